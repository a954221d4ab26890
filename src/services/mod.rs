//! Services layer for identity-service.
//!
//! Business logic for session tokens, login reconciliation, role policy,
//! sponsor one-time codes, and the persistence and mail ports behind them.

pub mod error;
mod mail;
mod mutation;
mod oauth;
mod redirect;
mod resolver;
mod roles;
mod sponsor;
mod store;
mod token;

pub use error::{CodeRejection, ServiceError};
pub use mail::{MailSender, MockMailer, SentMail, SmtpMailer, SPONSOR_CODE_TEMPLATE};
pub use mutation::RoleMutationService;
pub use oauth::{decode_state, encode_state, OAuthClient, ProviderUser};
pub use redirect::RedirectValidator;
pub use resolver::{IdentityResolver, Resolution};
pub use sponsor::SponsorService;
pub use store::{IdentityStore, MemoryIdentityStore, MongoIdentityStore};
pub use token::{TokenPayload, TokenService};
