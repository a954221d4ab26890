//! HTTP handlers for identity-service.

pub mod login;
pub mod roles;
pub mod sponsor;
pub mod token;

pub use login::*;
pub use roles::*;
pub use sponsor::*;
pub use token::*;
