pub mod identity;
pub mod login_code;
pub mod profile;
pub mod role;
pub mod sponsor;

pub use identity::Identity;
pub use login_code::LoginCode;
pub use profile::Profile;
pub use role::{Provider, Role, ELEVATED_ROLES};
pub use sponsor::Sponsor;
