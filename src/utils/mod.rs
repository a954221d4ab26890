pub mod cookie;
pub mod validation;

pub use cookie::session_cookie;
pub use validation::ValidatedJson;
