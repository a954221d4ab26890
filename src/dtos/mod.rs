pub mod auth;

pub use auth::*;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform error body: a machine-readable kind plus a human-readable message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "TokenInvalid")]
    pub error: String,
    #[schema(example = "The provided token was invalid")]
    pub message: String,
}
