use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Provider, Role};

/// Query params for starting an OAuth login.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginQuery {
    /// Explicit post-login redirect target; validated against the allow-list.
    pub redirect: Option<String>,
    /// Device label resolved through the configured redirect table.
    pub device: Option<String>,
}

/// Query params from the provider callback.
#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SponsorCodeRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "recruiter@bigco.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SponsorLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "recruiter@bigco.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "AB12CD")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AcceptedResponse {
    #[schema(example = "Accepted")]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9.eyJpZCI6ImdpdGh1YjEyMzQ1In0.signature")]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RolesResponse {
    #[schema(example = "github12345")]
    pub id: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "github12345")]
    pub id: String,
    #[schema(example = "dev@example.com")]
    pub email: String,
    pub provider: Provider,
    pub roles: Vec<Role>,
}
