use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

use crate::dtos::ErrorResponse;
use crate::models::Role;

/// Why a sponsor code verification was rejected.
///
/// The wire response is the same undifferentiated `BadCode` for every cause,
/// so a caller cannot probe which emails hold live codes. The tag exists for
/// server-side logs and for tests that need to assert the precise cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRejection {
    UnknownSponsor,
    NoActiveCode,
    Expired,
    Mismatch,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No authorization token was provided")]
    NoToken,

    #[error("The provided token has expired")]
    TokenExpired,

    #[error("The provided token was invalid")]
    TokenInvalid,

    #[error("The identity provider did not authenticate the login")]
    AuthenticationFailed,

    #[error("Invalid redirect URL: {0}")]
    BadRedirectUrl(String),

    #[error("The code provided was incorrect or expired")]
    BadCode(CodeRejection),

    #[error("You must hold one of the following roles: {}", join_roles(.required))]
    Forbidden { required: &'static [Role] },

    #[error("No user exists with that id")]
    UserNotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Mail dispatch failed: {0}")]
    Mail(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ServiceError {
    /// Machine-readable kind string carried in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NoToken => "NoToken",
            ServiceError::TokenExpired => "TokenExpired",
            ServiceError::TokenInvalid => "TokenInvalid",
            ServiceError::AuthenticationFailed => "AuthenticationFailed",
            ServiceError::BadRedirectUrl(_) => "BadRedirectUrl",
            ServiceError::BadCode(_) => "BadCode",
            ServiceError::Forbidden { .. } => "Forbidden",
            ServiceError::UserNotFound => "UserNotFound",
            ServiceError::BadRequest(_) => "BadRequest",
            ServiceError::Database(_)
            | ServiceError::Mail(_)
            | ServiceError::Config(_)
            | ServiceError::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NoToken
            | ServiceError::TokenInvalid
            | ServiceError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ServiceError::TokenExpired
            | ServiceError::BadCode(_)
            | ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ServiceError::BadRedirectUrl(_) | ServiceError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::UserNotFound => StatusCode::NOT_FOUND,
            ServiceError::Database(_)
            | ServiceError::Mail(_)
            | ServiceError::Config(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            ServiceError::Database(_)
                | ServiceError::Mail(_)
                | ServiceError::Config(_)
                | ServiceError::Internal(_)
        )
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if self.is_internal() {
            // Full detail stays in the server log, keyed by a correlation id
            // the caller can quote; the response carries nothing else.
            let error_id = Uuid::new_v4();
            tracing::error!(error_id = %error_id, error = ?self, "request failed with internal error");
            ErrorResponse {
                error: self.kind().to_string(),
                message: format!(
                    "Something went wrong on our end. Quote error id {} when reporting this.",
                    error_id
                ),
            }
        } else {
            if let ServiceError::BadCode(rejection) = &self {
                tracing::info!(rejection = ?rejection, "sponsor code rejected");
            }
            ErrorResponse {
                error: self.kind().to_string(),
                message: self.to_string(),
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_per_kind() {
        assert_eq!(ServiceError::NoToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::TokenInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::TokenExpired.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ServiceError::BadCode(CodeRejection::Mismatch).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ServiceError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::BadRedirectUrl("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_bad_code_message_is_uniform_across_causes() {
        let messages: Vec<String> = [
            CodeRejection::UnknownSponsor,
            CodeRejection::NoActiveCode,
            CodeRejection::Expired,
            CodeRejection::Mismatch,
        ]
        .into_iter()
        .map(|cause| ServiceError::BadCode(cause).to_string())
        .collect();

        assert!(messages.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_forbidden_message_enumerates_roles() {
        let err = ServiceError::Forbidden {
            required: &[Role::Staff, Role::Admin],
        };
        let message = err.to_string();
        assert!(message.contains("STAFF"));
        assert!(message.contains("ADMIN"));
    }
}
