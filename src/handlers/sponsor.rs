//! Passwordless sponsor login endpoints.

use axum::{extract::State, Json};

use crate::dtos::{
    AcceptedResponse, SponsorCodeRequest, SponsorLoginRequest, TokenResponse,
};
use crate::services::ServiceError;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Request a one-time login code by email.
///
/// POST /auth/sponsor/verify
///
/// Always answers 200, whether or not the email names a sponsor and whether
/// or not anything could actually be stored or mailed.
#[utoipa::path(
    post,
    path = "/auth/sponsor/verify",
    request_body = SponsorCodeRequest,
    responses(
        (status = 200, description = "Request accepted; a code was mailed if the email names a sponsor", body = AcceptedResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse)
    ),
    tag = "Sponsor"
)]
pub async fn request_code(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SponsorCodeRequest>,
) -> Json<AcceptedResponse> {
    state.sponsor.request_code(&req.email).await;
    Json(AcceptedResponse {
        status: "Accepted".to_string(),
    })
}

/// Trade a mailed code for a session token.
///
/// POST /auth/sponsor/login
#[utoipa::path(
    post,
    path = "/auth/sponsor/login",
    request_body = SponsorLoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = TokenResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 403, description = "The code provided was incorrect or expired", body = ErrorResponse)
    ),
    tag = "Sponsor"
)]
pub async fn login_with_code(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SponsorLoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let resolution = state.sponsor.verify_code(&req.email, &req.code).await?;
    let token = state.token.issue(&resolution.payload, false, None)?;
    Ok(Json(TokenResponse { token }))
}
