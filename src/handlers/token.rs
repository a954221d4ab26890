//! Session refresh and administrative user lookup.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::dtos::{TokenResponse, UserResponse};
use crate::middleware::AuthUser;
use crate::services::ServiceError;
use crate::AppState;

/// Re-issue the caller's session.
///
/// GET /auth/token/refresh
///
/// Runs the same derive-merge-persist cycle as a login, so role grants made
/// since the old token was minted appear in the new one. Works for every
/// provider, including sponsor sessions that never saw an OAuth profile.
/// A never-expiring session stays never-expiring.
#[utoipa::path(
    get,
    path = "/auth/token/refresh",
    responses(
        (status = 200, description = "Fresh session token", body = TokenResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "Auth",
    security(("session_token" = []))
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    AuthUser(payload): AuthUser,
) -> Result<Json<TokenResponse>, ServiceError> {
    // The id in a verified token is already qualified; no provider prefixing.
    let refreshed = state
        .resolver
        .resolve_from_profile(payload.provider, &payload.id, &payload.email, false)
        .await;
    if !refreshed.persisted {
        tracing::warn!(
            user_id = %refreshed.payload.id,
            "Refresh proceeding with role grants that could not be saved"
        );
    }

    let never_expire = payload.exp.is_none();
    let token = state.token.issue(&refreshed.payload, never_expire, None)?;
    Ok(Json(TokenResponse { token }))
}

/// Reconstructed token-payload view of an arbitrary user.
///
/// GET /auth/user/:id
#[utoipa::path(
    get,
    path = "/auth/user/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Identity and profile join for the user", body = UserResponse),
        (status = 403, description = "Caller is not admin", body = ErrorResponse),
        (status = 404, description = "No user exists with that id", body = ErrorResponse)
    ),
    tag = "Auth",
    security(("session_token" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ServiceError> {
    let payload = state.resolver.resolve_from_store(&id).await?;
    Ok(Json(UserResponse {
        id: payload.id,
        email: payload.email,
        provider: payload.provider,
        roles: payload.roles,
    }))
}
