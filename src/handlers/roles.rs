//! Role inspection and administration endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::dtos::{RolesResponse, UserListResponse};
use crate::middleware::AuthUser;
use crate::models::Role;
use crate::services::ServiceError;
use crate::AppState;

fn parse_role(raw: &str) -> Result<Role, ServiceError> {
    raw.parse().map_err(ServiceError::BadRequest)
}

/// The caller's own roles, straight from the verified token.
///
/// GET /auth/roles
#[utoipa::path(
    get,
    path = "/auth/roles",
    responses(
        (status = 200, description = "Roles carried by the presented token", body = RolesResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "Roles",
    security(("session_token" = []))
)]
pub async fn get_own_roles(AuthUser(payload): AuthUser) -> Json<RolesResponse> {
    Json(RolesResponse {
        id: payload.id,
        roles: payload.roles,
    })
}

/// Stored roles of an arbitrary user.
///
/// GET /auth/roles/:id
#[utoipa::path(
    get,
    path = "/auth/roles/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Stored roles for the user", body = RolesResponse),
        (status = 403, description = "Caller is not staff or admin", body = ErrorResponse),
        (status = 404, description = "No user exists with that id", body = ErrorResponse)
    ),
    tag = "Roles",
    security(("session_token" = []))
)]
pub async fn get_roles_of(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RolesResponse>, ServiceError> {
    let roles = state.mutation.get_roles(&id).await?;
    Ok(Json(RolesResponse {
        id,
        roles: roles.into_iter().collect(),
    }))
}

/// All user ids holding a role.
///
/// GET /auth/roles/list/:role
#[utoipa::path(
    get,
    path = "/auth/roles/list/{role}",
    params(("role" = String, Path, description = "Role name, e.g. STAFF")),
    responses(
        (status = 200, description = "Ids of every user granted the role", body = UserListResponse),
        (status = 400, description = "Unknown role name", body = ErrorResponse),
        (status = 403, description = "Caller is not staff or admin", body = ErrorResponse)
    ),
    tag = "Roles",
    security(("session_token" = []))
)]
pub async fn list_role_members(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<UserListResponse>, ServiceError> {
    let role = parse_role(&role)?;
    let user_ids = state.mutation.list_users_with_role(role).await?;
    Ok(Json(UserListResponse { user_ids }))
}

/// Grant a role.
///
/// PUT /auth/roles/:id/:role
#[utoipa::path(
    put,
    path = "/auth/roles/{id}/{role}",
    params(
        ("id" = String, Path, description = "User id"),
        ("role" = String, Path, description = "Role name, e.g. STAFF")
    ),
    responses(
        (status = 200, description = "Resulting role set", body = RolesResponse),
        (status = 400, description = "Unknown role name", body = ErrorResponse),
        (status = 403, description = "Caller is not admin", body = ErrorResponse),
        (status = 404, description = "No user exists with that id", body = ErrorResponse)
    ),
    tag = "Roles",
    security(("session_token" = []))
)]
pub async fn grant_role(
    State(state): State<AppState>,
    Path((id, role)): Path<(String, String)>,
) -> Result<Json<RolesResponse>, ServiceError> {
    let role = parse_role(&role)?;
    let roles = state.mutation.add_role(&id, role).await?;
    Ok(Json(RolesResponse {
        id,
        roles: roles.into_iter().collect(),
    }))
}

/// Revoke a role.
///
/// DELETE /auth/roles/:id/:role
#[utoipa::path(
    delete,
    path = "/auth/roles/{id}/{role}",
    params(
        ("id" = String, Path, description = "User id"),
        ("role" = String, Path, description = "Role name, e.g. STAFF")
    ),
    responses(
        (status = 200, description = "Resulting role set", body = RolesResponse),
        (status = 400, description = "Unknown role name", body = ErrorResponse),
        (status = 403, description = "Caller is not admin", body = ErrorResponse),
        (status = 404, description = "No user exists with that id", body = ErrorResponse)
    ),
    tag = "Roles",
    security(("session_token" = []))
)]
pub async fn revoke_role(
    State(state): State<AppState>,
    Path((id, role)): Path<(String, String)>,
) -> Result<Json<RolesResponse>, ServiceError> {
    let role = parse_role(&role)?;
    let roles = state.mutation.remove_role(&id, role).await?;
    Ok(Json(RolesResponse {
        id,
        roles: roles.into_iter().collect(),
    }))
}
