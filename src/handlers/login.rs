//! OAuth login flow: kick-off redirect to the provider and the callback
//! that turns a provider grant into a session.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;

use crate::dtos::{CallbackQuery, LoginQuery};
use crate::models::Provider;
use crate::services::{decode_state, encode_state, OAuthClient, ServiceError};
use crate::utils::session_cookie;
use crate::AppState;

/// Maps the path segment to a configured OAuth client. The sponsor
/// pseudo-provider has no OAuth client and is rejected here like any other
/// unknown segment.
fn oauth_client<'a>(state: &'a AppState, provider: &str) -> Result<&'a OAuthClient, ServiceError> {
    match provider.parse::<Provider>() {
        Ok(Provider::Google) => Ok(&state.google),
        Ok(Provider::Github) => Ok(&state.github),
        _ => Err(ServiceError::BadRequest(format!(
            "Unknown login provider: {}",
            provider
        ))),
    }
}

/// Start an OAuth login with the named provider.
///
/// GET /auth/login/:provider
#[utoipa::path(
    get,
    path = "/auth/login/{provider}",
    params(
        ("provider" = String, Path, description = "Login provider: google or github"),
        LoginQuery
    ),
    responses(
        (status = 303, description = "Redirect to the provider authorize endpoint"),
        (status = 400, description = "Unknown provider or rejected redirect target", body = ErrorResponse)
    ),
    tag = "Auth"
)]
#[tracing::instrument(skip(state, query), fields(provider = %provider))]
pub async fn start_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect, ServiceError> {
    let client = oauth_client(&state, &provider)?;

    let target = state
        .redirects
        .resolve_target(query.redirect.as_deref(), query.device.as_deref())?;

    // The validated target rides through the provider in `state` and comes
    // back to the callback.
    let authorize_url = client.authorize_url(&encode_state(&target));
    Ok(Redirect::to(&authorize_url))
}

/// Provider callback: re-validate the returned target, exchange the code,
/// reconcile the identity, then hand the browser its session.
///
/// GET /auth/:provider/callback
#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    params(
        ("provider" = String, Path, description = "Login provider: google or github"),
        CallbackQuery
    ),
    responses(
        (status = 303, description = "Redirect to the target with the session token appended"),
        (status = 400, description = "Missing or tampered state parameter", body = ErrorResponse),
        (status = 401, description = "Provider refused the login", body = ErrorResponse)
    ),
    tag = "Auth"
)]
#[tracing::instrument(skip_all, fields(provider = %provider))]
pub async fn login_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ServiceError> {
    let client = oauth_client(&state, &provider)?;

    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Provider reported a failed authorization");
        return Err(ServiceError::AuthenticationFailed);
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(ServiceError::AuthenticationFailed)?;

    let raw_state = query
        .state
        .as_deref()
        .ok_or_else(|| ServiceError::BadRedirectUrl("missing state parameter".to_string()))?;

    // The target made a round-trip through the provider; validate it again
    // rather than trusting what came back.
    let target = decode_state(raw_state)?;
    state.redirects.validate(&target)?;

    let access_token = client.exchange_code(code).await?;
    let user = client.fetch_user(&access_token).await?;

    let resolution = state
        .resolver
        .resolve_from_profile(client.provider(), &user.id, &user.email, true)
        .await;
    if !resolution.persisted {
        tracing::warn!(
            user_id = %resolution.payload.id,
            "Login proceeding with role grants that could not be saved"
        );
    }

    state
        .resolver
        .record_profile(&resolution.payload.id, &user.email, &user.display_name)
        .await?;

    // Mobile deep-link targets get a session that outlives any browser: the
    // apps hold the token in the platform keystore and never re-login.
    let never_expire = state.redirects.is_mobile_target(&target);
    let token = state.token.issue(&resolution.payload, never_expire, None)?;

    let jar = jar.add(session_cookie(&token, &state.config));

    let separator = if target.contains('?') { '&' } else { '?' };
    let destination = format!("{}{}token={}", target, separator, urlencoding::encode(&token));

    Ok((jar, Redirect::to(&destination)))
}
