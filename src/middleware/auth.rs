use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::models::Role;
use crate::services::{ServiceError, TokenPayload};
use crate::AppState;

/// Session cookie name, shared with the OAuth callback that sets it.
pub const TOKEN_COOKIE: &str = "token";

/// State handed to [`role_guard`] per route group: the shared app state plus
/// the roles that group demands. An empty `required` slice means
/// authentication only.
#[derive(Clone)]
pub struct RoleGuard {
    pub state: AppState,
    pub required: &'static [Role],
}

impl RoleGuard {
    pub fn new(state: AppState, required: &'static [Role]) -> Self {
        Self { state, required }
    }
}

/// Middleware enforcing authentication and, when roles are listed, possession
/// of at least one of them.
///
/// The verified payload is cached in request extensions, so stacked guards
/// verify the token once and handlers read it through [`AuthUser`].
pub async fn role_guard(
    State(guard): State<RoleGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let payload = match req.extensions().get::<TokenPayload>() {
        Some(payload) => payload.clone(),
        None => {
            let payload = guard.state.token.verify(raw_token(&req).as_deref())?;
            req.extensions_mut().insert(payload.clone());
            payload
        }
    };

    if !guard.required.is_empty() && !guard.required.iter().any(|role| payload.has_role(*role)) {
        tracing::warn!(user_id = %payload.id, "Caller holds none of the required roles");
        return Err(ServiceError::Forbidden {
            required: guard.required,
        });
    }

    Ok(next.run(req).await)
}

/// Raw token as presented by the caller: the `Authorization` header wins,
/// the `token` cookie is the fallback. A present-but-broken header is an
/// error, never a reason to fall through to the cookie.
fn raw_token(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        return value.to_str().ok().map(str::to_string);
    }
    CookieJar::from_headers(req.headers())
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Extractor handing handlers the payload a guard already verified.
pub struct AuthUser(pub TokenPayload);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let payload = parts.extensions.get::<TokenPayload>().ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!(
                "token payload missing from request extensions; route is not behind a guard"
            ))
        })?;
        Ok(AuthUser(payload.clone()))
    }
}
