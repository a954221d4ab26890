pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AuthConfig, Environment, SwaggerMode};
use crate::middleware::{
    request_id_middleware, role_guard, security_headers_middleware, RoleGuard, REQUEST_ID_HEADER,
};
use crate::models::{Provider, Role, ELEVATED_ROLES};
use crate::services::{
    IdentityResolver, IdentityStore, MailSender, OAuthClient, RedirectValidator,
    RoleMutationService, ServiceError, SponsorService, TokenService,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::login::start_login,
        handlers::login::login_callback,
        handlers::sponsor::request_code,
        handlers::sponsor::login_with_code,
        handlers::roles::get_own_roles,
        handlers::roles::get_roles_of,
        handlers::roles::list_role_members,
        handlers::roles::grant_role,
        handlers::roles::revoke_role,
        handlers::token::refresh_token,
        handlers::token::get_user,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::SponsorCodeRequest,
            dtos::auth::SponsorLoginRequest,
            dtos::auth::AcceptedResponse,
            dtos::auth::TokenResponse,
            dtos::auth::RolesResponse,
            dtos::auth::UserListResponse,
            dtos::auth::UserResponse,
            models::Role,
            models::Provider,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "OAuth logins and session tokens"),
        (name = "Sponsor", description = "Passwordless sponsor login"),
        (name = "Roles", description = "Role inspection and administration"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store: Arc<dyn IdentityStore>,
    pub token: Arc<TokenService>,
    pub redirects: Arc<RedirectValidator>,
    pub google: OAuthClient,
    pub github: OAuthClient,
    pub resolver: IdentityResolver,
    pub sponsor: Arc<SponsorService>,
    pub mutation: RoleMutationService,
}

impl AppState {
    /// Wires the service graph over a store and mail transport.
    ///
    /// Everything downstream receives its collaborators here; there is no
    /// global registry to mutate, which is also what lets the tests swap in
    /// the in-memory store and the recording mailer.
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn IdentityStore>,
        mailer: Arc<dyn MailSender>,
    ) -> Result<Self, ServiceError> {
        let token = Arc::new(TokenService::new(&config.jwt)?);
        let redirects = Arc::new(RedirectValidator::new(config.redirects.clone()));

        let http = reqwest::Client::new();
        let google = OAuthClient::new(Provider::Google, config.google.clone(), http.clone());
        let github = OAuthClient::new(Provider::Github, config.github.clone(), http);

        let resolver = IdentityResolver::new(store.clone(), config.staff.clone());
        let sponsor = Arc::new(SponsorService::new(
            store.clone(),
            mailer,
            resolver.clone(),
            config.sponsor.clone(),
        ));
        let mutation = RoleMutationService::new(store.clone());

        Ok(Self {
            config,
            store,
            token,
            redirects,
            google,
            github,
            resolver,
            sponsor,
            mutation,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    // Login entry points; the callback is reached by the provider, everything
    // else by anonymous browsers.
    let public_routes = Router::new()
        .route("/auth/login/:provider", get(handlers::login::start_login))
        .route(
            "/auth/:provider/callback",
            get(handlers::login::login_callback),
        )
        .route("/auth/sponsor/verify", post(handlers::sponsor::request_code))
        .route("/auth/sponsor/login", post(handlers::sponsor::login_with_code));

    // Any valid session.
    let authenticated_routes = Router::new()
        .route("/auth/roles", get(handlers::roles::get_own_roles))
        .route("/auth/token/refresh", get(handlers::token::refresh_token))
        .layer(from_fn_with_state(
            RoleGuard::new(state.clone(), &[]),
            role_guard,
        ));

    // Staff or admin.
    let elevated_routes = Router::new()
        .route(
            "/auth/roles/list/:role",
            get(handlers::roles::list_role_members),
        )
        .route("/auth/roles/:id", get(handlers::roles::get_roles_of))
        .layer(from_fn_with_state(
            RoleGuard::new(state.clone(), ELEVATED_ROLES),
            role_guard,
        ));

    // Admin only.
    let admin_routes = Router::new()
        .route(
            "/auth/roles/:id/:role",
            put(handlers::roles::grant_role).delete(handlers::roles::revoke_role),
        )
        .route("/auth/user/:id", get(handlers::token::get_user))
        .layer(from_fn_with_state(
            RoleGuard::new(state.clone(), &[Role::Admin]),
            role_guard,
        ));

    let mut app = Router::new().route("/health", get(health_check));

    // Swagger is unconditional in dev. In production the configured mode
    // decides whether the UI is public, session-gated, or absent; the raw
    // OpenAPI document stays available for programmatic access either way.
    let swagger_enabled = match state.config.environment {
        Environment::Dev => true,
        Environment::Prod => match state.config.swagger.enabled {
            SwaggerMode::Public | SwaggerMode::Authenticated => true,
            SwaggerMode::Disabled => false,
        },
    };

    if swagger_enabled {
        let docs: Router<AppState> =
            SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()).into();
        let docs = if state.config.environment == Environment::Prod
            && state.config.swagger.enabled == SwaggerMode::Authenticated
        {
            docs.layer(from_fn_with_state(
                RoleGuard::new(state.clone(), &[]),
                role_guard,
            ))
        } else {
            docs
        };
        app = app.merge(docs);
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    app.merge(public_routes)
        .merge(authenticated_routes)
        .merge(elevated_routes)
        .merge(admin_routes)
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|origin| {
                            origin
                                .parse::<axum::http::HeaderValue>()
                                .map_err(|e| {
                                    tracing::error!(
                                        "Invalid CORS origin '{}': {}. Skipping it.",
                                        origin,
                                        e
                                    );
                                })
                                .ok()
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Backing store is unreachable", body = dtos::ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}
