//! Shared helpers for identity-service integration tests.
//!
//! Tests drive the real router over the in-memory store and the recording
//! mailer, so no database, SMTP relay, or upstream provider is needed.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use identity_service::{
    build_router,
    config::{
        AuthConfig, Environment, JwtConfig, MongoConfig, ProviderConfig, RedirectConfig,
        SecurityConfig, SmtpConfig, SponsorCodeConfig, StaffConfig, SwaggerConfig, SwaggerMode,
    },
    models::{Identity, Profile, Provider, Role, Sponsor},
    services::{MemoryIdentityStore, MockMailer, TokenPayload},
    AppState,
};

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryIdentityStore>,
    pub mailer: Arc<MockMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryIdentityStore::new());
        let mailer = Arc::new(MockMailer::new());
        let state = AppState::new(test_config(), store.clone(), mailer.clone())
            .expect("Failed to build test state");
        Self {
            state,
            store,
            mailer,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Signs a session token exactly as a login would.
    pub fn mint_token(&self, id: &str, email: &str, provider: Provider, roles: &[Role]) -> String {
        self.state
            .token
            .issue(&payload(id, email, provider, roles), false, None)
            .unwrap()
    }

    pub fn mint_never_expiring_token(
        &self,
        id: &str,
        email: &str,
        provider: Provider,
        roles: &[Role],
    ) -> String {
        self.state
            .token
            .issue(&payload(id, email, provider, roles), true, None)
            .unwrap()
    }

    pub fn mint_expired_token(
        &self,
        id: &str,
        email: &str,
        provider: Provider,
        roles: &[Role],
    ) -> String {
        self.state
            .token
            .issue(
                &payload(id, email, provider, roles),
                false,
                Some(chrono::Duration::seconds(-3600)),
            )
            .unwrap()
    }

    /// Seeds a stored identity and its profile, as past logins would have.
    pub fn seed_user(&self, user_id: &str, email: &str, provider: Provider, roles: &[Role]) {
        self.store.seed_identity(Identity::new(
            user_id.to_string(),
            provider,
            roles.iter().copied().collect(),
        ));
        self.store.seed_profile(Profile::new(
            user_id.to_string(),
            email.to_string(),
            "Test User".to_string(),
        ));
    }

    pub fn seed_sponsor(&self, user_id: &str, email: &str) {
        self.store.seed_sponsor(Sponsor {
            user_id: user_id.to_string(),
            email: email.to_string(),
        });
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(request(axum::http::Method::GET, uri, token, None))
            .await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(request(axum::http::Method::PUT, uri, token, None))
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(request(axum::http::Method::DELETE, uri, token, None))
            .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(request(axum::http::Method::POST, uri, None, Some(body)))
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

fn payload(id: &str, email: &str, provider: Provider, roles: &[Role]) -> TokenPayload {
    TokenPayload {
        id: id.to_string(),
        email: email.to_string(),
        provider,
        roles: roles.to_vec(),
        exp: None,
    }
}

fn request(
    method: axum::http::Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Response body was not valid JSON")
}

pub fn test_config() -> AuthConfig {
    AuthConfig {
        environment: Environment::Dev,
        service_name: "identity-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        host: "127.0.0.1".to_string(),
        port: 8000,
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "identity_test".to_string(),
        },
        jwt: JwtConfig {
            secret: "test-secret-key-for-integration-tests".to_string(),
            default_ttl_seconds: 3600,
        },
        google: ProviderConfig {
            client_id: "google-client-id".to_string(),
            client_secret: "google-client-secret".to_string(),
            redirect_uri: "http://localhost:8000/auth/google/callback".to_string(),
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            scopes: "openid profile email".to_string(),
        },
        github: ProviderConfig {
            client_id: "github-client-id".to_string(),
            client_secret: "github-client-secret".to_string(),
            redirect_uri: "http://localhost:8000/auth/github/callback".to_string(),
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            userinfo_url: "https://api.github.com/user".to_string(),
            scopes: "user:email".to_string(),
        },
        staff: StaffConfig {
            domain: "hackillinois.org".to_string(),
            admins: vec!["director".to_string()],
        },
        sponsor: SponsorCodeConfig {
            code_length: 6,
            code_ttl_seconds: 600,
            mail_template: "sponsor_login_code".to_string(),
        },
        redirects: RedirectConfig {
            mobile_scheme: "hackillinois".to_string(),
            allowed_hosts: vec![
                "hackillinois.org".to_string(),
                "*.hackillinois.org".to_string(),
            ],
            devices: HashMap::from([
                (
                    "web".to_string(),
                    "https://www.hackillinois.org/auth/".to_string(),
                ),
                (
                    "dev".to_string(),
                    "http://localhost:3000/auth/".to_string(),
                ),
                ("ios".to_string(), "hackillinois://auth/".to_string()),
                ("android".to_string(), "hackillinois://auth/".to_string()),
            ]),
            default_device: "web".to_string(),
        },
        smtp: SmtpConfig {
            host: "smtp.example.com".to_string(),
            user: "mailer@example.com".to_string(),
            password: "app-password".to_string(),
            from_address: "no-reply@hackillinois.org".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            cookie_domain: "hackillinois.org".to_string(),
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
    }
}
