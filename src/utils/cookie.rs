use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::{AuthConfig, Environment};
use crate::middleware::TOKEN_COOKIE;

/// Builds the session cookie set by the OAuth callback.
///
/// Production cookies are scoped to the configured domain and must cross
/// site boundaries (the API and the frontends live on different subdomains),
/// so they are `Secure` + `SameSite=None` there and `Lax` in development.
pub fn session_cookie(token: &str, config: &AuthConfig) -> Cookie<'static> {
    let builder = Cookie::build((TOKEN_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(config.jwt.default_ttl_seconds));

    if config.environment == Environment::Prod {
        builder
            .secure(true)
            .same_site(SameSite::None)
            .domain(config.security.cookie_domain.clone())
            .build()
    } else {
        builder.same_site(SameSite::Lax).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        JwtConfig, MongoConfig, ProviderConfig, RedirectConfig, SecurityConfig, SmtpConfig,
        SponsorCodeConfig, StaffConfig, SwaggerConfig, SwaggerMode,
    };
    use std::collections::HashMap;

    fn config(environment: Environment) -> AuthConfig {
        let provider = ProviderConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8000/cb".to_string(),
            authorize_url: "https://example.com/auth".to_string(),
            token_url: "https://example.com/token".to_string(),
            userinfo_url: "https://example.com/userinfo".to_string(),
            scopes: "email".to_string(),
        };
        AuthConfig {
            environment,
            service_name: "identity-service".to_string(),
            service_version: "test".to_string(),
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "identity".to_string(),
            },
            jwt: JwtConfig {
                secret: "secret".to_string(),
                default_ttl_seconds: 604800,
            },
            google: provider.clone(),
            github: provider,
            staff: StaffConfig {
                domain: "hackillinois.org".to_string(),
                admins: vec![],
            },
            sponsor: SponsorCodeConfig {
                code_length: 6,
                code_ttl_seconds: 600,
                mail_template: "sponsor_login_code".to_string(),
            },
            redirects: RedirectConfig {
                mobile_scheme: "hackillinois".to_string(),
                allowed_hosts: vec!["hackillinois.org".to_string()],
                devices: HashMap::from([(
                    "web".to_string(),
                    "https://hackillinois.org/auth/".to_string(),
                )]),
                default_device: "web".to_string(),
            },
            smtp: SmtpConfig {
                host: "smtp.example.com".to_string(),
                user: "user".to_string(),
                password: "password".to_string(),
                from_address: "no-reply@example.com".to_string(),
            },
            security: SecurityConfig {
                allowed_origins: vec![],
                cookie_domain: "hackillinois.org".to_string(),
            },
            swagger: SwaggerConfig {
                enabled: SwaggerMode::Disabled,
            },
        }
    }

    #[test]
    fn test_dev_cookie_is_lax_without_domain() {
        let cookie = session_cookie("tok", &config(Environment::Dev));
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert!(cookie.domain().is_none());
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn test_prod_cookie_is_secure_cross_site_and_scoped() {
        let cookie = session_cookie("tok", &config(Environment::Prod));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.domain(), Some("hackillinois.org"));
    }
}
