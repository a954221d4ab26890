use serde::Deserialize;
use std::collections::HashMap;
use std::env;

use crate::services::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub google: ProviderConfig,
    pub github: ProviderConfig,
    pub staff: StaffConfig,
    pub sponsor: SponsorCodeConfig,
    pub redirects: RedirectConfig,
    pub smtp: SmtpConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub default_ttl_seconds: i64,
}

/// Endpoints and credentials for one upstream OAuth provider.
///
/// The endpoint URLs are fixed per provider; only the credentials and the
/// registered callback come from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffConfig {
    /// Email domain whose members are treated as event staff.
    pub domain: String,
    /// Local parts (before the `@`) of staff accounts that also get ADMIN.
    pub admins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SponsorCodeConfig {
    pub code_length: usize,
    pub code_ttl_seconds: i64,
    pub mail_template: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    /// Custom URI scheme the mobile apps register for deep links.
    pub mobile_scheme: String,
    /// Host patterns accepted for https redirect targets. A leading `*.`
    /// matches any single-level or deeper subdomain.
    pub allowed_hosts: Vec<String>,
    /// Redirect target per device label.
    pub devices: HashMap<String, String>,
    pub default_device: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    /// Domain attribute for the session cookie in production.
    pub cookie_domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerConfig {
    pub enabled: SwaggerMode,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SwaggerMode {
    Public,
    Authenticated,
    Disabled,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ServiceError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str.parse().map_err(ServiceError::Config)?;

        let is_prod = environment == Environment::Prod;

        let config = AuthConfig {
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("identity-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            host: get_env("HOST", Some("0.0.0.0"), is_prod)?,
            port: get_env("PORT", Some("8000"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| ServiceError::Config(e.to_string()))?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("identity"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", None, is_prod)?,
                default_ttl_seconds: get_env("JWT_DEFAULT_TTL_SECONDS", Some("604800"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ServiceError::Config(e.to_string()))?,
            },
            google: ProviderConfig {
                client_id: get_env("GOOGLE_CLIENT_ID", None, is_prod)?,
                client_secret: get_env("GOOGLE_CLIENT_SECRET", None, is_prod)?,
                redirect_uri: get_env(
                    "GOOGLE_REDIRECT_URI",
                    // No trailing slash: the router matches the callback path
                    // exactly.
                    Some("http://localhost:8000/auth/google/callback"),
                    is_prod,
                )?,
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
                scopes: "openid profile email".to_string(),
            },
            github: ProviderConfig {
                client_id: get_env("GITHUB_CLIENT_ID", None, is_prod)?,
                client_secret: get_env("GITHUB_CLIENT_SECRET", None, is_prod)?,
                redirect_uri: get_env(
                    "GITHUB_REDIRECT_URI",
                    Some("http://localhost:8000/auth/github/callback"),
                    is_prod,
                )?,
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: "https://github.com/login/oauth/access_token".to_string(),
                userinfo_url: "https://api.github.com/user".to_string(),
                scopes: "user:email".to_string(),
            },
            staff: StaffConfig {
                domain: get_env("STAFF_DOMAIN", Some("hackillinois.org"), is_prod)?,
                admins: split_csv(&get_env("ADMIN_ALLOWLIST", Some(""), is_prod)?),
            },
            sponsor: SponsorCodeConfig {
                code_length: get_env("SPONSOR_CODE_LENGTH", Some("6"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ServiceError::Config(e.to_string()))?,
                code_ttl_seconds: get_env("SPONSOR_CODE_TTL_SECONDS", Some("600"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ServiceError::Config(e.to_string()))?,
                mail_template: get_env(
                    "SPONSOR_CODE_TEMPLATE",
                    Some("sponsor_login_code"),
                    is_prod,
                )?,
            },
            redirects: RedirectConfig {
                mobile_scheme: get_env("MOBILE_REDIRECT_SCHEME", Some("hackillinois"), is_prod)?,
                allowed_hosts: split_csv(&get_env(
                    "ALLOWED_REDIRECT_HOSTS",
                    Some("hackillinois.org,*.hackillinois.org"),
                    is_prod,
                )?),
                devices: parse_device_map(&get_env(
                    "DEVICE_REDIRECTS",
                    Some(
                        "web=https://www.hackillinois.org/auth/,\
                         dev=http://localhost:3000/auth/,\
                         ios=hackillinois://auth/,\
                         android=hackillinois://auth/",
                    ),
                    is_prod,
                )?)?,
                default_device: get_env("DEFAULT_DEVICE", Some("web"), is_prod)?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                user: get_env("SMTP_USER", None, is_prod)?,
                password: get_env("SMTP_PASSWORD", None, is_prod)?,
                from_address: get_env("SMTP_FROM", Some("no-reply@hackillinois.org"), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: split_csv(&get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?),
                cookie_domain: get_env("COOKIE_DOMAIN", Some("hackillinois.org"), is_prod)?,
            },
            swagger: SwaggerConfig {
                enabled: get_env("ENABLE_SWAGGER", Some("public"), is_prod)?
                    .parse()
                    .map_err(ServiceError::Config)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ServiceError> {
        if self.port == 0 {
            return Err(ServiceError::Config(
                "PORT must be greater than 0".to_string(),
            ));
        }

        if self.jwt.secret.is_empty() {
            return Err(ServiceError::Config(
                "JWT_SECRET must not be empty".to_string(),
            ));
        }

        if self.jwt.default_ttl_seconds <= 0 {
            return Err(ServiceError::Config(
                "JWT_DEFAULT_TTL_SECONDS must be positive".to_string(),
            ));
        }

        if self.sponsor.code_length == 0 {
            return Err(ServiceError::Config(
                "SPONSOR_CODE_LENGTH must be greater than 0".to_string(),
            ));
        }

        if self.sponsor.code_ttl_seconds <= 0 {
            return Err(ServiceError::Config(
                "SPONSOR_CODE_TTL_SECONDS must be positive".to_string(),
            ));
        }

        if !self.redirects.devices.contains_key(&self.redirects.default_device) {
            return Err(ServiceError::Config(format!(
                "DEFAULT_DEVICE '{}' has no entry in DEVICE_REDIRECTS",
                self.redirects.default_device
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(ServiceError::Config(
                    "Wildcard CORS origin not allowed in production".to_string(),
                ));
            }

            if self.swagger.enabled == SwaggerMode::Public {
                tracing::error!("Swagger is publicly accessible in production - consider using 'authenticated' or 'disabled'");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, ServiceError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(ServiceError::Config(format!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(ServiceError::Config(format!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_device_map(raw: &str) -> Result<HashMap<String, String>, ServiceError> {
    let mut devices = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (device, target) = entry.split_once('=').ok_or_else(|| {
            ServiceError::Config(format!(
                "DEVICE_REDIRECTS entry '{}' is not of the form device=url",
                entry
            ))
        })?;
        devices.insert(device.trim().to_string(), target.trim().to_string());
    }
    Ok(devices)
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "authenticated" => Ok(SwaggerMode::Authenticated),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}
