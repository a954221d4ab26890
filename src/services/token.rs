use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::JwtConfig;
use crate::models::{Provider, Role};
use crate::services::error::ServiceError;

/// Claims carried by a session token.
///
/// `exp` is omitted entirely for never-expiring tokens handed to the mobile
/// apps, so its absence is meaningful and must survive round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenPayload {
    pub id: String,
    pub email: String,
    pub provider: Provider,
    pub roles: Vec<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenPayload {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Result<Self, ServiceError> {
        if config.secret.is_empty() {
            return Err(ServiceError::Config(
                "JWT secret must not be empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Never-expiring tokens carry no `exp` claim at all. With the
        // required-claims set cleared, a missing `exp` passes validation
        // while a present-but-past one still fails as expired.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            default_ttl: Duration::seconds(config.default_ttl_seconds),
        })
    }

    /// Signs `payload` into a compact JWT.
    ///
    /// `never_expire` wins over any TTL: the token is issued without an `exp`
    /// claim. Otherwise expiry is `now + ttl_override` when given, falling
    /// back to the configured default.
    pub fn issue(
        &self,
        payload: &TokenPayload,
        never_expire: bool,
        ttl_override: Option<Duration>,
    ) -> Result<String, ServiceError> {
        let mut claims = payload.clone();
        claims.exp = if never_expire {
            None
        } else {
            let ttl = ttl_override.unwrap_or(self.default_ttl);
            Some((Utc::now() + ttl).timestamp())
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("token signing failed: {}", e)))
    }

    /// Verifies a raw token value as found in a header or cookie.
    ///
    /// An optional `Bearer ` prefix is tolerated. Absent or blank input maps
    /// to `NoToken`, a past `exp` to `TokenExpired`, everything else that
    /// fails to `TokenInvalid`.
    pub fn verify(&self, raw: Option<&str>) -> Result<TokenPayload, ServiceError> {
        let raw = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ServiceError::NoToken)?;

        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        if token.is_empty() {
            return Err(ServiceError::NoToken);
        }

        decode::<TokenPayload>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::TokenExpired,
                _ => ServiceError::TokenInvalid,
            })
    }
}
