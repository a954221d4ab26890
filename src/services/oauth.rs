//! Upstream OAuth 2.0 plumbing shared by the Google and GitHub logins:
//! authorize-URL construction, code-for-token exchange, userinfo retrieval,
//! and the encoding of the redirect target through the `state` parameter.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::models::Provider;
use crate::services::error::ServiceError;

/// The provider-agnostic shape of an authenticated upstream account.
#[derive(Debug, Clone)]
pub struct ProviderUser {
    /// Provider-local account id, stringified.
    pub id: String,
    pub email: String,
    pub display_name: String,
}

/// One configured upstream provider. Constructed once at startup and handed
/// to whatever needs it; there is deliberately no global provider registry.
#[derive(Clone)]
pub struct OAuthClient {
    provider: Provider,
    config: ProviderConfig,
    http: reqwest::Client,
}

/// Response from the provider token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Userinfo document, with the fields the providers disagree on left loose:
/// Google sends `id` as a string and always has `email`; GitHub sends a
/// numeric `id`, a nullable `email`, and a `login`.
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    id: serde_json::Value,
    email: Option<String>,
    name: Option<String>,
    login: Option<String>,
}

impl OAuthClient {
    pub fn new(provider: Provider, config: ProviderConfig, http: reqwest::Client) -> Self {
        Self {
            provider,
            config,
            http,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Builds the provider authorize URL carrying `state`.
    pub fn authorize_url(&self, state: &str) -> String {
        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.scopes),
            urlencoding::encode(state),
        );
        if self.provider == Provider::Google {
            url.push_str("&prompt=select_account");
        }
        url
    }

    /// Exchanges the callback `code` for an access token.
    #[tracing::instrument(skip_all, fields(provider = %self.provider))]
    pub async fn exchange_code(&self, code: &str) -> Result<String, ServiceError> {
        let response = self
            .http
            .post(&self.config.token_url)
            // GitHub answers with form-encoding unless JSON is asked for.
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("code", code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", &self.config.redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to contact provider token endpoint");
                ServiceError::AuthenticationFailed
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(error = %error_text, "Provider rejected the code exchange");
            return Err(ServiceError::AuthenticationFailed);
        }

        let tokens = response.json::<TokenResponse>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse provider token response");
            ServiceError::AuthenticationFailed
        })?;

        Ok(tokens.access_token)
    }

    /// Fetches and normalizes the userinfo document for `access_token`.
    #[tracing::instrument(skip_all, fields(provider = %self.provider))]
    pub async fn fetch_user(&self, access_token: &str) -> Result<ProviderUser, ServiceError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            // GitHub refuses requests without a User-Agent.
            .header(reqwest::header::USER_AGENT, "identity-service")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to contact provider userinfo endpoint");
                ServiceError::AuthenticationFailed
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Provider refused the userinfo request");
            return Err(ServiceError::AuthenticationFailed);
        }

        let info = response.json::<UserInfoResponse>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse provider userinfo response");
            ServiceError::AuthenticationFailed
        })?;

        normalize_user(info)
    }
}

fn normalize_user(info: UserInfoResponse) -> Result<ProviderUser, ServiceError> {
    let id = match &info.id {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => {
            tracing::warn!("Provider userinfo carried no usable account id");
            return Err(ServiceError::AuthenticationFailed);
        }
    };

    // A login without an email cannot be mapped to an identity here; GitHub
    // accounts with a private email address fall into this bucket.
    let email = match info.email.filter(|e| !e.is_empty()) {
        Some(email) => email,
        None => {
            tracing::warn!("Provider userinfo carried no email address");
            return Err(ServiceError::AuthenticationFailed);
        }
    };

    let display_name = info
        .name
        .filter(|n| !n.is_empty())
        .or(info.login)
        .unwrap_or_else(|| email.clone());

    Ok(ProviderUser {
        id,
        email,
        display_name,
    })
}

/// Encodes a validated redirect target for the round-trip through the
/// provider's `state` parameter.
pub fn encode_state(target: &str) -> String {
    URL_SAFE_NO_PAD.encode(target.as_bytes())
}

/// Decodes the `state` parameter back into the redirect target.
pub fn decode_state(raw: &str) -> Result<String, ServiceError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|_| ServiceError::BadRedirectUrl("state parameter is not valid".to_string()))?;
    String::from_utf8(bytes)
        .map_err(|_| ServiceError::BadRedirectUrl("state parameter is not valid".to_string()))
}
