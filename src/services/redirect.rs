use crate::config::RedirectConfig;
use crate::services::error::ServiceError;

/// Decides where a login flow may send the browser once a token is minted.
///
/// Three target shapes are acceptable: the mobile deep-link scheme, `https`
/// URLs whose host matches the allow-list, and `http` URLs pointing at
/// localhost for development. Everything else is rejected before any
/// provider round-trip happens.
pub struct RedirectValidator {
    config: RedirectConfig,
    mobile_prefix: String,
}

impl RedirectValidator {
    pub fn new(config: RedirectConfig) -> Self {
        let mobile_prefix = format!("{}://", config.mobile_scheme);
        Self {
            config,
            mobile_prefix,
        }
    }

    /// True when the target opens in the mobile app rather than a browser.
    /// Sessions minted for such targets are issued without an expiry.
    pub fn is_mobile_target(&self, target: &str) -> bool {
        target.starts_with(&self.mobile_prefix)
    }

    /// Picks the post-login target: an explicit `redirect` parameter wins,
    /// otherwise the `device` label (default when absent) is mapped through
    /// the configured device table. The chosen target is always validated.
    pub fn resolve_target(
        &self,
        redirect: Option<&str>,
        device: Option<&str>,
    ) -> Result<String, ServiceError> {
        if let Some(target) = redirect.filter(|t| !t.is_empty()) {
            self.validate(target)?;
            return Ok(target.to_string());
        }

        let device = device
            .filter(|d| !d.is_empty())
            .unwrap_or(self.config.default_device.as_str());
        let target = self.config.devices.get(device).ok_or_else(|| {
            ServiceError::BadRedirectUrl(format!("no redirect target for device '{}'", device))
        })?;

        self.validate(target)?;
        Ok(target.clone())
    }

    pub fn validate(&self, target: &str) -> Result<(), ServiceError> {
        if self.is_mobile_target(target) {
            return Ok(());
        }

        let Some((scheme, rest)) = target.split_once("://") else {
            return Err(ServiceError::BadRedirectUrl(target.to_string()));
        };

        let host = host_of(rest);
        if host.is_empty() {
            return Err(ServiceError::BadRedirectUrl(target.to_string()));
        }

        let allowed = match scheme.to_ascii_lowercase().as_str() {
            "https" => self
                .config
                .allowed_hosts
                .iter()
                .any(|pattern| host_matches(&host, pattern)),
            // Plain http never leaves the developer's machine.
            "http" => host == "localhost" || host == "127.0.0.1",
            _ => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(ServiceError::BadRedirectUrl(target.to_string()))
        }
    }
}

/// Extracts the lowercased host from everything after `scheme://`.
fn host_of(rest: &str) -> String {
    // Browsers treat `\` as `/` in http(s) URLs, so it terminates the
    // authority here too; a host can never contain one.
    let authority = rest
        .split(['/', '\\', '?', '#'])
        .next()
        .unwrap_or("");
    // Userinfo is what the browser discards before resolving the host, so it
    // must be discarded here too before the allow-list comparison.
    let without_userinfo = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = without_userinfo.split(':').next().unwrap_or("");
    host.to_ascii_lowercase()
}

fn host_matches(host: &str, pattern: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    if let Some(suffix) = pattern.strip_prefix("*.") {
        host.strip_suffix(suffix)
            .map_or(false, |head| head.ends_with('.'))
    } else {
        host == pattern
    }
}
