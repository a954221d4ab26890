use std::sync::Arc;

use crate::config::StaffConfig;
use crate::models::{Identity, Profile, Provider};
use crate::services::error::ServiceError;
use crate::services::roles;
use crate::services::store::IdentityStore;
use crate::services::token::TokenPayload;

/// Outcome of reconciling a login against the identity store.
///
/// `persisted` is false when the store could not be read or written and the
/// session therefore runs on roles that were never saved. Callers decide
/// whether that matters; the login itself still succeeds.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub payload: TokenPayload,
    pub persisted: bool,
}

/// Reconciles provider logins into stable internal identities and rebuilds
/// token payloads from stored state.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    staff: StaffConfig,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>, staff: StaffConfig) -> Self {
        Self { store, staff }
    }

    /// Turns a fresh provider login into a token payload.
    ///
    /// Stored roles are merged with the roles the login itself grants and
    /// the union is written back. Store failures never fail the login:
    /// a failed read drops the stored contribution and skips the write, a
    /// failed write keeps the session on unsaved roles. Either way the
    /// outcome is reported through `Resolution::persisted`.
    #[tracing::instrument(skip(self, raw_id, email), fields(provider = %provider))]
    pub async fn resolve_from_profile(
        &self,
        provider: Provider,
        raw_id: &str,
        email: &str,
        treat_id_as_unqualified: bool,
    ) -> Resolution {
        let user_id = if treat_id_as_unqualified {
            // Provider-local ids collide across providers; prefixing keeps
            // github account 42 and google account 42 distinct forever.
            format!("{}{}", provider.as_str(), raw_id)
        } else {
            raw_id.to_string()
        };

        let fresh = roles::initial_roles(provider, email, &self.staff);

        let (merged, read_ok) = match self.store.get_identity(&user_id).await {
            Ok(Some(existing)) => (roles::merge(&existing.roles, &fresh), true),
            Ok(None) => (fresh, true),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id = %user_id,
                    "Identity read failed; continuing with freshly derived roles only"
                );
                (fresh, false)
            }
        };

        let mut persisted = false;
        if read_ok {
            let identity = Identity::new(user_id.clone(), provider, merged.clone());
            match self.store.upsert_identity(&identity).await {
                Ok(()) => persisted = true,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        user_id = %user_id,
                        "Identity write failed; session roles were not saved"
                    );
                }
            }
        }

        let payload = TokenPayload {
            id: user_id,
            email: email.to_string(),
            provider,
            roles: merged.into_iter().collect(),
            exp: None,
        };

        Resolution { payload, persisted }
    }

    /// Rebuilds a token payload for an already-known user from stored state
    /// alone. Both the identity and the profile must exist.
    pub async fn resolve_from_store(&self, user_id: &str) -> Result<TokenPayload, ServiceError> {
        let identity = self
            .store
            .get_identity(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        let profile = self
            .store
            .get_profile(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        Ok(TokenPayload {
            id: identity.user_id,
            email: profile.email,
            provider: identity.provider,
            roles: identity.roles.into_iter().collect(),
            exp: None,
        })
    }

    /// Writes the profile document through for a successful OAuth login.
    /// Independent of the identity upsert; failures here do propagate.
    pub async fn record_profile(
        &self,
        user_id: &str,
        email: &str,
        display_name: &str,
    ) -> Result<(), ServiceError> {
        let profile = Profile::new(
            user_id.to_string(),
            email.to_string(),
            display_name.to_string(),
        );
        self.store.upsert_profile(&profile).await
    }
}
