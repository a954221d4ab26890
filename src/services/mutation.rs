use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::Role;
use crate::services::error::ServiceError;
use crate::services::store::IdentityStore;

/// Administrative role grants and revocations, plus the reverse lookup.
///
/// Mutations are single atomic store operations and idempotent: granting a
/// held role or revoking an absent one leaves the set unchanged. Both always
/// answer with the resulting set.
#[derive(Clone)]
pub struct RoleMutationService {
    store: Arc<dyn IdentityStore>,
}

impl RoleMutationService {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn get_roles(&self, user_id: &str) -> Result<BTreeSet<Role>, ServiceError> {
        let identity = self
            .store
            .get_identity(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        Ok(identity.roles)
    }

    pub async fn add_role(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<BTreeSet<Role>, ServiceError> {
        let updated = self
            .store
            .add_role(user_id, role)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        tracing::info!(user_id = %user_id, role = %role, "Role granted");
        Ok(updated.roles)
    }

    pub async fn remove_role(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<BTreeSet<Role>, ServiceError> {
        let updated = self
            .store
            .remove_role(user_id, role)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        tracing::info!(user_id = %user_id, role = %role, "Role revoked");
        Ok(updated.roles)
    }

    pub async fn list_users_with_role(&self, role: Role) -> Result<Vec<String>, ServiceError> {
        self.store.list_users_with_role(role).await
    }
}
