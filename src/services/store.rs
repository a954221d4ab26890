use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReplaceOptions, ReturnDocument};

use crate::db::MongoDb;
use crate::models::{Identity, LoginCode, Profile, Role, Sponsor};
use crate::services::error::ServiceError;

/// Persistence port for identities, profiles, the sponsor directory and
/// one-time login codes.
///
/// The live implementation is [`MongoIdentityStore`]; [`MemoryIdentityStore`]
/// backs the integration tests and local runs without a database.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_identity(&self, user_id: &str) -> Result<Option<Identity>, ServiceError>;

    /// Writes the full identity record, creating it when absent.
    async fn upsert_identity(&self, identity: &Identity) -> Result<(), ServiceError>;

    /// Adds `role` to the user's grant set. Returns the updated record, or
    /// `None` when no identity exists for `user_id`.
    async fn add_role(&self, user_id: &str, role: Role)
        -> Result<Option<Identity>, ServiceError>;

    /// Removes `role` from the user's grant set. Returns the updated record,
    /// or `None` when no identity exists for `user_id`.
    async fn remove_role(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<Option<Identity>, ServiceError>;

    async fn list_users_with_role(&self, role: Role) -> Result<Vec<String>, ServiceError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, ServiceError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ServiceError>;

    async fn get_sponsor(&self, email: &str) -> Result<Option<Sponsor>, ServiceError>;

    /// Replaces any live code for the email; at most one code per sponsor.
    async fn upsert_login_code(&self, code: &LoginCode) -> Result<(), ServiceError>;

    async fn get_login_code(&self, email: &str) -> Result<Option<LoginCode>, ServiceError>;

    async fn delete_login_code(&self, email: &str) -> Result<(), ServiceError>;

    /// Liveness of the backing store, surfaced by the health endpoint.
    async fn health_check(&self) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct MongoIdentityStore {
    db: MongoDb,
}

impl MongoIdentityStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for MongoIdentityStore {
    async fn get_identity(&self, user_id: &str) -> Result<Option<Identity>, ServiceError> {
        let identity = self
            .db
            .identities()
            .find_one(doc! { "user_id": user_id }, None)
            .await?;
        Ok(identity)
    }

    async fn upsert_identity(&self, identity: &Identity) -> Result<(), ServiceError> {
        self.db
            .identities()
            .replace_one(
                doc! { "user_id": &identity.user_id },
                identity,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn add_role(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<Option<Identity>, ServiceError> {
        let updated = self
            .db
            .identities()
            .find_one_and_update(
                doc! { "user_id": user_id },
                doc! { "$addToSet": { "roles": role.as_str() } },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;
        Ok(updated)
    }

    async fn remove_role(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<Option<Identity>, ServiceError> {
        let updated = self
            .db
            .identities()
            .find_one_and_update(
                doc! { "user_id": user_id },
                doc! { "$pull": { "roles": role.as_str() } },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;
        Ok(updated)
    }

    async fn list_users_with_role(&self, role: Role) -> Result<Vec<String>, ServiceError> {
        let mut cursor = self
            .db
            .identities()
            .find(doc! { "roles": role.as_str() }, None)
            .await?;

        let mut user_ids = Vec::new();
        while let Some(identity) = cursor.try_next().await? {
            user_ids.push(identity.user_id);
        }
        Ok(user_ids)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, ServiceError> {
        let profile = self
            .db
            .profiles()
            .find_one(doc! { "user_id": user_id }, None)
            .await?;
        Ok(profile)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ServiceError> {
        self.db
            .profiles()
            .replace_one(
                doc! { "user_id": &profile.user_id },
                profile,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn get_sponsor(&self, email: &str) -> Result<Option<Sponsor>, ServiceError> {
        let sponsor = self
            .db
            .sponsors()
            .find_one(doc! { "email": email }, None)
            .await?;
        Ok(sponsor)
    }

    async fn upsert_login_code(&self, code: &LoginCode) -> Result<(), ServiceError> {
        self.db
            .login_codes()
            .replace_one(
                doc! { "email": &code.email },
                code,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn get_login_code(&self, email: &str) -> Result<Option<LoginCode>, ServiceError> {
        let code = self
            .db
            .login_codes()
            .find_one(doc! { "email": email }, None)
            .await?;
        Ok(code)
    }

    async fn delete_login_code(&self, email: &str) -> Result<(), ServiceError> {
        self.db
            .login_codes()
            .delete_one(doc! { "email": email }, None)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.db.health_check().await
    }
}

/// In-memory store for tests and database-less local runs.
///
/// Reads and writes can be made to fail on demand so callers' degraded paths
/// can be exercised.
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: Mutex<HashMap<String, Identity>>,
    profiles: Mutex<HashMap<String, Profile>>,
    sponsors: Mutex<HashMap<String, Sponsor>>,
    login_codes: Mutex<HashMap<String, LoginCode>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_sponsor(&self, sponsor: Sponsor) {
        self.sponsors
            .lock()
            .unwrap()
            .insert(sponsor.email.clone(), sponsor);
    }

    pub fn seed_identity(&self, identity: Identity) {
        self.identities
            .lock()
            .unwrap()
            .insert(identity.user_id.clone(), identity);
    }

    pub fn seed_profile(&self, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile);
    }

    pub fn stored_identity(&self, user_id: &str) -> Option<Identity> {
        self.identities.lock().unwrap().get(user_id).cloned()
    }

    pub fn stored_login_code(&self, email: &str) -> Option<LoginCode> {
        self.login_codes.lock().unwrap().get(email).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), ServiceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "injected read failure"
            )));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), ServiceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "injected write failure"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn get_identity(&self, user_id: &str) -> Result<Option<Identity>, ServiceError> {
        self.check_read()?;
        Ok(self.identities.lock().unwrap().get(user_id).cloned())
    }

    async fn upsert_identity(&self, identity: &Identity) -> Result<(), ServiceError> {
        self.check_write()?;
        self.identities
            .lock()
            .unwrap()
            .insert(identity.user_id.clone(), identity.clone());
        Ok(())
    }

    async fn add_role(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<Option<Identity>, ServiceError> {
        self.check_write()?;
        let mut identities = self.identities.lock().unwrap();
        Ok(identities.get_mut(user_id).map(|identity| {
            identity.roles.insert(role);
            identity.clone()
        }))
    }

    async fn remove_role(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<Option<Identity>, ServiceError> {
        self.check_write()?;
        let mut identities = self.identities.lock().unwrap();
        Ok(identities.get_mut(user_id).map(|identity| {
            identity.roles.remove(&role);
            identity.clone()
        }))
    }

    async fn list_users_with_role(&self, role: Role) -> Result<Vec<String>, ServiceError> {
        self.check_read()?;
        let mut user_ids: Vec<String> = self
            .identities
            .lock()
            .unwrap()
            .values()
            .filter(|identity| identity.roles.contains(&role))
            .map(|identity| identity.user_id.clone())
            .collect();
        user_ids.sort();
        Ok(user_ids)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, ServiceError> {
        self.check_read()?;
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ServiceError> {
        self.check_write()?;
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_sponsor(&self, email: &str) -> Result<Option<Sponsor>, ServiceError> {
        self.check_read()?;
        Ok(self.sponsors.lock().unwrap().get(email).cloned())
    }

    async fn upsert_login_code(&self, code: &LoginCode) -> Result<(), ServiceError> {
        self.check_write()?;
        self.login_codes
            .lock()
            .unwrap()
            .insert(code.email.clone(), code.clone());
        Ok(())
    }

    async fn get_login_code(&self, email: &str) -> Result<Option<LoginCode>, ServiceError> {
        self.check_read()?;
        Ok(self.login_codes.lock().unwrap().get(email).cloned())
    }

    async fn delete_login_code(&self, email: &str) -> Result<(), ServiceError> {
        self.check_write()?;
        self.login_codes.lock().unwrap().remove(email);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.check_read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;
    use std::collections::BTreeSet;

    fn identity(user_id: &str, roles: &[Role]) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            provider: Provider::Github,
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[tokio::test]
    async fn test_add_role_to_unknown_user_returns_none() {
        let store = MemoryIdentityStore::new();
        let updated = store.add_role("ghost", Role::Staff).await.unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_list_users_with_role_filters_by_grant() {
        let store = MemoryIdentityStore::new();
        store.seed_identity(identity("a", &[Role::User]));
        store.seed_identity(identity("b", &[Role::User, Role::Attendee]));
        store.seed_identity(identity("c", &[Role::User, Role::Attendee, Role::Staff]));

        let attendees = store.list_users_with_role(Role::Attendee).await.unwrap();
        assert_eq!(attendees, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_injected_read_failure_surfaces_as_error() {
        let store = MemoryIdentityStore::new();
        store.set_fail_reads(true);
        assert!(store.get_identity("anyone").await.is_err());
    }
}
