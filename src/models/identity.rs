//! Identity record - the durable provider + role grants for one user.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{Provider, Role};

/// One document per user, keyed by the provider-qualified `user_id`.
///
/// Created on first successful login, merged with freshly derived roles on
/// every subsequent login, mutated by administrative role grants. Never
/// deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub provider: Provider,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
}

impl Identity {
    pub fn new(user_id: String, provider: Provider, roles: BTreeSet<Role>) -> Self {
        Self {
            user_id,
            provider,
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
