//! Profile record - display data owned by the user-profile collaborator.

use serde::{Deserialize, Serialize};

/// One document per user. This service only writes it through on successful
/// OAuth logins and joins it when reconstructing a payload from storage; all
/// other reads and writes belong to the profile service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
}

impl Profile {
    pub fn new(user_id: String, email: String, display_name: String) -> Self {
        Self {
            user_id,
            email,
            display_name,
        }
    }
}
