//! Sponsor directory entry.

use serde::{Deserialize, Serialize};

/// A sponsor contact eligible for one-time-code login.
///
/// Seeded by the sponsor management service with an already-qualified
/// `user_id`; this service treats the collection as read-only and uses it to
/// decide whether an email may receive a login code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsor {
    pub user_id: String,
    pub email: String,
}
