//! One-time login code for passwordless sponsor login.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// At most one live code per email; a new request replaces the previous code
/// wholesale. Consumed (deleted) on successful verification.
///
/// Expiry is logical: an expired code simply stops verifying and sits in the
/// collection until it is replaced or consumed. There is deliberately no TTL
/// index on this collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCode {
    pub email: String,
    pub code: String,
    pub expiry_epoch_seconds: i64,
}

impl LoginCode {
    pub fn new(email: String, code: String, ttl_seconds: i64) -> Self {
        Self {
            email,
            code,
            expiry_epoch_seconds: Utc::now().timestamp() + ttl_seconds,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expiry_epoch_seconds < Utc::now().timestamp()
    }
}
