use serde::{Deserialize, Serialize};

/// One-time `state` value issued by `/oauth/authorize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    pub state: String,
    pub created_at: i64,
}

impl OAuthState {
    pub fn is_expired(&self, now: i64, ttl_secs: i64) -> bool {
        now - self.created_at > ttl_secs
    }
}
