use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-level mute of one account by another.
///
/// Expired mutes are treated as absent for every decision at query time;
/// a sweeper removes them eventually but nothing depends on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMute {
    pub id: Id,
    pub account_id: Id,
    pub target_account_id: Id,
    /// Also suppress notifications from the muted account.
    pub notifications: bool,
    pub created_at: DateTime<Utc>,
    /// None means the mute never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserMute {
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => at <= now,
            None => false,
        }
    }
}

/// A mute of an entire thread. Thread mutes suppress notifications only,
/// never timeline visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMute {
    pub id: Id,
    pub account_id: Id,
    pub thread_id: Id,
    pub created_at: DateTime<Utc>,
}
