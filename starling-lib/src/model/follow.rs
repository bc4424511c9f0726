use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A follow edge from `account_id` to `target_account_id`.
///
/// A follow and a follow request never coexist for the same pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: Id,
    pub account_id: Id,
    pub target_account_id: Id,
    pub uri: String,
    /// Show boosts by the target on the follower's home timeline.
    pub show_reblogs: bool,
    /// Notify the follower on every new status by the target.
    pub notify: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Follow {
    pub fn new(account_id: Id, target_account_id: Id, uri: &str) -> Follow {
        Follow {
            id: Id::gen(),
            account_id,
            target_account_id,
            uri: uri.to_owned(),
            show_reblogs: true,
            notify: false,
            created_at: Utc::now(),
            expires_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRequest {
    pub id: Id,
    pub account_id: Id,
    pub target_account_id: Id,
    pub uri: String,
    pub show_reblogs: bool,
    pub notify: bool,
    pub created_at: DateTime<Utc>,
}
