use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which replies are shown in a list timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepliesPolicy {
    /// Replies to anyone the list owner follows.
    #[default]
    Followed,
    /// Replies to other members of the same list.
    List,
    /// No replies at all.
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: Id,
    pub account_id: Id,
    pub title: String,
    pub replies_policy: RepliesPolicy,
    /// Statuses consumed by an exclusive list stay off the home timeline.
    pub exclusive: bool,
    pub created_at: DateTime<Utc>,
}

/// Membership of one follow in one list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEntry {
    pub id: Id,
    pub list_id: Id,
    pub follow_id: Id,
    pub created_at: DateTime<Utc>,
}
