use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    FollowRequest,
    Mention,
    Boost,
    Favourite,
    /// A followed account posted (follow.notify).
    Status,
    /// A status the account interacted with was edited.
    Update,
    PollClosed,
    Conversation,
}

/// A notification to a local account.
///
/// At most one notification exists per `(kind, target, origin, status,
/// edit)` tuple; the store enforces the unique key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Id,
    pub kind: NotificationKind,
    pub target_account_id: Id,
    pub origin_account_id: Id,
    pub status_id: Option<Id>,
    pub edit_id: Option<Id>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// The de-duplication key
    pub fn dedup_key(&self) -> (NotificationKind, Id, Id, Option<Id>, Option<Id>) {
        (
            self.kind,
            self.target_account_id,
            self.origin_account_id,
            self.status_id,
            self.edit_id,
        )
    }
}
