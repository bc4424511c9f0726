use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One account's view of a direct-message thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Id,
    pub account_id: Id,
    pub thread_id: Id,
    pub last_status_id: Id,
    pub unread: bool,
    pub created_at: DateTime<Utc>,
}
