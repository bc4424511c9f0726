use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A favourite (like) of a status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favourite {
    pub id: Id,
    pub account_id: Id,
    pub status_id: Id,
    pub uri: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Reply,
    Favourite,
    Boost,
}

/// One recorded interaction with a status; used by the edit path to
/// notify everyone who engaged with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInteraction {
    pub account_id: Id,
    pub kind: InteractionKind,
    /// The reply or boost status, when the interaction created one.
    pub status_id: Option<Id>,
}

/// A pending interaction awaiting the status author's manual approval,
/// created when the policy resolver returns a with-approval verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRequest {
    pub id: Id,
    pub status_id: Id,
    pub origin_account_id: Id,
    pub target_account_id: Id,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}
