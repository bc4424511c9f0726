use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A block of `target_account_id` by `account_id`. Directional; most
/// visibility decisions check both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: Id,
    pub account_id: Id,
    pub target_account_id: Id,
    pub uri: String,
    pub created_at: DateTime<Utc>,
}
