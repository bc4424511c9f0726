use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local login credentials and preferences attached to a local account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub account_id: Id,
    pub email: Option<String>,
    pub locale: String,
    pub created_at: DateTime<Utc>,
}
