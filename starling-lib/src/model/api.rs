//! Client-facing representations, produced during timeline preparation
//! and handed to the stream sink. The HTTP layer serialises these as-is.

use super::{Account, Id, Notification, PopulatedStatus, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAccount {
    pub id: Id,
    pub username: String,
    /// `user` for local accounts, `user@domain` for remote ones.
    pub acct: String,
    pub display_name: String,
}

impl ApiAccount {
    pub fn from_account(account: &Account) -> ApiAccount {
        let acct = if account.is_local() {
            account.username.clone()
        } else {
            format!("{}@{}", account.username, account.domain)
        };
        ApiAccount {
            id: account.id,
            username: account.username.clone(),
            acct,
            display_name: account.display_name.clone(),
        }
    }
}

/// The outcome of one keyword filter that matched with a `warn` action.
/// Hide actions never reach the client; the status is simply omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResult {
    pub title: String,
    pub keyword_matches: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    pub id: Id,
    pub uri: String,
    pub account: ApiAccount,
    pub content: String,
    pub spoiler_text: String,
    pub visibility: Visibility,
    pub language: Option<String>,
    pub in_reply_to_id: Option<Id>,
    pub reblog_id: Option<Id>,
    pub created_at: DateTime<Utc>,
    /// Warn-level filter matches, shown as a badge by clients.
    pub filtered: Vec<FilterResult>,
}

impl ApiStatus {
    pub fn from_populated(ps: &PopulatedStatus, filtered: Vec<FilterResult>) -> ApiStatus {
        ApiStatus {
            id: ps.status.id,
            uri: ps.status.uri.clone(),
            account: ApiAccount::from_account(&ps.author),
            content: ps.status.content.clone(),
            spoiler_text: ps.status.content_warning.clone(),
            visibility: ps.status.visibility,
            language: ps.status.language.clone(),
            in_reply_to_id: ps.status.in_reply_to_id,
            reblog_id: ps.status.boost_of_id,
            created_at: ps.status.created_at,
            filtered,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiNotification {
    pub id: Id,
    pub kind: super::NotificationKind,
    pub account: Option<ApiAccount>,
    pub status_id: Option<Id>,
    pub created_at: DateTime<Utc>,
}

impl ApiNotification {
    pub fn from_notification(notif: &Notification, origin: Option<&Account>) -> ApiNotification {
        ApiNotification {
            id: notif.id,
            kind: notif.kind,
            account: origin.map(ApiAccount::from_account),
            status_id: notif.status_id,
            created_at: notif.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConversation {
    pub id: Id,
    pub unread: bool,
    pub last_status_id: Id,
    pub accounts: Vec<ApiAccount>,
}
