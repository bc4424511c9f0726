use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account, local or remote.
///
/// `(username, domain)` is unique; an empty domain means the account is
/// local to this instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Id,
    pub username: String,
    /// Punycode domain. Empty for local accounts.
    pub domain: String,
    /// ActivityPub URI, globally unique.
    pub uri: String,
    pub display_name: String,
    pub note: String,
    /// Avatar media attachment, if any (may be uncached).
    pub avatar_attachment_id: Option<Id>,
    /// Header media attachment, if any (may be uncached).
    pub header_attachment_id: Option<Id>,
    pub suspended_at: Option<DateTime<Utc>>,
    /// The account deleted itself; requests on its behalf are unauthorised.
    pub deleted_self: bool,
    /// Present on local accounts only.
    pub settings: Option<AccountSettings>,
    pub created_at: DateTime<Utc>,
    /// When this remote account was last dereferenced.
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSettings {
    /// ISO 639-1 language code for authored statuses.
    pub language: String,
    /// Whether the account's public statuses are exposed as an RSS feed.
    pub rss_enabled: bool,
}

impl Account {
    pub fn is_local(&self) -> bool {
        self.domain.is_empty()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }

    /// `@username` for local accounts, `@username@domain` for remote ones
    pub fn full_handle(&self) -> String {
        if self.is_local() {
            format!("@{}", self.username)
        } else {
            format!("@{}@{}", self.username, self.domain)
        }
    }

    /// A minimal local account with fresh ID and timestamps
    pub fn new_local(username: &str, uri: &str) -> Account {
        Account {
            id: Id::gen(),
            username: username.to_owned(),
            domain: String::new(),
            uri: uri.to_owned(),
            display_name: String::new(),
            note: String::new(),
            avatar_attachment_id: None,
            header_attachment_id: None,
            suspended_at: None,
            deleted_self: false,
            settings: Some(AccountSettings::default()),
            created_at: Utc::now(),
            fetched_at: None,
        }
    }

    /// A minimal remote account shell, to be filled by dereference
    pub fn new_remote(username: &str, domain: &str, uri: &str) -> Account {
        Account {
            id: Id::gen(),
            username: username.to_owned(),
            domain: domain.to_owned(),
            uri: uri.to_owned(),
            display_name: String::new(),
            note: String::new(),
            avatar_attachment_id: None,
            header_attachment_id: None,
            suspended_at: None,
            deleted_self: false,
            settings: None,
            created_at: Utc::now(),
            fetched_at: Some(Utc::now()),
        }
    }
}
