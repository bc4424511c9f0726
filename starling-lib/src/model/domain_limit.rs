use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaPolicy {
    #[default]
    NoAction,
    MarkSensitive,
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowsPolicy {
    #[default]
    NoAction,
    ManualApproval,
    RejectNonMutual,
    RejectAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusesPolicy {
    #[default]
    NoAction,
    FilterWarn,
    FilterHide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountsPolicy {
    #[default]
    NoAction,
    Mute,
}

/// Moderation limits applied to a remote domain and its subdomains.
///
/// The matcher returns `Option<DomainLimit>`; an absent limit means
/// no-action on every policy axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainLimit {
    pub id: Id,
    /// Punycode, lowercased. Matches the domain itself and any subdomain.
    pub domain: String,
    pub media_policy: MediaPolicy,
    pub follows_policy: FollowsPolicy,
    pub statuses_policy: StatusesPolicy,
    pub accounts_policy: AccountsPolicy,
    pub content_warning: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DomainLimit {
    pub fn new(domain: &str) -> DomainLimit {
        DomainLimit {
            id: Id::gen(),
            domain: domain.to_owned(),
            media_policy: MediaPolicy::default(),
            follows_policy: FollowsPolicy::default(),
            statuses_policy: StatusesPolicy::default(),
            accounts_policy: AccountsPolicy::default(),
            content_warning: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
