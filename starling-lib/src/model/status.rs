use super::{Account, Emoji, Id, MediaAttachment, Tag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may see a status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible to nobody. Used for soft-withdrawn statuses.
    None,
    #[default]
    Public,
    /// Public reach, but culled from public timelines unless federated.
    Unlocked,
    FollowersOnly,
    MutualsOnly,
    Direct,
}

/// A mention of one account inside a status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: Id,
    pub target_account_id: Id,
    pub target_account_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: Id,
    pub options: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Set by the update path for the edit where the poll transitions
    /// from open to closed; voters are notified exactly once on that edge.
    pub closing: bool,
}

/// One side of an interaction policy: values that are always permitted,
/// and values that require the author's manual approval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyRules {
    pub always: Vec<PolicyValue>,
    pub with_approval: Vec<PolicyValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyValue {
    Public,
    Followers,
    Following,
    Mutuals,
    Mentioned,
    Author,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionPolicy {
    pub can_favourite: PolicyRules,
    pub can_reply: PolicyRules,
    pub can_boost: PolicyRules,
}

/// A status (post), authored locally or received from a remote instance.
///
/// Relations are scalar IDs; use `Store::populate_status` when sub-objects
/// are needed. If `boost_of_id` is set this status is a boost and must not
/// widen the boosted status's visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: Id,
    /// ActivityPub URI, globally unique.
    pub uri: String,
    pub account_id: Id,
    /// HTML content.
    pub content: String,
    pub content_warning: String,
    pub language: Option<String>,
    pub visibility: Visibility,
    /// Empty when this status is not a reply. A non-empty URI with a
    /// `None` id means the parent has not been dereferenced yet.
    pub in_reply_to_uri: String,
    pub in_reply_to_id: Option<Id>,
    pub in_reply_to_account_id: Option<Id>,
    pub boost_of_id: Option<Id>,
    pub boost_of_account_id: Option<Id>,
    /// Every status belongs to exactly one thread.
    pub thread_id: Id,
    pub mentions: Vec<Mention>,
    pub tag_ids: Vec<Id>,
    pub attachment_ids: Vec<Id>,
    pub emoji_ids: Vec<Id>,
    pub poll: Option<Poll>,
    pub interaction_policy: Option<InteractionPolicy>,
    /// Authored on this instance.
    pub local: bool,
    /// Eligible for federated (public) timelines.
    pub federated: bool,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Status {
    pub fn is_boost(&self) -> bool {
        self.boost_of_id.is_some()
    }

    pub fn is_reply(&self) -> bool {
        !self.in_reply_to_uri.is_empty()
    }

    /// True if `account_id` is mentioned in this status
    pub fn mentions_account(&self, account_id: Id) -> bool {
        self.mentions.iter().any(|m| m.target_account_id == account_id)
    }

    /// A minimal local public status
    pub fn new_local(account_id: Id, uri: &str, content: &str) -> Status {
        let id = Id::gen();
        Status {
            id,
            uri: uri.to_owned(),
            account_id,
            content: content.to_owned(),
            content_warning: String::new(),
            language: None,
            visibility: Visibility::Public,
            in_reply_to_uri: String::new(),
            in_reply_to_id: None,
            in_reply_to_account_id: None,
            boost_of_id: None,
            boost_of_account_id: None,
            thread_id: id,
            mentions: Vec::new(),
            tag_ids: Vec::new(),
            attachment_ids: Vec::new(),
            emoji_ids: Vec::new(),
            poll: None,
            interaction_policy: None,
            local: true,
            federated: true,
            pinned: false,
            created_at: Utc::now(),
            edited_at: None,
            fetched_at: None,
        }
    }
}

/// A status with its sub-objects loaded.
#[derive(Debug, Clone)]
pub struct PopulatedStatus {
    pub status: Status,
    pub author: Account,
    /// The boosted status and its author, when this status is a boost.
    pub boost_of: Option<Box<PopulatedStatus>>,
    pub mentioned: Vec<Account>,
    pub attachments: Vec<MediaAttachment>,
    pub emojis: Vec<Emoji>,
    pub tags: Vec<Tag>,
}

impl PopulatedStatus {
    /// The status whose content is actually displayed: the boost target
    /// for boosts, the status itself otherwise.
    pub fn unwrap_boost(&self) -> &PopulatedStatus {
        match &self.boost_of {
            Some(b) => b,
            None => self,
        }
    }
}
