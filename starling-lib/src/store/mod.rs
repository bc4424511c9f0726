//! The store facade. The relational database lives outside the core;
//! this trait is the named interface the core depends on. Every method
//! is a blocking call from the caller's point of view and respects task
//! cancellation at its await points.
//!
//! Model structs are scalar-only ("barebones"). Hydration is explicit:
//! `populate_status` loads sub-objects, and reply-chain walks fetch each
//! hop themselves. Nothing hydrates automatically, so fan-out paths never
//! pay for joins they don't need.

mod mem;
pub use mem::MemStore;

use crate::error::Error;
use crate::model::{
    Account, Block, Conversation, DomainLimit, Emoji, Favourite, Follow, FollowRequest, Id,
    InteractionRequest, List, ListEntry, MediaAttachment, Notification, NotificationKind,
    PopulatedStatus, Status, StatusInteraction, Tag, ThreadMute, User, UserMute,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Desc,
    Asc,
}

/// The paging contract: results are always returned ID-descending;
/// ascending callers reverse at the boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    /// Exclusive lower bound.
    pub min: Option<Id>,
    /// Exclusive upper bound.
    pub max: Option<Id>,
    pub limit: usize,
    pub order: Order,
}

impl Page {
    pub fn first(limit: usize) -> Page {
        Page {
            limit,
            ..Default::default()
        }
    }

    pub fn below(max: Id, limit: usize) -> Page {
        Page {
            max: Some(max),
            limit,
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // Accounts
    async fn get_account_by_id(&self, id: Id) -> Result<Account, Error>;
    async fn get_account_by_username_domain(
        &self,
        username: &str,
        domain: &str,
    ) -> Result<Account, Error>;
    async fn put_account(&self, account: &Account) -> Result<(), Error>;
    async fn update_account(&self, account: &Account) -> Result<(), Error>;
    async fn get_accounts_by_ids(&self, ids: &[Id]) -> Result<Vec<Account>, Error>;

    // Users (local credentials)
    async fn put_user(&self, user: &User) -> Result<(), Error>;
    async fn get_user_by_account_id(&self, account_id: Id) -> Result<User, Error>;
    /// Every local user, paged.
    async fn get_all_users(&self, page: Page) -> Result<Vec<User>, Error>;

    // Statuses
    async fn get_status_by_id(&self, id: Id) -> Result<Status, Error>;
    async fn get_status_by_uri(&self, uri: &str) -> Result<Status, Error>;
    async fn put_status(&self, status: &Status) -> Result<(), Error>;
    async fn update_status(&self, status: &Status) -> Result<(), Error>;
    /// The deleter must have removed the status from every timeline cache
    /// before this returns.
    async fn delete_status(&self, id: Id) -> Result<(), Error>;
    async fn populate_status(&self, status: &Status) -> Result<PopulatedStatus, Error>;
    /// Recent statuses authored by one account, ID-descending.
    async fn get_account_statuses(&self, account_id: Id, page: Page) -> Result<Vec<Status>, Error>;
    /// Accounts that replied to, favourited, or boosted a status.
    async fn get_status_interactions(
        &self,
        status_id: Id,
        local_only: bool,
    ) -> Result<Vec<StatusInteraction>, Error>;
    /// The boost of `status_id` authored by `account_id`, if any.
    async fn get_boost_by_account(
        &self,
        account_id: Id,
        status_id: Id,
    ) -> Result<Option<Status>, Error>;

    // Favourites
    async fn put_favourite(&self, favourite: &Favourite) -> Result<(), Error>;
    async fn delete_favourite(&self, id: Id) -> Result<(), Error>;

    // Follows
    async fn get_follow(&self, account_id: Id, target_account_id: Id)
        -> Result<Option<Follow>, Error>;
    async fn put_follow(&self, follow: &Follow) -> Result<(), Error>;
    async fn delete_follow(&self, id: Id) -> Result<(), Error>;
    async fn is_following(&self, account_id: Id, target_account_id: Id) -> Result<bool, Error>;
    async fn is_mutuals(&self, account_id: Id, target_account_id: Id) -> Result<bool, Error>;
    /// Follows targeting `account_id` whose source account is local.
    async fn get_account_local_followers(&self, account_id: Id) -> Result<Vec<Follow>, Error>;

    // Follow requests
    async fn get_follow_request(
        &self,
        account_id: Id,
        target_account_id: Id,
    ) -> Result<Option<FollowRequest>, Error>;
    async fn put_follow_request(&self, request: &FollowRequest) -> Result<(), Error>;
    /// Deletes the request and creates the follow; the pair invariant
    /// (never both at once) holds before and after.
    async fn accept_follow_request(
        &self,
        account_id: Id,
        target_account_id: Id,
    ) -> Result<Follow, Error>;

    // Blocks
    async fn put_block(&self, block: &Block) -> Result<(), Error>;
    /// Does `account_id` block `target_account_id`?
    async fn is_blocked(&self, account_id: Id, target_account_id: Id) -> Result<bool, Error>;
    /// Does a block exist in either direction?
    async fn is_either_blocked(&self, a: Id, b: Id) -> Result<bool, Error>;

    // Lists
    async fn put_list(&self, list: &List) -> Result<(), Error>;
    async fn get_list_by_id(&self, id: Id) -> Result<List, Error>;
    async fn put_list_entry(&self, entry: &ListEntry) -> Result<(), Error>;
    async fn get_lists_containing_follow_id(&self, follow_id: Id) -> Result<Vec<List>, Error>;
    /// Is `account_id` the target of any follow in this list?
    async fn is_account_in_list(&self, list_id: Id, account_id: Id) -> Result<bool, Error>;

    // Tags
    async fn put_tag(&self, tag: &Tag) -> Result<(), Error>;
    async fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>, Error>;
    async fn get_tags_by_ids(&self, ids: &[Id]) -> Result<Vec<Tag>, Error>;
    async fn follow_tag(&self, account_id: Id, tag_id: Id) -> Result<(), Error>;
    async fn get_account_ids_following_tag_ids(&self, tag_ids: &[Id]) -> Result<Vec<Id>, Error>;

    // Mutes
    async fn get_mute(
        &self,
        account_id: Id,
        target_account_id: Id,
    ) -> Result<Option<UserMute>, Error>;
    async fn put_mute(&self, mute: &UserMute) -> Result<(), Error>;
    async fn delete_mute(&self, id: Id) -> Result<(), Error>;
    async fn get_thread_muted_by_account(
        &self,
        thread_id: Id,
        account_id: Id,
    ) -> Result<Option<ThreadMute>, Error>;
    async fn put_thread_mute(&self, mute: &ThreadMute) -> Result<(), Error>;

    // Domain limits
    async fn put_domain_limit(&self, limit: &DomainLimit) -> Result<(), Error>;
    async fn update_domain_limit(&self, limit: &DomainLimit) -> Result<(), Error>;
    async fn delete_domain_limit(&self, id: Id) -> Result<(), Error>;
    async fn get_domain_limits(&self, page: Page) -> Result<Vec<DomainLimit>, Error>;
    /// Exact-domain lookup; suffix matching is the matcher's job.
    async fn get_domain_limit_by_domain(&self, domain: &str)
        -> Result<Option<DomainLimit>, Error>;

    // Emoji
    async fn get_emoji_by_id(&self, id: Id) -> Result<Emoji, Error>;
    async fn get_emoji_by_shortcode_domain(
        &self,
        shortcode: &str,
        domain: &str,
    ) -> Result<Option<Emoji>, Error>;
    async fn put_emoji(&self, emoji: &Emoji) -> Result<(), Error>;
    async fn update_emoji(&self, emoji: &Emoji) -> Result<(), Error>;
    /// Remote emoji still cached whose last fetch precedes the cutoff.
    async fn get_cached_emojis_older_than(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Emoji>, Error>;

    // Media attachments
    async fn get_attachment(&self, id: Id) -> Result<MediaAttachment, Error>;
    async fn put_attachment(&self, attachment: &MediaAttachment) -> Result<(), Error>;
    async fn update_attachment(&self, attachment: &MediaAttachment) -> Result<(), Error>;
    /// Remote attachments still cached whose last fetch precedes the cutoff.
    async fn get_cached_attachments_older_than(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MediaAttachment>, Error>;

    // Notifications
    /// Insert-if-absent on the `(kind, target, origin, status, edit)`
    /// unique key. Returns `AlreadyExists` when a duplicate is present.
    async fn put_notification(&self, notification: &Notification) -> Result<(), Error>;
    async fn get_notification_by_key(
        &self,
        kind: NotificationKind,
        target_account_id: Id,
        origin_account_id: Id,
        status_id: Option<Id>,
        edit_id: Option<Id>,
    ) -> Result<Option<Notification>, Error>;
    async fn get_notifications_for_account(&self, account_id: Id)
        -> Result<Vec<Notification>, Error>;
    async fn delete_notifications_for_status(&self, status_id: Id) -> Result<(), Error>;

    // Conversations
    async fn get_conversation(
        &self,
        account_id: Id,
        thread_id: Id,
    ) -> Result<Option<Conversation>, Error>;
    async fn put_conversation(&self, conversation: &Conversation) -> Result<(), Error>;
    async fn update_conversation(&self, conversation: &Conversation) -> Result<(), Error>;

    // Polls
    async fn put_poll_vote(&self, poll_id: Id, account_id: Id) -> Result<(), Error>;
    async fn get_poll_voters(&self, poll_id: Id) -> Result<Vec<Id>, Error>;

    // Interaction requests
    async fn put_interaction_request(&self, request: &InteractionRequest) -> Result<(), Error>;
    async fn get_interaction_request_by_id(&self, id: Id) -> Result<InteractionRequest, Error>;
}
