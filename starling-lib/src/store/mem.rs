//! In-process reference implementation of the store facade, used by the
//! daemon scaffold and the test suite. Concurrency model matches the
//! facade contract: every method is atomic with respect to the unique
//! keys it touches.

use super::{Page, Store};
use crate::error::{Error, ErrorKind};
use crate::model::{
    Account, Block, Conversation, DomainLimit, Emoji, Favourite, Follow, FollowRequest, Id,
    InteractionKind, InteractionRequest, List, ListEntry, MediaAttachment, Notification,
    NotificationKind, PopulatedStatus, Status, StatusInteraction, Tag, ThreadMute, User, UserMute,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};

type NotificationKey = (NotificationKind, Id, Id, Option<Id>, Option<Id>);

#[derive(Default)]
pub struct MemStore {
    accounts: DashMap<Id, Account>,
    account_handles: DashMap<(String, String), Id>,

    users: DashMap<Id, User>,
    users_by_account: DashMap<Id, Id>,

    statuses: DashMap<Id, Status>,
    status_uris: DashMap<String, Id>,

    favourites: DashMap<Id, Favourite>,

    follows: DashMap<Id, Follow>,
    follow_pairs: DashMap<(Id, Id), Id>,
    follow_requests: DashMap<(Id, Id), FollowRequest>,

    blocks: DashMap<Id, Block>,
    block_pairs: DashSet<(Id, Id)>,

    lists: DashMap<Id, List>,
    list_entries: DashMap<Id, ListEntry>,

    tags: DashMap<Id, Tag>,
    tag_names: DashMap<String, Id>,
    tag_follows: DashSet<(Id, Id)>,

    mutes: DashMap<Id, UserMute>,
    mute_pairs: DashMap<(Id, Id), Id>,
    thread_mutes: DashMap<(Id, Id), ThreadMute>,

    domain_limits: DashMap<Id, DomainLimit>,
    domain_limit_domains: DashMap<String, Id>,

    emojis: DashMap<Id, Emoji>,
    emoji_keys: DashMap<(String, String), Id>,

    attachments: DashMap<Id, MediaAttachment>,

    notifications: DashMap<Id, Notification>,
    notification_keys: DashMap<NotificationKey, Id>,

    conversations: DashMap<(Id, Id), Conversation>,

    poll_votes: DashMap<Id, Vec<Id>>,

    interaction_requests: DashMap<Id, InteractionRequest>,
}

impl MemStore {
    pub fn new() -> MemStore {
        Default::default()
    }

    /// Order a set of IDs per the paging contract: filter by bounds, sort
    /// descending, truncate to limit.
    fn page_ids(mut ids: Vec<Id>, page: Page) -> Vec<Id> {
        if let Some(min) = page.min {
            ids.retain(|id| *id > min);
        }
        if let Some(max) = page.max {
            ids.retain(|id| *id < max);
        }
        ids.sort_unstable_by(|a, b| b.cmp(a));
        if page.limit > 0 {
            ids.truncate(page.limit);
        }
        // Always ID-descending; ascending callers reverse at the boundary.
        ids
    }

    fn populate_shallow(&self, status: &Status) -> Result<PopulatedStatus, Error> {
        let author = self
            .accounts
            .get(&status.account_id)
            .map(|a| a.clone())
            .ok_or(ErrorKind::NotFound)?;

        let mut mentioned = Vec::with_capacity(status.mentions.len());
        for mention in &status.mentions {
            if let Some(account) = self.accounts.get(&mention.target_account_id) {
                mentioned.push(account.clone());
            }
        }

        let mut attachments = Vec::with_capacity(status.attachment_ids.len());
        for id in &status.attachment_ids {
            if let Some(a) = self.attachments.get(id) {
                attachments.push(a.clone());
            }
        }

        let mut emojis = Vec::with_capacity(status.emoji_ids.len());
        for id in &status.emoji_ids {
            if let Some(e) = self.emojis.get(id) {
                emojis.push(e.clone());
            }
        }

        let mut tags = Vec::with_capacity(status.tag_ids.len());
        for id in &status.tag_ids {
            if let Some(t) = self.tags.get(id) {
                tags.push(t.clone());
            }
        }

        Ok(PopulatedStatus {
            status: status.clone(),
            author,
            boost_of: None,
            mentioned,
            attachments,
            emojis,
            tags,
        })
    }
}

#[async_trait]
impl Store for MemStore {
    async fn get_account_by_id(&self, id: Id) -> Result<Account, Error> {
        self.accounts
            .get(&id)
            .map(|a| a.clone())
            .ok_or_else(|| ErrorKind::NotFound.into())
    }

    async fn get_account_by_username_domain(
        &self,
        username: &str,
        domain: &str,
    ) -> Result<Account, Error> {
        let key = (username.to_owned(), domain.to_owned());
        let id = *self.account_handles.get(&key).ok_or(ErrorKind::NotFound)?;
        self.get_account_by_id(id).await
    }

    async fn put_account(&self, account: &Account) -> Result<(), Error> {
        let key = (account.username.clone(), account.domain.clone());
        match self.account_handles.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(account.id);
                self.accounts.insert(account.id, account.clone());
                Ok(())
            }
        }
    }

    async fn update_account(&self, account: &Account) -> Result<(), Error> {
        if !self.accounts.contains_key(&account.id) {
            return Err(ErrorKind::NotFound.into());
        }
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_accounts_by_ids(&self, ids: &[Id]) -> Result<Vec<Account>, Error> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(a) = self.accounts.get(id) {
                out.push(a.clone());
            }
        }
        Ok(out)
    }

    async fn put_user(&self, user: &User) -> Result<(), Error> {
        match self.users_by_account.entry(user.account_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(())
            }
        }
    }

    async fn get_user_by_account_id(&self, account_id: Id) -> Result<User, Error> {
        let id = *self
            .users_by_account
            .get(&account_id)
            .ok_or(ErrorKind::NotFound)?;
        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or_else(|| ErrorKind::NotFound.into())
    }

    async fn get_all_users(&self, page: Page) -> Result<Vec<User>, Error> {
        let ids: Vec<Id> = self.users.iter().map(|u| *u.key()).collect();
        let ids = Self::page_ids(ids, page);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(u) = self.users.get(&id) {
                out.push(u.clone());
            }
        }
        Ok(out)
    }

    async fn get_status_by_id(&self, id: Id) -> Result<Status, Error> {
        self.statuses
            .get(&id)
            .map(|s| s.clone())
            .ok_or_else(|| ErrorKind::NotFound.into())
    }

    async fn get_status_by_uri(&self, uri: &str) -> Result<Status, Error> {
        let id = *self.status_uris.get(uri).ok_or(ErrorKind::NotFound)?;
        self.get_status_by_id(id).await
    }

    async fn put_status(&self, status: &Status) -> Result<(), Error> {
        match self.status_uris.entry(status.uri.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(status.id);
                self.statuses.insert(status.id, status.clone());
                Ok(())
            }
        }
    }

    async fn update_status(&self, status: &Status) -> Result<(), Error> {
        if !self.statuses.contains_key(&status.id) {
            return Err(ErrorKind::NotFound.into());
        }
        self.statuses.insert(status.id, status.clone());
        Ok(())
    }

    async fn delete_status(&self, id: Id) -> Result<(), Error> {
        if let Some((_, status)) = self.statuses.remove(&id) {
            self.status_uris.remove(&status.uri);
        }
        Ok(())
    }

    async fn populate_status(&self, status: &Status) -> Result<PopulatedStatus, Error> {
        let mut populated = self.populate_shallow(status)?;
        if let Some(boost_of_id) = status.boost_of_id {
            let target = self
                .statuses
                .get(&boost_of_id)
                .map(|s| s.clone())
                .ok_or(ErrorKind::NotFound)?;
            // A boost target is never itself a boost; one level suffices.
            populated.boost_of = Some(Box::new(self.populate_shallow(&target)?));
        }
        Ok(populated)
    }

    async fn get_account_statuses(&self, account_id: Id, page: Page) -> Result<Vec<Status>, Error> {
        let ids: Vec<Id> = self
            .statuses
            .iter()
            .filter(|s| s.account_id == account_id)
            .map(|s| *s.key())
            .collect();
        let ids = Self::page_ids(ids, page);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(s) = self.statuses.get(&id) {
                out.push(s.clone());
            }
        }
        Ok(out)
    }

    async fn get_status_interactions(
        &self,
        status_id: Id,
        local_only: bool,
    ) -> Result<Vec<StatusInteraction>, Error> {
        let mut out = Vec::new();

        for s in self.statuses.iter() {
            let kind = if s.in_reply_to_id == Some(status_id) {
                InteractionKind::Reply
            } else if s.boost_of_id == Some(status_id) {
                InteractionKind::Boost
            } else {
                continue;
            };
            out.push(StatusInteraction {
                account_id: s.account_id,
                kind,
                status_id: Some(s.id),
            });
        }

        for f in self.favourites.iter() {
            if f.status_id == status_id {
                out.push(StatusInteraction {
                    account_id: f.account_id,
                    kind: InteractionKind::Favourite,
                    status_id: None,
                });
            }
        }

        if local_only {
            let mut filtered = Vec::with_capacity(out.len());
            for interaction in out {
                if let Some(a) = self.accounts.get(&interaction.account_id) {
                    if a.is_local() {
                        filtered.push(interaction);
                    }
                }
            }
            return Ok(filtered);
        }

        Ok(out)
    }

    async fn get_boost_by_account(
        &self,
        account_id: Id,
        status_id: Id,
    ) -> Result<Option<Status>, Error> {
        Ok(self
            .statuses
            .iter()
            .find(|s| s.account_id == account_id && s.boost_of_id == Some(status_id))
            .map(|s| s.clone()))
    }

    async fn put_favourite(&self, favourite: &Favourite) -> Result<(), Error> {
        self.favourites.insert(favourite.id, favourite.clone());
        Ok(())
    }

    async fn delete_favourite(&self, id: Id) -> Result<(), Error> {
        self.favourites.remove(&id);
        Ok(())
    }

    async fn get_follow(
        &self,
        account_id: Id,
        target_account_id: Id,
    ) -> Result<Option<Follow>, Error> {
        match self.follow_pairs.get(&(account_id, target_account_id)) {
            Some(id) => Ok(self.follows.get(&id).map(|f| f.clone())),
            None => Ok(None),
        }
    }

    async fn put_follow(&self, follow: &Follow) -> Result<(), Error> {
        let pair = (follow.account_id, follow.target_account_id);
        if self.follow_requests.contains_key(&pair) {
            return Err(ErrorKind::AlreadyExists.into());
        }
        match self.follow_pairs.entry(pair) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(follow.id);
                self.follows.insert(follow.id, follow.clone());
                Ok(())
            }
        }
    }

    async fn delete_follow(&self, id: Id) -> Result<(), Error> {
        if let Some((_, follow)) = self.follows.remove(&id) {
            self.follow_pairs
                .remove(&(follow.account_id, follow.target_account_id));
        }
        Ok(())
    }

    async fn is_following(&self, account_id: Id, target_account_id: Id) -> Result<bool, Error> {
        Ok(self
            .follow_pairs
            .contains_key(&(account_id, target_account_id)))
    }

    async fn is_mutuals(&self, account_id: Id, target_account_id: Id) -> Result<bool, Error> {
        Ok(self.follow_pairs.contains_key(&(account_id, target_account_id))
            && self.follow_pairs.contains_key(&(target_account_id, account_id)))
    }

    async fn get_account_local_followers(&self, account_id: Id) -> Result<Vec<Follow>, Error> {
        let mut out = Vec::new();
        for f in self.follows.iter() {
            if f.target_account_id != account_id {
                continue;
            }
            if let Some(a) = self.accounts.get(&f.account_id) {
                if a.is_local() {
                    out.push(f.clone());
                }
            }
        }
        Ok(out)
    }

    async fn get_follow_request(
        &self,
        account_id: Id,
        target_account_id: Id,
    ) -> Result<Option<FollowRequest>, Error> {
        Ok(self
            .follow_requests
            .get(&(account_id, target_account_id))
            .map(|r| r.clone()))
    }

    async fn put_follow_request(&self, request: &FollowRequest) -> Result<(), Error> {
        let pair = (request.account_id, request.target_account_id);
        if self.follow_pairs.contains_key(&pair) {
            return Err(ErrorKind::AlreadyExists.into());
        }
        match self.follow_requests.entry(pair) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(request.clone());
                Ok(())
            }
        }
    }

    async fn accept_follow_request(
        &self,
        account_id: Id,
        target_account_id: Id,
    ) -> Result<Follow, Error> {
        let pair = (account_id, target_account_id);
        let (_, request) = self
            .follow_requests
            .remove(&pair)
            .ok_or(ErrorKind::NotFound)?;
        let follow = Follow {
            id: Id::gen(),
            account_id: request.account_id,
            target_account_id: request.target_account_id,
            uri: request.uri,
            show_reblogs: request.show_reblogs,
            notify: request.notify,
            created_at: Utc::now(),
            expires_at: None,
        };
        self.follow_pairs.insert(pair, follow.id);
        self.follows.insert(follow.id, follow.clone());
        Ok(follow)
    }

    async fn put_block(&self, block: &Block) -> Result<(), Error> {
        let pair = (block.account_id, block.target_account_id);
        if !self.block_pairs.insert(pair) {
            return Err(ErrorKind::AlreadyExists.into());
        }
        self.blocks.insert(block.id, block.clone());
        Ok(())
    }

    async fn is_blocked(&self, account_id: Id, target_account_id: Id) -> Result<bool, Error> {
        Ok(self
            .block_pairs
            .contains(&(account_id, target_account_id)))
    }

    async fn is_either_blocked(&self, a: Id, b: Id) -> Result<bool, Error> {
        Ok(self.block_pairs.contains(&(a, b)) || self.block_pairs.contains(&(b, a)))
    }

    async fn put_list(&self, list: &List) -> Result<(), Error> {
        self.lists.insert(list.id, list.clone());
        Ok(())
    }

    async fn get_list_by_id(&self, id: Id) -> Result<List, Error> {
        self.lists
            .get(&id)
            .map(|l| l.clone())
            .ok_or_else(|| ErrorKind::NotFound.into())
    }

    async fn put_list_entry(&self, entry: &ListEntry) -> Result<(), Error> {
        self.list_entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn get_lists_containing_follow_id(&self, follow_id: Id) -> Result<Vec<List>, Error> {
        let mut out = Vec::new();
        for entry in self.list_entries.iter() {
            if entry.follow_id != follow_id {
                continue;
            }
            if let Some(list) = self.lists.get(&entry.list_id) {
                out.push(list.clone());
            }
        }
        Ok(out)
    }

    async fn is_account_in_list(&self, list_id: Id, account_id: Id) -> Result<bool, Error> {
        for entry in self.list_entries.iter() {
            if entry.list_id != list_id {
                continue;
            }
            if let Some(follow) = self.follows.get(&entry.follow_id) {
                if follow.target_account_id == account_id {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn put_tag(&self, tag: &Tag) -> Result<(), Error> {
        match self.tag_names.entry(tag.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(tag.id);
                self.tags.insert(tag.id, tag.clone());
                Ok(())
            }
        }
    }

    async fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>, Error> {
        match self.tag_names.get(&name.to_lowercase()) {
            Some(id) => Ok(self.tags.get(&id).map(|t| t.clone())),
            None => Ok(None),
        }
    }

    async fn get_tags_by_ids(&self, ids: &[Id]) -> Result<Vec<Tag>, Error> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(t) = self.tags.get(id) {
                out.push(t.clone());
            }
        }
        Ok(out)
    }

    async fn follow_tag(&self, account_id: Id, tag_id: Id) -> Result<(), Error> {
        self.tag_follows.insert((account_id, tag_id));
        Ok(())
    }

    async fn get_account_ids_following_tag_ids(&self, tag_ids: &[Id]) -> Result<Vec<Id>, Error> {
        let mut out: Vec<Id> = Vec::new();
        for pair in self.tag_follows.iter() {
            let (account_id, tag_id) = *pair;
            if tag_ids.contains(&tag_id) && !out.contains(&account_id) {
                out.push(account_id);
            }
        }
        Ok(out)
    }

    async fn get_mute(
        &self,
        account_id: Id,
        target_account_id: Id,
    ) -> Result<Option<UserMute>, Error> {
        match self.mute_pairs.get(&(account_id, target_account_id)) {
            Some(id) => Ok(self.mutes.get(&id).map(|m| m.clone())),
            None => Ok(None),
        }
    }

    async fn put_mute(&self, mute: &UserMute) -> Result<(), Error> {
        let pair = (mute.account_id, mute.target_account_id);
        self.mute_pairs.insert(pair, mute.id);
        self.mutes.insert(mute.id, mute.clone());
        Ok(())
    }

    async fn delete_mute(&self, id: Id) -> Result<(), Error> {
        if let Some((_, mute)) = self.mutes.remove(&id) {
            self.mute_pairs
                .remove(&(mute.account_id, mute.target_account_id));
        }
        Ok(())
    }

    async fn get_thread_muted_by_account(
        &self,
        thread_id: Id,
        account_id: Id,
    ) -> Result<Option<ThreadMute>, Error> {
        Ok(self
            .thread_mutes
            .get(&(account_id, thread_id))
            .map(|m| m.clone()))
    }

    async fn put_thread_mute(&self, mute: &ThreadMute) -> Result<(), Error> {
        self.thread_mutes
            .insert((mute.account_id, mute.thread_id), mute.clone());
        Ok(())
    }

    async fn put_domain_limit(&self, limit: &DomainLimit) -> Result<(), Error> {
        match self.domain_limit_domains.entry(limit.domain.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(limit.id);
                self.domain_limits.insert(limit.id, limit.clone());
                Ok(())
            }
        }
    }

    async fn update_domain_limit(&self, limit: &DomainLimit) -> Result<(), Error> {
        if !self.domain_limits.contains_key(&limit.id) {
            return Err(ErrorKind::NotFound.into());
        }
        self.domain_limits.insert(limit.id, limit.clone());
        Ok(())
    }

    async fn delete_domain_limit(&self, id: Id) -> Result<(), Error> {
        if let Some((_, limit)) = self.domain_limits.remove(&id) {
            self.domain_limit_domains.remove(&limit.domain);
        }
        Ok(())
    }

    async fn get_domain_limits(&self, page: Page) -> Result<Vec<DomainLimit>, Error> {
        let ids: Vec<Id> = self.domain_limits.iter().map(|l| *l.key()).collect();
        let ids = Self::page_ids(ids, page);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(l) = self.domain_limits.get(&id) {
                out.push(l.clone());
            }
        }
        Ok(out)
    }

    async fn get_domain_limit_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<DomainLimit>, Error> {
        match self.domain_limit_domains.get(domain) {
            Some(id) => Ok(self.domain_limits.get(&id).map(|l| l.clone())),
            None => Ok(None),
        }
    }

    async fn get_emoji_by_id(&self, id: Id) -> Result<Emoji, Error> {
        self.emojis
            .get(&id)
            .map(|e| e.clone())
            .ok_or_else(|| ErrorKind::NotFound.into())
    }

    async fn get_emoji_by_shortcode_domain(
        &self,
        shortcode: &str,
        domain: &str,
    ) -> Result<Option<Emoji>, Error> {
        let key = (shortcode.to_owned(), domain.to_owned());
        match self.emoji_keys.get(&key) {
            Some(id) => Ok(self.emojis.get(&id).map(|e| e.clone())),
            None => Ok(None),
        }
    }

    async fn put_emoji(&self, emoji: &Emoji) -> Result<(), Error> {
        let key = (emoji.shortcode.clone(), emoji.domain.clone());
        match self.emoji_keys.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(emoji.id);
                self.emojis.insert(emoji.id, emoji.clone());
                Ok(())
            }
        }
    }

    async fn update_emoji(&self, emoji: &Emoji) -> Result<(), Error> {
        if !self.emojis.contains_key(&emoji.id) {
            return Err(ErrorKind::NotFound.into());
        }
        self.emojis.insert(emoji.id, emoji.clone());
        Ok(())
    }

    async fn get_cached_emojis_older_than(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Emoji>, Error> {
        let mut out = Vec::new();
        for e in self.emojis.iter() {
            if e.is_local() || !e.cached {
                continue;
            }
            let touched = e.updated_at;
            if touched < cutoff {
                out.push(e.clone());
                if limit > 0 && out.len() == limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    async fn get_attachment(&self, id: Id) -> Result<MediaAttachment, Error> {
        self.attachments
            .get(&id)
            .map(|a| a.clone())
            .ok_or_else(|| ErrorKind::NotFound.into())
    }

    async fn put_attachment(&self, attachment: &MediaAttachment) -> Result<(), Error> {
        self.attachments.insert(attachment.id, attachment.clone());
        Ok(())
    }

    async fn update_attachment(&self, attachment: &MediaAttachment) -> Result<(), Error> {
        if !self.attachments.contains_key(&attachment.id) {
            return Err(ErrorKind::NotFound.into());
        }
        self.attachments.insert(attachment.id, attachment.clone());
        Ok(())
    }

    async fn get_cached_attachments_older_than(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MediaAttachment>, Error> {
        let mut out = Vec::new();
        for a in self.attachments.iter() {
            if !a.is_remote() || !a.cached {
                continue;
            }
            let touched = a.fetched_at.unwrap_or(a.created_at);
            if touched < cutoff {
                out.push(a.clone());
                if limit > 0 && out.len() == limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    async fn put_notification(&self, notification: &Notification) -> Result<(), Error> {
        // The entry guard makes check-and-insert atomic; twenty
        // concurrent writers of one tuple leave exactly one row.
        match self.notification_keys.entry(notification.dedup_key()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ErrorKind::AlreadyExists.into()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(notification.id);
                self.notifications
                    .insert(notification.id, notification.clone());
                Ok(())
            }
        }
    }

    async fn get_notification_by_key(
        &self,
        kind: NotificationKind,
        target_account_id: Id,
        origin_account_id: Id,
        status_id: Option<Id>,
        edit_id: Option<Id>,
    ) -> Result<Option<Notification>, Error> {
        let key = (kind, target_account_id, origin_account_id, status_id, edit_id);
        match self.notification_keys.get(&key) {
            Some(id) => Ok(self.notifications.get(&id).map(|n| n.clone())),
            None => Ok(None),
        }
    }

    async fn get_notifications_for_account(
        &self,
        account_id: Id,
    ) -> Result<Vec<Notification>, Error> {
        let mut out: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.target_account_id == account_id)
            .map(|n| n.clone())
            .collect();
        out.sort_unstable_by(|a, b| b.id.cmp(&a.id));
        Ok(out)
    }

    async fn delete_notifications_for_status(&self, status_id: Id) -> Result<(), Error> {
        let doomed: Vec<Id> = self
            .notifications
            .iter()
            .filter(|n| n.status_id == Some(status_id))
            .map(|n| *n.key())
            .collect();
        for id in doomed {
            if let Some((_, n)) = self.notifications.remove(&id) {
                self.notification_keys.remove(&n.dedup_key());
            }
        }
        Ok(())
    }

    async fn get_conversation(
        &self,
        account_id: Id,
        thread_id: Id,
    ) -> Result<Option<Conversation>, Error> {
        Ok(self
            .conversations
            .get(&(account_id, thread_id))
            .map(|c| c.clone()))
    }

    async fn put_conversation(&self, conversation: &Conversation) -> Result<(), Error> {
        self.conversations.insert(
            (conversation.account_id, conversation.thread_id),
            conversation.clone(),
        );
        Ok(())
    }

    async fn update_conversation(&self, conversation: &Conversation) -> Result<(), Error> {
        self.put_conversation(conversation).await
    }

    async fn put_poll_vote(&self, poll_id: Id, account_id: Id) -> Result<(), Error> {
        let mut voters = self.poll_votes.entry(poll_id).or_default();
        if !voters.contains(&account_id) {
            voters.push(account_id);
        }
        Ok(())
    }

    async fn get_poll_voters(&self, poll_id: Id) -> Result<Vec<Id>, Error> {
        Ok(self
            .poll_votes
            .get(&poll_id)
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    async fn put_interaction_request(&self, request: &InteractionRequest) -> Result<(), Error> {
        self.interaction_requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn get_interaction_request_by_id(&self, id: Id) -> Result<InteractionRequest, Error> {
        self.interaction_requests
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| ErrorKind::NotFound.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_account_handle_unique() {
        let store = MemStore::new();
        let a = Account::new_local("zork", "https://localhost/users/zork");
        store.put_account(&a).await.unwrap();

        let mut dup = Account::new_local("zork", "https://localhost/users/zork2");
        dup.id = Id::gen();
        let err = store.put_account(&dup).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_follow_and_request_never_coexist() {
        let store = MemStore::new();
        let a = Id::gen();
        let b = Id::gen();

        let request = FollowRequest {
            id: Id::gen(),
            account_id: a,
            target_account_id: b,
            uri: "https://example.org/fr/1".into(),
            show_reblogs: true,
            notify: false,
            created_at: Utc::now(),
        };
        store.put_follow_request(&request).await.unwrap();

        let follow = Follow::new(a, b, "https://example.org/f/1");
        assert!(store.put_follow(&follow).await.unwrap_err().is_already_exists());

        let follow = store.accept_follow_request(a, b).await.unwrap();
        assert!(store.is_following(a, b).await.unwrap());
        assert_eq!(follow.account_id, a);
        assert!(store.get_follow_request(a, b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_paging_is_descending_and_bounded() {
        let store = MemStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let account = Account::new_local(
                &format!("user{i}"),
                &format!("https://localhost/users/user{i}"),
            );
            store.put_account(&account).await.unwrap();
            let user = User {
                id: Id::gen(),
                account_id: account.id,
                email: None,
                locale: "en".into(),
                created_at: Utc::now(),
            };
            store.put_user(&user).await.unwrap();
            ids.push(user.id);
        }

        let users = store.get_all_users(Page::first(3)).await.unwrap();
        assert_eq!(users.len(), 3);
        assert!(users.windows(2).all(|w| w[0].id > w[1].id));

        let rest = store
            .get_all_users(Page::below(users[2].id, 10))
            .await
            .unwrap();
        assert_eq!(rest.len(), 2);
    }
}
