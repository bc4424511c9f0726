//! The surfacer: on create, edit, and delete of a status, decides which
//! timeline caches receive it, which streams fire, and which
//! notifications are generated.
//!
//! Fan-out is best-effort: a store or conversion failure for one viewer
//! is logged and skipped, never fatal to the rest. The store stays
//! authoritative; every cache here is reconstructible.

use crate::error::Error;
use crate::filter::VisContext;
use crate::globals::GLOBALS;
use crate::model::{
    Account, ApiStatus, Follow, Id, List, NotificationKind, PopulatedStatus, RepliesPolicy,
    Status, Visibility,
};
use crate::store::Page;
use crate::stream::{stream_list, stream_tag, STREAM_HOME, STREAM_LOCAL, STREAM_PUBLIC};
use crate::timeline::TimelineEntry;
use chrono::Utc;
use std::collections::HashSet;

const USER_PAGE: usize = 100;

fn entry_for(status: &Status) -> TimelineEntry {
    TimelineEntry {
        status_id: status.id,
        account_id: status.account_id,
        boost_of_status_id: status.boost_of_id,
        boost_of_account_id: status.boost_of_account_id,
    }
}

pub struct Surfacer {}

impl Default for Surfacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Surfacer {
    pub(crate) fn new() -> Surfacer {
        Surfacer {}
    }

    /// Run a status through the per-viewer filter stack for one context.
    /// `None` means the viewer does not get to see it there.
    async fn prepare_status_for_timeline(
        &self,
        viewer: &Account,
        populated: &PopulatedStatus,
        ctx: VisContext,
    ) -> Result<Option<ApiStatus>, Error> {
        let status = &populated.status;

        if !crate::filter::status_visible(Some(viewer), status, ctx).await? {
            return Ok(None);
        }

        let details = GLOBALS
            .mute_filter
            .status_mute_details(Some(viewer), status)
            .await?;
        if details.muted(Utc::now()) {
            return Ok(None);
        }

        let (filtered, hide) = GLOBALS
            .status_filters
            .apply(Some(viewer), status, ctx)
            .await?;
        if hide {
            return Ok(None);
        }

        Ok(Some(ApiStatus::from_populated(populated, filtered)))
    }

    /// Surface a newly authored or received status everywhere it belongs.
    pub async fn timeline_and_notify_status(&self, status: &Status) -> Result<(), Error> {
        let store = GLOBALS.store();
        let populated = store.populate_status(status).await?;
        GLOBALS
            .statuses_surfaced
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        self.surface_public(&populated).await;
        let home_processed = self.surface_followers(&populated).await;
        self.surface_tag_followers(&populated, home_processed).await;
        self.notify_mentions(&populated).await;
        self.surface_conversations(&populated).await;

        Ok(())
    }

    /// Steps onto the public and local timelines, streaming per viewer.
    /// The cache inserts happen exactly once, before the first stream
    /// emit for the same status.
    async fn surface_public(&self, populated: &PopulatedStatus) {
        let store = GLOBALS.store();
        let status = &populated.status;
        let streams = GLOBALS.streams();

        let mut inserted_public = false;
        let mut inserted_local = false;

        // Enumerate local users in pages rather than materialising them.
        let mut max: Option<Id> = None;
        loop {
            let page = Page {
                max,
                limit: USER_PAGE,
                ..Default::default()
            };
            let users = match store.get_all_users(page).await {
                Ok(users) => users,
                Err(e) => {
                    tracing::error!("surfacing: user enumeration failed: {e}");
                    break;
                }
            };
            let Some(last) = users.last() else {
                break;
            };
            max = Some(last.id);
            let done = users.len() < USER_PAGE;

            for user in &users {
                let viewer = match store.get_account_by_id(user.account_id).await {
                    Ok(a) => a,
                    Err(e) => {
                        tracing::error!("surfacing: viewer account load failed: {e}");
                        continue;
                    }
                };

                let api = match self
                    .prepare_status_for_timeline(&viewer, populated, VisContext::Public)
                    .await
                {
                    Ok(Some(api)) => api,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::error!("surfacing: prepare failed for {}: {e}", viewer.id);
                        continue;
                    }
                };

                if status.local {
                    if !inserted_local {
                        GLOBALS.timelines.local().insert_one(entry_for(status));
                        inserted_local = true;
                    }
                    streams.update(&viewer, &api, STREAM_LOCAL).await;
                }

                if !inserted_public {
                    GLOBALS.timelines.public().insert_one(entry_for(status));
                    inserted_public = true;
                }
                streams.update(&viewer, &api, STREAM_PUBLIC).await;
            }

            if done {
                break;
            }
        }
    }

    /// Home and list fan-out to local followers of the author, plus the
    /// author themselves. Returns the set of accounts already handled so
    /// the tag pass can skip them.
    async fn surface_followers(&self, populated: &PopulatedStatus) -> HashSet<Id> {
        let store = GLOBALS.store();
        let status = &populated.status;
        let mut home_processed: HashSet<Id> = HashSet::new();

        let mut follows = match store.get_account_local_followers(status.account_id).await {
            Ok(follows) => follows,
            Err(e) => {
                tracing::error!("surfacing: follower enumeration failed: {e}");
                Vec::new()
            }
        };

        // The author follows their own home timeline, implicitly.
        if populated.author.is_local() {
            follows.push(Follow {
                id: Id::nil(),
                account_id: status.account_id,
                target_account_id: status.account_id,
                uri: String::new(),
                show_reblogs: true,
                notify: false,
                created_at: status.created_at,
                expires_at: None,
            });
        }

        for follow in follows {
            if let Err(e) = self
                .surface_one_follower(populated, &follow, &mut home_processed)
                .await
            {
                tracing::error!(
                    "surfacing: follower {} failed: {e}",
                    follow.account_id
                );
            }
        }

        home_processed
    }

    async fn surface_one_follower(
        &self,
        populated: &PopulatedStatus,
        follow: &Follow,
        home_processed: &mut HashSet<Id>,
    ) -> Result<(), Error> {
        let store = GLOBALS.store();
        let status = &populated.status;
        let streams = GLOBALS.streams();

        if status.is_boost() && !follow.show_reblogs {
            home_processed.insert(follow.account_id);
            return Ok(());
        }

        let viewer = store.get_account_by_id(follow.account_id).await?;

        let api = match self
            .prepare_status_for_timeline(&viewer, populated, VisContext::Home)
            .await?
        {
            Some(api) => api,
            None => {
                home_processed.insert(viewer.id);
                return Ok(());
            }
        };

        // List timelines first; an exclusive list keeps the status off
        // the home timeline.
        let mut any_exclusive = false;
        if follow.id != Id::nil() {
            let lists = store.get_lists_containing_follow_id(follow.id).await?;
            for list in lists {
                if !self.list_eligible(&list, status).await? {
                    continue;
                }
                let repeat = GLOBALS.timelines.list(list.id).insert_one(entry_for(status));
                if !repeat {
                    streams.update(&viewer, &api, &stream_list(list.id)).await;
                }
                any_exclusive = any_exclusive || list.exclusive;
            }
        }

        if !any_exclusive {
            let repeat = GLOBALS
                .timelines
                .home(viewer.id)
                .insert_one(entry_for(status));
            if !repeat {
                streams.update(&viewer, &api, STREAM_HOME).await;
            }
        }
        home_processed.insert(viewer.id);

        // follow.notify fires only for plain originals.
        if follow.notify && !status.is_boost() && !status.is_reply() {
            GLOBALS
                .notifier
                .notify(
                    NotificationKind::Status,
                    viewer.id,
                    status.account_id,
                    Some(status.id),
                    None,
                )
                .await?;
        }

        Ok(())
    }

    async fn list_eligible(&self, list: &List, status: &Status) -> Result<bool, Error> {
        if !status.is_reply() {
            return Ok(true);
        }
        // Parent not dereferenced yet: nothing to check against, skip.
        let Some(parent_author) = status.in_reply_to_account_id else {
            return Ok(false);
        };
        if parent_author == status.account_id {
            // Self-replies thread through wherever the original went.
            return Ok(true);
        }
        let store = GLOBALS.store();
        match list.replies_policy {
            RepliesPolicy::None => Ok(false),
            RepliesPolicy::List => store.is_account_in_list(list.id, parent_author).await,
            RepliesPolicy::Followed => store.is_following(list.account_id, parent_author).await,
        }
    }

    /// Hashtag fan-out: the unwrapped, public status reaches the home
    /// timelines of tag followers that nothing above already served, and
    /// the tag timelines themselves.
    async fn surface_tag_followers(
        &self,
        populated: &PopulatedStatus,
        home_processed: HashSet<Id>,
    ) {
        let store = GLOBALS.store();
        let streams = GLOBALS.streams();
        let target = populated.unwrap_boost();

        if target.status.visibility != Visibility::Public {
            return;
        }

        let useable: Vec<&crate::model::Tag> =
            target.tags.iter().filter(|t| t.useable).collect();
        if useable.is_empty() {
            return;
        }

        for tag in &useable {
            GLOBALS
                .timelines
                .tag(tag.id)
                .insert_one(entry_for(&target.status));
        }

        let tag_ids: Vec<Id> = useable.iter().map(|t| t.id).collect();
        let follower_ids = match store.get_account_ids_following_tag_ids(&tag_ids).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!("surfacing: tag follower lookup failed: {e}");
                return;
            }
        };

        for account_id in follower_ids {
            if home_processed.contains(&account_id) {
                continue;
            }
            let viewer = match store.get_account_by_id(account_id).await {
                Ok(a) => a,
                Err(e) => {
                    tracing::error!("surfacing: tag follower load failed: {e}");
                    continue;
                }
            };
            if !viewer.is_local() {
                continue;
            }

            let api = match self
                .prepare_status_for_timeline(&viewer, target, VisContext::Home)
                .await
            {
                Ok(Some(api)) => api,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("surfacing: tag prepare failed for {account_id}: {e}");
                    continue;
                }
            };

            let repeat = GLOBALS
                .timelines
                .home(viewer.id)
                .insert_one(entry_for(&target.status));
            if !repeat {
                streams.update(&viewer, &api, STREAM_HOME).await;
                for tag in &useable {
                    streams.update(&viewer, &api, &stream_tag(&tag.name)).await;
                }
            }
        }
    }

    async fn notify_mentions(&self, populated: &PopulatedStatus) {
        let status = &populated.status;
        for account in &populated.mentioned {
            if !account.is_local() || account.id == status.account_id {
                continue;
            }
            if let Err(e) = GLOBALS
                .notifier
                .notify(
                    NotificationKind::Mention,
                    account.id,
                    status.account_id,
                    Some(status.id),
                    None,
                )
                .await
            {
                tracing::error!("surfacing: mention notification failed: {e}");
            }
        }
    }

    async fn surface_conversations(&self, populated: &PopulatedStatus) {
        let events = match GLOBALS.conversations.update_for_status(populated).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("surfacing: conversation update failed: {e}");
                return;
            }
        };
        let streams = GLOBALS.streams();
        for (account, conversation) in events {
            streams.conversation(account.id, &conversation).await;
        }
    }

    /// Surface an edit. Mirrors the create fan-out on the stream side but
    /// leaves the timeline caches alone; a separate sweep invalidates
    /// per-status state downstream.
    pub async fn timeline_and_notify_status_update(
        &self,
        status: &Status,
        edit_id: Option<Id>,
    ) -> Result<(), Error> {
        let store = GLOBALS.store();
        let populated = store.populate_status(status).await?;
        let streams = GLOBALS.streams();

        // Public and local statusUpdate events.
        let mut max: Option<Id> = None;
        loop {
            let page = Page {
                max,
                limit: USER_PAGE,
                ..Default::default()
            };
            let users = match store.get_all_users(page).await {
                Ok(users) => users,
                Err(e) => {
                    tracing::error!("edit surfacing: user enumeration failed: {e}");
                    break;
                }
            };
            let Some(last) = users.last() else {
                break;
            };
            max = Some(last.id);
            let done = users.len() < USER_PAGE;

            for user in &users {
                let Ok(viewer) = store.get_account_by_id(user.account_id).await else {
                    continue;
                };
                match self
                    .prepare_status_for_timeline(&viewer, &populated, VisContext::Public)
                    .await
                {
                    Ok(Some(api)) => {
                        if status.local {
                            streams.status_update(&viewer, &api, STREAM_LOCAL).await;
                        }
                        streams.status_update(&viewer, &api, STREAM_PUBLIC).await;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!("edit surfacing: prepare failed: {e}");
                    }
                }
            }

            if done {
                break;
            }
        }

        // Home and list statusUpdate events for followers.
        if let Ok(follows) = store.get_account_local_followers(status.account_id).await {
            for follow in follows {
                if status.is_boost() && !follow.show_reblogs {
                    continue;
                }
                let Ok(viewer) = store.get_account_by_id(follow.account_id).await else {
                    continue;
                };
                match self
                    .prepare_status_for_timeline(&viewer, &populated, VisContext::Home)
                    .await
                {
                    Ok(Some(api)) => {
                        streams.status_update(&viewer, &api, STREAM_HOME).await;
                        if let Ok(lists) = store.get_lists_containing_follow_id(follow.id).await
                        {
                            for list in lists {
                                if self.list_eligible(&list, status).await.unwrap_or(false) {
                                    streams
                                        .status_update(&viewer, &api, &stream_list(list.id))
                                        .await;
                                }
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!("edit surfacing: prepare failed: {e}");
                    }
                }
            }
        }

        // One update notification per account that interacted locally.
        match store.get_status_interactions(status.id, true).await {
            Ok(interactions) => {
                let mut notified: HashSet<Id> = HashSet::new();
                for interaction in interactions {
                    if interaction.account_id == status.account_id
                        || !notified.insert(interaction.account_id)
                    {
                        continue;
                    }
                    if let Err(e) = GLOBALS
                        .notifier
                        .notify(
                            NotificationKind::Update,
                            interaction.account_id,
                            status.account_id,
                            Some(status.id),
                            edit_id,
                        )
                        .await
                    {
                        tracing::error!("edit surfacing: update notification failed: {e}");
                    }
                }
            }
            Err(e) => {
                tracing::error!("edit surfacing: interaction lookup failed: {e}");
            }
        }

        // Poll close edge: notify the voters exactly once.
        if let Some(poll) = &status.poll {
            if poll.closing {
                match store.get_poll_voters(poll.id).await {
                    Ok(voters) => {
                        for voter in voters {
                            if let Err(e) = GLOBALS
                                .notifier
                                .notify(
                                    NotificationKind::PollClosed,
                                    voter,
                                    status.account_id,
                                    Some(status.id),
                                    None,
                                )
                                .await
                            {
                                tracing::error!("edit surfacing: poll notification failed: {e}");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("edit surfacing: poll voter lookup failed: {e}");
                    }
                }
            }
        }

        Ok(())
    }

    /// Remove a deleted status from all five cache classes and stream
    /// the deletion once. Callers run this before the store delete
    /// returns, so no cache entry outlives its status.
    pub async fn delete_status_from_timelines(&self, status_id: Id) {
        GLOBALS.timelines.remove_status_everywhere(status_id);
        GLOBALS.streams().delete(status_id).await;
    }
}
