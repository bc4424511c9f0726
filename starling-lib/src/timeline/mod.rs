//! The five timeline cache classes: public and local singles, plus
//! per-tenant maps for home (by viewer), list (by list), and tag (by
//! tag). Tenant caches are created lazily and expire when idle.
//!
//! These are caches over the store, nothing more: an entry may be
//! evicted at any time, and the deleter removes entries before the store
//! delete returns so no entry outlives its status.

mod cache;
pub use cache::{StatusTimeline, TimelineEntry};

use crate::globals::GLOBALS;
use crate::model::Id;
use crate::settings::Settings;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

pub struct Timelines {
    public: StatusTimeline,
    local: StatusTimeline,
    home: Cache<Id, Arc<StatusTimeline>>,
    list: Cache<Id, Arc<StatusTimeline>>,
    tag: Cache<Id, Arc<StatusTimeline>>,
}

impl Default for Timelines {
    fn default() -> Self {
        Self::new()
    }
}

impl Timelines {
    pub(crate) fn new() -> Timelines {
        // Constructed during GLOBALS init; sizes come from the defaults
        // and tenant caches pick up live settings on creation.
        let defaults = Settings::default();
        Timelines {
            public: StatusTimeline::new(defaults.timeline_capacity, defaults.boost_dedup_window),
            local: StatusTimeline::new(defaults.timeline_capacity, defaults.boost_dedup_window),
            home: Cache::builder()
                .time_to_idle(Duration::from_secs(defaults.home_timeline_ttl_secs))
                .build(),
            list: Cache::builder()
                .time_to_idle(Duration::from_secs(defaults.list_timeline_ttl_secs))
                .build(),
            tag: Cache::builder()
                .time_to_idle(Duration::from_secs(defaults.tag_timeline_ttl_secs))
                .build(),
        }
    }

    fn fresh_timeline() -> Arc<StatusTimeline> {
        let settings = GLOBALS.settings.read();
        Arc::new(StatusTimeline::new(
            settings.timeline_capacity,
            settings.boost_dedup_window,
        ))
    }

    pub fn public(&self) -> &StatusTimeline {
        &self.public
    }

    pub fn local(&self) -> &StatusTimeline {
        &self.local
    }

    /// The home timeline for one viewer, created empty if absent.
    pub fn home(&self, account_id: Id) -> Arc<StatusTimeline> {
        self.home
            .get_with(account_id, Self::fresh_timeline)
    }

    pub fn list(&self, list_id: Id) -> Arc<StatusTimeline> {
        self.list.get_with(list_id, Self::fresh_timeline)
    }

    pub fn tag(&self, tag_id: Id) -> Arc<StatusTimeline> {
        self.tag.get_with(tag_id, Self::fresh_timeline)
    }

    /// Remove a status from every cache of every class.
    pub fn remove_status_everywhere(&self, status_id: Id) {
        let ids = [status_id];
        self.public.remove_by_status_ids(&ids);
        self.local.remove_by_status_ids(&ids);
        for (_, timeline) in self.home.iter() {
            timeline.remove_by_status_ids(&ids);
        }
        for (_, timeline) in self.list.iter() {
            timeline.remove_by_status_ids(&ids);
        }
        for (_, timeline) in self.tag.iter() {
            timeline.remove_by_status_ids(&ids);
        }
    }

    /// Remove everything authored by or boosting these accounts, from
    /// every cache. Used on suspension and account deletion.
    pub fn remove_accounts_everywhere(&self, account_ids: &[Id]) {
        self.public.remove_by_account_ids(account_ids);
        self.local.remove_by_account_ids(account_ids);
        for (_, timeline) in self.home.iter() {
            timeline.remove_by_account_ids(account_ids);
        }
        for (_, timeline) in self.list.iter() {
            timeline.remove_by_account_ids(account_ids);
        }
        for (_, timeline) in self.tag.iter() {
            timeline.remove_by_account_ids(account_ids);
        }
    }
}
