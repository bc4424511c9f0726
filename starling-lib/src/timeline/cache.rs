//! One bounded timeline cache: entries ordered strictly ID-descending,
//! indexed for O(log n) removal by status and O(k) removal by account,
//! with a recent-window boost de-duplication check.

use crate::model::Id;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub status_id: Id,
    pub account_id: Id,
    pub boost_of_status_id: Option<Id>,
    pub boost_of_account_id: Option<Id>,
}

impl TimelineEntry {
    /// Does this entry reference `status_id`, as itself or as its boost
    /// target?
    fn references(&self, status_id: Id) -> bool {
        self.status_id == status_id || self.boost_of_status_id == Some(status_id)
    }
}

struct Inner {
    /// Keyed by status ID; reverse iteration gives ID-descending order.
    entries: BTreeMap<Id, TimelineEntry>,
    /// Author and boosted-author index into `entries`.
    by_account: HashMap<Id, HashSet<Id>>,
    capacity: usize,
    boost_window: usize,
}

impl Inner {
    fn index(&mut self, entry: &TimelineEntry) {
        self.by_account
            .entry(entry.account_id)
            .or_default()
            .insert(entry.status_id);
        if let Some(boostee) = entry.boost_of_account_id {
            self.by_account
                .entry(boostee)
                .or_default()
                .insert(entry.status_id);
        }
    }

    fn unindex(&mut self, entry: &TimelineEntry) {
        let mut drop_key = |account_id: Id, inner: &mut Inner| {
            if let Some(set) = inner.by_account.get_mut(&account_id) {
                set.remove(&entry.status_id);
                if set.is_empty() {
                    inner.by_account.remove(&account_id);
                }
            }
        };
        drop_key(entry.account_id, self);
        if let Some(boostee) = entry.boost_of_account_id {
            drop_key(boostee, self);
        }
    }

    fn remove_status(&mut self, status_id: Id) -> bool {
        match self.entries.remove(&status_id) {
            Some(entry) => {
                self.unindex(&entry);
                true
            }
            None => false,
        }
    }
}

/// A single bounded timeline.
pub struct StatusTimeline {
    inner: Mutex<Inner>,
}

impl StatusTimeline {
    pub fn new(capacity: usize, boost_window: usize) -> StatusTimeline {
        StatusTimeline {
            inner: Mutex::new(Inner {
                entries: BTreeMap::new(),
                by_account: HashMap::new(),
                capacity,
                boost_window,
            }),
        }
    }

    /// Insert an entry at its ID-ordered position. Returns true iff the
    /// entry is a boost whose target is already referenced by one of the
    /// newest `boost_window` entries; callers use that to suppress
    /// streaming repeat boosts.
    pub fn insert_one(&self, entry: TimelineEntry) -> bool {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&entry.status_id) {
            return false;
        }

        let repeat_boost = match entry.boost_of_status_id {
            Some(target) => inner
                .entries
                .values()
                .rev()
                .take(inner.boost_window)
                .any(|existing| existing.references(target)),
            None => false,
        };

        inner.index(&entry);
        inner.entries.insert(entry.status_id, entry);

        while inner.entries.len() > inner.capacity {
            // Oldest first.
            let Some(oldest) = inner.entries.keys().next().copied() else {
                break;
            };
            inner.remove_status(oldest);
        }

        repeat_boost
    }

    pub fn remove_by_status_ids(&self, status_ids: &[Id]) -> usize {
        let mut inner = self.inner.lock();
        let mut removed = 0;
        for status_id in status_ids {
            if inner.remove_status(*status_id) {
                removed += 1;
            }
            // Entries referencing the status as a boost target go too.
            let boosts: Vec<Id> = inner
                .entries
                .values()
                .filter(|e| e.boost_of_status_id == Some(*status_id))
                .map(|e| e.status_id)
                .collect();
            for boost_id in boosts {
                if inner.remove_status(boost_id) {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Remove every entry authored by or boosting any of these accounts.
    pub fn remove_by_account_ids(&self, account_ids: &[Id]) -> usize {
        let mut inner = self.inner.lock();
        let mut removed = 0;
        for account_id in account_ids {
            let Some(status_ids) = inner.by_account.get(account_id) else {
                continue;
            };
            let status_ids: Vec<Id> = status_ids.iter().copied().collect();
            for status_id in status_ids {
                if inner.remove_status(status_id) {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// The newest `limit` entries, ID-descending. Zero means all.
    pub fn newest(&self, limit: usize) -> Vec<TimelineEntry> {
        let inner = self.inner.lock();
        let iter = inner.entries.values().rev().cloned();
        if limit == 0 {
            iter.collect()
        } else {
            iter.take(limit).collect()
        }
    }

    pub fn contains(&self, status_id: Id) -> bool {
        self.inner.lock().entries.contains_key(&status_id)
    }

    /// Any entry referencing `status_id`, as itself or as a boost target
    pub fn references(&self, status_id: Id) -> bool {
        let inner = self.inner.lock();
        inner.entries.values().any(|e| e.references(status_id))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(account_id: Id) -> TimelineEntry {
        TimelineEntry {
            status_id: Id::gen(),
            account_id,
            boost_of_status_id: None,
            boost_of_account_id: None,
        }
    }

    fn boost(account_id: Id, target: &TimelineEntry) -> TimelineEntry {
        TimelineEntry {
            status_id: Id::gen(),
            account_id,
            boost_of_status_id: Some(target.status_id),
            boost_of_account_id: Some(target.account_id),
        }
    }

    #[test]
    fn test_ordering_and_capacity() {
        let timeline = StatusTimeline::new(5, 40);
        let author = Id::gen();
        let mut inserted = Vec::new();
        for _ in 0..8 {
            let e = entry(author);
            inserted.push(e.clone());
            timeline.insert_one(e);
        }

        assert_eq!(timeline.len(), 5);
        let newest = timeline.newest(0);
        assert!(newest.windows(2).all(|w| w[0].status_id > w[1].status_id));
        // The oldest three were evicted.
        for old in &inserted[..3] {
            assert!(!timeline.contains(old.status_id));
        }
    }

    #[test]
    fn test_boost_dedup_within_window() {
        let timeline = StatusTimeline::new(100, 40);
        let original = entry(Id::gen());
        timeline.insert_one(original.clone());

        let first_boost = boost(Id::gen(), &original);
        assert!(timeline.insert_one(first_boost));

        // Another boost of the same target by a different author is also
        // a repeat.
        let second_boost = boost(Id::gen(), &original);
        assert!(timeline.insert_one(second_boost));

        // A boost of something unseen is not.
        let other = entry(Id::gen());
        let fresh_boost = boost(Id::gen(), &other);
        assert!(!timeline.insert_one(fresh_boost));
    }

    #[test]
    fn test_boost_dedup_expires_past_window() {
        let timeline = StatusTimeline::new(100, 3);
        let original = entry(Id::gen());
        timeline.insert_one(original.clone());

        // Push the original out of the dedup window.
        for _ in 0..3 {
            timeline.insert_one(entry(Id::gen()));
        }

        let late_boost = boost(Id::gen(), &original);
        assert!(!timeline.insert_one(late_boost));
    }

    #[test]
    fn test_remove_by_status_ids_takes_boosts_along() {
        let timeline = StatusTimeline::new(100, 40);
        let original = entry(Id::gen());
        let b = boost(Id::gen(), &original);
        timeline.insert_one(original.clone());
        timeline.insert_one(b.clone());

        let removed = timeline.remove_by_status_ids(&[original.status_id]);
        assert_eq!(removed, 2);
        assert!(!timeline.references(original.status_id));
    }

    #[test]
    fn test_remove_by_account_ids_covers_boosted_author() {
        let timeline = StatusTimeline::new(100, 40);
        let muted_author = Id::gen();
        let original = entry(muted_author);
        let b = boost(Id::gen(), &original);
        let unrelated = entry(Id::gen());
        timeline.insert_one(original.clone());
        timeline.insert_one(b.clone());
        timeline.insert_one(unrelated.clone());

        let removed = timeline.remove_by_account_ids(&[muted_author]);
        assert_eq!(removed, 2);
        assert!(timeline.contains(unrelated.status_id));
        assert!(!timeline.contains(b.status_id));
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let timeline = StatusTimeline::new(100, 40);
        let e = entry(Id::gen());
        timeline.insert_one(e.clone());
        timeline.insert_one(e.clone());
        assert_eq!(timeline.len(), 1);
    }
}
