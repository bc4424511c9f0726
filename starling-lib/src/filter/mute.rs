//! Per-(viewer, status) mute evaluation with a load-through cache.
//!
//! Mute state propagates up the reply chain: muting an account mutes
//! every descendant of its statuses for the muting viewer. The loader
//! walks the chain with barebones reads; if a hop's parent has not been
//! dereferenced yet the result is a retry signal that must bypass the
//! cache, or the status would be stuck "possibly muted" forever.

use crate::error::{Error, ErrorKind};
use crate::globals::GLOBALS;
use crate::model::{Account, AccountsPolicy, Id, Status};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// When a mute stops applying. `never` wins over any concrete time;
/// a mute with no expiry at all is permanent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryTime {
    pub time: Option<DateTime<Utc>>,
    pub never: bool,
}

impl ExpiryTime {
    /// Extend this expiry to cover `t`. Monotone non-decreasing, and
    /// idempotent: feeding the same time twice changes nothing.
    pub fn update(&mut self, t: Option<DateTime<Utc>>) {
        if self.never {
            return;
        }
        match t {
            None => self.never = true,
            Some(t) => {
                if self.time.map_or(true, |current| t > current) {
                    self.time = Some(t);
                }
            }
        }
    }

    /// Still in force at `now`?
    pub fn active(&self, now: DateTime<Utc>) -> bool {
        self.never || self.time.map_or(false, |t| t > now)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusMuteDetails {
    pub mute: bool,
    pub notification_mute: bool,
    pub mute_expiry: ExpiryTime,
    pub notification_expiry: ExpiryTime,
}

impl StatusMuteDetails {
    /// Muted right now: the flag is set and its expiry has not passed.
    pub fn muted(&self, now: DateTime<Utc>) -> bool {
        self.mute && self.mute_expiry.active(now)
    }

    pub fn notification_muted(&self, now: DateTime<Utc>) -> bool {
        self.notification_mute && self.notification_expiry.active(now)
    }
}

/// System that answers "has this viewer muted this status".
pub struct MuteFilter {
    cache: Cache<(Id, Id), StatusMuteDetails>,
}

impl Default for MuteFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MuteFilter {
    pub(crate) fn new() -> MuteFilter {
        MuteFilter {
            cache: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(Duration::from_secs(5 * 60))
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Mute details for `(viewer, status)`. Anonymous viewers mute
    /// nothing. Results are cached per pair except for the
    /// parent-not-dereferenced retry case, which returns empty and lets
    /// the next request try again.
    pub async fn status_mute_details(
        &self,
        viewer: Option<&Account>,
        status: &Status,
    ) -> Result<StatusMuteDetails, Error> {
        let Some(viewer) = viewer else {
            return Ok(StatusMuteDetails::default());
        };

        let key = (viewer.id, status.id);
        let viewer = viewer.clone();
        let status = status.clone();
        let loaded: Result<StatusMuteDetails, Arc<Error>> = self
            .cache
            .try_get_with(key, async move { load_inner(&viewer, &status).await })
            .await;

        match loaded {
            Ok(details) => Ok(details),
            Err(e) => match &e.kind {
                // Retry-later signal: uncached empty result.
                ErrorKind::ParentNotDereferenced(_) => Ok(StatusMuteDetails::default()),
                _ => Err((*e).clone()),
            },
        }
    }

    /// Drop cached decisions involving `account_id`, in either role.
    /// Called when mutes or domain policies change.
    pub fn invalidate_account(&self, account_id: Id) {
        let _ = self
            .cache
            .invalidate_entries_if(move |(viewer, _), _| *viewer == account_id);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

async fn load_inner(viewer: &Account, status: &Status) -> Result<StatusMuteDetails, Error> {
    let store = GLOBALS.store();
    let mut details = StatusMuteDetails::default();

    // Thread mutes suppress notifications only, forever.
    if store
        .get_thread_muted_by_account(status.thread_id, viewer.id)
        .await?
        .is_some()
    {
        details.notification_mute = true;
        details.notification_expiry.update(None);
    }

    // Walk the reply chain from this status to the thread root.
    let mut current = status.clone();
    loop {
        load_one_status_mute_details(viewer, &current, &mut details).await?;

        if current.in_reply_to_uri.is_empty() {
            break;
        }
        match current.in_reply_to_id {
            // Parent known by URI but not yet dereferenced: signal retry.
            // This result must not be cached.
            None => return Err(ErrorKind::ParentNotDereferenced(current.id).into()),
            Some(parent_id) => {
                current = store.get_status_by_id(parent_id).await?;
            }
        }
    }

    // An author never hides their own status from themselves, no matter
    // what domain policy or chain-inherited mutes said.
    if viewer.id == status.account_id {
        details.mute = false;
    }

    Ok(details)
}

/// Fold one status's worth of mute evidence into `details`.
async fn load_one_status_mute_details(
    viewer: &Account,
    status: &Status,
    details: &mut StatusMuteDetails,
) -> Result<(), Error> {
    let store = GLOBALS.store();
    let now = Utc::now();

    // Domain-limit accounts policy, follower override: the viewer
    // following the limited account keeps it visible.
    let mut limited_accounts: Vec<Id> = vec![status.account_id];
    if let Some(boostee) = status.boost_of_account_id {
        // Evaluated against the boostee's own domain, not the booster's.
        limited_accounts.push(boostee);
    }
    for account_id in limited_accounts {
        if account_id == viewer.id {
            continue;
        }
        let account = store.get_account_by_id(account_id).await?;
        if account.is_local() {
            continue;
        }
        if let Some(limit) = GLOBALS.domain_limits.match_domain(&account.domain).await? {
            if limit.accounts_policy == AccountsPolicy::Mute
                && !store.is_following(viewer.id, account_id).await?
            {
                details.mute = true;
                details.mute_expiry.update(None);
            }
        }
    }

    // User mutes against the author, the boosted author, and every
    // mention target other than the viewer.
    let mut mute_targets: Vec<Id> = vec![status.account_id];
    if let Some(boostee) = status.boost_of_account_id {
        mute_targets.push(boostee);
    }
    for mention in &status.mentions {
        if mention.target_account_id != viewer.id {
            mute_targets.push(mention.target_account_id);
        }
    }

    for target in mute_targets {
        let Some(mute) = store.get_mute(viewer.id, target).await? else {
            continue;
        };
        if mute.expired(now) {
            // Expired mutes are absent for every decision.
            continue;
        }
        details.mute = true;
        details.mute_expiry.update(mute.expires_at);
        if mute.notifications {
            details.notification_mute = true;
            details.notification_expiry.update(mute.expires_at);
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_expiry_update_is_monotone() {
        let now = Utc::now();
        let mut e = ExpiryTime::default();

        e.update(Some(now));
        assert_eq!(e.time, Some(now));

        // Earlier time does not rewind.
        e.update(Some(now - TimeDelta::hours(1)));
        assert_eq!(e.time, Some(now));

        // Later time extends.
        let later = now + TimeDelta::hours(1);
        e.update(Some(later));
        assert_eq!(e.time, Some(later));

        // Idempotent.
        e.update(Some(later));
        assert_eq!(e.time, Some(later));
        assert!(!e.never);
    }

    #[test]
    fn test_expiry_zero_means_never() {
        let mut e = ExpiryTime::default();
        e.update(None);
        assert!(e.never);

        // Once never, concrete times change nothing.
        e.update(Some(Utc::now()));
        assert!(e.never);
        assert_eq!(e.time, None);
        assert!(e.active(Utc::now() + TimeDelta::days(10_000)));
    }

    #[test]
    fn test_expiry_active() {
        let now = Utc::now();
        let mut e = ExpiryTime::default();
        assert!(!e.active(now));

        e.update(Some(now + TimeDelta::minutes(5)));
        assert!(e.active(now));
        assert!(!e.active(now + TimeDelta::minutes(6)));
    }

    #[test]
    fn test_details_muted_now() {
        let now = Utc::now();
        let mut details = StatusMuteDetails {
            mute: true,
            ..Default::default()
        };
        details.mute_expiry.update(Some(now + TimeDelta::minutes(1)));
        assert!(details.muted(now));
        assert!(!details.muted(now + TimeDelta::minutes(2)));
        assert!(!details.notification_muted(now));
    }
}
