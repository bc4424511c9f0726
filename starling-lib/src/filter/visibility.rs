use crate::error::Error;
use crate::globals::GLOBALS;
use crate::model::{Account, Status, StatusesPolicy, Visibility};

/// Where a status is about to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisContext {
    Home,
    Public,
    Thread,
    Notification,
}

/// Is `status` visible to `viewer` in `ctx`?
///
/// `viewer` is None for anonymous requests, which can only ever see
/// public and unlocked statuses.
pub async fn status_visible(
    viewer: Option<&Account>,
    status: &Status,
    ctx: VisContext,
) -> Result<bool, Error> {
    let store = GLOBALS.store();

    let author = store.get_account_by_id(status.account_id).await?;
    if author.is_suspended() {
        return Ok(false);
    }

    if let Some(viewer) = viewer {
        if viewer.id != author.id && store.is_either_blocked(viewer.id, author.id).await? {
            // Either direction hides. In the notification context this
            // covers the viewer muting an origin by blocking it.
            return Ok(false);
        }
    }

    let viewer_id = viewer.map(|v| v.id);
    let is_author = viewer_id == Some(author.id);
    let is_mentioned = viewer_id.map(|id| status.mentions_account(id)).unwrap_or(false);

    let unpacked = match status.visibility {
        Visibility::Public => true,
        Visibility::Unlocked => {
            if ctx == VisContext::Public {
                // Unlocked reaches the public timeline only when the
                // status actually federates (or is local).
                status.federated || status.local
            } else {
                true
            }
        }
        Visibility::FollowersOnly => match viewer_id {
            None => false,
            Some(viewer_id) => {
                is_author || is_mentioned || store.is_following(viewer_id, author.id).await?
            }
        },
        Visibility::MutualsOnly => match viewer_id {
            None => false,
            Some(viewer_id) => {
                is_author || is_mentioned || store.is_mutuals(viewer_id, author.id).await?
            }
        },
        Visibility::Direct => is_author || is_mentioned,
        Visibility::None => false,
    };
    if !unpacked {
        return Ok(false);
    }

    if ctx == VisContext::Public {
        // Restricted-audience statuses never hit public timelines, even
        // for viewers inside the audience.
        if !matches!(
            status.visibility,
            Visibility::Public | Visibility::Unlocked
        ) {
            return Ok(false);
        }

        // Public timelines carry only top-level originals; boosts reach
        // followers through home timelines.
        if status.is_reply() || status.is_boost() {
            return Ok(false);
        }

        // Domain-limit overlay: filtered domains never hit public.
        if !author.is_local() {
            if let Some(limit) = GLOBALS.domain_limits.match_domain(&author.domain).await? {
                if matches!(
                    limit.statuses_policy,
                    StatusesPolicy::FilterWarn | StatusesPolicy::FilterHide
                ) {
                    return Ok(false);
                }
            }
        }
    }

    Ok(true)
}

/// Public-timeline eligibility, the strictest context.
pub async fn public_timelineable(
    viewer: Option<&Account>,
    status: &Status,
) -> Result<bool, Error> {
    status_visible(viewer, status, VisContext::Public).await
}

/// Home-timeline eligibility.
pub async fn home_timelineable(viewer: Option<&Account>, status: &Status) -> Result<bool, Error> {
    status_visible(viewer, status, VisContext::Home).await
}
