//! Interaction policy resolution: may this account favourite / reply to
//! / boost that status? Statuses may carry explicit rules; otherwise the
//! defaults derived from visibility apply. Domain limits overlay the
//! result.

use crate::error::Error;
use crate::filter::VisContext;
use crate::globals::GLOBALS;
use crate::model::{
    Account, Id, InteractionKind, InteractionRequest, PolicyRules, PolicyValue, Status,
    StatusesPolicy, Visibility,
};
use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Permitted,
    /// Allowed only with the status author's manual approval; callers
    /// record an interaction request and wait.
    ManualApproval,
    Forbidden,
}

fn default_rules(visibility: Visibility, kind: InteractionKind) -> PolicyRules {
    use InteractionKind::*;
    use PolicyValue::*;
    let always = match (visibility, kind) {
        (Visibility::Public | Visibility::Unlocked, _) => vec![Public],
        (Visibility::FollowersOnly, Boost) => vec![Author],
        (Visibility::FollowersOnly, Reply | Favourite) => vec![Followers, Mentioned, Author],
        (Visibility::MutualsOnly, Boost) => vec![Author],
        (Visibility::MutualsOnly, Reply | Favourite) => vec![Mutuals, Mentioned, Author],
        (Visibility::Direct, Boost) => vec![Author],
        (Visibility::Direct, Reply | Favourite) => vec![Mentioned, Author],
        (Visibility::None, _) => vec![Author],
    };
    PolicyRules {
        always,
        with_approval: Vec::new(),
    }
}

async fn value_applies(
    value: PolicyValue,
    viewer: &Account,
    status: &Status,
    author_id: Id,
) -> Result<bool, Error> {
    let store = GLOBALS.store();
    Ok(match value {
        PolicyValue::Public => true,
        PolicyValue::Followers => store.is_following(viewer.id, author_id).await?,
        PolicyValue::Following => store.is_following(author_id, viewer.id).await?,
        PolicyValue::Mutuals => store.is_mutuals(viewer.id, author_id).await?,
        PolicyValue::Mentioned => status.mentions_account(viewer.id),
        PolicyValue::Author => viewer.id == author_id,
    })
}

/// Resolve whether `viewer` may perform `kind` on `status`.
pub async fn check_interaction(
    viewer: &Account,
    status: &Status,
    kind: InteractionKind,
) -> Result<Verdict, Error> {
    let store = GLOBALS.store();

    if viewer.is_suspended() || viewer.deleted_self {
        return Ok(Verdict::Forbidden);
    }

    let author_id = status.account_id;
    if viewer.id != author_id && store.is_either_blocked(viewer.id, author_id).await? {
        return Ok(Verdict::Forbidden);
    }

    // No interacting with what you cannot see.
    if !crate::filter::status_visible(Some(viewer), status, VisContext::Thread).await? {
        return Ok(Verdict::Forbidden);
    }

    // Interactions originating from a filtered domain are dropped.
    if !viewer.is_local() {
        if let Some(limit) = GLOBALS.domain_limits.match_domain(&viewer.domain).await? {
            if limit.statuses_policy == StatusesPolicy::FilterHide {
                return Ok(Verdict::Forbidden);
            }
        }
    }

    let rules = match &status.interaction_policy {
        Some(policy) => match kind {
            InteractionKind::Favourite => policy.can_favourite.clone(),
            InteractionKind::Reply => policy.can_reply.clone(),
            InteractionKind::Boost => policy.can_boost.clone(),
        },
        None => default_rules(status.visibility, kind),
    };

    for value in &rules.always {
        if value_applies(*value, viewer, status, author_id).await? {
            return Ok(Verdict::Permitted);
        }
    }
    for value in &rules.with_approval {
        if value_applies(*value, viewer, status, author_id).await? {
            return Ok(Verdict::ManualApproval);
        }
    }
    Ok(Verdict::Forbidden)
}

/// Record a pending interaction for a manual-approval verdict.
pub async fn record_pending_interaction(
    viewer: &Account,
    status: &Status,
    kind: InteractionKind,
) -> Result<InteractionRequest, Error> {
    let request = InteractionRequest {
        id: Id::gen(),
        status_id: status.id,
        origin_account_id: viewer.id,
        target_account_id: status.account_id,
        kind,
        created_at: Utc::now(),
        accepted_at: None,
        rejected_at: None,
    };
    GLOBALS.store().put_interaction_request(&request).await?;
    Ok(request)
}
