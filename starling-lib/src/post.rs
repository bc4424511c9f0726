//! Status authoring actions built on the surfacer: boosts, unboosts,
//! favourites. The HTTP layer calls these after authentication.

use crate::error::{Error, ErrorKind};
use crate::globals::GLOBALS;
use crate::model::{
    Account, Favourite, Id, InteractionKind, NotificationKind, Status, Visibility,
};
use crate::policy::{check_interaction, record_pending_interaction, Verdict};
use chrono::Utc;

/// Boost a status. Boosting a boost collapses onto the original: the new
/// status's `boost_of_id` always references the root target, never
/// another boost.
pub async fn boost_status(booster: &Account, target_status_id: Id) -> Result<Status, Error> {
    let store = GLOBALS.store();

    let mut target = store.get_status_by_id(target_status_id).await?;
    if let Some(original_id) = target.boost_of_id {
        target = store.get_status_by_id(original_id).await?;
    }

    match check_interaction(booster, &target, InteractionKind::Boost).await? {
        Verdict::Permitted => {}
        Verdict::ManualApproval => {
            record_pending_interaction(booster, &target, InteractionKind::Boost).await?;
            return Err(ErrorKind::Forbidden.into());
        }
        Verdict::Forbidden => return Err(ErrorKind::Forbidden.into()),
    }

    if let Some(existing) = store.get_boost_by_account(booster.id, target.id).await? {
        // Boosting twice is a no-op; hand back the existing boost.
        return Ok(existing);
    }

    let id = Id::gen();
    let boost = Status {
        id,
        uri: format!("{}/boosts/{}", booster.uri, id),
        account_id: booster.id,
        content: String::new(),
        content_warning: String::new(),
        language: None,
        // A boost never widens the boosted status's visibility.
        visibility: match target.visibility {
            Visibility::Public => Visibility::Public,
            other => other,
        },
        in_reply_to_uri: String::new(),
        in_reply_to_id: None,
        in_reply_to_account_id: None,
        boost_of_id: Some(target.id),
        boost_of_account_id: Some(target.account_id),
        thread_id: target.thread_id,
        mentions: Vec::new(),
        tag_ids: Vec::new(),
        attachment_ids: Vec::new(),
        emoji_ids: Vec::new(),
        poll: None,
        interaction_policy: None,
        local: booster.is_local(),
        federated: target.federated,
        pinned: false,
        created_at: Utc::now(),
        edited_at: None,
        fetched_at: None,
    };
    store.put_status(&boost).await?;

    GLOBALS
        .notifier
        .notify(
            NotificationKind::Boost,
            target.account_id,
            booster.id,
            Some(target.id),
            None,
        )
        .await?;

    if let Err(e) = GLOBALS.surfacer.timeline_and_notify_status(&boost).await {
        tracing::error!("boost surfacing failed: {e}");
    }

    Ok(boost)
}

/// Remove the booster's boost of a status, if one exists. The timeline
/// caches are purged before the store delete returns.
pub async fn unboost_status(booster: &Account, target_status_id: Id) -> Result<(), Error> {
    let store = GLOBALS.store();

    let mut target_id = target_status_id;
    let target = store.get_status_by_id(target_status_id).await?;
    if let Some(original_id) = target.boost_of_id {
        target_id = original_id;
    }

    let Some(boost) = store.get_boost_by_account(booster.id, target_id).await? else {
        return Ok(());
    };

    GLOBALS.surfacer.delete_status_from_timelines(boost.id).await;
    store.delete_notifications_for_status(boost.id).await?;
    store.delete_status(boost.id).await?;
    Ok(())
}

/// Has this account boosted the status?
pub async fn status_boosted_by(account: &Account, status_id: Id) -> Result<bool, Error> {
    let store = GLOBALS.store();
    let mut target_id = status_id;
    let status = store.get_status_by_id(status_id).await?;
    if let Some(original_id) = status.boost_of_id {
        target_id = original_id;
    }
    Ok(store
        .get_boost_by_account(account.id, target_id)
        .await?
        .is_some())
}

/// Favourite a status.
pub async fn favourite_status(account: &Account, status_id: Id) -> Result<Favourite, Error> {
    let store = GLOBALS.store();
    let status = store.get_status_by_id(status_id).await?;

    match check_interaction(account, &status, InteractionKind::Favourite).await? {
        Verdict::Permitted => {}
        Verdict::ManualApproval => {
            record_pending_interaction(account, &status, InteractionKind::Favourite).await?;
            return Err(ErrorKind::Forbidden.into());
        }
        Verdict::Forbidden => return Err(ErrorKind::Forbidden.into()),
    }

    let favourite = Favourite {
        id: Id::gen(),
        account_id: account.id,
        status_id: status.id,
        uri: format!("{}/favourites/{}", account.uri, status.id),
        created_at: Utc::now(),
    };
    store.put_favourite(&favourite).await?;

    GLOBALS
        .notifier
        .notify(
            NotificationKind::Favourite,
            status.account_id,
            account.id,
            Some(status.id),
            None,
        )
        .await?;

    Ok(favourite)
}

/// Delete a status everywhere: timeline caches first, then notifications,
/// then the durable row.
pub async fn delete_status(status_id: Id) -> Result<(), Error> {
    let store = GLOBALS.store();
    GLOBALS.surfacer.delete_status_from_timelines(status_id).await;
    store.delete_notifications_for_status(status_id).await?;
    store.delete_status(status_id).await?;
    Ok(())
}
