//! The visibility filter across its four contexts, plus interaction
//! policy verdicts.

mod common;

use common::*;
use starling_lib::filter::{status_visible, VisContext};
use starling_lib::model::{
    Block, DomainLimit, Id, InteractionKind, PolicyRules, PolicyValue, StatusesPolicy,
    Visibility,
};
use starling_lib::policy::{check_interaction, Verdict};
use starling_lib::store::Store;
use starling_lib::GLOBALS;

#[tokio::test]
async fn test_direct_status_visible_to_participants_only() {
    let _ = world();
    let author = local_user("vis_dm_author").await;
    let target = local_user("vis_dm_target").await;
    let outsider = local_user("vis_dm_outsider").await;

    let mut dm = status_by(&author, Visibility::Direct, "<p>psst</p>").await;
    mention(&mut dm, &target).await;

    assert!(status_visible(Some(&author), &dm, VisContext::Thread).await.unwrap());
    assert!(status_visible(Some(&target), &dm, VisContext::Thread).await.unwrap());
    assert!(!status_visible(Some(&outsider), &dm, VisContext::Thread).await.unwrap());
    assert!(!status_visible(None, &dm, VisContext::Public).await.unwrap());
}

#[tokio::test]
async fn test_mutuals_only_requires_both_directions() {
    let _ = world();
    let author = local_user("vis_mu_author").await;
    let half = local_user("vis_mu_half").await;
    let full = local_user("vis_mu_full").await;

    follow(&half, &author).await;
    follow(&full, &author).await;
    follow(&author, &full).await;

    let status = status_by(&author, Visibility::MutualsOnly, "<p>mutuals</p>").await;

    assert!(!status_visible(Some(&half), &status, VisContext::Home).await.unwrap());
    assert!(status_visible(Some(&full), &status, VisContext::Home).await.unwrap());
}

#[tokio::test]
async fn test_suspended_author_is_invisible() {
    let _ = world();
    let mut author = local_user("vis_susp_author").await;
    let viewer = local_user("vis_susp_viewer").await;

    let status = status_by(&author, Visibility::Public, "<p>about to vanish</p>").await;
    author.suspended_at = Some(chrono::Utc::now());
    store().update_account(&author).await.unwrap();

    assert!(!status_visible(Some(&viewer), &status, VisContext::Home).await.unwrap());
    assert!(!status_visible(None, &status, VisContext::Public).await.unwrap());
}

#[tokio::test]
async fn test_block_hides_in_both_directions() {
    let _ = world();
    let author = local_user("vis_blk_author").await;
    let blocked = local_user("vis_blk_blocked").await;

    store()
        .put_block(&Block {
            id: Id::gen(),
            account_id: author.id,
            target_account_id: blocked.id,
            uri: "https://localhost/blocks/vis".to_owned(),
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let status = status_by(&author, Visibility::Public, "<p>not for blocked</p>").await;
    assert!(!status_visible(Some(&blocked), &status, VisContext::Home).await.unwrap());
    assert!(
        !status_visible(Some(&blocked), &status, VisContext::Notification)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_unfederated_unlocked_stays_off_public_timeline() {
    let _ = world();
    let author = local_user("vis_unf_author").await;
    let viewer = local_user("vis_unf_viewer").await;

    let mut status = status_by(&author, Visibility::Unlocked, "<p>quiet public</p>").await;
    status.federated = false;
    status.local = false;
    store().update_status(&status).await.unwrap();

    assert!(!status_visible(Some(&viewer), &status, VisContext::Public).await.unwrap());
    // Home context is unaffected.
    assert!(status_visible(Some(&viewer), &status, VisContext::Home).await.unwrap());
}

#[tokio::test]
async fn test_domain_limit_filter_hides_from_public_timeline() {
    let _ = world();
    let author = remote_account("vis_dl_author", "shady.example").await;
    let viewer = local_user("vis_dl_viewer").await;

    let mut limit = DomainLimit::new("shady.example");
    limit.statuses_policy = StatusesPolicy::FilterHide;
    GLOBALS.domain_limits.create(limit).await.unwrap();

    let status = status_by(&author, Visibility::Public, "<p>from shady</p>").await;
    assert!(!status_visible(Some(&viewer), &status, VisContext::Public).await.unwrap());
}

#[tokio::test]
async fn test_interaction_policy_defaults() {
    let _ = world();
    let author = local_user("pol_author").await;
    let follower = local_user("pol_follower").await;
    let stranger = local_user("pol_stranger").await;
    follow(&follower, &author).await;

    let private = status_by(&author, Visibility::FollowersOnly, "<p>followers</p>").await;

    assert_eq!(
        check_interaction(&follower, &private, InteractionKind::Favourite)
            .await
            .unwrap(),
        Verdict::Permitted
    );
    assert_eq!(
        check_interaction(&follower, &private, InteractionKind::Boost)
            .await
            .unwrap(),
        Verdict::Forbidden
    );
    // Strangers cannot even see it.
    assert_eq!(
        check_interaction(&stranger, &private, InteractionKind::Reply)
            .await
            .unwrap(),
        Verdict::Forbidden
    );
}

#[tokio::test]
async fn test_interaction_policy_with_approval() {
    let _ = world();
    let author = local_user("pol_ap_author").await;
    let follower = local_user("pol_ap_follower").await;
    follow(&follower, &author).await;

    let mut status = status_by(&author, Visibility::Public, "<p>ask first</p>").await;
    status.interaction_policy = Some(starling_lib::model::InteractionPolicy {
        can_favourite: PolicyRules {
            always: vec![PolicyValue::Public],
            with_approval: Vec::new(),
        },
        can_reply: PolicyRules {
            always: vec![PolicyValue::Author],
            with_approval: vec![PolicyValue::Followers],
        },
        can_boost: PolicyRules {
            always: vec![PolicyValue::Author],
            with_approval: Vec::new(),
        },
    });
    store().update_status(&status).await.unwrap();

    assert_eq!(
        check_interaction(&follower, &status, InteractionKind::Reply)
            .await
            .unwrap(),
        Verdict::ManualApproval
    );
    assert_eq!(
        check_interaction(&follower, &status, InteractionKind::Boost)
            .await
            .unwrap(),
        Verdict::Forbidden
    );
    assert_eq!(
        check_interaction(&follower, &status, InteractionKind::Favourite)
            .await
            .unwrap(),
        Verdict::Permitted
    );
}
