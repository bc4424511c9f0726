//! Boost semantics: collapse onto the original, unboost round trip, and
//! the no-widening rule.

mod common;

use common::*;
use starling_lib::model::{NotificationKind, Visibility};
use starling_lib::store::Store;
use starling_lib::{post, ErrorKind, GLOBALS};

#[tokio::test]
async fn test_boost_of_boost_collapses_to_original() {
    let _ = world();
    let author = local_user("bb_author").await;
    let first = local_user("bb_first").await;
    let second = local_user("bb_second").await;

    let original = status_by(&author, Visibility::Public, "<p>the original</p>").await;

    let b1 = post::boost_status(&first, original.id).await.unwrap();
    assert_eq!(b1.boost_of_id, Some(original.id));
    assert_eq!(b1.boost_of_account_id, Some(author.id));

    // Boosting the boost targets the original, never the boost.
    let b2 = post::boost_status(&second, b1.id).await.unwrap();
    assert_eq!(b2.boost_of_id, Some(original.id));
    assert_eq!(b2.boost_of_account_id, Some(author.id));
}

#[tokio::test]
async fn test_boost_then_unboost_round_trip() {
    let _ = world();
    let author = local_user("ub_author").await;
    let booster = local_user("ub_booster").await;
    follow(&booster, &author).await;

    let original = status_by(&author, Visibility::Public, "<p>boostable</p>").await;

    let boost = post::boost_status(&booster, original.id).await.unwrap();
    assert!(post::status_boosted_by(&booster, original.id).await.unwrap());
    assert!(store()
        .get_notification_by_key(
            NotificationKind::Boost,
            author.id,
            booster.id,
            Some(original.id),
            None,
        )
        .await
        .unwrap()
        .is_some());

    post::unboost_status(&booster, original.id).await.unwrap();
    assert!(!post::status_boosted_by(&booster, original.id).await.unwrap());
    assert!(store().get_status_by_id(boost.id).await.is_err());
    assert!(!GLOBALS.timelines.home(booster.id).contains(boost.id));
}

#[tokio::test]
async fn test_double_boost_returns_existing() {
    let _ = world();
    let author = local_user("db_author").await;
    let booster = local_user("db_booster").await;

    let original = status_by(&author, Visibility::Public, "<p>once only</p>").await;
    let b1 = post::boost_status(&booster, original.id).await.unwrap();
    let b2 = post::boost_status(&booster, original.id).await.unwrap();
    assert_eq!(b1.id, b2.id);
}

#[tokio::test]
async fn test_boost_does_not_widen_visibility() {
    let _ = world();
    let author = local_user("nw_author").await;
    let follower = local_user("nw_follower").await;
    follow(&follower, &author).await;

    let private = status_by(&author, Visibility::FollowersOnly, "<p>private-ish</p>").await;

    // Followers cannot boost a followers-only status.
    let err = post::boost_status(&follower, private.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    // The author can, and the boost stays followers-only.
    let own_boost = post::boost_status(&author, private.id).await.unwrap();
    assert_eq!(own_boost.visibility, Visibility::FollowersOnly);
}

#[tokio::test]
async fn test_blocked_booster_is_forbidden() {
    let _ = world();
    let author = local_user("blb_author").await;
    let blocked = local_user("blb_blocked").await;

    store()
        .put_block(&starling_lib::model::Block {
            id: starling_lib::model::Id::gen(),
            account_id: author.id,
            target_account_id: blocked.id,
            uri: "https://localhost/blocks/boost".to_owned(),
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let status = status_by(&author, Visibility::Public, "<p>not for you</p>").await;
    let err = post::boost_status(&blocked, status.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}
