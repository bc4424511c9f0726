//! End-to-end surfacing: new statuses land in the right timeline caches,
//! fire the right streams, and generate the right notifications.

mod common;

use common::*;
use starling_lib::model::{
    Id, List, ListEntry, NotificationKind, RepliesPolicy, Status, Tag, Visibility,
};
use starling_lib::store::Store;
use starling_lib::stream::{STREAM_HOME, STREAM_LOCAL, STREAM_PUBLIC};
use starling_lib::GLOBALS;

async fn boost_of(account: &starling_lib::model::Account, target: &Status) -> Status {
    let id = Id::gen();
    let mut boost = Status::new_local(
        account.id,
        &format!("https://localhost/statuses/{id}"),
        "",
    );
    boost.boost_of_id = Some(target.id);
    boost.boost_of_account_id = Some(target.account_id);
    boost.thread_id = target.thread_id;
    boost.visibility = target.visibility;
    store().put_status(&boost).await.unwrap();
    boost
}

#[tokio::test]
async fn test_public_status_reaches_home_public_local() {
    let _ = world();
    let author = local_user("surf_author").await;
    let follower = local_user("surf_follower").await;
    follow(&follower, &author).await;

    let status = status_by(&author, Visibility::Public, "<p>hello fedi</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&status)
        .await
        .unwrap();

    assert!(GLOBALS.timelines.public().contains(status.id));
    assert!(GLOBALS.timelines.local().contains(status.id));
    assert!(GLOBALS.timelines.home(follower.id).contains(status.id));
    // The author sees their own status at home too.
    assert!(GLOBALS.timelines.home(author.id).contains(status.id));

    let events = stream().updates_for(follower.id);
    let streams_hit: Vec<&str> = events
        .iter()
        .filter(|(_, api)| api.id == status.id)
        .map(|(name, _)| name.as_str())
        .collect();
    assert!(streams_hit.contains(&STREAM_HOME));
    assert!(streams_hit.contains(&STREAM_PUBLIC));
    assert!(streams_hit.contains(&STREAM_LOCAL));
}

#[tokio::test]
async fn test_followers_only_stays_off_public_timeline() {
    let _ = world();
    let author = local_user("fo_author").await;
    let follower = local_user("fo_follower").await;
    let stranger = local_user("fo_stranger").await;
    follow(&follower, &author).await;

    let status = status_by(&author, Visibility::FollowersOnly, "<p>for you</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&status)
        .await
        .unwrap();

    assert!(!GLOBALS.timelines.public().contains(status.id));
    assert!(!GLOBALS.timelines.local().contains(status.id));
    assert!(GLOBALS.timelines.home(follower.id).contains(status.id));
    assert!(!GLOBALS.timelines.home(stranger.id).contains(status.id));
    assert!(stream()
        .updates_for(stranger.id)
        .iter()
        .all(|(_, api)| api.id != status.id));
}

#[tokio::test]
async fn test_replies_and_boosts_stay_off_public_timeline() {
    let _ = world();
    let author = local_user("rp_author").await;
    let follower = local_user("rp_follower").await;
    follow(&follower, &author).await;

    let top = status_by(&author, Visibility::Public, "<p>top</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&top)
        .await
        .unwrap();

    let reply = reply_to(&author, &top, "<p>self reply</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&reply)
        .await
        .unwrap();

    assert!(!GLOBALS.timelines.public().contains(reply.id));
    // But the follower's home still carries it.
    assert!(GLOBALS.timelines.home(follower.id).contains(reply.id));

    let boost = boost_of(&author, &top).await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&boost)
        .await
        .unwrap();
    assert!(!GLOBALS.timelines.public().contains(boost.id));
}

#[tokio::test]
async fn test_surface_then_delete_leaves_no_trace() {
    let _ = world();
    let author = local_user("del_author").await;
    let follower = local_user("del_follower").await;
    follow(&follower, &author).await;

    let status = status_by(&author, Visibility::Public, "<p>going away</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&status)
        .await
        .unwrap();
    let boost = boost_of(&follower, &status).await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&boost)
        .await
        .unwrap();

    GLOBALS.surfacer.delete_status_from_timelines(status.id).await;

    assert!(!GLOBALS.timelines.public().references(status.id));
    assert!(!GLOBALS.timelines.local().references(status.id));
    assert!(!GLOBALS.timelines.home(follower.id).references(status.id));
    assert!(!GLOBALS.timelines.home(author.id).references(status.id));
    assert!(stream().deletes.lock().contains(&status.id));
}

#[tokio::test]
async fn test_repeat_boost_is_not_streamed_again() {
    let _ = world();
    let author = local_user("bd_author").await;
    let booster_one = local_user("bd_booster1").await;
    let booster_two = local_user("bd_booster2").await;
    let viewer = local_user("bd_viewer").await;
    follow(&viewer, &booster_one).await;
    follow(&viewer, &booster_two).await;

    let original = status_by(&author, Visibility::Public, "<p>boost me</p>").await;

    let first = boost_of(&booster_one, &original).await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&first)
        .await
        .unwrap();

    let second = boost_of(&booster_two, &original).await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&second)
        .await
        .unwrap();

    // Both entries are cached, but only the first was streamed to home.
    assert!(GLOBALS.timelines.home(viewer.id).contains(first.id));
    assert!(GLOBALS.timelines.home(viewer.id).contains(second.id));
    let home_events: Vec<Id> = stream()
        .updates_for(viewer.id)
        .into_iter()
        .filter(|(name, _)| name == STREAM_HOME)
        .map(|(_, api)| api.id)
        .collect();
    assert!(home_events.contains(&first.id));
    assert!(!home_events.contains(&second.id));
}

#[tokio::test]
async fn test_exclusive_list_consumes_home_insert() {
    let _ = world();
    let author = local_user("xl_author").await;
    let owner = local_user("xl_owner").await;
    let f = follow(&owner, &author).await;

    let list = List {
        id: Id::gen(),
        account_id: owner.id,
        title: "quiet reading".to_owned(),
        replies_policy: RepliesPolicy::Followed,
        exclusive: true,
        created_at: chrono::Utc::now(),
    };
    store().put_list(&list).await.unwrap();
    store()
        .put_list_entry(&ListEntry {
            id: Id::gen(),
            list_id: list.id,
            follow_id: f.id,
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let status = status_by(&author, Visibility::Public, "<p>listed</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&status)
        .await
        .unwrap();

    assert!(GLOBALS.timelines.list(list.id).contains(status.id));
    assert!(!GLOBALS.timelines.home(owner.id).contains(status.id));
    let list_stream = format!("list:{}", list.id);
    assert!(stream()
        .updates_for(owner.id)
        .iter()
        .any(|(name, api)| *name == list_stream && api.id == status.id));
}

#[tokio::test]
async fn test_list_reply_policy_none_skips_replies() {
    let _ = world();
    let author = local_user("lrp_author").await;
    let other = local_user("lrp_other").await;
    let owner = local_user("lrp_owner").await;
    let f = follow(&owner, &author).await;

    let list = List {
        id: Id::gen(),
        account_id: owner.id,
        title: "no replies".to_owned(),
        replies_policy: RepliesPolicy::None,
        exclusive: false,
        created_at: chrono::Utc::now(),
    };
    store().put_list(&list).await.unwrap();
    store()
        .put_list_entry(&ListEntry {
            id: Id::gen(),
            list_id: list.id,
            follow_id: f.id,
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let parent = status_by(&other, Visibility::Public, "<p>parent</p>").await;
    let reply = reply_to(&author, &parent, "<p>reply</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&reply)
        .await
        .unwrap();

    assert!(!GLOBALS.timelines.list(list.id).contains(reply.id));
    // Non-exclusive list: home still gets it.
    assert!(GLOBALS.timelines.home(owner.id).contains(reply.id));
}

#[tokio::test]
async fn test_tag_followers_get_home_and_tag_timelines() {
    let _ = world();
    let author = local_user("tag_author").await;
    let tag_fan = local_user("tag_fan").await;

    let tag = Tag::new("rustacea");
    store().put_tag(&tag).await.unwrap();
    store().follow_tag(tag_fan.id, tag.id).await.unwrap();

    let mut status = status_by(&author, Visibility::Public, "<p>#rustacea content</p>").await;
    status.tag_ids.push(tag.id);
    store().update_status(&status).await.unwrap();

    GLOBALS
        .surfacer
        .timeline_and_notify_status(&status)
        .await
        .unwrap();

    assert!(GLOBALS.timelines.tag(tag.id).contains(status.id));
    assert!(GLOBALS.timelines.home(tag_fan.id).contains(status.id));
    assert!(stream()
        .updates_for(tag_fan.id)
        .iter()
        .any(|(name, _)| name == "tag:rustacea"));
}

#[tokio::test]
async fn test_mention_generates_notification() {
    let _ = world();
    let author = local_user("mn_author").await;
    let target = local_user("mn_target").await;

    let mut status = status_by(&author, Visibility::Public, "<p>hey @mn_target</p>").await;
    mention(&mut status, &target).await;

    GLOBALS
        .surfacer
        .timeline_and_notify_status(&status)
        .await
        .unwrap();

    let persisted = store()
        .get_notification_by_key(
            NotificationKind::Mention,
            target.id,
            author.id,
            Some(status.id),
            None,
        )
        .await
        .unwrap();
    assert!(persisted.is_some());
    assert!(stream()
        .notifications_for(target.id)
        .iter()
        .any(|n| n.status_id == Some(status.id)));
}

#[tokio::test]
async fn test_status_update_streams_but_does_not_reinsert() {
    let _ = world();
    let author = local_user("up_author").await;
    let follower = local_user("up_follower").await;
    follow(&follower, &author).await;

    let mut status = status_by(&author, Visibility::Public, "<p>v1</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&status)
        .await
        .unwrap();

    // Edit: remove from caches out-of-band to prove the update path does
    // not reinsert.
    GLOBALS.timelines.remove_status_everywhere(status.id);
    status.content = "<p>v2</p>".to_owned();
    status.edited_at = Some(chrono::Utc::now());
    store().update_status(&status).await.unwrap();

    let edit_id = Id::gen();
    GLOBALS
        .surfacer
        .timeline_and_notify_status_update(&status, Some(edit_id))
        .await
        .unwrap();

    assert!(!GLOBALS.timelines.home(follower.id).contains(status.id));
    let edits = stream()
        .status_updates
        .get(&follower.id)
        .map(|v| v.clone())
        .unwrap_or_default();
    assert!(edits.iter().any(|(name, api)| name == STREAM_HOME && api.id == status.id));
}

#[tokio::test]
async fn test_status_update_notifies_local_interactors_once() {
    let _ = world();
    let author = local_user("ui_author").await;
    let replier = local_user("ui_replier").await;

    let status = status_by(&author, Visibility::Public, "<p>discuss</p>").await;
    GLOBALS
        .surfacer
        .timeline_and_notify_status(&status)
        .await
        .unwrap();

    // Two interactions by the same account: one notification.
    let r1 = reply_to(&replier, &status, "<p>first</p>").await;
    let r2 = reply_to(&replier, &status, "<p>second</p>").await;
    let _ = (r1, r2);

    let edit_id = Id::gen();
    let mut edited = status.clone();
    edited.edited_at = Some(chrono::Utc::now());
    store().update_status(&edited).await.unwrap();
    GLOBALS
        .surfacer
        .timeline_and_notify_status_update(&edited, Some(edit_id))
        .await
        .unwrap();

    let notifications = store()
        .get_notifications_for_account(replier.id)
        .await
        .unwrap();
    let updates: Vec<_> = notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::Update && n.status_id == Some(status.id))
        .collect();
    assert_eq!(updates.len(), 1);
}
