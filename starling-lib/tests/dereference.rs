//! Dereferencing: single-flight collapse, size ceilings, refresh and
//! recache paths, and the uncache/recache round trip.

mod common;

use common::*;
use starling_lib::model::{EmojiRefs, Visibility};
use starling_lib::store::Store;
use starling_lib::{Dereferenced, ErrorKind, GLOBALS};

#[tokio::test]
async fn test_concurrent_emoji_dereference_fetches_once() {
    let _ = world();
    let url = "https://flight.example/emoji/blob.png";
    transport().serve(url, b"tiny png".to_vec());

    let mut handles = Vec::new();
    for _ in 0..20 {
        handles.push(tokio::spawn(async move {
            GLOBALS
                .dereferencer
                .get_emoji(
                    "blob",
                    "flight.example",
                    Some(url),
                    EmojiRefs::default(),
                    false,
                    false,
                )
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap();
        let emoji = outcome.into_entity().expect("every caller gets the emoji");
        ids.push(emoji.id);
    }

    // One underlying fetch+persist; every caller observed the same row.
    assert_eq!(transport().fetch_count_for(url), 1);
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let stored = store()
        .get_emoji_by_shortcode_domain("blob", "flight.example")
        .await
        .unwrap()
        .expect("emoji persisted");
    assert!(stored.cached);
    assert_eq!(stored.image_file_size, 8);
    assert!(starling_lib::blobs::exists(&stored.image_path).await);
}

#[tokio::test]
async fn test_local_emoji_missing_is_unretrievable() {
    let _ = world();
    let outcome = GLOBALS
        .dereferencer
        .get_emoji("missing_local", "", None, EmojiRefs::default(), false, false)
        .await;
    match outcome {
        Dereferenced::Failed(e) => assert_eq!(e.kind, ErrorKind::Unretrievable),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_oversized_emoji_yields_placeholder_and_error() {
    let _ = world();
    let url = "https://big.example/emoji/huge.png";
    let limit = GLOBALS.settings.read().emoji_max_bytes;
    transport().serve(url, vec![0u8; (limit + 1) as usize]);

    let outcome = GLOBALS
        .dereferencer
        .get_emoji(
            "huge",
            "big.example",
            Some(url),
            EmojiRefs::default(),
            false,
            false,
        )
        .await;

    match outcome {
        Dereferenced::Partial(emoji, e) => {
            assert!(!emoji.cached);
            assert!(matches!(e.kind, ErrorKind::SizeLimit { .. }));
        }
        other => panic!("expected partial, got {other:?}"),
    }

    // Nothing was persisted; the next attempt may retry.
    assert!(store()
        .get_emoji_by_shortcode_domain("huge", "big.example")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_changed_remote_refs_force_refresh() {
    let _ = world();
    let url_v1 = "https://fresh.example/emoji/v1.png";
    let url_v2 = "https://fresh.example/emoji/v2.png";
    transport().serve(url_v1, b"one".to_vec());
    transport().serve(url_v2, b"twotwo".to_vec());

    let first = GLOBALS
        .dereferencer
        .get_emoji(
            "fresh",
            "fresh.example",
            Some(url_v1),
            EmojiRefs::default(),
            false,
            false,
        )
        .await;
    assert!(first.is_full());

    // Same emoji, new image URL: the stored row must be refreshed.
    let second = GLOBALS
        .dereferencer
        .get_emoji(
            "fresh",
            "fresh.example",
            Some(url_v1),
            EmojiRefs {
                image_remote_url: Some(url_v2.to_owned()),
                ..Default::default()
            },
            false,
            false,
        )
        .await;
    let emoji = second.into_entity().unwrap();
    assert!(emoji.cached);
    assert_eq!(emoji.image_file_size, 6);
    assert_eq!(emoji.image_remote_url.as_deref(), Some(url_v2));
    assert_eq!(transport().fetch_count_for(url_v2), 1);

    // Unchanged refs on a cached emoji never refetch.
    let third = GLOBALS
        .dereferencer
        .get_emoji(
            "fresh",
            "fresh.example",
            Some(url_v2),
            EmojiRefs::default(),
            false,
            false,
        )
        .await;
    assert!(third.is_full());
    assert_eq!(transport().fetch_count_for(url_v2), 1);
}

#[tokio::test]
async fn test_uncache_and_recache_round_trip() {
    let _ = world();
    let remote = remote_account("media_owner", "media.example").await;
    let status = status_by(&remote, Visibility::Public, "<p>with media</p>").await;

    // One remote status with two attachments plus one account header.
    let a1 = cached_attachment(&remote, Some(status.id), 30).await;
    let a2 = cached_attachment(&remote, Some(status.id), 30).await;
    let header = cached_attachment(&remote, None, 30).await;
    for attachment in [&a1, &a2, &header] {
        transport().serve(
            attachment.remote_url.as_deref().unwrap(),
            b"png!".to_vec(),
        );
    }

    let cutoff = chrono::Utc::now() - chrono::TimeDelta::hours(24);
    let swept = GLOBALS.cleaner.uncache_remote(cutoff).await.unwrap();
    assert_eq!(swept, 3);

    for attachment in [&a1, &a2, &header] {
        let stored = store().get_attachment(attachment.id).await.unwrap();
        assert!(!stored.cached);
        assert!(!starling_lib::blobs::exists(&stored.storage_path).await);
    }

    // Uncache is idempotent: a second pass finds nothing.
    let swept_again = GLOBALS.cleaner.uncache_remote(cutoff).await.unwrap();
    assert_eq!(swept_again, 0);

    // Recache restores bytes at the same paths with the same metadata.
    for attachment in [&a1, &a2, &header] {
        let uncached = store().get_attachment(attachment.id).await.unwrap();
        let outcome = GLOBALS
            .dereferencer
            .recache_media("", uncached, false)
            .await;
        let recached = outcome.into_entity().expect("recache succeeds");
        assert!(recached.cached);
        assert_eq!(recached.storage_path, attachment.storage_path);
        assert_eq!(recached.file_meta, attachment.file_meta);
        assert!(starling_lib::blobs::exists(&recached.storage_path).await);
    }
}

#[tokio::test]
async fn test_recache_is_noop_when_still_cached() {
    let _ = world();
    let remote = remote_account("noop_owner", "noop.example").await;
    let attachment = cached_attachment(&remote, None, 0).await;

    let outcome = GLOBALS
        .dereferencer
        .recache_media("", attachment.clone(), false)
        .await;
    assert!(outcome.is_full());
    assert_eq!(
        transport().fetch_count_for(attachment.remote_url.as_deref().unwrap()),
        0
    );
}
