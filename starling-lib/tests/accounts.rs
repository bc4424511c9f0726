//! Signup locale handling and the RSS surface.

mod common;

use common::*;
use starling_lib::model::Visibility;
use starling_lib::store::Store;
use starling_lib::{rss, users, ErrorKind, GLOBALS};

#[tokio::test]
async fn test_signup_locale_propagates() {
    let _ = world();
    let (account, user) = users::create_user_account("locale_be", "be", None)
        .await
        .unwrap();
    assert_eq!(account.settings.unwrap().language, "be");
    assert_eq!(user.locale, "be");
}

#[tokio::test]
async fn test_signup_locale_instance_fallback() {
    let _ = world();
    {
        let mut settings = GLOBALS.settings.write();
        settings.instance_languages = vec!["nl".to_owned(), "en-gb".to_owned()];
    }
    let (account, user) = users::create_user_account("locale_nl", "", None)
        .await
        .unwrap();
    assert_eq!(account.settings.unwrap().language, "nl");
    assert_eq!(user.locale, "nl");

    {
        let mut settings = GLOBALS.settings.write();
        settings.instance_languages = Vec::new();
    }
    let (account, user) = users::create_user_account("locale_en", "", None)
        .await
        .unwrap();
    assert_eq!(account.settings.unwrap().language, "en");
    assert_eq!(user.locale, "en");
}

#[tokio::test]
async fn test_rss_feed_requires_enabled_local_account() {
    let _ = world();
    let account = local_user("rss_off").await;
    let _ = account;
    let err = rss::account_feed_xml("rss_off").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = rss::account_feed_xml("rss_nobody").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_rss_feed_contains_public_statuses_only() {
    let _ = world();
    let mut account = local_user("rss_on").await;
    if let Some(settings) = &mut account.settings {
        settings.rss_enabled = true;
    }
    store().update_account(&account).await.unwrap();

    let public = status_by(&account, Visibility::Public, "<p>public words</p>").await;
    let private = status_by(&account, Visibility::FollowersOnly, "<p>secret words</p>").await;
    let _ = (public, private);

    let xml = rss::account_feed_xml("rss_on").await.unwrap();
    assert!(xml.contains("public words"));
    assert!(!xml.contains("secret words"));
    assert!(xml.contains("@rss_on@localhost"));
    // RSS author wants an email address; we have none, so no author tag.
    assert!(!xml.contains("<author>"));
}

#[tokio::test]
async fn test_rss_title_uses_content_warning() {
    let _ = world();
    let mut account = local_user("rss_cw").await;
    if let Some(settings) = &mut account.settings {
        settings.rss_enabled = true;
    }
    store().update_account(&account).await.unwrap();

    let mut status = status_by(&account, Visibility::Public, "<p>body under the fold</p>").await;
    status.content_warning = "the warning".to_owned();
    store().update_status(&status).await.unwrap();

    let xml = rss::account_feed_xml("rss_cw").await.unwrap();
    assert!(xml.contains("<title>the warning</title>"));
}

#[tokio::test]
async fn test_robots_surface() {
    let _ = world();
    let (body, etag) = starling_lib::robots::robots_txt();
    assert!(body.contains("Disallow: /api/"));
    assert!(etag.starts_with('"'));

    GLOBALS.settings.write().robots_deny_nodeinfo = true;
    let (body2, etag2) = starling_lib::robots::robots_txt();
    assert!(body2.contains("Disallow: /nodeinfo/"));
    assert_ne!(etag, etag2);
    GLOBALS.settings.write().robots_deny_nodeinfo = false;
}
