//! RSS rendering of a local account's recent public statuses. Bound to
//! the same visibility stack as the timelines: only what an anonymous
//! viewer could see makes it into the feed.

use crate::error::{Error, ErrorKind};
use crate::filter::public_timelineable;
use crate::globals::GLOBALS;
use crate::model::Status;
use crate::store::Page;
use html_escape::encode_text;

const TITLE_RUNES: usize = 128;
const DESCRIPTION_RUNES: usize = 256;

/// Drop HTML tags, keeping text content.
fn strip_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;
    for c in content.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_owned()
}

fn truncate_runes(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}…")
}

fn item_title(status: &Status) -> String {
    if !status.content_warning.is_empty() {
        return status.content_warning.clone();
    }
    truncate_runes(&strip_html(&status.content), TITLE_RUNES)
}

fn item_description(handle: &str, status: &Status) -> String {
    let text = truncate_runes(&strip_html(&status.content), DESCRIPTION_RUNES);
    format!("{handle} posted: \"{text}\"")
}

/// Render the RSS feed for a local account, newest first. Errors with
/// `NotFound` when the account has no feed to serve (missing, remote, or
/// RSS disabled) so the HTTP layer maps it straight to 404.
pub async fn account_feed_xml(username: &str) -> Result<String, Error> {
    let store = GLOBALS.store();

    let account = store.get_account_by_username_domain(username, "").await?;
    let rss_enabled = account
        .settings
        .as_ref()
        .map(|s| s.rss_enabled)
        .unwrap_or(false);
    if !rss_enabled {
        return Err(ErrorKind::NotFound.into());
    }

    let (host, feed_length) = {
        let settings = GLOBALS.settings.read();
        (settings.instance_host.clone(), settings.rss_feed_length)
    };
    let handle = format!("@{}@{}", account.username, host);

    let candidates = store
        .get_account_statuses(account.id, Page::first(feed_length * 4))
        .await?;

    let mut items = String::new();
    let mut included = 0;
    for status in &candidates {
        if included == feed_length {
            break;
        }
        // Anonymous public visibility gates the feed.
        match public_timelineable(None, status).await {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                tracing::error!("rss: visibility check failed: {e}");
                continue;
            }
        }
        included += 1;

        items.push_str(&format!(
            concat!(
                "    <item>\n",
                "      <title>{title}</title>\n",
                "      <link>{link}</link>\n",
                "      <guid isPermaLink=\"true\">{link}</guid>\n",
                "      <pubDate>{date}</pubDate>\n",
                "      <description>{description}</description>\n",
                "    </item>\n",
            ),
            title = encode_text(&item_title(status)),
            link = encode_text(&status.uri),
            date = status.created_at.to_rfc2822(),
            description = encode_text(&item_description(&handle, status)),
        ));
        // RSS requires an email in <author>; we have none, so the field
        // stays absent.
    }

    Ok(format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<rss version=\"2.0\">\n",
            "  <channel>\n",
            "    <title>Posts from {handle}</title>\n",
            "    <link>{link}</link>\n",
            "    <description>Public posts from {handle}</description>\n",
            "{items}",
            "  </channel>\n",
            "</rss>\n",
        ),
        handle = encode_text(&handle),
        link = encode_text(&account.uri),
        items = items,
    ))
}
