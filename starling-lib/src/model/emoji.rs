use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A custom emoji. `(shortcode, domain)` is unique; empty domain means
/// the emoji is local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    pub id: Id,
    pub shortcode: String,
    pub domain: String,
    pub uri: String,
    pub image_remote_url: Option<String>,
    pub image_static_remote_url: Option<String>,
    pub image_path: String,
    pub image_static_path: String,
    pub image_content_type: String,
    pub image_file_size: u64,
    /// Disabled by an admin; excluded from pickers but still rendered.
    pub disabled: bool,
    pub cached: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Emoji {
    pub fn is_local(&self) -> bool {
        self.domain.is_empty()
    }
}

/// Fresh remote references for an emoji, carried alongside a dereference
/// request. Any difference against the stored emoji forces a refresh.
#[derive(Debug, Clone, Default)]
pub struct EmojiRefs {
    pub uri: Option<String>,
    pub image_remote_url: Option<String>,
    pub image_static_remote_url: Option<String>,
}

impl EmojiRefs {
    /// True if any provided reference differs from what is stored
    pub fn differs_from(&self, emoji: &Emoji) -> bool {
        if let Some(uri) = &self.uri {
            if *uri != emoji.uri {
                return true;
            }
        }
        if let Some(url) = &self.image_remote_url {
            if Some(url) != emoji.image_remote_url.as_ref() {
                return true;
            }
        }
        if let Some(url) = &self.image_static_remote_url {
            if Some(url) != emoji.image_static_remote_url.as_ref() {
                return true;
            }
        }
        false
    }
}
