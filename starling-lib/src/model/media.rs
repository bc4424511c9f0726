use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Gif,
    Audio,
    #[default]
    Unknown,
}

impl MediaType {
    /// Guess from a content type such as "image/png"
    pub fn from_content_type(ct: &str) -> MediaType {
        let parsed: mime::Mime = match ct.parse() {
            Ok(m) => m,
            Err(_) => return MediaType::Unknown,
        };
        match (parsed.type_(), parsed.subtype()) {
            (mime::IMAGE, mime::GIF) => MediaType::Gif,
            (mime::IMAGE, _) => MediaType::Image,
            (mime::VIDEO, _) => MediaType::Video,
            (mime::AUDIO, _) => MediaType::Audio,
            _ => MediaType::Unknown,
        }
    }
}


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub original: Dimensions,
    pub small: Option<Dimensions>,
}

/// A media file belonging to a status or an account (avatar, header).
///
/// `cached=true` means bytes are present at `storage_path`. The transition
/// to `false` is eventually consistent: the cleaner may race a reader, and
/// the reader recaches via the dereferencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: Id,
    pub account_id: Id,
    pub status_id: Option<Id>,
    /// Where the original lives on the remote instance. None for local media.
    pub remote_url: Option<String>,
    pub storage_path: String,
    pub thumbnail_path: String,
    pub content_type: String,
    pub file_size: u64,
    pub file_meta: FileMeta,
    pub description: String,
    pub media_type: MediaType,
    pub cached: bool,
    pub created_at: DateTime<Utc>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl MediaAttachment {
    pub fn is_remote(&self) -> bool {
        self.remote_url.is_some()
    }
}
