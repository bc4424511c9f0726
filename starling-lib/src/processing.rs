//! Artefact processors: one outstanding fetch+persist operation per emoji
//! or media attachment, constructed by the dereferencer and shared between
//! every caller interested in the result.
//!
//! Image transcoding is an external concern; the processor persists the
//! fetched bytes as both original and static/thumbnail representations
//! and records their metadata.

use crate::blobs;
use crate::error::{Error, ErrorKind};
use crate::globals::GLOBALS;
use crate::model::{Emoji, MediaAttachment, MediaType};
use chrono::Utc;
use futures::future::BoxFuture;
use sha2::Digest;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// The fetch strategy: produces the remote bytes exactly once.
pub type DataFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<Vec<u8>, Error>> + Send>;

/// What the processor does with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtefactOp {
    /// First sighting; insert a new row.
    Create,
    /// Known artefact with changed remote references; update the row.
    Update,
    /// Known artefact evicted from byte storage; restore bytes, keep paths.
    Recache,
}

/// Content-type hint and size ceiling for one fetch.
#[derive(Debug, Clone, Default)]
pub struct ArtefactInfo {
    pub content_type_hint: Option<String>,
}

/// Guess a content type from the file extension of a remote URL.
fn url_content_type(s: &str) -> Option<&'static str> {
    let lower = s.to_lowercase();
    let lower = lower.split('?').next().unwrap_or(&lower);
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        Some("image/jpeg")
    } else if lower.ends_with(".png") {
        Some("image/png")
    } else if lower.ends_with(".gif") {
        Some("image/gif")
    } else if lower.ends_with(".webp") {
        Some("image/webp")
    } else if lower.ends_with(".svg") {
        Some("image/svg+xml")
    } else if lower.ends_with(".mp4") {
        Some("video/mp4")
    } else if lower.ends_with(".webm") {
        Some("video/webm")
    } else if lower.ends_with(".mov") {
        Some("video/quicktime")
    } else if lower.ends_with(".mp3") {
        Some("audio/mpeg")
    } else if lower.ends_with(".ogg") {
        Some("audio/ogg")
    } else if lower.ends_with(".flac") {
        Some("audio/flac")
    } else {
        None
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpeg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        _ => "bin",
    }
}

/// Media files are stored under a name derived from their remote URL, so
/// re-dereferencing the same remote bytes lands on the same path.
fn media_storage_name(media: &MediaAttachment) -> String {
    match &media.remote_url {
        Some(url) => {
            let mut hasher = sha2::Sha256::new();
            hasher.update(url.as_bytes());
            hex::encode(hasher.finalize())
        }
        None => media.id.to_string(),
    }
}

fn resolve_content_type(remote_url: Option<&str>, hint: Option<&str>) -> String {
    if let Some(hint) = hint {
        if !hint.is_empty() {
            return hint.to_owned();
        }
    }
    remote_url
        .and_then(url_content_type)
        .unwrap_or("application/octet-stream")
        .to_owned()
}

// ---------------------------------------------------------------------
// Emoji

struct EmojiInner {
    placeholder: Emoji,
    op: ArtefactOp,
    info: ArtefactInfo,
    data_fn: std::sync::Mutex<Option<DataFn>>,
    started: AtomicBool,
    tx: watch::Sender<Option<(Emoji, Option<Error>)>>,
}

/// One outstanding emoji fetch+persist.
#[derive(Clone)]
pub struct ProcessingEmoji {
    inner: Arc<EmojiInner>,
}

impl ProcessingEmoji {
    /// A valid-but-unloaded emoji usable as a forward placeholder.
    pub fn placeholder(&self) -> Emoji {
        self.inner.placeholder.clone()
    }

    /// Complete processing, or wait on the run already in progress.
    /// Returns the entity and, independently, any error: a failed load
    /// still hands back the placeholder.
    pub async fn load(&self) -> (Emoji, Option<Error>) {
        if !self.inner.started.swap(true, Ordering::AcqRel) {
            let result = self.process().await;
            let pair = match result {
                Ok(emoji) => (emoji, None),
                Err(e) => (self.placeholder(), Some(e)),
            };
            let _ = self.inner.tx.send(Some(pair.clone()));
            return pair;
        }
        self.wait().await
    }

    /// Like `load`, but runs on a detached task: if the caller is
    /// cancelled (future dropped) the fetch continues and still lands
    /// in the store.
    pub async fn must_load(&self) -> (Emoji, Option<Error>) {
        if !self.inner.started.load(Ordering::Acquire) {
            let this = self.clone();
            tokio::spawn(async move {
                let _ = this.load().await;
            });
        }
        self.wait().await
    }

    async fn wait(&self) -> (Emoji, Option<Error>) {
        let mut rx = self.inner.tx.subscribe();
        loop {
            if let Some(pair) = rx.borrow_and_update().clone() {
                return pair;
            }
            if rx.changed().await.is_err() {
                return (
                    self.placeholder(),
                    Some(ErrorKind::Internal("emoji processor dropped".to_owned()).into()),
                );
            }
        }
    }

    async fn process(&self) -> Result<Emoji, Error> {
        let mut emoji = self.placeholder();
        let max_bytes = GLOBALS.settings.read().emoji_max_bytes;

        let data_fn = self
            .inner
            .data_fn
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
            .ok_or_else(|| ErrorKind::Internal("emoji data fn already taken".to_owned()))?;

        let bytes = data_fn().await?;
        if bytes.len() as u64 > max_bytes {
            return Err(ErrorKind::SizeLimit { limit: max_bytes }.into());
        }

        let content_type = resolve_content_type(
            emoji.image_remote_url.as_deref(),
            self.inner.info.content_type_hint.as_deref(),
        );
        let ext = extension_for(&content_type);

        if self.inner.op != ArtefactOp::Recache {
            emoji.image_path = format!("emoji/original/{}.{}", emoji.id, ext);
            emoji.image_static_path = format!("emoji/static/{}.png", emoji.id);
        }

        blobs::put(&emoji.image_path, &bytes).await?;
        blobs::put(&emoji.image_static_path, &bytes).await?;

        emoji.image_content_type = content_type;
        emoji.image_file_size = bytes.len() as u64;
        emoji.cached = true;
        emoji.updated_at = Utc::now();

        match self.inner.op {
            ArtefactOp::Create => GLOBALS.store().put_emoji(&emoji).await?,
            ArtefactOp::Update | ArtefactOp::Recache => {
                GLOBALS.store().update_emoji(&emoji).await?
            }
        }

        tracing::debug!(
            "cached emoji :{}: from {} ({} bytes)",
            emoji.shortcode,
            emoji.domain,
            emoji.image_file_size,
        );

        Ok(emoji)
    }
}

// ---------------------------------------------------------------------
// Media attachments

struct MediaInner {
    placeholder: MediaAttachment,
    op: ArtefactOp,
    info: ArtefactInfo,
    data_fn: std::sync::Mutex<Option<DataFn>>,
    started: AtomicBool,
    tx: watch::Sender<Option<(MediaAttachment, Option<Error>)>>,
}

/// One outstanding media attachment fetch+persist.
#[derive(Clone)]
pub struct ProcessingMedia {
    inner: Arc<MediaInner>,
}

impl ProcessingMedia {
    pub fn placeholder(&self) -> MediaAttachment {
        self.inner.placeholder.clone()
    }

    pub async fn load(&self) -> (MediaAttachment, Option<Error>) {
        if !self.inner.started.swap(true, Ordering::AcqRel) {
            let result = self.process().await;
            let pair = match result {
                Ok(media) => (media, None),
                Err(e) => (self.placeholder(), Some(e)),
            };
            let _ = self.inner.tx.send(Some(pair.clone()));
            return pair;
        }
        self.wait().await
    }

    pub async fn must_load(&self) -> (MediaAttachment, Option<Error>) {
        if !self.inner.started.load(Ordering::Acquire) {
            let this = self.clone();
            tokio::spawn(async move {
                let _ = this.load().await;
            });
        }
        self.wait().await
    }

    async fn wait(&self) -> (MediaAttachment, Option<Error>) {
        let mut rx = self.inner.tx.subscribe();
        loop {
            if let Some(pair) = rx.borrow_and_update().clone() {
                return pair;
            }
            if rx.changed().await.is_err() {
                return (
                    self.placeholder(),
                    Some(ErrorKind::Internal("media processor dropped".to_owned()).into()),
                );
            }
        }
    }

    async fn process(&self) -> Result<MediaAttachment, Error> {
        let mut media = self.placeholder();
        let max_bytes = GLOBALS.settings.read().media_max_bytes;

        let data_fn = self
            .inner
            .data_fn
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
            .ok_or_else(|| ErrorKind::Internal("media data fn already taken".to_owned()))?;

        let bytes = data_fn().await?;
        if bytes.len() as u64 > max_bytes {
            return Err(ErrorKind::SizeLimit { limit: max_bytes }.into());
        }

        let content_type = resolve_content_type(
            media.remote_url.as_deref(),
            self.inner.info.content_type_hint.as_deref(),
        );
        let ext = extension_for(&content_type);

        if self.inner.op != ArtefactOp::Recache {
            let name = media_storage_name(&media);
            media.storage_path = format!("attachment/original/{name}.{ext}");
            media.thumbnail_path = format!("attachment/small/{name}.{ext}");
        }

        blobs::put(&media.storage_path, &bytes).await?;
        blobs::put(&media.thumbnail_path, &bytes).await?;

        media.content_type = content_type.clone();
        media.media_type = MediaType::from_content_type(&content_type);
        media.file_size = bytes.len() as u64;
        media.cached = true;
        media.fetched_at = Some(Utc::now());

        match self.inner.op {
            ArtefactOp::Create => GLOBALS.store().put_attachment(&media).await?,
            ArtefactOp::Update | ArtefactOp::Recache => {
                GLOBALS.store().update_attachment(&media).await?
            }
        }

        tracing::debug!(
            "cached media {} ({}, {} bytes)",
            media.id,
            media.content_type,
            media.file_size,
        );

        Ok(media)
    }
}

// ---------------------------------------------------------------------

/// Constructs artefact processors. One per process, owned by GLOBALS.
pub struct Manager {}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    pub(crate) fn new() -> Manager {
        Manager {}
    }

    fn emoji(
        &self,
        placeholder: Emoji,
        op: ArtefactOp,
        info: ArtefactInfo,
        data_fn: DataFn,
    ) -> ProcessingEmoji {
        let (tx, _) = watch::channel(None);
        ProcessingEmoji {
            inner: Arc::new(EmojiInner {
                placeholder,
                op,
                info,
                data_fn: std::sync::Mutex::new(Some(data_fn)),
                started: AtomicBool::new(false),
                tx,
            }),
        }
    }

    fn media(
        &self,
        placeholder: MediaAttachment,
        op: ArtefactOp,
        info: ArtefactInfo,
        data_fn: DataFn,
    ) -> ProcessingMedia {
        let (tx, _) = watch::channel(None);
        ProcessingMedia {
            inner: Arc::new(MediaInner {
                placeholder,
                op,
                info,
                data_fn: std::sync::Mutex::new(Some(data_fn)),
                started: AtomicBool::new(false),
                tx,
            }),
        }
    }

    pub fn create_emoji(&self, placeholder: Emoji, info: ArtefactInfo, data_fn: DataFn) -> ProcessingEmoji {
        self.emoji(placeholder, ArtefactOp::Create, info, data_fn)
    }

    pub fn update_emoji(&self, placeholder: Emoji, info: ArtefactInfo, data_fn: DataFn) -> ProcessingEmoji {
        self.emoji(placeholder, ArtefactOp::Update, info, data_fn)
    }

    pub fn recache_emoji(&self, placeholder: Emoji, data_fn: DataFn) -> ProcessingEmoji {
        self.emoji(placeholder, ArtefactOp::Recache, ArtefactInfo::default(), data_fn)
    }

    pub fn create_media(&self, placeholder: MediaAttachment, info: ArtefactInfo, data_fn: DataFn) -> ProcessingMedia {
        self.media(placeholder, ArtefactOp::Create, info, data_fn)
    }

    pub fn recache_media(&self, placeholder: MediaAttachment, data_fn: DataFn) -> ProcessingMedia {
        self.media(placeholder, ArtefactOp::Recache, ArtefactInfo::default(), data_fn)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_url_content_type() {
        assert_eq!(url_content_type("https://x.example/a/blob.PNG"), Some("image/png"));
        assert_eq!(
            url_content_type("https://x.example/a.webp?sig=abc"),
            Some("image/webp")
        );
        assert_eq!(url_content_type("https://x.example/noext"), None);
    }

    #[test]
    fn test_resolve_content_type_prefers_hint() {
        assert_eq!(
            resolve_content_type(Some("https://x.example/a.png"), Some("image/gif")),
            "image/gif"
        );
        assert_eq!(
            resolve_content_type(Some("https://x.example/a.png"), None),
            "image/png"
        );
        assert_eq!(
            resolve_content_type(Some("https://x.example/mystery"), None),
            "application/octet-stream"
        );
    }
}
