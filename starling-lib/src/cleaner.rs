//! Uncaching of remote artefact bytes. The store row survives with
//! `cached=false`; the dereferencer recaches on the next read. This may
//! race a reader, which is fine: readers re-check under single-flight.

use crate::blobs;
use crate::error::Error;
use crate::globals::GLOBALS;
use chrono::{DateTime, Utc};

pub struct Cleaner {}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner {
    pub(crate) fn new() -> Cleaner {
        Cleaner {}
    }

    /// Remove the locally cached bytes of remote attachments and emoji
    /// untouched since `older_than`. Returns how many artefacts were
    /// uncached; a second identical run returns zero.
    pub async fn uncache_remote(&self, older_than: DateTime<Utc>) -> Result<usize, Error> {
        let store = GLOBALS.store();
        let mut count: usize = 0;

        let attachments = store.get_cached_attachments_older_than(older_than, 0).await?;
        for mut attachment in attachments {
            blobs::delete(&attachment.storage_path).await;
            blobs::delete(&attachment.thumbnail_path).await;
            attachment.cached = false;
            store.update_attachment(&attachment).await?;
            count += 1;
        }

        let emojis = store.get_cached_emojis_older_than(older_than, 0).await?;
        for mut emoji in emojis {
            blobs::delete(&emoji.image_path).await;
            blobs::delete(&emoji.image_static_path).await;
            emoji.cached = false;
            store.update_emoji(&emoji).await?;
            count += 1;
        }

        if count > 0 {
            tracing::info!("uncached {count} remote artefacts");
        }
        Ok(count)
    }
}
