use super::{Dereferenced, Dereferencer};
use crate::error::{Error, ErrorKind};
use crate::globals::GLOBALS;
use crate::model::{FileMeta, Id, MediaAttachment, MediaType};
use crate::processing::{ArtefactInfo, DataFn, ProcessingMedia};
use crate::single_flight::FlightGuard;
use chrono::Utc;
use url::Url;

/// Extra information for a media dereference, from the activity that
/// referenced it.
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    pub status_id: Option<Id>,
    pub description: String,
    pub content_type: Option<String>,
}

fn media_data_fn(requesting_username: String, remote_url: Url) -> DataFn {
    Box::new(move || {
        Box::pin(async move {
            let transport = GLOBALS
                .transport_controller()
                .transport_for_username(&requesting_username)
                .await?;
            let max_bytes = GLOBALS.settings.read().media_max_bytes;
            transport.dereference_media(&remote_url, max_bytes).await
        })
    })
}

impl Dereferencer {
    /// Dereference a remote media attachment for `account_id`, creating
    /// the attachment row. Concurrent calls for the same remote URL
    /// collapse into one fetch.
    pub async fn get_media(
        &self,
        requesting_username: &str,
        account_id: Id,
        remote_url: &str,
        info: MediaInfo,
        background: bool,
    ) -> Dereferenced<MediaAttachment> {
        let parsed = match Url::parse(remote_url) {
            Ok(u) => u,
            Err(e) => return Dereferenced::Failed(ErrorKind::from(e).into()),
        };

        let (flight, guard) = self.media_flights.acquire(remote_url);
        let Some(guard) = guard else {
            return match flight.wait().await {
                Ok(outcome) => outcome,
                Err(e) => Dereferenced::Failed(e),
            };
        };

        let placeholder = MediaAttachment {
            id: Id::gen(),
            account_id,
            status_id: info.status_id,
            remote_url: Some(remote_url.to_owned()),
            storage_path: String::new(),
            thumbnail_path: String::new(),
            content_type: String::new(),
            file_size: 0,
            file_meta: FileMeta::default(),
            description: info.description.clone(),
            media_type: MediaType::Unknown,
            cached: false,
            created_at: Utc::now(),
            fetched_at: None,
        };

        let processor = GLOBALS.media_manager.create_media(
            placeholder,
            ArtefactInfo {
                content_type_hint: info.content_type.clone(),
            },
            media_data_fn(requesting_username.to_owned(), parsed),
        );

        self.finish_media(processor, guard, flight, background).await
    }

    /// Restore the bytes of an attachment evicted from storage. No-op
    /// when still cached. The evictor may race a reader here, which is
    /// why the cached flag is re-checked under the flight.
    pub async fn recache_media(
        &self,
        requesting_username: &str,
        attachment: MediaAttachment,
        background: bool,
    ) -> Dereferenced<MediaAttachment> {
        if attachment.cached {
            return Dereferenced::Full(attachment);
        }

        let key = format!("recache:{}", attachment.id);
        let (flight, guard) = self.media_flights.acquire(&key);
        let Some(guard) = guard else {
            return match flight.wait().await {
                Ok(outcome) => outcome,
                Err(e) => Dereferenced::Failed(e),
            };
        };

        let fresh = match GLOBALS.store().get_attachment(attachment.id).await {
            Ok(fresh) => fresh,
            Err(e) => {
                guard.resolve(Err(e.clone()));
                return Dereferenced::Failed(e);
            }
        };
        if fresh.cached {
            guard.resolve(Ok(Dereferenced::Full(fresh.clone())));
            return Dereferenced::Full(fresh);
        }

        let Some(remote) = fresh.remote_url.clone() else {
            let err: Error = ErrorKind::Unretrievable.into();
            guard.resolve(Err(err.clone()));
            return Dereferenced::Failed(err);
        };
        let parsed = match Url::parse(&remote) {
            Ok(u) => u,
            Err(e) => {
                let err: Error = ErrorKind::from(e).into();
                guard.resolve(Err(err.clone()));
                return Dereferenced::Failed(err);
            }
        };

        let processor = GLOBALS
            .media_manager
            .recache_media(fresh, media_data_fn(requesting_username.to_owned(), parsed));

        self.finish_media(processor, guard, flight, background).await
    }

    async fn finish_media(
        &self,
        processor: ProcessingMedia,
        guard: FlightGuard<Dereferenced<MediaAttachment>>,
        flight: std::sync::Arc<crate::single_flight::Flight<Dereferenced<MediaAttachment>>>,
        background: bool,
    ) -> Dereferenced<MediaAttachment> {
        let placeholder = processor.placeholder();

        let job = async move {
            let (media, err) = processor.load().await;
            if let Some(e) = &err {
                tracing::debug!("media dereference failed: {e}");
            }
            guard.resolve(Ok(Dereferenced::from_parts(media, err)));
        };

        if background {
            if let Err(e) = GLOBALS.workers.enqueue(job).await {
                return Dereferenced::Failed(e);
            }
            return Dereferenced::Full(placeholder);
        }

        tokio::spawn(job);
        match flight.wait().await {
            Ok(outcome) => outcome,
            Err(e) => Dereferenced::Failed(e),
        }
    }
}
