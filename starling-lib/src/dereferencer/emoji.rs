use super::{Dereferenced, Dereferencer};
use crate::domain::punify;
use crate::error::{Error, ErrorKind};
use crate::globals::GLOBALS;
use crate::model::{Emoji, EmojiRefs, Id};
use crate::processing::{ArtefactInfo, DataFn, ProcessingEmoji};
use crate::single_flight::FlightGuard;
use chrono::Utc;
use url::Url;

fn flight_key(shortcode: &str, domain: &str) -> String {
    format!("{shortcode}@{domain}")
}

/// Build the fetch strategy for one emoji image.
fn emoji_data_fn(remote_url: Url) -> DataFn {
    Box::new(move || {
        Box::pin(async move {
            let transport = GLOBALS
                .transport_controller()
                .transport_for_username("")
                .await?;
            let max_bytes = GLOBALS.settings.read().emoji_max_bytes;
            transport.dereference_media(&remote_url, max_bytes).await
        })
    })
}

impl Dereferencer {
    /// Get an emoji by `(shortcode, domain)`, dereferencing it if we have
    /// never seen it. With `background` set the caller receives a
    /// placeholder immediately and processing continues on the worker
    /// queue; otherwise the call blocks on the fetch, and caller
    /// cancellation detaches the work rather than aborting it.
    pub async fn get_emoji(
        &self,
        shortcode: &str,
        domain: &str,
        remote_url: Option<&str>,
        refs: EmojiRefs,
        refresh: bool,
        background: bool,
    ) -> Dereferenced<Emoji> {
        // An empty domain means local; punify only remote domains.
        let domain = if domain.is_empty() {
            String::new()
        } else {
            match punify(domain) {
                Ok(d) => d,
                Err(e) => return Dereferenced::Failed(e),
            }
        };

        match GLOBALS
            .store()
            .get_emoji_by_shortcode_domain(shortcode, &domain)
            .await
        {
            Ok(Some(emoji)) => {
                return self.refresh_emoji(emoji, refs, refresh, background).await;
            }
            Ok(None) => {}
            Err(e) => return Dereferenced::Failed(e),
        }

        // A local emoji that is not in the store does not exist and
        // cannot be fetched from anywhere.
        if domain.is_empty() {
            return Dereferenced::Failed(ErrorKind::Unretrievable.into());
        }

        let Some(remote_url) = remote_url else {
            return Dereferenced::Failed(
                ErrorKind::InvalidInput(format!("no remote url for :{shortcode}:@{domain}"))
                    .into(),
            );
        };

        let key = flight_key(shortcode, &domain);
        let (flight, guard) = self.emoji_flights.acquire(&key);
        let Some(guard) = guard else {
            return match flight.wait().await {
                Ok(outcome) => outcome,
                Err(e) => Dereferenced::Failed(e),
            };
        };

        // Re-lookup under the flight: the leader may have lost a race
        // against a flight that just resolved. Release the key before
        // refreshing, which takes a flight of its own.
        match GLOBALS
            .store()
            .get_emoji_by_shortcode_domain(shortcode, &domain)
            .await
        {
            Ok(Some(emoji)) => {
                guard.resolve(Ok(Dereferenced::Full(emoji.clone())));
                return self.refresh_emoji(emoji, refs, refresh, background).await;
            }
            Ok(None) => {}
            Err(e) => {
                guard.resolve(Err(e.clone()));
                return Dereferenced::Failed(e);
            }
        }

        let parsed = match Url::parse(remote_url) {
            Ok(u) => u,
            Err(e) => {
                let err: Error = ErrorKind::from(e).into();
                guard.resolve(Err(err.clone()));
                return Dereferenced::Failed(err);
            }
        };

        let now = Utc::now();
        let placeholder = Emoji {
            id: Id::gen(),
            shortcode: shortcode.to_owned(),
            domain: domain.clone(),
            uri: refs.uri.clone().unwrap_or_else(|| remote_url.to_owned()),
            image_remote_url: Some(remote_url.to_owned()),
            image_static_remote_url: refs.image_static_remote_url.clone(),
            image_path: String::new(),
            image_static_path: String::new(),
            image_content_type: String::new(),
            image_file_size: 0,
            disabled: false,
            cached: false,
            created_at: now,
            updated_at: now,
        };

        let processor = GLOBALS.media_manager.create_emoji(
            placeholder,
            ArtefactInfo::default(),
            emoji_data_fn(parsed),
        );

        self.finish_emoji(processor, guard, flight, background).await
    }

    /// Refresh a known emoji. `force` is implied when any reference in
    /// `refs` differs from what is stored.
    pub async fn refresh_emoji(
        &self,
        emoji: Emoji,
        refs: EmojiRefs,
        force: bool,
        background: bool,
    ) -> Dereferenced<Emoji> {
        if emoji.is_local() {
            return Dereferenced::Full(emoji);
        }

        let force = force || refs.differs_from(&emoji);
        if !force && emoji.cached {
            return Dereferenced::Full(emoji);
        }

        let key = flight_key(&emoji.shortcode, &emoji.domain);
        let (flight, guard) = self.emoji_flights.acquire(&key);
        let Some(guard) = guard else {
            return match flight.wait().await {
                Ok(outcome) => outcome,
                Err(e) => Dereferenced::Failed(e),
            };
        };

        // Work from the freshest copy under the flight.
        let fresh = match GLOBALS
            .store()
            .get_emoji_by_shortcode_domain(&emoji.shortcode, &emoji.domain)
            .await
        {
            Ok(Some(fresh)) => fresh,
            Ok(None) => emoji.clone(),
            Err(e) => {
                guard.resolve(Err(e.clone()));
                return Dereferenced::Failed(e);
            }
        };

        let force = force || refs.differs_from(&fresh);
        if !force && fresh.cached {
            guard.resolve(Ok(Dereferenced::Full(fresh.clone())));
            return Dereferenced::Full(fresh);
        }

        let mut updated = fresh;
        if let Some(uri) = &refs.uri {
            updated.uri = uri.clone();
        }
        if let Some(url) = &refs.image_remote_url {
            updated.image_remote_url = Some(url.clone());
        }
        if let Some(url) = &refs.image_static_remote_url {
            updated.image_static_remote_url = Some(url.clone());
        }
        updated.cached = false;

        let Some(remote) = updated.image_remote_url.clone() else {
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

        let processor = GLOBALS.media_manager.update_emoji(
            updated,
            ArtefactInfo::default(),
            emoji_data_fn(parsed),
        );

        self.finish_emoji(processor, guard, flight, background).await
    }

    /// Restore the bytes of an emoji evicted from storage. No-op when the
    /// emoji is still cached.
    pub async fn recache_emoji(&self, emoji: Emoji, background: bool) -> Dereferenced<Emoji> {
        if emoji.cached {
            return Dereferenced::Full(emoji);
        }

        let key = flight_key(&emoji.shortcode, &emoji.domain);
        let (flight, guard) = self.emoji_flights.acquire(&key);
        let Some(guard) = guard else {
            return match flight.wait().await {
                Ok(outcome) => outcome,
                Err(e) => Dereferenced::Failed(e),
            };
        };

        // The evictor may have raced us; re-check under the flight.
        let fresh = match GLOBALS.store().get_emoji_by_id(emoji.id).await {
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

        let Some(remote) = fresh.image_remote_url.clone() else {
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
            .recache_emoji(fresh, emoji_data_fn(parsed));

        self.finish_emoji(processor, guard, flight, background).await
    }

    /// Common tail: run the processor in the background or synchronously,
    /// resolving the flight when the result is observable. The processing
    /// task owns the guard, so a cancelled synchronous caller observes
    /// only its own cancellation while the fetch still lands.
    async fn finish_emoji(
        &self,
        processor: ProcessingEmoji,
        guard: FlightGuard<Dereferenced<Emoji>>,
        flight: std::sync::Arc<crate::single_flight::Flight<Dereferenced<Emoji>>>,
        background: bool,
    ) -> Dereferenced<Emoji> {
        let placeholder = processor.placeholder();

        let job = async move {
            let (emoji, err) = processor.load().await;
            if let Some(e) = &err {
                tracing::debug!("emoji dereference failed: {e}");
            }
            guard.resolve(Ok(Dereferenced::from_parts(emoji, err)));
        };

        if background {
            if let Err(e) = GLOBALS.workers.enqueue(job).await {
                // Dropping the job drops the guard, failing the flight.
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
