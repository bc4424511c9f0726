//! Resolves references to remote artefacts (emoji, media attachments),
//! collapsing concurrent work per key with single-flight and deciding
//! between get-existing, refresh-if-stale, recache-if-evicted, and
//! fetch-new.

mod emoji;
mod media;
pub use media::MediaInfo;

use crate::error::Error;
use crate::model::{Emoji, MediaAttachment};
use crate::single_flight::FlightMap;

/// The outcome of a dereference. Entity and error are independent: a
/// failed or still-running load may hand back a placeholder entity that
/// is valid to reference but not yet (or never) cached.
#[derive(Debug, Clone)]
pub enum Dereferenced<T> {
    /// The entity, fully processed.
    Full(T),
    /// A placeholder plus the error that stopped processing.
    Partial(T, Error),
    /// Nothing usable.
    Failed(Error),
}

impl<T> Dereferenced<T> {
    pub fn from_parts(entity: T, error: Option<Error>) -> Dereferenced<T> {
        match error {
            None => Dereferenced::Full(entity),
            Some(e) => Dereferenced::Partial(entity, e),
        }
    }

    pub fn entity(&self) -> Option<&T> {
        match self {
            Dereferenced::Full(e) | Dereferenced::Partial(e, _) => Some(e),
            Dereferenced::Failed(_) => None,
        }
    }

    pub fn into_entity(self) -> Option<T> {
        match self {
            Dereferenced::Full(e) | Dereferenced::Partial(e, _) => Some(e),
            Dereferenced::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Dereferenced::Full(_) => None,
            Dereferenced::Partial(_, e) | Dereferenced::Failed(e) => Some(e),
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Dereferenced::Full(_))
    }
}

/// System that dereferences remote artefacts. One single-flight map per
/// artefact class; flights resolve to the same `Dereferenced` value every
/// caller observes.
pub struct Dereferencer {
    pub(crate) emoji_flights: FlightMap<Dereferenced<Emoji>>,
    pub(crate) media_flights: FlightMap<Dereferenced<MediaAttachment>>,
}

impl Default for Dereferencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dereferencer {
    pub(crate) fn new() -> Dereferencer {
        Dereferencer {
            emoji_flights: FlightMap::new(),
            media_flights: FlightMap::new(),
        }
    }

    /// Flights currently in progress, for diagnostics
    pub fn stats(&self) -> String {
        format!(
            "emoji in flight: {}, media in flight: {}",
            self.emoji_flights.in_flight(),
            self.media_flights.in_flight(),
        )
    }
}
