use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hashtag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    /// Normalised (lowercased) name without the leading '#'.
    pub name: String,
    /// False when an admin has disabled surfacing for this tag.
    pub useable: bool,
    pub listable: bool,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            id: Id::gen(),
            name: name.to_lowercase(),
            useable: true,
            listable: true,
            created_at: Utc::now(),
        }
    }
}
