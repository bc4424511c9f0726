use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity ID. ULID-shaped: 26 characters, lexicographic order is also
/// creation-time order, which every timeline relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(ulid::Ulid);

impl Id {
    /// Generate a fresh ID
    pub fn gen() -> Id {
        Id(ulid::Ulid::new())
    }

    /// The zero ID, ordered before every generated one
    pub fn nil() -> Id {
        Id(ulid::Ulid::nil())
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id, Error> {
        Ok(Id(ulid::Ulid::from_str(s)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_id_ordering_follows_time() {
        let a = Id::gen();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = Id::gen();
        assert!(a < b);
        assert!(Id::nil() < a);
    }

    #[test]
    fn test_id_round_trip() {
        let a = Id::gen();
        let b: Id = a.to_string().parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bad_id_rejected() {
        assert!("not-a-ulid!".parse::<Id>().is_err());
    }
}
