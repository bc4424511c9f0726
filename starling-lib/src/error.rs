use crate::model::Id;

/// Error kinds that can occur in starling-lib
///
/// Kinds are `Clone` because single-flight followers observe the leader's
/// failure, and artefact processors hand the same error to every waiter.
/// Wrapped source errors are therefore carried as rendered strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity absent.
    NotFound,
    /// Entity absent and known to be un-fetchable (local object missing
    /// from the store, or a remote past its retries).
    Unretrievable,
    /// Unique-key conflict. Idempotent write paths treat this as success.
    AlreadyExists,
    /// Bad URI, malformed domain, bad ULID, bad paging input.
    InvalidInput(String),
    /// A block is in effect, or the requester is suspended.
    Forbidden,
    /// The requester deleted itself or presented an invalid signature.
    Unauthorised,
    /// Artefact exceeds the configured size ceiling.
    SizeLimit { limit: u64 },
    /// Network failure fetching a remote artefact.
    Transport(String),
    /// Store or conversion failure.
    Internal(String),
    /// The parent of a status has not been dereferenced yet; retry after
    /// it has. Never cached, never surfaced past the mute loader.
    ParentNotDereferenced(Id),
    /// The process is shutting down; queues no longer accept work.
    ShuttingDown,
    /// Worker queue is not running.
    QueueClosed,
    BadDomain(String),
    Io(String),
    SerdeJson(String),
    Regex(String),
    UrlParse(String),
    General(String),
}

/// Errors that can occur in starling-lib, optionally including a file and
/// line number where they were generated
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorKind::*;
        if let Some(file) = self.file {
            write!(f, "{file}:")?;
        }
        if let Some(line) = self.line {
            write!(f, "{line}:")?;
        }
        match &self.kind {
            NotFound => write!(f, "Not found"),
            Unretrievable => write!(f, "Not retrievable"),
            AlreadyExists => write!(f, "Already exists"),
            InvalidInput(s) => write!(f, "Invalid input: {s}"),
            Forbidden => write!(f, "Forbidden"),
            Unauthorised => write!(f, "Unauthorised"),
            SizeLimit { limit } => write!(f, "Size limit of {limit} bytes exceeded"),
            Transport(s) => write!(f, "Transport: {s}"),
            Internal(s) => write!(f, "INTERNAL: {s}"),
            ParentNotDereferenced(id) => {
                write!(f, "Parent status {id} not yet dereferenced, retry later")
            }
            ShuttingDown => write!(f, "Shutting down"),
            QueueClosed => write!(f, "Worker queue is closed"),
            BadDomain(s) => write!(f, "Bad domain: {s}"),
            Io(s) => write!(f, "I/O error: {s}"),
            SerdeJson(s) => write!(f, "JSON error: {s}"),
            Regex(s) => write!(f, "Regex error: {s}"),
            UrlParse(s) => write!(f, "URL parse error: {s}"),
            General(s) => write!(f, "{s}"),
        }
    }
}

impl Error {
    /// True for kinds that idempotent write paths swallow.
    pub fn is_already_exists(&self) -> bool {
        matches!(self.kind, ErrorKind::AlreadyExists)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }
}

impl<E> From<(E, &'static str, u32)> for Error
where
    ErrorKind: From<E>,
{
    fn from(triplet: (E, &'static str, u32)) -> Error {
        Error {
            kind: triplet.0.into(),
            file: Some(triplet.1),
            line: Some(triplet.2),
        }
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(intoek: E) -> Error {
        Error {
            kind: intoek.into(),
            file: None,
            line: None,
        }
    }
}

impl From<String> for ErrorKind {
    fn from(s: String) -> ErrorKind {
        ErrorKind::General(s)
    }
}

impl From<&str> for ErrorKind {
    fn from(s: &str) -> ErrorKind {
        ErrorKind::General(s.to_string())
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(e: std::io::Error) -> ErrorKind {
        ErrorKind::Io(format!("{e}"))
    }
}

impl From<reqwest::Error> for ErrorKind {
    fn from(e: reqwest::Error) -> ErrorKind {
        ErrorKind::Transport(format!("{e}"))
    }
}

impl From<serde_json::Error> for ErrorKind {
    fn from(e: serde_json::Error) -> ErrorKind {
        ErrorKind::SerdeJson(format!("{e}"))
    }
}

impl From<regex::Error> for ErrorKind {
    fn from(e: regex::Error) -> ErrorKind {
        ErrorKind::Regex(format!("{e}"))
    }
}

impl From<url::ParseError> for ErrorKind {
    fn from(e: url::ParseError) -> ErrorKind {
        ErrorKind::UrlParse(format!("{e}"))
    }
}

impl From<ulid::DecodeError> for ErrorKind {
    fn from(e: ulid::DecodeError) -> ErrorKind {
        ErrorKind::InvalidInput(format!("bad ulid: {e}"))
    }
}

impl From<tokio::task::JoinError> for ErrorKind {
    fn from(e: tokio::task::JoinError) -> ErrorKind {
        ErrorKind::Internal(format!("task join: {e}"))
    }
}
