//! Remote fetch plumbing. The HTTP-signature layer is outside the core;
//! a transport arrives here already able to make authenticated requests
//! on behalf of one local username.

use crate::error::{Error, ErrorKind};
use crate::globals::GLOBALS;
use crate::USER_AGENT;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch remote media bytes. Reading past `max_bytes` aborts the
    /// request immediately and yields a size-limit error.
    async fn dereference_media(&self, url: &Url, max_bytes: u64) -> Result<Vec<u8>, Error>;
}

#[async_trait]
pub trait TransportController: Send + Sync {
    /// A transport signing as `username`'s key.
    async fn transport_for_username(&self, username: &str) -> Result<Arc<dyn Transport>, Error>;
}

/// reqwest-backed transport controller. Clients are built lazily per
/// username and reused; reqwest clients are internally reference-counted.
pub struct HttpTransportController {
    transports: DashMap<String, Arc<HttpTransport>>,
}

impl Default for HttpTransportController {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransportController {
    pub fn new() -> HttpTransportController {
        HttpTransportController {
            transports: DashMap::new(),
        }
    }
}

#[async_trait]
impl TransportController for HttpTransportController {
    async fn transport_for_username(&self, username: &str) -> Result<Arc<dyn Transport>, Error> {
        if let Some(t) = self.transports.get(username) {
            return Ok(t.clone());
        }

        let (connect_timeout, timeout) = {
            let settings = GLOBALS.settings.read();
            (
                Duration::from_secs(settings.fetch_connect_timeout_secs),
                Duration::from_secs(settings.fetch_timeout_secs),
            )
        };

        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let transport = Arc::new(HttpTransport { client });
        self.transports.insert(username.to_owned(), transport.clone());
        Ok(transport)
    }
}

pub struct HttpTransport {
    client: Client,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dereference_media(&self, url: &Url, max_bytes: u64) -> Result<Vec<u8>, Error> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErrorKind::Transport(format!("{url}: {status}")).into());
        }

        // Reject early when the server declares an oversized body.
        if let Some(len) = response.content_length() {
            if len > max_bytes {
                return Err(ErrorKind::SizeLimit { limit: max_bytes }.into());
            }
        }

        let mut bytes: Vec<u8> = Vec::new();
        let mut response = response;
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                // Dropping the response closes the connection.
                return Err(ErrorKind::SizeLimit { limit: max_bytes }.into());
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ErrorKind::Transport(format!("{url}: zero length body")).into());
        }

        Ok(bytes)
    }
}

/// In-memory transport for tests: serves canned bytes and counts fetches
/// per URL, which is how the single-flight tests assert exactly-once.
#[derive(Default)]
pub struct MockTransport {
    bodies: DashMap<String, Vec<u8>>,
    fetches: DashMap<String, usize>,
    total_fetches: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        Default::default()
    }

    pub fn serve(&self, url: &str, bytes: Vec<u8>) {
        self.bodies.insert(url.to_owned(), bytes);
    }

    pub fn fetch_count(&self) -> usize {
        self.total_fetches.load(Ordering::SeqCst)
    }

    pub fn fetch_count_for(&self, url: &str) -> usize {
        self.fetches.get(url).map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn dereference_media(&self, url: &Url, max_bytes: u64) -> Result<Vec<u8>, Error> {
        self.total_fetches.fetch_add(1, Ordering::SeqCst);
        *self.fetches.entry(url.as_str().to_owned()).or_insert(0) += 1;
        let bytes = self
            .bodies
            .get(url.as_str())
            .map(|b| b.clone())
            .ok_or_else(|| ErrorKind::Transport(format!("{url}: not served")))?;
        if bytes.len() as u64 > max_bytes {
            return Err(ErrorKind::SizeLimit { limit: max_bytes }.into());
        }
        Ok(bytes)
    }
}

/// Controller handing out one shared mock transport. Test support.
pub struct MockTransportController(pub Arc<MockTransport>);

#[async_trait]
impl TransportController for MockTransportController {
    async fn transport_for_username(&self, _username: &str) -> Result<Arc<dyn Transport>, Error> {
        Ok(self.0.clone())
    }
}
