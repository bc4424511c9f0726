//! Keyed single-flight: collapses concurrent work for one key into a
//! single in-flight producer. The dereferencer owns one map per artefact
//! class.

use crate::error::{Error, ErrorKind};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// One in-flight computation. Followers hold a clone of this and wait on
/// the leader's result.
pub struct Flight<T: Clone> {
    tx: watch::Sender<Option<Result<T, Error>>>,
}

impl<T: Clone> Flight<T> {
    fn new() -> Flight<T> {
        let (tx, _) = watch::channel(None);
        Flight { tx }
    }

    /// Wait until the leader resolves this flight. Cancel-safe: dropping
    /// the future affects only this waiter.
    pub async fn wait(&self) -> Result<T, Error> {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(result) = rx.borrow_and_update().clone() {
                return result;
            }
            if rx.changed().await.is_err() {
                return Err(ErrorKind::Internal("flight sender dropped".to_owned()).into());
            }
        }
    }

    /// The result, if already resolved.
    pub fn peek(&self) -> Option<Result<T, Error>> {
        self.tx.borrow().clone()
    }
}

/// Held by the leader. Resolving publishes the result to every waiter and
/// releases the key, in that order, so a new acquire can never observe a
/// registered-but-resolved flight. If the guard is dropped unresolved
/// (leader panicked or bailed), the flight resolves as a failure first.
pub struct FlightGuard<T: Clone> {
    map: Arc<DashMap<String, Arc<Flight<T>>>>,
    key: String,
    flight: Arc<Flight<T>>,
    resolved: bool,
}

impl<T: Clone> FlightGuard<T> {
    pub fn resolve(mut self, result: Result<T, Error>) {
        let _ = self.flight.tx.send(Some(result));
        self.map.remove(&self.key);
        self.resolved = true;
    }
}

impl<T: Clone> Drop for FlightGuard<T> {
    fn drop(&mut self) {
        if !self.resolved {
            let _ = self
                .flight
                .tx
                .send(Some(Err(ErrorKind::Internal("flight abandoned".to_owned()).into())));
            self.map.remove(&self.key);
        }
    }
}

/// Map from key to in-progress flight.
pub struct FlightMap<T: Clone> {
    flights: Arc<DashMap<String, Arc<Flight<T>>>>,
}

impl<T: Clone> Default for FlightMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FlightMap<T> {
    pub fn new() -> FlightMap<T> {
        FlightMap {
            flights: Arc::new(DashMap::new()),
        }
    }

    /// Join the flight for `key`, becoming the leader if none is in
    /// progress. Exactly one caller receives a guard; everyone else gets
    /// a flight handle to wait on.
    pub fn acquire(&self, key: &str) -> (Arc<Flight<T>>, Option<FlightGuard<T>>) {
        match self.flights.entry(key.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(e) => (e.get().clone(), None),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let flight = Arc::new(Flight::new());
                e.insert(flight.clone());
                let guard = FlightGuard {
                    map: self.flights.clone(),
                    key: key.to_owned(),
                    flight: flight.clone(),
                    resolved: false,
                };
                (flight, Some(guard))
            }
        }
    }

    /// Number of keys currently in flight
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_single_leader_shared_result() {
        let map: Arc<FlightMap<u32>> = Arc::new(FlightMap::new());
        let produced = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let map = map.clone();
            let produced = produced.clone();
            handles.push(tokio::spawn(async move {
                let (flight, guard) = map.acquire("emoji:blob@example.org");
                match guard {
                    Some(guard) => {
                        // Leader: do the work once.
                        produced.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        guard.resolve(Ok(42));
                        42
                    }
                    None => flight.wait().await.unwrap(),
                }
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(produced.load(Ordering::SeqCst), 1);
        assert_eq!(map.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_leader_fails_followers_and_releases() {
        let map: FlightMap<u32> = FlightMap::new();

        let (flight, guard) = map.acquire("k");
        assert!(guard.is_some());

        let waiter = tokio::spawn(async move { flight.wait().await });
        drop(guard);

        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Internal(_)));
        assert_eq!(map.in_flight(), 0);

        // Key is free again; a new leader can register.
        let (_, guard) = map.acquire("k");
        assert!(guard.is_some());
    }

    #[tokio::test]
    async fn test_followers_share_failure() {
        let map: FlightMap<u32> = FlightMap::new();
        let (flight, guard) = map.acquire("k");
        let waiter = tokio::spawn(async move { flight.wait().await });

        guard
            .unwrap()
            .resolve(Err(ErrorKind::Transport("connection refused".to_owned()).into()));

        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Transport(_)));
    }
}
