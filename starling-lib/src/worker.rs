//! The worker queue: a single bounded in-memory FIFO of jobs, processed
//! by a fixed pool. All long-running background activity (dereference,
//! artefact processing, notification deliveries) goes through here.
//! Enqueueing blocks when the queue is full, which is the back-pressure.

use crate::error::{Error, ErrorKind};
use crate::globals::GLOBALS;
use crate::RunState;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

pub type Job = BoxFuture<'static, ()>;

pub struct WorkerQueue {
    tx: mpsc::Sender<Job>,
    /// Filled during lazy init, stolen by `start()`.
    tmp_rx: Mutex<Option<mpsc::Receiver<Job>>>,
}

impl Default for WorkerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerQueue {
    pub(crate) fn new() -> WorkerQueue {
        let capacity = crate::settings::Settings::default().worker_queue_capacity;
        let (tx, rx) = mpsc::channel(capacity);
        WorkerQueue {
            tx,
            tmp_rx: Mutex::new(Some(rx)),
        }
    }

    /// Queue a job. FIFO-fair; blocks while the queue is full. Fails once
    /// the pool has shut down.
    pub async fn enqueue(
        &self,
        job: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), Error> {
        if *GLOBALS.read_runstate.borrow() == RunState::ShuttingDown {
            return Err(ErrorKind::ShuttingDown.into());
        }
        self.tx
            .send(Box::pin(job))
            .await
            .map_err(|_| ErrorKind::QueueClosed.into())
    }

    /// Start the fixed worker pool. Called once at startup.
    pub fn start() {
        tracing::info!("Worker queue startup");

        let rx = GLOBALS
            .workers
            .tmp_rx
            .try_lock()
            .ok()
            .and_then(|mut guard| guard.take());
        let Some(rx) = rx else {
            tracing::error!("Worker queue started twice");
            return;
        };
        let shared = Arc::new(Mutex::new(rx));

        let worker_count = GLOBALS.settings.read().worker_count;
        for worker in 0..worker_count {
            let shared = shared.clone();
            tokio::task::spawn(async move {
                let mut read_runstate = GLOBALS.read_runstate.clone();
                read_runstate.mark_unchanged();

                loop {
                    let maybe_job = {
                        let mut rx = shared.lock().await;
                        tokio::select! {
                            job = rx.recv() => job,
                            _ = read_runstate.wait_for(|rs| *rs == RunState::ShuttingDown) => None,
                        }
                    };
                    match maybe_job {
                        Some(job) => job.await,
                        None => break,
                    }
                }

                // Drain what is already queued, up to the deadline.
                let deadline = Instant::now()
                    + std::time::Duration::from_secs(
                        GLOBALS.settings.read().worker_shutdown_deadline_secs,
                    );
                loop {
                    let maybe_job = shared.lock().await.try_recv().ok();
                    let Some(job) = maybe_job else {
                        break;
                    };
                    if tokio::time::timeout_at(deadline, job).await.is_err() {
                        tracing::warn!("worker {worker}: drain deadline hit, dropping queue");
                        break;
                    }
                }

                tracing::debug!("worker {worker} stopped");
            });
        }
    }

    /// Jobs waiting in the queue right now
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}
