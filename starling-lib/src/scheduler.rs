//! Timed jobs on a single reset-on-change timer over a priority heap.
//! Each fire is dispatched onto its own task so a slow job never delays
//! the queue. Jobs whose timing returns no next fire time are removed.

use crate::globals::GLOBALS;
use crate::RunState;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Fires within this horizon run immediately instead of sleeping.
const PRECISION_FLOOR: Duration = Duration::from_millis(2);

/// Given now, when should the job fire next? None removes the job.
pub type TimingFn = Box<dyn Fn(DateTime<Utc>) -> Option<DateTime<Utc>> + Send + Sync>;
pub type RunFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct ScheduledJob {
    id: u64,
    fire_at: DateTime<Utc>,
    timing: TimingFn,
    run: RunFn,
}

// Min-heap on fire_at.
impl PartialEq for ScheduledJob {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}
impl Eq for ScheduledJob {}
impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScheduledJob {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

struct Inner {
    heap: BinaryHeap<ScheduledJob>,
    next_id: u64,
}

pub struct Scheduler {
    inner: Mutex<Inner>,
    changed: Notify,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub(crate) fn new() -> Scheduler {
        Scheduler {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                next_id: 1,
            }),
            changed: Notify::new(),
        }
    }

    /// Add a job. Returns its handle, or None when the timing yields no
    /// first fire time.
    pub fn add(&self, timing: TimingFn, run: RunFn) -> Option<u64> {
        let fire_at = timing(Utc::now())?;
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.heap.push(ScheduledJob {
                id,
                fire_at,
                timing,
                run,
            });
            id
        };
        self.changed.notify_one();
        Some(id)
    }

    pub fn remove(&self, id: u64) {
        {
            let mut inner = self.inner.lock();
            let jobs: Vec<ScheduledJob> = inner.heap.drain().filter(|j| j.id != id).collect();
            inner.heap.extend(jobs);
        }
        self.changed.notify_one();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    /// Start the scheduler loop. Called once at startup.
    pub fn start() {
        tracing::info!("Scheduler startup");

        tokio::task::spawn(async move {
            let mut read_runstate = GLOBALS.read_runstate.clone();
            read_runstate.mark_unchanged();

            loop {
                // Fire everything due, requeueing repeating jobs.
                let mut sleep_for = Duration::from_secs(3600);
                {
                    let now = Utc::now();
                    let mut inner = GLOBALS.scheduler.inner.lock();
                    while let Some(next) = inner.heap.peek() {
                        let until = (next.fire_at - now)
                            .to_std()
                            .unwrap_or(Duration::ZERO);
                        if until > PRECISION_FLOOR {
                            sleep_for = until;
                            break;
                        }
                        let Some(job) = inner.heap.pop() else {
                            break;
                        };
                        // Asynchronous dispatch: the loop never waits on
                        // a job body.
                        tokio::task::spawn((job.run)());
                        if let Some(fire_at) = (job.timing)(now) {
                            inner.heap.push(ScheduledJob { fire_at, ..job });
                        }
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(sleep_for) => {},
                    _ = GLOBALS.scheduler.changed.notified() => {},
                    _ = read_runstate.wait_for(|rs| *rs == RunState::ShuttingDown) => break,
                }
            }

            tracing::info!("Scheduler shutdown");
        });
    }
}

/// Fire every `period`, starting one period from now.
pub fn every(period: Duration) -> TimingFn {
    let period = chrono::TimeDelta::from_std(period).unwrap_or(chrono::TimeDelta::seconds(1));
    Box::new(move |now| Some(now + period))
}

/// Fire once at `at`.
pub fn once(at: DateTime<Utc>) -> TimingFn {
    let fired = std::sync::atomic::AtomicBool::new(false);
    Box::new(move |_now| {
        if fired.swap(true, std::sync::atomic::Ordering::AcqRel) {
            None
        } else {
            Some(at)
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_heap_is_min_on_fire_at() {
        let scheduler = Scheduler::new();
        let late = Utc::now() + chrono::TimeDelta::hours(2);
        let soon = Utc::now() + chrono::TimeDelta::minutes(1);

        let noop: RunFn = Arc::new(|| Box::pin(async {}));
        scheduler.add(once(late), noop.clone());
        scheduler.add(once(soon), noop.clone());

        let inner = scheduler.inner.lock();
        assert_eq!(inner.heap.peek().map(|j| j.fire_at), Some(soon));
    }

    #[test]
    fn test_remove_keeps_others() {
        let scheduler = Scheduler::new();
        let noop: RunFn = Arc::new(|| Box::pin(async {}));
        let a = scheduler
            .add(once(Utc::now() + chrono::TimeDelta::minutes(1)), noop.clone())
            .unwrap();
        let _b = scheduler
            .add(once(Utc::now() + chrono::TimeDelta::minutes(2)), noop.clone())
            .unwrap();

        scheduler.remove(a);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_once_fires_exactly_once() {
        let at = Utc::now();
        let timing = once(at);
        assert_eq!(timing(at), Some(at));
        assert_eq!(timing(at), None);
    }
}
