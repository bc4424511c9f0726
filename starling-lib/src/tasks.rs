use crate::error::Error;
use crate::scheduler::{every, RunFn};
use crate::GLOBALS;
use crate::RunState;
use chrono::{TimeDelta, Utc};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub(crate) fn start_background_tasks() {
    tracing::info!("Starting general background tasks");

    // The daily remote-media uncache sweep rides the scheduler.
    let run: RunFn = Arc::new(|| {
        Box::pin(async {
            let days = GLOBALS.settings.read().media_remote_cache_days;
            let cutoff = Utc::now() - TimeDelta::days(days as i64);
            match GLOBALS.cleaner.uncache_remote(cutoff).await {
                Ok(count) => {
                    tracing::debug!("media sweep uncached {count} artefacts");
                }
                Err(e) => tracing::error!("media sweep failed: {e}"),
            }
        })
    });
    GLOBALS
        .scheduler
        .add(every(Duration::from_secs(24 * 60 * 60)), run);

    tokio::task::spawn(async move {
        let mut read_runstate = GLOBALS.read_runstate.clone();
        read_runstate.mark_unchanged();
        if *read_runstate.borrow() == RunState::ShuttingDown {
            return;
        }

        let sleep = tokio::time::sleep(Duration::from_millis(1000));
        tokio::pin!(sleep);
        let mut tick: usize = 0;

        loop {
            tokio::select! {
                _ = &mut sleep => {
                    sleep.as_mut().reset(Instant::now() + Duration::from_millis(1000));
                },
                _ = read_runstate.wait_for(|runstate| *runstate == RunState::ShuttingDown) => break,
            }

            tick += 1;

            if let Err(e) = do_general_tasks(tick) {
                tracing::error!("{}", e);
            }
        }

        tracing::info!("Stopping general background tasks");
    });
}

fn do_general_tasks(tick: usize) -> Result<(), Error> {
    // Periodic visibility into the moving parts (every minute)
    if tick % 60 == 0 {
        tracing::debug!(
            "surfaced={} queued={} {}",
            GLOBALS.statuses_surfaced.load(Ordering::Relaxed),
            GLOBALS.workers.queued(),
            GLOBALS.dereferencer.stats(),
        );
    }

    Ok(())
}
