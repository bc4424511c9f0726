use starling_lib::store::MemStore;
use starling_lib::{Error, GLOBALS};
use std::env;
use std::sync::Arc;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

fn main() -> Result<(), Error> {
    // Setup logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    let env_filter = EnvFilter::from_default_env();
    let max_level = match env_filter.max_level_hint() {
        Some(l) => l,
        None => LevelFilter::ERROR,
    };
    let show_debug = cfg!(debug_assertions) || max_level <= LevelFilter::DEBUG;
    tracing_subscriber::fmt::fmt()
        .with_target(false)
        .with_file(show_debug)
        .with_line_number(show_debug)
        .with_env_filter(env_filter)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run())
}

async fn run() -> Result<(), Error> {
    // Until the relational store adapter attaches from the outside, the
    // daemon scaffold runs on the in-memory reference store.
    GLOBALS.attach_store(Arc::new(MemStore::new()));

    starling_lib::start();
    tracing::info!("starling {} online", env!("CARGO_PKG_VERSION"));

    tokio::signal::ctrl_c().await?;

    starling_lib::shutdown();

    // Give the worker pool its drain window before the process exits.
    let deadline = GLOBALS.settings.read().worker_shutdown_deadline_secs;
    tokio::time::sleep(std::time::Duration::from_secs(deadline.min(5))).await;

    Ok(())
}
