//! starling-lib is the federation core of starling: dereferencing of
//! remote artefacts, timeline surfacing, visibility and mute filtering,
//! and notification fan-out. The canonical binary crate is
//! `starling-bin`; HTTP delivery, the relational store, and the
//! ActivityPub codec attach from outside through the seams in `store`,
//! `stream`, and `transport`.

pub mod blobs;

mod cleaner;
pub use cleaner::Cleaner;

mod conversations;
pub use conversations::Conversations;

mod dereferencer;
pub use dereferencer::{Dereferenced, Dereferencer, MediaInfo};

mod domain;
pub use domain::{normalize_limit_domain, punify, DomainLimits};

mod error;
pub use error::{Error, ErrorKind};

pub mod filter;

mod globals;
pub use globals::{Globals, GLOBALS};

pub mod model;

mod notify;
pub use notify::Notifier;

/// Interaction policy resolution
pub mod policy;

/// Status authoring actions (boost, favourite, delete)
pub mod post;

mod processing;
pub use processing::{ArtefactInfo, ArtefactOp, Manager, ProcessingEmoji, ProcessingMedia};

/// RSS feed rendering for local accounts
pub mod rss;

/// The static robots.txt surface
pub mod robots;

pub mod scheduler;
pub use scheduler::Scheduler;

mod settings;
pub use settings::Settings;

mod single_flight;
pub use single_flight::{Flight, FlightGuard, FlightMap};

pub mod store;

pub mod stream;

mod surfacer;
pub use surfacer::Surfacer;

mod tasks;

pub mod timeline;

pub mod transport;

/// Local user signup
pub mod users;

mod worker;
pub use worker::WorkerQueue;

#[macro_use]
extern crate lazy_static;

/// The USER_AGENT string that starling (may) use when fetching remote
/// resources
pub static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The lifecycle state of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Online,
    ShuttingDown,
}

/// Bring the core online: start the worker pool, the scheduler, and the
/// periodic background tasks. The store must already be attached.
pub fn start() {
    let _ = GLOBALS.write_runstate.send(RunState::Online);
    WorkerQueue::start();
    Scheduler::start();
    tasks::start_background_tasks();
}

/// Begin graceful shutdown: the worker pool drains up to its deadline,
/// the scheduler and background loops stop.
pub fn shutdown() {
    tracing::info!("Shutting down");
    let _ = GLOBALS.write_runstate.send(RunState::ShuttingDown);
}
