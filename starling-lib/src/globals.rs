use crate::cleaner::Cleaner;
use crate::conversations::Conversations;
use crate::dereferencer::Dereferencer;
use crate::domain::DomainLimits;
use crate::filter::{MuteFilter, StatusFilters};
use crate::notify::Notifier;
use crate::processing::Manager;
use crate::scheduler::Scheduler;
use crate::settings::Settings;
use crate::store::Store;
use crate::stream::{
    MailSender, NullMailSender, NullPushSender, NullStream, PushSender, StreamSink,
};
use crate::surfacer::Surfacer;
use crate::timeline::Timelines;
use crate::transport::{HttpTransportController, TransportController};
use crate::worker::WorkerQueue;
use crate::RunState;
use parking_lot::RwLock as PRwLock;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

/// Global data shared between threads. Access via the static ref
/// `GLOBALS`.
pub struct Globals {
    /// Runtime-tunable settings
    pub settings: PRwLock<Settings>,

    /// This is a watch channel for making changes to the RunState.
    pub write_runstate: watch::Sender<RunState>,

    /// This is a watch channel for watching for changes to the RunState.
    ///
    /// Synchronous code can `borrow()` and dereference to see the current
    /// RunState. Asynchronous code should `clone()` and await on the
    /// clone, so that waiters do not steal each other's wakeups.
    pub read_runstate: watch::Receiver<RunState>,

    // Pluggable collaborators. The store must be attached before use;
    // the others fall back to working defaults.
    store: OnceLock<Arc<dyn Store>>,
    streams: OnceLock<Arc<dyn StreamSink>>,
    transport: OnceLock<Arc<dyn TransportController>>,
    mailer: OnceLock<Arc<dyn MailSender>>,
    pusher: OnceLock<Arc<dyn PushSender>>,

    /// Remote artefact dereferencing
    pub dereferencer: Dereferencer,

    /// Artefact processor construction
    pub media_manager: Manager,

    /// The five timeline cache classes
    pub timelines: Timelines,

    /// Per-(viewer, status) mute decisions
    pub mute_filter: MuteFilter,

    /// Per-account keyword filters
    pub status_filters: StatusFilters,

    /// Cached domain-limit matching
    pub domain_limits: DomainLimits,

    /// Notification persistence and delivery
    pub notifier: Notifier,

    /// Direct-message conversation tracking
    pub conversations: Conversations,

    /// Create/update/delete fan-out
    pub surfacer: Surfacer,

    /// Remote artefact uncaching
    pub cleaner: Cleaner,

    /// The background worker pool
    pub workers: WorkerQueue,

    /// Timed jobs
    pub scheduler: Scheduler,

    /// Statuses surfaced since startup
    pub statuses_surfaced: AtomicUsize,
}

lazy_static! {
    /// A static reference to global data shared between threads.
    pub static ref GLOBALS: Globals = {
        // We start in the Initializing state
        let (write_runstate, read_runstate) = watch::channel(RunState::Initializing);

        Globals {
            settings: PRwLock::new(Settings::default()),
            write_runstate,
            read_runstate,
            store: OnceLock::new(),
            streams: OnceLock::new(),
            transport: OnceLock::new(),
            mailer: OnceLock::new(),
            pusher: OnceLock::new(),
            dereferencer: Dereferencer::new(),
            media_manager: Manager::new(),
            timelines: Timelines::new(),
            mute_filter: MuteFilter::new(),
            status_filters: StatusFilters::new(),
            domain_limits: DomainLimits::new(),
            notifier: Notifier::new(),
            conversations: Conversations::new(),
            surfacer: Surfacer::new(),
            cleaner: Cleaner::new(),
            workers: WorkerQueue::new(),
            scheduler: Scheduler::new(),
            statuses_surfaced: AtomicUsize::new(0),
        }
    };
}

impl Globals {
    /// Attach the durable store. Must happen exactly once, before any
    /// core operation runs.
    pub fn attach_store(&self, store: Arc<dyn Store>) -> bool {
        self.store.set(store).is_ok()
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        match self.store.get() {
            Some(s) => s,
            None => panic!("Store call before initialization"),
        }
    }

    pub fn attach_streams(&self, streams: Arc<dyn StreamSink>) -> bool {
        self.streams.set(streams).is_ok()
    }

    pub fn streams(&self) -> Arc<dyn StreamSink> {
        self.streams
            .get_or_init(|| Arc::new(NullStream))
            .clone()
    }

    pub fn attach_transport(&self, transport: Arc<dyn TransportController>) -> bool {
        self.transport.set(transport).is_ok()
    }

    pub fn transport_controller(&self) -> Arc<dyn TransportController> {
        self.transport
            .get_or_init(|| Arc::new(HttpTransportController::new()))
            .clone()
    }

    pub fn attach_mailer(&self, mailer: Arc<dyn MailSender>) -> bool {
        self.mailer.set(mailer).is_ok()
    }

    pub fn mailer(&self) -> Arc<dyn MailSender> {
        self.mailer.get_or_init(|| Arc::new(NullMailSender)).clone()
    }

    pub fn attach_pusher(&self, pusher: Arc<dyn PushSender>) -> bool {
        self.pusher.set(pusher).is_ok()
    }

    pub fn pusher(&self) -> Arc<dyn PushSender> {
        self.pusher.get_or_init(|| Arc::new(NullPushSender)).clone()
    }
}
