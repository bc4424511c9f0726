//! The stream sink seam. The websocket/SSE delivery framework lives
//! outside the core; it implements [`StreamSink`] and receives every
//! timeline and notification event the surfacer emits.

use crate::model::{Account, ApiConversation, ApiNotification, ApiStatus, Id};
use async_trait::async_trait;
use dashmap::DashMap;

pub const STREAM_HOME: &str = "home";
pub const STREAM_PUBLIC: &str = "public";
pub const STREAM_LOCAL: &str = "local";

/// `list:<id>`
pub fn stream_list(list_id: Id) -> String {
    format!("list:{list_id}")
}

/// `tag:<name>`
pub fn stream_tag(name: &str) -> String {
    format!("tag:{name}")
}

#[async_trait]
pub trait StreamSink: Send + Sync {
    /// A new status was surfaced into `stream_name` for `account`.
    async fn update(&self, account: &Account, status: &ApiStatus, stream_name: &str);

    /// An existing status was edited.
    async fn status_update(&self, account: &Account, status: &ApiStatus, stream_name: &str);

    /// A status was deleted everywhere. Emitted once per deletion.
    async fn delete(&self, status_id: Id);

    /// A notification for `account`.
    async fn notification(&self, account: &Account, notification: &ApiNotification);

    /// A direct-message conversation changed for `account_id`.
    async fn conversation(&self, account_id: Id, conversation: &ApiConversation);
}

/// Discards everything. Used until a real delivery layer is attached.
pub struct NullStream;

#[async_trait]
impl StreamSink for NullStream {
    async fn update(&self, _: &Account, _: &ApiStatus, _: &str) {}
    async fn status_update(&self, _: &Account, _: &ApiStatus, _: &str) {}
    async fn delete(&self, _: Id) {}
    async fn notification(&self, _: &Account, _: &ApiNotification) {}
    async fn conversation(&self, _: Id, _: &ApiConversation) {}
}

/// Records every emitted event, keyed by receiving account. Test support.
#[derive(Default)]
pub struct CollectingStream {
    pub updates: DashMap<Id, Vec<(String, ApiStatus)>>,
    pub status_updates: DashMap<Id, Vec<(String, ApiStatus)>>,
    pub deletes: parking_lot::Mutex<Vec<Id>>,
    pub notifications: DashMap<Id, Vec<ApiNotification>>,
    pub conversations: DashMap<Id, Vec<ApiConversation>>,
}

impl CollectingStream {
    pub fn new() -> CollectingStream {
        Default::default()
    }

    pub fn updates_for(&self, account_id: Id) -> Vec<(String, ApiStatus)> {
        self.updates
            .get(&account_id)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn notifications_for(&self, account_id: Id) -> Vec<ApiNotification> {
        self.notifications
            .get(&account_id)
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StreamSink for CollectingStream {
    async fn update(&self, account: &Account, status: &ApiStatus, stream_name: &str) {
        self.updates
            .entry(account.id)
            .or_default()
            .push((stream_name.to_owned(), status.clone()));
    }

    async fn status_update(&self, account: &Account, status: &ApiStatus, stream_name: &str) {
        self.status_updates
            .entry(account.id)
            .or_default()
            .push((stream_name.to_owned(), status.clone()));
    }

    async fn delete(&self, status_id: Id) {
        self.deletes.lock().push(status_id);
    }

    async fn notification(&self, account: &Account, notification: &ApiNotification) {
        self.notifications
            .entry(account.id)
            .or_default()
            .push(notification.clone());
    }

    async fn conversation(&self, account_id: Id, conversation: &ApiConversation) {
        self.conversations
            .entry(account_id)
            .or_default()
            .push(conversation.clone());
    }
}

/// Delivery seams for notification side-channels. Bit-level transport is
/// out of scope; the core only enqueues work against these.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_notification_mail(&self, target: &Account, notification: &ApiNotification);
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send_push(&self, target: &Account, notification: &ApiNotification);
}

pub struct NullMailSender;

#[async_trait]
impl MailSender for NullMailSender {
    async fn send_notification_mail(&self, _: &Account, _: &ApiNotification) {}
}

pub struct NullPushSender;

#[async_trait]
impl PushSender for NullPushSender {
    async fn send_push(&self, _: &Account, _: &ApiNotification) {}
}
