//! The notification surface: idempotent persistence keyed by
//! `(kind, target, origin, status, edit)`, stream delivery, and email /
//! web-push hand-off to the worker queue.

use crate::error::Error;
use crate::filter::VisContext;
use crate::globals::GLOBALS;
use crate::model::{ApiNotification, Id, Notification, NotificationKind};
use chrono::Utc;

pub struct Notifier {}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub(crate) fn new() -> Notifier {
        Notifier {}
    }

    /// Notify `target` about something `origin` did. At most one durable
    /// notification survives per tuple no matter how many concurrent
    /// callers race here; the store's unique key arbitrates and the
    /// first writer wins.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        target_account_id: Id,
        origin_account_id: Id,
        status_id: Option<Id>,
        edit_id: Option<Id>,
    ) -> Result<(), Error> {
        if target_account_id == origin_account_id {
            // Nobody needs to hear about their own actions.
            return Ok(());
        }

        let store = GLOBALS.store();

        let target = store.get_account_by_id(target_account_id).await?;
        if !target.is_local() {
            // Remote targets are notified by federation delivery, not us.
            return Ok(());
        }

        // Notification-context policy: blocked or muted origins stay
        // silent.
        if let Some(status_id) = status_id {
            let status = store.get_status_by_id(status_id).await?;
            if !crate::filter::status_visible(Some(&target), &status, VisContext::Notification)
                .await?
            {
                return Ok(());
            }
            let details = GLOBALS
                .mute_filter
                .status_mute_details(Some(&target), &status)
                .await?;
            if details.notification_muted(Utc::now()) {
                return Ok(());
            }
        } else if store
            .is_either_blocked(target_account_id, origin_account_id)
            .await?
        {
            return Ok(());
        }

        let notification = Notification {
            id: Id::gen(),
            kind,
            target_account_id,
            origin_account_id,
            status_id,
            edit_id,
            read: false,
            created_at: Utc::now(),
        };

        match store.put_notification(&notification).await {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => {
                // Someone else persisted this tuple first; done.
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let origin = store.get_account_by_id(origin_account_id).await.ok();
        let api = ApiNotification::from_notification(&notification, origin.as_ref());

        GLOBALS.streams().notification(&target, &api).await;

        // Side-channel deliveries ride the worker queue; transport is
        // somebody else's problem.
        let mail_target = target.clone();
        let mail_api = api.clone();
        let enqueue = GLOBALS
            .workers
            .enqueue(async move {
                GLOBALS
                    .mailer()
                    .send_notification_mail(&mail_target, &mail_api)
                    .await;
                GLOBALS.pusher().send_push(&mail_target, &mail_api).await;
            })
            .await;
        if let Err(e) = enqueue {
            tracing::warn!("could not enqueue notification delivery: {e}");
        }

        Ok(())
    }
}
