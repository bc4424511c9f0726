//! Conversation threading for direct statuses: each local participant
//! gets a per-thread conversation row, bumped and marked unread as new
//! statuses arrive.

use crate::error::Error;
use crate::globals::GLOBALS;
use crate::model::{
    Account, ApiAccount, ApiConversation, Conversation, Id, PopulatedStatus, Visibility,
};
use chrono::Utc;

pub struct Conversations {}

impl Default for Conversations {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversations {
    pub(crate) fn new() -> Conversations {
        Conversations {}
    }

    /// Update conversations for a direct status. Returns the per-account
    /// events the surfacer should stream.
    pub async fn update_for_status(
        &self,
        populated: &PopulatedStatus,
    ) -> Result<Vec<(Account, ApiConversation)>, Error> {
        let status = &populated.status;
        if status.visibility != Visibility::Direct {
            return Ok(Vec::new());
        }

        let store = GLOBALS.store();
        let mut participants: Vec<&Account> = vec![&populated.author];
        for account in &populated.mentioned {
            if account.id != populated.author.id {
                participants.push(account);
            }
        }

        let mut events = Vec::new();
        for participant in participants {
            if !participant.is_local() {
                continue;
            }

            // A participant who muted this thread or its authors gets no
            // conversation bump.
            let details = GLOBALS
                .mute_filter
                .status_mute_details(Some(participant), status)
                .await?;
            if details.muted(Utc::now()) {
                continue;
            }

            let conversation = match store
                .get_conversation(participant.id, status.thread_id)
                .await?
            {
                Some(mut existing) => {
                    existing.last_status_id = status.id;
                    existing.unread = participant.id != status.account_id;
                    store.update_conversation(&existing).await?;
                    existing
                }
                None => {
                    let fresh = Conversation {
                        id: Id::gen(),
                        account_id: participant.id,
                        thread_id: status.thread_id,
                        last_status_id: status.id,
                        unread: participant.id != status.account_id,
                        created_at: Utc::now(),
                    };
                    store.put_conversation(&fresh).await?;
                    fresh
                }
            };

            let accounts = std::iter::once(&populated.author)
                .chain(populated.mentioned.iter())
                .filter(|a| a.id != participant.id)
                .map(|a| ApiAccount::from_account(a))
                .collect();

            events.push((
                participant.clone(),
                ApiConversation {
                    id: conversation.id,
                    unread: conversation.unread,
                    last_status_id: conversation.last_status_id,
                    accounts,
                },
            ));
        }

        Ok(events)
    }
}
