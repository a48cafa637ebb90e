// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hand-off from the interaction service to alarm persistence.
//!
//! Callers stage an event inside their write transaction and publish it
//! after the commit:
//!
//! ```rust,ignore
//! let (like, staged) = store.write(|txn| {
//!     let like = LikeRepository::new(txn).insert(user, post)?;
//!     let staged = alarms.stage(txn, event)?;
//!     Ok((like, staged))
//! })?;
//! alarms.publish(staged);
//! ```
//!
//! Inline delivery writes the alarm during `stage`, so it commits or rolls
//! back with the like. Queued delivery only sends on `publish`, so an aborted
//! transaction never produces an alarm.

use std::sync::Arc;

use redb::WriteTransaction;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, warn};

use super::AlarmEvent;
use crate::storage::{AlarmRepository, Store, StoreResult, StoredAlarm};

/// How staged alarms reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Written in the triggering transaction.
    Inline,
    /// Pushed to a channel after commit and written by the worker.
    Queued,
}

impl DeliveryMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "inline" => Some(DeliveryMode::Inline),
            "queued" => Some(DeliveryMode::Queued),
            _ => None,
        }
    }
}

/// Persist the alarm for `event` unless it was already persisted.
pub fn persist_event(txn: &WriteTransaction, event: &AlarmEvent) -> StoreResult<Option<StoredAlarm>> {
    AlarmRepository::new(txn).record_event(
        &event.event_id.to_string(),
        event.recipient_id,
        event.kind,
        event.args,
    )
}

/// Result of [`AlarmDispatcher::stage`]; pass it to
/// [`AlarmDispatcher::publish`] once the transaction has committed.
#[must_use = "staged alarms must be published after commit"]
#[derive(Debug)]
pub struct StagedAlarm {
    deferred: Option<AlarmEvent>,
}

#[derive(Clone)]
pub struct AlarmDispatcher {
    store: Arc<Store>,
    queue: Option<UnboundedSender<AlarmEvent>>,
}

impl AlarmDispatcher {
    /// Dispatcher that writes alarms in the caller's transaction.
    pub fn inline(store: Arc<Store>) -> Self {
        Self { store, queue: None }
    }

    /// Dispatcher feeding a channel; hand the receiver to an
    /// [`AlarmWorker`](super::AlarmWorker).
    pub fn queued(store: Arc<Store>) -> (Self, UnboundedReceiver<AlarmEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                store,
                queue: Some(sender),
            },
            receiver,
        )
    }

    pub fn mode(&self) -> DeliveryMode {
        if self.queue.is_some() {
            DeliveryMode::Queued
        } else {
            DeliveryMode::Inline
        }
    }

    /// Stage `event` as part of the caller's unit of work.
    pub fn stage(&self, txn: &WriteTransaction, event: AlarmEvent) -> StoreResult<StagedAlarm> {
        match self.queue {
            None => {
                persist_event(txn, &event)?;
                Ok(StagedAlarm { deferred: None })
            }
            Some(_) => Ok(StagedAlarm {
                deferred: Some(event),
            }),
        }
    }

    /// Release a staged alarm after its transaction committed. Never blocks.
    pub fn publish(&self, staged: StagedAlarm) {
        if let Some(event) = staged.deferred {
            self.enqueue(event);
        }
    }

    /// Dispatch an event that is not tied to any other write.
    pub fn submit(&self, event: AlarmEvent) -> StoreResult<()> {
        match self.queue {
            None => self.store.write(|txn| persist_event(txn, &event).map(|_| ())),
            Some(_) => {
                self.enqueue(event);
                Ok(())
            }
        }
    }

    fn enqueue(&self, event: AlarmEvent) {
        let Some(queue) = &self.queue else {
            return;
        };

        match queue.send(event) {
            Ok(()) => debug!("Alarm event queued"),
            Err(mpsc::error::SendError(event)) => {
                // Worker is gone (shutdown); keep the alarm anyway
                warn!(event_id = %event.event_id, "Alarm queue closed, writing directly");
                if let Err(e) = self.store.write(|txn| persist_event(txn, &event)) {
                    error!(event_id = %event.event_id, error = %e, "Failed to persist alarm");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlarmArgs, AlarmKind};
    use crate::ids::{PostId, UserId};
    use crate::pagination::PageRequest;
    use crate::storage::StoreError;

    fn temp_store() -> (Arc<Store>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in(dir.path()).unwrap();
        (Arc::new(store), dir)
    }

    fn event() -> AlarmEvent {
        AlarmEvent::new(
            UserId(1),
            AlarmKind::NewLikeOnPost,
            AlarmArgs::on_post(UserId(2), PostId(3)),
        )
    }

    fn alarm_count(store: &Store) -> u64 {
        store
            .read(|txn| AlarmRepository::new(txn).list_by_recipient(UserId(1), PageRequest::default()))
            .unwrap()
            .total_elements
    }

    #[test]
    fn inline_alarm_rolls_back_with_transaction() {
        let (store, _dir) = temp_store();
        let dispatcher = AlarmDispatcher::inline(store.clone());

        let result: StoreResult<()> = store.write(|txn| {
            let staged = dispatcher.stage(txn, event())?;
            dispatcher.publish(staged);
            Err(StoreError::Dangling("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(alarm_count(&store), 0);

        let staged = store.write(|txn| dispatcher.stage(txn, event())).unwrap();
        dispatcher.publish(staged);
        assert_eq!(alarm_count(&store), 1);
    }

    #[test]
    fn queued_alarm_waits_for_publish() {
        let (store, _dir) = temp_store();
        let (dispatcher, mut receiver) = AlarmDispatcher::queued(store.clone());
        assert_eq!(dispatcher.mode(), DeliveryMode::Queued);

        let sent = event();
        let staged = store
            .write(|txn| dispatcher.stage(txn, sent.clone()))
            .unwrap();
        assert!(receiver.try_recv().is_err(), "nothing sent before publish");
        assert_eq!(alarm_count(&store), 0);

        dispatcher.publish(staged);
        assert_eq!(receiver.try_recv().unwrap(), sent);
    }

    #[test]
    fn closed_queue_falls_back_to_direct_write() {
        let (store, _dir) = temp_store();
        let (dispatcher, receiver) = AlarmDispatcher::queued(store.clone());
        drop(receiver);

        dispatcher.submit(event()).unwrap();
        assert_eq!(alarm_count(&store), 1);
    }

    #[test]
    fn delivery_mode_parses() {
        assert_eq!(DeliveryMode::parse("Queued"), Some(DeliveryMode::Queued));
        assert_eq!(DeliveryMode::parse("inline"), Some(DeliveryMode::Inline));
        assert_eq!(DeliveryMode::parse("kafka"), None);
    }
}
