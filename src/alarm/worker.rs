// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Alarm Worker
//!
//! Background task that drains the queued alarm channel and persists each
//! event in its own transaction.
//!
//! ## Delivery
//!
//! - A failed write is retried with linear backoff, up to `max_attempts`
//! - Persisting is keyed by event id, so a retry after an ambiguous failure
//!   cannot create a second alarm
//! - Writes run on the blocking pool, since redb admits one writer at a time
//! - On shutdown the channel is closed and whatever is already queued is
//!   still written
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::dispatch::persist_event;
use super::AlarmEvent;
use crate::storage::{Store, StoreResult, StoredAlarm};

/// Default attempts per event.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; attempt `n` waits `n * base`.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Writes one event to the store. Runs on the blocking pool.
type Persist = Arc<dyn Fn(&Store, &AlarmEvent) -> StoreResult<Option<StoredAlarm>> + Send + Sync>;

fn commit_event(store: &Store, event: &AlarmEvent) -> StoreResult<Option<StoredAlarm>> {
    store.write(|txn| persist_event(txn, event))
}

/// Outcome counts of one worker run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Events persisted, or found already persisted.
    pub delivered: u64,
    /// Events given up on after the last attempt.
    pub dropped: u64,
}

/// Consumer side of the queued alarm channel.
pub struct AlarmWorker {
    store: Arc<Store>,
    receiver: UnboundedReceiver<AlarmEvent>,
    max_attempts: u32,
    backoff: Duration,
    persist: Persist,
    report: DeliveryReport,
}

impl AlarmWorker {
    /// `max_attempts` is raised to 2 so every failure is retried at least once.
    pub fn new(store: Arc<Store>, receiver: UnboundedReceiver<AlarmEvent>, max_attempts: u32) -> Self {
        Self {
            store,
            receiver,
            max_attempts: max_attempts.max(2),
            backoff: DEFAULT_RETRY_BACKOFF,
            persist: Arc::new(commit_event),
            report: DeliveryReport::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[cfg(test)]
    fn with_persist(
        mut self,
        persist: impl Fn(&Store, &AlarmEvent) -> StoreResult<Option<StoredAlarm>> + Send + Sync + 'static,
    ) -> Self {
        self.persist = Arc::new(persist);
        self
    }

    /// Run until the cancellation token is triggered or every sender is gone.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// let handle = tokio::spawn(worker.run(shutdown.clone()));
    /// ```
    pub async fn run(mut self, shutdown: CancellationToken) -> DeliveryReport {
        info!(max_attempts = self.max_attempts, "Alarm worker starting");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(event) => self.handle(event).await,
                    None => {
                        info!(
                            delivered = self.report.delivered,
                            dropped = self.report.dropped,
                            "Alarm channel closed, worker stopping"
                        );
                        return self.report;
                    }
                },
            }
        }

        self.receiver.close();
        let mut drained = 0usize;
        while let Some(event) = self.receiver.recv().await {
            self.handle(event).await;
            drained += 1;
        }
        info!(
            drained,
            delivered = self.report.delivered,
            dropped = self.report.dropped,
            "Alarm worker shutting down"
        );
        self.report
    }

    async fn handle(&mut self, event: AlarmEvent) {
        if self.deliver(&event).await {
            self.report.delivered += 1;
        } else {
            self.report.dropped += 1;
        }
    }

    /// Persist one event, retrying on failure. Returns whether it landed.
    ///
    /// A blocking task that panics or is cancelled counts as a failed attempt.
    async fn deliver(&self, event: &AlarmEvent) -> bool {
        for attempt in 1..=self.max_attempts {
            let store = self.store.clone();
            let persist = self.persist.clone();
            let pending = event.clone();
            let outcome =
                tokio::task::spawn_blocking(move || (*persist)(store.as_ref(), &pending)).await;

            let failure = match outcome {
                Ok(Ok(Some(alarm))) => {
                    debug!(
                        event_id = %event.event_id,
                        alarm_id = %alarm.id,
                        recipient_id = %alarm.recipient_id,
                        "Alarm persisted"
                    );
                    return true;
                }
                Ok(Ok(None)) => {
                    debug!(event_id = %event.event_id, "Alarm event already persisted");
                    return true;
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => e.to_string(),
            };

            warn!(
                event_id = %event.event_id,
                attempt,
                error = %failure,
                "Alarm worker: failed to persist event"
            );
            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff * attempt).await;
            }
        }

        error!(
            event_id = %event.event_id,
            recipient_id = %event.recipient_id,
            "Alarm event dropped after retries"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    use tokio::sync::mpsc::unbounded_channel;

    use crate::alarm::{AlarmArgs, AlarmDispatcher, AlarmKind};
    use crate::ids::{PostId, UserId};
    use crate::pagination::PageRequest;
    use crate::storage::{AlarmRepository, StoreError};
    use crate::test_support::TestContext;

    fn temp_store() -> (Arc<Store>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open_in(dir.path()).unwrap());
        (store, dir)
    }

    fn alarm_count(store: &Store, recipient: u64) -> u64 {
        store
            .read(|txn| AlarmRepository::new(txn).list_by_recipient(UserId(recipient), PageRequest::default()))
            .unwrap()
            .total_elements
    }

    fn like_event(recipient: u64) -> AlarmEvent {
        AlarmEvent::new(
            UserId(recipient),
            AlarmKind::NewLikeOnPost,
            AlarmArgs::on_post(UserId(9), PostId(1)),
        )
    }

    #[tokio::test]
    async fn worker_persists_published_events() {
        let (store, _dir) = temp_store();
        let (dispatcher, receiver) = AlarmDispatcher::queued(store.clone());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(AlarmWorker::new(store.clone(), receiver, 3).run(shutdown.clone()));

        dispatcher.submit(like_event(1)).unwrap();
        dispatcher.submit(like_event(1)).unwrap();
        dispatcher.submit(like_event(2)).unwrap();

        shutdown.cancel();
        let report = handle.await.unwrap();

        assert_eq!(report.delivered, 3);
        assert_eq!(alarm_count(&store, 1), 2);
        assert_eq!(alarm_count(&store, 2), 1);
    }

    #[tokio::test]
    async fn redelivered_event_is_written_once() {
        let (store, _dir) = temp_store();
        let (sender, receiver) = unbounded_channel();

        let event = like_event(1);
        sender.send(event.clone()).unwrap();
        sender.send(event).unwrap();
        drop(sender);

        let report = AlarmWorker::new(store.clone(), receiver, 3)
            .run(CancellationToken::new())
            .await;

        assert_eq!(report.delivered, 2);
        assert_eq!(alarm_count(&store, 1), 1);
    }

    #[tokio::test]
    async fn failed_write_is_retried() {
        let (store, _dir) = temp_store();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let (sender, receiver) = unbounded_channel();
        sender.send(like_event(1)).unwrap();
        drop(sender);

        let report = AlarmWorker::new(store.clone(), receiver, 3)
            .with_backoff(Duration::from_millis(1))
            .with_persist(move |store, event| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(StoreError::Dangling("transient".to_string()));
                }
                commit_event(store, event)
            })
            .run(CancellationToken::new())
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(report, DeliveryReport { delivered: 1, dropped: 0 });
        assert_eq!(alarm_count(&store, 1), 1);
    }

    #[tokio::test]
    async fn event_is_dropped_after_last_attempt() {
        let (store, _dir) = temp_store();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let (sender, receiver) = unbounded_channel();
        sender.send(like_event(1)).unwrap();
        drop(sender);

        // One attempt is raised to two
        let report = AlarmWorker::new(store.clone(), receiver, 1)
            .with_backoff(Duration::from_millis(1))
            .with_persist(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Dangling("down".to_string()))
            })
            .run(CancellationToken::new())
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(report, DeliveryReport { delivered: 0, dropped: 1 });
        assert_eq!(alarm_count(&store, 1), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn waiting_for_the_write_lock_leaves_the_runtime_free() {
        let (store, _dir) = temp_store();

        // Another writer holds redb's write lock for a while
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let holder = {
            let store = store.clone();
            std::thread::spawn(move || {
                store
                    .write(|_txn| -> StoreResult<()> {
                        locked_tx.send(()).unwrap();
                        std::thread::sleep(Duration::from_millis(400));
                        Ok(())
                    })
                    .unwrap();
            })
        };
        locked_rx.recv().unwrap();

        let (sender, receiver) = unbounded_channel();
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(AlarmWorker::new(store.clone(), receiver, 3).run(shutdown.clone()));
        sender.send(like_event(1)).unwrap();

        let started = Instant::now();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(
            started.elapsed() < Duration::from_millis(200),
            "timer stalled for {:?}",
            started.elapsed()
        );

        shutdown.cancel();
        let report = worker.await.unwrap();
        holder.join().unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(alarm_count(&store, 1), 1);
    }

    #[tokio::test]
    async fn queued_like_reaches_the_post_owner() {
        let (ctx, receiver) = TestContext::queued();
        let alice = ctx.member("alice");
        let bob = ctx.member("bob");

        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(
            AlarmWorker::new(ctx.state.store.clone(), receiver, 3).run(shutdown.clone()),
        );

        let post = ctx.posts.create(&alice, "hello", "world").unwrap();
        ctx.posts.like(&bob, post.id).unwrap();

        shutdown.cancel();
        let report = worker.await.unwrap();
        assert_eq!(report.delivered, 1);

        let inbox = ctx.users.alarm_list(&alice, PageRequest::default()).unwrap();
        assert_eq!(inbox.total_elements, 1);
        assert_eq!(inbox.content[0].alarm_type, AlarmKind::NewLikeOnPost);
        assert_eq!(inbox.content[0].args.from_user_id, bob.user_id);
        assert_eq!(inbox.content[0].args.target_id, post.id.get());

        let bob_inbox = ctx.users.alarm_list(&bob, PageRequest::default()).unwrap();
        assert_eq!(bob_inbox.total_elements, 0);
    }
}
