//! Deferred "expire if still pending" delivery.
//!
//! [`ExpiryScheduler`] is the sending handle; [`SchedulerRunner`] owns the deadline queue and
//! runs as its own task, the same split as a resource actor and its client. Delivery is
//! at-least-once:
//!
//! 1. `schedule_expiry` records the entry in the journal and queues the deadline.
//! 2. When the deadline passes, the runner spawns a delivery task that calls the
//!    [`ExpiryHandler`] with bounded retry.
//! 3. The entry is acknowledged (removed from the journal) once the handler returns an
//!    outcome. Exhausted retries put the entry back in the queue after the redelivery
//!    interval.
//!
//! Scheduled expiries are never cancelled. An order that was paid or cancelled in the
//! meantime turns the delivery into a no-op.

use crate::model::OrderNo;
use crate::order_actor::OrderError;
use crate::retry::{retry_with_predicate, RetryPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// A journal record: the order and when it falls due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryEntry {
    pub order_no: OrderNo,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryOutcome {
    Expired,
    /// Paid or cancelled before the deadline.
    AlreadyTerminal,
    UnknownOrder,
}

/// The receiving end of a scheduled expiry.
#[async_trait]
pub trait ExpiryHandler: Clone + Send + Sync + 'static {
    async fn handle_expiry(&self, order_no: &OrderNo) -> Result<ExpiryOutcome, OrderError>;
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchedulerError {
    #[error("Expiry scheduler has stopped")]
    Stopped,
}

enum Command {
    Schedule { order_no: OrderNo, delay: Duration },
    Shutdown,
}

type Journal = Arc<Mutex<HashMap<OrderNo, DateTime<Utc>>>>;

fn lock(journal: &Journal) -> MutexGuard<'_, HashMap<OrderNo, DateTime<Utc>>> {
    journal.lock().unwrap_or_else(PoisonError::into_inner)
}

fn due_at(delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| Utc::now().checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn deadline(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay)
        .unwrap_or_else(|| now + Duration::from_secs(100 * 365 * 24 * 3600))
}

/// Handle for scheduling expiries. Cheap to clone.
#[derive(Clone)]
pub struct ExpiryScheduler {
    sender: mpsc::UnboundedSender<Command>,
    journal: Journal,
}

impl ExpiryScheduler {
    /// Creates the handle and the runner. Nothing is delivered until the runner is `run`.
    pub fn new(retry: RetryPolicy, redelivery: Duration) -> (Self, SchedulerRunner) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let journal: Journal = Arc::default();
        let runner = SchedulerRunner {
            receiver,
            journal: journal.clone(),
            retry,
            redelivery,
        };
        (Self { sender, journal }, runner)
    }

    /// Arranges for `order_no` to be expired once `delay` has passed. Never blocks.
    pub fn schedule_expiry(&self, order_no: OrderNo, delay: Duration) -> Result<(), SchedulerError> {
        self.enqueue(order_no, due_at(delay), delay)
    }

    /// Re-queues journal entries saved by an earlier run. Overdue entries fire immediately.
    pub fn restore(&self, entries: Vec<ExpiryEntry>) -> Result<(), SchedulerError> {
        let now = Utc::now();
        let count = entries.len();
        for entry in entries {
            let delay = (entry.due_at - now).to_std().unwrap_or(Duration::ZERO);
            self.enqueue(entry.order_no, entry.due_at, delay)?;
        }
        info!(count, "Restored scheduled expiries");
        Ok(())
    }

    /// Entries not yet acknowledged, earliest first.
    pub fn pending(&self) -> Vec<ExpiryEntry> {
        let mut entries: Vec<ExpiryEntry> = lock(&self.journal)
            .iter()
            .map(|(order_no, due_at)| ExpiryEntry {
                order_no: order_no.clone(),
                due_at: *due_at,
            })
            .collect();
        entries.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.order_no.cmp(&b.order_no)));
        entries
    }

    /// Stops the runner after in-flight deliveries finish. Queued entries stay in the journal.
    pub fn shutdown(&self) {
        let _ = self.sender.send(Command::Shutdown);
    }

    fn enqueue(
        &self,
        order_no: OrderNo,
        due_at: DateTime<Utc>,
        delay: Duration,
    ) -> Result<(), SchedulerError> {
        lock(&self.journal).insert(order_no.clone(), due_at);
        let command = Command::Schedule {
            order_no: order_no.clone(),
            delay,
        };
        if self.sender.send(command).is_err() {
            lock(&self.journal).remove(&order_no);
            return Err(SchedulerError::Stopped);
        }
        debug!(%order_no, %due_at, "Expiry scheduled");
        Ok(())
    }
}

/// Owns the deadline queue. Consumed by [`run`](Self::run).
pub struct SchedulerRunner {
    receiver: mpsc::UnboundedReceiver<Command>,
    journal: Journal,
    retry: RetryPolicy,
    redelivery: Duration,
}

impl SchedulerRunner {
    /// Runs until [`ExpiryScheduler::shutdown`] is called or every handle is dropped.
    pub async fn run<H: ExpiryHandler>(mut self, handler: H) {
        info!("Expiry scheduler started");
        let mut queue: BinaryHeap<Reverse<(Instant, OrderNo)>> = BinaryHeap::new();
        let mut deliveries: JoinSet<(OrderNo, bool)> = JoinSet::new();

        loop {
            let next_due = queue.peek().map(|Reverse((at, _))| *at);
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(Command::Schedule { order_no, delay }) => {
                        queue.push(Reverse((deadline(delay), order_no)));
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                    let now = Instant::now();
                    while let Some(Reverse((at, _))) = queue.peek() {
                        if *at > now {
                            break;
                        }
                        if let Some(Reverse((_, order_no))) = queue.pop() {
                            deliveries.spawn(deliver(
                                handler.clone(),
                                order_no,
                                self.retry.clone(),
                                self.journal.clone(),
                            ));
                        }
                    }
                }
                Some(joined) = deliveries.join_next(), if !deliveries.is_empty() => match joined {
                    Ok((_, true)) => {}
                    Ok((order_no, false)) => {
                        warn!(%order_no, redelivery_secs = self.redelivery.as_secs(), "Expiry not delivered, re-queued");
                        lock(&self.journal).insert(order_no.clone(), due_at(self.redelivery));
                        queue.push(Reverse((deadline(self.redelivery), order_no)));
                    }
                    Err(e) => error!(error = %e, "Expiry delivery task failed"),
                },
            }
        }

        while deliveries.join_next().await.is_some() {}
        info!(pending = lock(&self.journal).len(), "Expiry scheduler stopped");
    }
}

/// Returns `true` when the entry was acknowledged.
async fn deliver<H: ExpiryHandler>(
    handler: H,
    order_no: OrderNo,
    retry: RetryPolicy,
    journal: Journal,
) -> (OrderNo, bool) {
    let result = retry_with_predicate(
        &retry,
        || {
            let handler = handler.clone();
            let order_no = order_no.clone();
            async move { handler.handle_expiry(&order_no).await }
        },
        OrderError::is_retryable,
    )
    .await;

    match result {
        Ok(outcome) => {
            debug!(%order_no, ?outcome, "Expiry delivered");
            lock(&journal).remove(&order_no);
            (order_no, true)
        }
        Err(e) if e.is_retryable() => {
            warn!(%order_no, error = %e, "Expiry delivery failed");
            (order_no, false)
        }
        Err(e) => {
            error!(%order_no, error = %e, "Expiry rejected permanently, dropping it");
            lock(&journal).remove(&order_no);
            (order_no, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records deliveries and fails the first `failures` calls with a transport error.
    #[derive(Clone, Default)]
    struct RecordingHandler {
        delivered: Arc<Mutex<Vec<OrderNo>>>,
        failures: Arc<AtomicUsize>,
        unknown: bool,
    }

    impl RecordingHandler {
        fn failing(failures: usize) -> Self {
            let handler = Self::default();
            handler.failures.store(failures, Ordering::SeqCst);
            handler
        }

        fn delivered(&self) -> Vec<OrderNo> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExpiryHandler for RecordingHandler {
        async fn handle_expiry(&self, order_no: &OrderNo) -> Result<ExpiryOutcome, OrderError> {
            let failed = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(OrderError::ActorCommunicationError("order store down".into()));
            }
            self.delivered.lock().unwrap().push(order_no.clone());
            if self.unknown {
                Ok(ExpiryOutcome::UnknownOrder)
            } else {
                Ok(ExpiryOutcome::Expired)
            }
        }
    }

    fn no_retry() -> RetryPolicy {
        RetryPolicy::none()
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_entries_are_delivered_in_deadline_order() {
        let handler = RecordingHandler::default();
        let (scheduler, runner) = ExpiryScheduler::new(no_retry(), Duration::from_secs(30));
        let task = tokio::spawn(runner.run(handler.clone()));

        scheduler
            .schedule_expiry(OrderNo::from("late"), Duration::from_secs(10))
            .unwrap();
        scheduler
            .schedule_expiry(OrderNo::from("early"), Duration::from_secs(5))
            .unwrap();
        assert_eq!(scheduler.pending().len(), 2);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(handler.delivered(), vec![OrderNo::from("early")]);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            handler.delivered(),
            vec![OrderNo::from("early"), OrderNo::from("late")]
        );
        assert!(scheduler.pending().is_empty());

        scheduler.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delivery_is_redelivered() {
        let handler = RecordingHandler::failing(1);
        let (scheduler, runner) = ExpiryScheduler::new(no_retry(), Duration::from_secs(30));
        let task = tokio::spawn(runner.run(handler.clone()));

        scheduler
            .schedule_expiry(OrderNo::from("o-1"), Duration::from_secs(1))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handler.delivered().is_empty());
        assert_eq!(scheduler.pending().len(), 1, "unacknowledged entry stays journaled");

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handler.delivered(), vec![OrderNo::from("o-1")]);
        assert!(scheduler.pending().is_empty());

        scheduler.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_inside_one_delivery() {
        let handler = RecordingHandler::failing(2);
        let retry = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            multiplier: 2.0,
        };
        let (scheduler, runner) = ExpiryScheduler::new(retry, Duration::from_secs(30));
        let task = tokio::spawn(runner.run(handler.clone()));

        scheduler
            .schedule_expiry(OrderNo::from("o-1"), Duration::ZERO)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(handler.delivered(), vec![OrderNo::from("o-1")]);
        scheduler.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_orders_are_acknowledged() {
        let handler = RecordingHandler {
            unknown: true,
            ..Default::default()
        };
        let (scheduler, runner) = ExpiryScheduler::new(no_retry(), Duration::from_secs(30));
        let task = tokio::spawn(runner.run(handler.clone()));

        scheduler
            .schedule_expiry(OrderNo::from("ghost"), Duration::from_secs(1))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(scheduler.pending().is_empty());
        scheduler.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_journal_survives_restart() {
        let (first, runner) = ExpiryScheduler::new(no_retry(), Duration::from_secs(30));
        let task = tokio::spawn(runner.run(RecordingHandler::default()));
        first
            .schedule_expiry(OrderNo::from("o-1"), Duration::from_secs(3600))
            .unwrap();
        first.shutdown();
        task.await.unwrap();

        let saved = first.pending();
        assert_eq!(saved.len(), 1);
        assert!(first
            .schedule_expiry(OrderNo::from("o-2"), Duration::from_secs(1))
            .is_err());

        // Pretend the deadline passed while the process was down.
        let overdue: Vec<ExpiryEntry> = saved
            .into_iter()
            .map(|entry| ExpiryEntry {
                due_at: entry.due_at - chrono::Duration::hours(2),
                ..entry
            })
            .collect();
        let handler = RecordingHandler::default();
        let (second, runner) = ExpiryScheduler::new(no_retry(), Duration::from_secs(30));
        let task = tokio::spawn(runner.run(handler.clone()));
        second.restore(overdue).unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handler.delivered(), vec![OrderNo::from("o-1")]);
        second.shutdown();
        task.await.unwrap();
    }
}
