//! Outbox for decision notifications.
//!
//! Events are appended only after the decision is persisted. Delivery runs
//! afterwards and its failures never reach the transition that produced the
//! event.

use std::{
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use fund_domain::NotificationEvent;
use parking_lot::Mutex;

use crate::ports::Notifier;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Outcome of a single [`Outbox::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub retrying: usize,
    pub dropped: usize,
}

struct PendingEvent {
    event: NotificationEvent,
    attempts: u32,
}

pub struct Outbox {
    notifier: Arc<dyn Notifier>,
    pending: Mutex<VecDeque<PendingEvent>>,
    dead_letters: Mutex<Vec<NotificationEvent>>,
    max_attempts: u32,
}

impl Outbox {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_max_attempts(notifier, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(notifier: Arc<dyn Notifier>, max_attempts: u32) -> Self {
        Self {
            notifier,
            pending: Mutex::new(VecDeque::new()),
            dead_letters: Mutex::new(Vec::new()),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn enqueue(&self, event: NotificationEvent) {
        self.pending.lock().push_back(PendingEvent { event, attempts: 0 });
    }

    /// Attempts delivery of the events queued when the flush started.
    ///
    /// Events are taken one at a time and stay owned by the outbox until their
    /// attempt settles. A notifier that panics counts as a failed attempt.
    pub fn flush(&self) -> FlushReport {
        let mut report = FlushReport::default();
        let due = self.pending.lock().len();
        for _ in 0..due {
            let Some(mut pending) = self.pending.lock().pop_front() else {
                break;
            };
            let reason = match self.deliver(&pending.event) {
                Ok(()) => {
                    report.delivered += 1;
                    continue;
                }
                Err(reason) => reason,
            };
            pending.attempts += 1;
            if pending.attempts >= self.max_attempts {
                tracing::warn!(
                    event = %pending.event.id,
                    submission = %pending.event.submission_id,
                    attempts = pending.attempts,
                    error = %reason,
                    "dropping notification after repeated failures"
                );
                self.dead_letters.lock().push(pending.event);
                report.dropped += 1;
            } else {
                tracing::warn!(
                    event = %pending.event.id,
                    attempts = pending.attempts,
                    error = %reason,
                    "notification delivery failed; will retry"
                );
                self.pending.lock().push_back(pending);
                report.retrying += 1;
            }
        }
        report
    }

    fn deliver(&self, event: &NotificationEvent) -> Result<(), String> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.notifier.notify(event))) {
            Ok(result) => result.map_err(|err| err.to_string()),
            Err(_) => Err("notifier panicked".to_string()),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn dead_letters(&self) -> Vec<NotificationEvent> {
        self.dead_letters.lock().clone()
    }
}
