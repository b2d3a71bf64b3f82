//! Subscriber registry and fan-out.

use crate::error::{DeliveryError, Result, StoreError};
use crate::types::Snapshot;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::types::{Callback, SubscriptionId};

/// Internal subscription state.
#[derive(Clone)]
pub(crate) struct Subscriber {
    pub(crate) id: SubscriptionId,
    callback: Callback,
    /// Shared with the handle; cleared on unsubscribe.
    active: Arc<AtomicBool>,
}

impl Subscriber {
    /// Invoke the callback, containing both returned errors and panics.
    fn notify(&self, snapshot: &Snapshot) -> std::result::Result<(), DeliveryError> {
        match catch_unwind(AssertUnwindSafe(|| (self.callback)(snapshot))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "subscriber panicked".to_string());
                Err(DeliveryError::Other(message))
            }
        }
    }
}

/// Active subscriptions in registration order.
///
/// Not synchronized on its own; the store keeps it under the same lock as
/// the log.
pub(crate) struct SubscriberRegistry {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    limit: Option<usize>,
}

impl SubscriberRegistry {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
            limit,
        }
    }

    /// Register a callback. Fails only when a subscriber limit is configured
    /// and already reached.
    pub(crate) fn register(&mut self, callback: Callback) -> Result<(SubscriptionId, Arc<AtomicBool>)> {
        if let Some(limit) = self.limit {
            if self.subscribers.len() >= limit {
                return Err(StoreError::SubscriberLimit { limit });
            }
        }

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let active = Arc::new(AtomicBool::new(true));
        self.subscribers.push(Subscriber {
            id,
            callback,
            active: Arc::clone(&active),
        });
        debug!(subscription = %id, subscribers = self.subscribers.len(), "Subscriber registered");

        Ok((id, active))
    }

    /// Remove a subscription, handing it back so the caller can drop the
    /// callback after releasing its lock. `None` if it was not registered.
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> Option<Subscriber> {
        let pos = self.subscribers.iter().position(|s| s.id == id)?;
        let removed = self.subscribers.remove(pos);
        removed.active.store(false, Ordering::SeqCst);
        debug!(subscription = %id, subscribers = self.subscribers.len(), "Subscriber removed");
        Some(removed)
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Copy of the current subscriber list, for notifying outside the lock.
    pub(crate) fn targets(&self) -> Vec<Subscriber> {
        self.subscribers.clone()
    }
}

/// Outcome of one notification round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BroadcastReport {
    pub(crate) delivered: usize,
    pub(crate) failed: usize,
}

/// Notify every target, in order, with the same snapshot.
///
/// Failures are logged and counted; they never stop the round. Targets
/// unsubscribed since the list was taken are skipped.
pub(crate) fn broadcast(targets: &[Subscriber], snapshot: &Snapshot) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for sub in targets {
        if !sub.active.load(Ordering::SeqCst) {
            continue;
        }
        match sub.notify(snapshot) {
            Ok(()) => report.delivered += 1,
            Err(DeliveryError::Disconnected) => {
                report.failed += 1;
                debug!(subscription = %sub.id, "Subscriber disconnected");
            }
            Err(e) => {
                report.failed += 1;
                warn!(subscription = %sub.id, error = %e, "Subscriber notification failed");
            }
        }
    }

    trace!(
        delivered = report.delivered,
        failed = report.failed,
        events = snapshot.len(),
        "Broadcast complete"
    );
    report
}
