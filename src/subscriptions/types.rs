//! Subscription handles.

use crate::error::DeliveryError;
use crate::types::Snapshot;
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Subscriber callback. Receives the full, unfiltered log after every
/// mutation; filtering is up to the subscriber.
pub type Callback = Arc<dyn Fn(&Snapshot) -> Result<(), DeliveryError> + Send + Sync>;

/// Something a [`Subscription`] can detach itself from.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: SubscriptionId);
}

/// Handle to an active subscription.
///
/// `unsubscribe` removes exactly this subscription and may be called any
/// number of times. Dropping the handle unsubscribes as well.
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, active: Arc<AtomicBool>, registry: Weak<dyn Detach>) -> Self {
        Self {
            id,
            active,
            registry,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the subscription is still registered.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Remove this subscription. No-op if already removed.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Some(registry) = self.registry.upgrade() {
                registry.detach(self.id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Subscription delivering snapshots over a bounded channel.
///
/// A full buffer drops the notification for this subscriber only; the next
/// notification carries the complete log again.
#[derive(Debug)]
pub struct ChannelSubscription {
    subscription: Subscription,
    receiver: Receiver<Snapshot>,
}

impl ChannelSubscription {
    pub(crate) fn new(subscription: Subscription, receiver: Receiver<Snapshot>) -> Self {
        Self {
            subscription,
            receiver,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Receive the next snapshot (blocking).
    pub fn recv(&self) -> Result<Snapshot, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a snapshot (non-blocking).
    pub fn try_recv(&self) -> Result<Snapshot, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Snapshot, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued.
    pub fn drain(&self) -> Vec<Snapshot> {
        self.receiver.try_iter().collect()
    }
}
