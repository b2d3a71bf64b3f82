//! The event broadcast store.

use crate::error::{DeliveryError, Result, StoreError};
use crate::ids::{Clock, IdGenerator, RandomSuffixIds, SystemClock};
use crate::subscriptions::{
    broadcast, ChannelSubscription, Detach, SubscriberRegistry, Subscription, SubscriptionId,
};
use crate::types::{Event, NewEvent, Snapshot, StoreStats};
use crossbeam_channel::{bounded, TrySendError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Default number of retained events.
pub const DEFAULT_MAX_EVENTS: usize = 100;

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Maximum retained events. Older events are evicted silently.
    pub max_events: usize,

    /// Optional cap on concurrent subscriptions (None = unbounded).
    pub max_subscribers: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
            max_subscribers: None,
        }
    }
}

/// Log and registry, guarded together.
struct State {
    log: Snapshot,
    subscribers: SubscriberRegistry,
}

struct Inner {
    config: StoreConfig,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,

    /// Serializes writers across insert, evict and notify, so subscribers
    /// see notifications in mutation order.
    write_lock: Mutex<()>,

    state: Mutex<State>,

    total_recorded: AtomicU64,
    total_evicted: AtomicU64,
}

impl Detach for Inner {
    fn detach(&self, id: SubscriptionId) {
        let removed = self.state.lock().subscribers.remove(id);
        // Dropped here, outside the lock.
        drop(removed);
    }
}

/// Bounded, newest-first event log with subscriber fan-out.
///
/// Cloning is cheap and yields a handle to the same store.
///
/// - `record` prepends an event, evicts beyond capacity and notifies every
///   subscriber with the full log
/// - `query` returns an immutable snapshot, optionally filtered by address
/// - `subscribe` registers a callback for future mutations only
/// - `clear` empties the log and notifies
///
/// Subscriber callbacks run on the writer's thread after the state lock is
/// released. They may call `query`, `subscribe` or `unsubscribe`, but must
/// not call `record` or `clear`.
#[derive(Clone)]
pub struct EventStore {
    inner: Arc<Inner>,
}

impl EventStore {
    /// Create a store with the default id generator and wall clock.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_generators(config, RandomSuffixIds::new(), SystemClock)
    }

    /// Create a store with custom id and timestamp sources.
    pub fn with_generators(
        config: StoreConfig,
        ids: impl IdGenerator + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        if config.max_events == 0 {
            return Err(StoreError::InvalidConfig(
                "max_events must be at least 1".to_string(),
            ));
        }

        let subscribers = SubscriberRegistry::new(config.max_subscribers);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                ids: Box::new(ids),
                clock: Box::new(clock),
                write_lock: Mutex::new(()),
                state: Mutex::new(State {
                    log: Snapshot::empty(),
                    subscribers,
                }),
                total_recorded: AtomicU64::new(0),
                total_evicted: AtomicU64::new(0),
            }),
        })
    }

    // --- Write Operations ---

    /// Record an event and notify subscribers.
    ///
    /// Always succeeds once the log is updated; subscriber failures are
    /// logged and ignored.
    pub fn record(&self, new: NewEvent) -> Event {
        let _write = self.inner.write_lock.lock();

        let recorded_at = self.inner.clock.now();
        let id = self.inner.ids.next_id(recorded_at);
        let event = Event::from_new(id, recorded_at, new);

        let (snapshot, evicted, targets) = {
            let mut state = self.inner.state.lock();
            let (next, evicted) = state.log.prepend(event.clone(), self.inner.config.max_events);
            state.log = next.clone();
            (next, evicted, state.subscribers.targets())
        };

        self.inner.total_recorded.fetch_add(1, Ordering::Relaxed);
        if evicted > 0 {
            self.inner
                .total_evicted
                .fetch_add(evicted as u64, Ordering::Relaxed);
            trace!(evicted, capacity = self.inner.config.max_events, "Evicted oldest events");
        }

        debug!(
            id = %event.id,
            address = %event.address,
            event_type = %event.event_type,
            chain_id = %event.chain_id,
            "Event recorded"
        );

        broadcast(&targets, &snapshot);
        event
    }

    /// Empty the log and notify subscribers with the empty log.
    pub fn clear(&self) {
        let _write = self.inner.write_lock.lock();

        let (snapshot, targets) = {
            let mut state = self.inner.state.lock();
            state.log = Snapshot::empty();
            (state.log.clone(), state.subscribers.targets())
        };

        debug!("Event log cleared");
        broadcast(&targets, &snapshot);
    }

    // --- Read Operations ---

    /// Current log, newest first. With an address, only events whose
    /// address matches case-insensitively.
    pub fn query(&self, address: Option<&str>) -> Snapshot {
        let log = self.inner.state.lock().log.clone();
        log.filtered(address)
    }

    /// Full current log, newest first.
    pub fn snapshot(&self) -> Snapshot {
        self.query(None)
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum retained events.
    pub fn capacity(&self) -> usize {
        self.inner.config.max_events
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    // --- Subscriptions ---

    /// Register a callback invoked with the full log after every mutation.
    ///
    /// The current log is not delivered; use `query` for an initial snapshot.
    pub fn subscribe<F>(&self, callback: F) -> Result<Subscription>
    where
        F: Fn(&Snapshot) -> std::result::Result<(), DeliveryError> + Send + Sync + 'static,
    {
        let (id, active) = self
            .inner
            .state
            .lock()
            .subscribers
            .register(Arc::new(callback))?;

        Ok(self.handle(id, active))
    }

    /// Take the full current log and subscribe in one step.
    ///
    /// Every mutation is either already in the returned snapshot or
    /// delivered to the callback afterwards, never both and never neither.
    pub fn snapshot_and_subscribe<F>(&self, callback: F) -> Result<(Snapshot, Subscription)>
    where
        F: Fn(&Snapshot) -> std::result::Result<(), DeliveryError> + Send + Sync + 'static,
    {
        let (log, id, active) = {
            let mut state = self.inner.state.lock();
            let (id, active) = state.subscribers.register(Arc::new(callback))?;
            (state.log.clone(), id, active)
        };

        Ok((log, self.handle(id, active)))
    }

    fn handle(&self, id: SubscriptionId, active: Arc<AtomicBool>) -> Subscription {
        let registry: Weak<dyn Detach> = Arc::downgrade(&self.inner) as Weak<dyn Detach>;
        Subscription::new(id, active, registry)
    }

    /// Subscribe through a bounded channel of `buffer` snapshots.
    ///
    /// The writer never waits on the channel: when it is full the
    /// notification is dropped for this subscriber.
    pub fn subscribe_channel(&self, buffer: usize) -> Result<ChannelSubscription> {
        let (sender, receiver) = bounded(buffer.max(1));
        let subscription = self.subscribe(move |snapshot| {
            sender.try_send(snapshot.clone()).map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Disconnected(_) => DeliveryError::Disconnected,
            })
        })?;
        Ok(ChannelSubscription::new(subscription, receiver))
    }

    /// Remove a subscription by id. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.detach(id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    // --- Stats ---

    pub fn stats(&self) -> StoreStats {
        let (events, subscribers) = {
            let state = self.inner.state.lock();
            (state.log.len(), state.subscribers.len())
        };
        StoreStats {
            events,
            capacity: self.inner.config.max_events,
            subscribers,
            total_recorded: self.inner.total_recorded.load(Ordering::Relaxed),
            total_evicted: self.inner.total_evicted.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for EventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStore")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}
