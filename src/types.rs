//! Core types for the event relay.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Unique identifier for an event (assigned by the store).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes as an ISO-8601 UTC string with millisecond precision,
/// e.g. `2025-01-01T12:00:00.000Z`.
fn serialize_recorded_at<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// An event waiting to be recorded. The store assigns `id` and `recorded_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    /// Subject address (a Safe account). Stored as received.
    pub address: String,
    /// Event category, e.g. `EXECUTED_MULTISIG_TRANSACTION`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Origin network.
    pub chain_id: String,
    /// Opaque payload, returned verbatim.
    #[serde(rename = "data")]
    pub payload: serde_json::Value,
}

impl NewEvent {
    pub fn new(
        address: impl Into<String>,
        event_type: impl Into<String>,
        chain_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            address: address.into(),
            event_type: event_type.into(),
            chain_id: chain_id.into(),
            payload,
        }
    }
}

/// A recorded event. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    /// Time the store accepted the event.
    #[serde(rename = "timestamp", serialize_with = "serialize_recorded_at")]
    pub recorded_at: DateTime<Utc>,
    pub address: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub chain_id: String,
    #[serde(rename = "data")]
    pub payload: serde_json::Value,
}

impl Event {
    pub(crate) fn from_new(id: EventId, recorded_at: DateTime<Utc>, new: NewEvent) -> Self {
        Self {
            id,
            recorded_at,
            address: new.address,
            event_type: new.event_type,
            chain_id: new.chain_id,
            payload: new.payload,
        }
    }

    /// Case-insensitive address comparison.
    pub fn matches_address(&self, address: &str) -> bool {
        self.address.to_lowercase() == address.to_lowercase()
    }
}

/// An immutable, newest-first view of the log at one point in time.
///
/// Cloning is cheap; the underlying events are shared and never mutated.
#[derive(Clone, PartialEq)]
pub struct Snapshot(Arc<[Event]>);

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot(Arc::from(Vec::new()))
    }

    /// Events whose address matches `address` case-insensitively, order preserved.
    pub fn filter_address(&self, address: &str) -> Snapshot {
        self.0
            .iter()
            .filter(|event| event.matches_address(address))
            .cloned()
            .collect()
    }

    /// Applies an optional address filter. `None` returns the same snapshot.
    pub fn filtered(&self, address: Option<&str>) -> Snapshot {
        match address {
            Some(address) => self.filter_address(address),
            None => self.clone(),
        }
    }

    /// Most recent event, if any.
    pub fn newest(&self) -> Option<&Event> {
        self.0.first()
    }

    pub fn to_vec(&self) -> Vec<Event> {
        self.0.to_vec()
    }

    /// Builds the next log: `event` first, then up to `capacity - 1` retained
    /// events. Returns the new snapshot and the number of events evicted.
    pub(crate) fn prepend(&self, event: Event, capacity: usize) -> (Snapshot, usize) {
        let keep = self.0.len().min(capacity.saturating_sub(1));
        let evicted = self.0.len() - keep;
        let mut events = Vec::with_capacity(keep + 1);
        events.push(event);
        events.extend_from_slice(&self.0[..keep]);
        (Snapshot(events.into()), evicted)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for Snapshot {
    type Target = [Event];

    fn deref(&self) -> &[Event] {
        &self.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|e| &e.id)).finish()
    }
}

impl FromIterator<Event> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Snapshot(iter.into_iter().collect())
    }
}

impl From<Vec<Event>> for Snapshot {
    fn from(events: Vec<Event>) -> Self {
        Snapshot(events.into())
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Body of the snapshot and stream endpoints: `{"events": [...]}`.
#[derive(Clone, Debug, Serialize)]
pub struct EventsEnvelope {
    pub events: Snapshot,
}

impl From<Snapshot> for EventsEnvelope {
    fn from(events: Snapshot) -> Self {
        Self { events }
    }
}

/// Store statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Events currently retained.
    pub events: usize,
    /// Maximum retained events.
    pub capacity: usize,
    /// Active subscriptions.
    pub subscribers: usize,
    /// Events recorded since the store was created.
    pub total_recorded: u64,
    /// Events dropped by eviction since the store was created.
    pub total_evicted: u64,
}
