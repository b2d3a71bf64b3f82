//! Event id generation and the store clock.
//!
//! Default ids look like `1735732800000-k3j9x0q2m`: a millisecond timestamp
//! followed by a random base36 suffix. Uniqueness is probabilistic, not
//! guaranteed. Tests can swap in [`SequentialIds`] for deterministic output.

use crate::types::EventId;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random id suffix.
pub const SUFFIX_LEN: usize = 9;

/// Source of acceptance timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Produces event ids.
pub trait IdGenerator: Send + Sync {
    /// Generate an id for an event accepted at `at`.
    fn next_id(&self, at: DateTime<Utc>) -> EventId;
}

/// Timestamp plus random base36 suffix.
///
/// The timestamp component never goes backwards within one generator, even
/// if the wall clock does.
#[derive(Debug, Default)]
pub struct RandomSuffixIds {
    last_millis: AtomicI64,
}

impl RandomSuffixIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn clamp_millis(&self, millis: i64) -> i64 {
        let previous = self.last_millis.fetch_max(millis, Ordering::SeqCst);
        previous.max(millis)
    }
}

impl IdGenerator for RandomSuffixIds {
    fn next_id(&self, at: DateTime<Utc>) -> EventId {
        let millis = self.clamp_millis(at.timestamp_millis());
        EventId(format!("{}-{}", millis, random_suffix(&mut rand::thread_rng())))
    }
}

fn random_suffix<R: Rng>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Deterministic ids: `evt-1`, `evt-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, _at: DateTime<Utc>) -> EventId {
        EventId(format!("evt-{}", self.next.fetch_add(1, Ordering::SeqCst)))
    }
}
