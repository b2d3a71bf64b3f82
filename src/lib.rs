//! # Safe Relay
//!
//! Receives webhook events from the Safe Events Service, keeps the most
//! recent ones in memory and rebroadcasts them to viewers.
//!
//! ## Core Concepts
//!
//! - **Events**: Immutable records tied to a Safe address, category and chain
//! - **Log**: Bounded, newest-first; the oldest events are evicted silently
//! - **Snapshots**: Immutable views of the log, optionally filtered by address
//! - **Subscriptions**: Callbacks or channels notified with the full log on
//!   every mutation
//!
//! ## Example
//!
//! ```ignore
//! use safe_relay::{EventStore, NewEvent, StoreConfig};
//!
//! let store = EventStore::new(StoreConfig::default())?;
//!
//! let sub = store.subscribe(|log| {
//!     println!("{} events", log.len());
//!     Ok(())
//! })?;
//!
//! store.record(NewEvent::new("0xAbC", "INCOMING_ETHER", "1", json!({})));
//!
//! let mine = store.query(Some("0xabc"));
//! sub.unsubscribe();
//! ```

#[cfg(feature = "server")]
pub mod config;
pub mod error;
pub mod ids;
#[cfg(feature = "server")]
pub mod register;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{DeliveryError, Result, StoreError};
pub use ids::{Clock, IdGenerator, RandomSuffixIds, SequentialIds, SystemClock};
pub use store::{EventStore, StoreConfig, DEFAULT_MAX_EVENTS};
pub use subscriptions::{Callback, ChannelSubscription, Subscription, SubscriptionId};
pub use types::*;
