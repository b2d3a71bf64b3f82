//! Subscription system for live log updates.
//!
//! Every mutation of the log (a new event, or a clear) notifies all active
//! subscribers with the full, unfiltered log. Subscribers filter on their own.
//!
//! Subscriptions come in two shapes:
//! - Callbacks, invoked synchronously in registration order
//! - Channels, a bounded per-subscriber queue for consumers on other threads
//!
//! A failing callback (returned error or panic) is logged and skipped; it
//! never affects other subscribers or the writer.
//!
//! # Example
//!
//! ```ignore
//! let sub = store.subscribe_channel(16)?;
//!
//! loop {
//!     match sub.recv() {
//!         Ok(snapshot) => println!("{} events", snapshot.len()),
//!         Err(_) => break,
//!     }
//! }
//! ```

mod manager;
mod types;

pub(crate) use manager::{broadcast, SubscriberRegistry};
pub(crate) use types::Detach;
pub use types::{Callback, ChannelSubscription, Subscription, SubscriptionId};
