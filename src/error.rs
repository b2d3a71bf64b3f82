//! Error types for the event store.

use thiserror::Error;

/// Main error type for store operations.
///
/// Eviction, filters with no match and unsubscribing an unknown handle are
/// not errors and never surface here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Subscriber limit reached ({limit})")]
    SubscriberLimit { limit: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Why a subscriber could not take a notification.
///
/// Returned by subscriber callbacks. The store logs it and moves on to the
/// next subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("subscriber disconnected")]
    Disconnected,

    #[error("subscriber buffer full")]
    Full,

    #[error("{0}")]
    Other(String),
}
