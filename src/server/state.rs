use super::auth::WebhookAuth;
use crate::store::EventStore;
use std::time::Duration;

/// Shortest keep-alive interval a stream will use.
pub const MIN_KEEP_ALIVE: Duration = Duration::from_secs(1);

/// Per-connection settings for the live stream.
#[derive(Clone, Debug)]
pub struct StreamSettings {
    /// Queued notifications per client before new ones are dropped.
    pub buffer: usize,
    /// Interval between SSE keep-alive comments. Raised to
    /// [`MIN_KEEP_ALIVE`] when shorter.
    pub keep_alive: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            buffer: 16,
            keep_alive: Duration::from_secs(15),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: EventStore,
    /// None disables the webhook bearer check.
    pub webhook_auth: Option<WebhookAuth>,
    pub stream: StreamSettings,
}

impl AppState {
    pub fn new(store: EventStore, webhook_secret: Option<&str>, stream: StreamSettings) -> Self {
        Self {
            store,
            webhook_auth: webhook_secret
                .filter(|secret| !secret.is_empty())
                .map(WebhookAuth::new),
            stream,
        }
    }
}
