use super::AddressQuery;
use crate::error::DeliveryError;
use crate::server::error::AppError;
use crate::server::state::{AppState, MIN_KEEP_ALIVE};
use crate::subscriptions::Subscription;
use crate::types::{EventsEnvelope, Snapshot};
use axum::{
    extract::{Query, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

/// Live side of one stream connection. Dropping it (client disconnect)
/// unsubscribes from the store.
struct LiveFeed {
    receiver: mpsc::Receiver<Snapshot>,
    subscription: Subscription,
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        debug!(subscription = %self.subscription.id(), "Stream client disconnected");
    }
}

fn to_sse(snapshot: Snapshot) -> Result<SseEvent, axum::Error> {
    SseEvent::default().json_data(EventsEnvelope::from(snapshot))
}

/// `GET /api/events/stream`
///
/// Sends the current (filtered) log first, then the filtered log again
/// after every store mutation.
pub async fn stream_events(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, axum::Error>>>, AppError> {
    let address = query.filter().map(str::to_string);
    let (sender, receiver) = mpsc::channel(state.stream.buffer.max(1));

    let filter = address.clone();
    let (log, subscription) = state.store.snapshot_and_subscribe(move |log| {
        sender
            .try_send(log.filtered(filter.as_deref()))
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Closed(_) => DeliveryError::Disconnected,
            })
    })?;

    info!(
        subscription = %subscription.id(),
        address = address.as_deref().unwrap_or("*"),
        "Stream client connected"
    );

    let initial = stream::once(std::future::ready(log.filtered(address.as_deref())));
    let feed = LiveFeed {
        receiver,
        subscription,
    };
    let updates = stream::unfold(feed, |mut feed| async move {
        let snapshot = feed.receiver.recv().await?;
        Some((snapshot, feed))
    });

    let events = initial.chain(updates).map(to_sse);
    let keep_alive = state.stream.keep_alive.max(MIN_KEEP_ALIVE);
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(keep_alive)))
}
