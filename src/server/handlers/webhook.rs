use crate::server::state::AppState;
use crate::types::NewEvent;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a webhook body could not be turned into an event.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing or invalid field `{0}`")]
    MissingField(&'static str),
}

/// Build an event from a Safe webhook body. The whole body becomes the
/// event payload.
pub fn parse_payload(body: &[u8]) -> Result<NewEvent, PayloadError> {
    let payload: Value = serde_json::from_slice(body)?;
    let fields = payload.as_object().ok_or(PayloadError::NotAnObject)?;

    let address = fields
        .get("address")
        .and_then(Value::as_str)
        .ok_or(PayloadError::MissingField("address"))?
        .to_string();
    let event_type = fields
        .get("type")
        .and_then(Value::as_str)
        .ok_or(PayloadError::MissingField("type"))?
        .to_string();
    // Chain ids arrive as strings, but accept bare numbers as well.
    let chain_id = match fields.get("chainId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(PayloadError::MissingField("chainId")),
    };

    Ok(NewEvent {
        address,
        event_type,
        chain_id,
        payload,
    })
}

/// `POST /api/webhook`
///
/// Always answers 202 with an empty body, whether the delivery was
/// authorized, malformed or accepted. Recording happens after the response
/// is produced, on the blocking pool.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(auth) = &state.webhook_auth {
        if !auth.verify(headers.get(AUTHORIZATION)) {
            warn!("Unauthorized webhook request");
            return StatusCode::ACCEPTED;
        }
    }

    let new_event = match parse_payload(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed webhook payload");
            return StatusCode::ACCEPTED;
        }
    };

    info!(
        event_type = %new_event.event_type,
        address = %new_event.address,
        chain_id = %new_event.chain_id,
        "Received Safe webhook event"
    );

    let store = state.store.clone();
    tokio::task::spawn_blocking(move || {
        let event = store.record(new_event);
        debug!(id = %event.id, "Event stored");
    });

    StatusCode::ACCEPTED
}
