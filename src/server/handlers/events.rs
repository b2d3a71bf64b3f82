use super::AddressQuery;
use crate::server::state::AppState;
use crate::types::EventsEnvelope;
use axum::{
    extract::{Query, State},
    Json,
};

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Json<EventsEnvelope> {
    Json(state.store.query(query.filter()).into())
}
