use super::handlers::{events, health, method_not_allowed, stream, webhook};
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/webhook",
            post(webhook::receive_webhook).fallback(method_not_allowed),
        )
        .route(
            "/events",
            get(events::list_events).fallback(method_not_allowed),
        )
        .route(
            "/events/stream",
            get(stream::stream_events).fallback(method_not_allowed),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
