//! Registration client against a local stand-in for the Safe Events Service.

#![cfg(feature = "server")]

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use safe_relay::register::{RegisterError, RegistrationClient, WebhookRegistration};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

type Received = Arc<Mutex<Vec<Value>>>;

/// Serve `POST /webhooks` on an ephemeral port, answering with `status`.
async fn spawn_service(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route(
            "/webhooks",
            post(
                move |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().await.push(body);
                    (status, Json(json!({"id": "wh-1"})))
                },
            ),
        )
        .with_state(Arc::clone(&received));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), received)
}

#[tokio::test]
async fn test_register_success() {
    let (base, received) = spawn_service(StatusCode::CREATED).await;
    let client = RegistrationClient::new(format!("{base}/"));
    let registration = WebhookRegistration::new("https://relay.example.com", "token")
        .with_chain_ids(vec![100]);

    let response = client.register(&registration).await.unwrap();

    assert_eq!(response, json!({"id": "wh-1"}));
    let received = received.lock().await;
    assert_eq!(
        *received,
        vec![json!({
            "url": "https://relay.example.com/api/webhook",
            "authToken": "token",
            "chainIds": [100],
            "eventTypes": ["ALL"]
        })]
    );
}

#[tokio::test]
async fn test_register_rejected() {
    let (base, _received) = spawn_service(StatusCode::BAD_REQUEST).await;
    let client = RegistrationClient::new(base);
    let registration = WebhookRegistration::new("https://relay.example.com", "token");

    let err = client.register(&registration).await.unwrap_err();

    match err {
        RegisterError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("wh-1"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_register_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RegistrationClient::new(format!("http://{addr}"));
    let registration = WebhookRegistration::new("https://relay.example.com", "token");

    let err = client.register(&registration).await.unwrap_err();
    assert!(matches!(err, RegisterError::Http(_)));
}
