//! Webhook registration with the Safe Events Service.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// Default Safe Events Service endpoint.
pub const DEFAULT_EVENTS_API: &str = "https://safe-events.safe.global";

/// Ethereum mainnet and Sepolia.
pub const DEFAULT_CHAIN_IDS: [u64; 2] = [1, 11_155_111];

/// Path the relay receives webhooks on.
pub const WEBHOOK_PATH: &str = "/api/webhook";

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registration rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Body of `POST <events_api>/webhooks`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRegistration {
    pub url: String,
    pub auth_token: String,
    pub chain_ids: Vec<u64>,
    pub event_types: Vec<String>,
}

impl WebhookRegistration {
    /// Register `<public_url>/api/webhook` for all event types on the
    /// default chains.
    pub fn new(public_url: &str, auth_token: impl Into<String>) -> Self {
        Self {
            url: format!("{}{}", public_url.trim_end_matches('/'), WEBHOOK_PATH),
            auth_token: auth_token.into(),
            chain_ids: DEFAULT_CHAIN_IDS.to_vec(),
            event_types: vec!["ALL".to_string()],
        }
    }

    pub fn with_chain_ids(mut self, chain_ids: Vec<u64>) -> Self {
        self.chain_ids = chain_ids;
        self
    }
}

pub struct RegistrationClient {
    http: reqwest::Client,
    api_base: String,
}

impl RegistrationClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base)
    }

    pub fn with_client(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/webhooks", self.api_base)
    }

    /// Submit the registration. Returns the service's response body, as
    /// JSON when it parses and as a string otherwise.
    pub async fn register(&self, registration: &WebhookRegistration) -> Result<Value, RegisterError> {
        let endpoint = self.endpoint();
        info!(url = %registration.url, endpoint = %endpoint, "Registering webhook");

        let res = self.http.post(&endpoint).json(registration).send().await?;
        let status = res.status();
        let body = res.text().await?;
        debug!(status = status.as_u16(), "Registration response received");

        if !status.is_success() {
            return Err(RegisterError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_body() {
        let registration = WebhookRegistration::new("https://relay.example.com/", "token");
        assert_eq!(
            serde_json::to_value(&registration).unwrap(),
            json!({
                "url": "https://relay.example.com/api/webhook",
                "authToken": "token",
                "chainIds": [1, 11155111],
                "eventTypes": ["ALL"]
            })
        );
    }

    #[test]
    fn test_endpoint() {
        let client = RegistrationClient::new("https://safe-events.safe.global/");
        assert_eq!(client.endpoint(), "https://safe-events.safe.global/webhooks");
    }
}
