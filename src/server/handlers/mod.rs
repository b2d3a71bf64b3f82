pub mod events;
pub mod health;
pub mod stream;
pub mod webhook;

use super::error::AppError;
use serde::Deserialize;

/// `?address=` on the retrieval endpoints. An empty value means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct AddressQuery {
    pub address: Option<String>,
}

impl AddressQuery {
    pub fn filter(&self) -> Option<&str> {
        self.address.as_deref().filter(|a| !a.is_empty())
    }
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
