use crate::common::config::HttpConfig;
use crate::common::{GateError, Result};
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client shared by the storage and matcher clients.
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("facegate/", env!("CARGO_PKG_VERSION")));

    if let Some(timeout) = config.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(timeout));
    }

    builder
        .build()
        .map_err(|e| GateError::Config(format!("Failed to create HTTP client: {}", e)))
}
