use crate::common::config::EndpointConfig;
use crate::common::{Config, ErrorStatusPolicy, GateError, Result};
use crate::core::ObjectKey;
use crate::service::protocol::MatchPayload;
use crate::service::{build_http_client, FaceMatcher};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

const APPLICATION_JSON: &str = "application/json";

/// Queries the matching service for an already uploaded object.
pub struct MatchClient {
    client: Client,
    endpoints: EndpointConfig,
    error_status: ErrorStatusPolicy,
}

impl MatchClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&config.http)?,
            endpoints: config.endpoints.clone(),
            error_status: config.auth.error_status,
        })
    }

    pub fn auth_url(&self) -> String {
        self.endpoints.url(&[&self.endpoints.auth_path])
    }
}

#[async_trait]
impl FaceMatcher for MatchClient {
    async fn authenticate(&self, key: &ObjectKey) -> Result<MatchPayload> {
        let response = self
            .client
            .get(self.auth_url())
            .query(&[("objectKey", key.as_str())])
            .header(ACCEPT, APPLICATION_JSON)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .send()
            .await
            .map_err(|e| GateError::AuthTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() && self.error_status == ErrorStatusPolicy::AsError {
            return Err(GateError::AuthTransport(format!(
                "matching service returned {}", status
            )));
        }

        let payload: MatchPayload = response
            .json()
            .await
            .map_err(|e| GateError::AuthTransport(format!("invalid response body: {}", e)))?;

        if status.is_success() {
            tracing::debug!("Match response for {}: {:?}", key, payload);
        } else {
            // Error bodies are well-formed results ("Person Not Found" comes back as 403)
            tracing::warn!("Match response for {} with status {}: {:?}", key, status, payload);
        }

        Ok(payload)
    }
}
