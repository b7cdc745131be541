use crate::common::config::EndpointConfig;
use crate::common::{Config, GateError, Result};
use crate::core::{ImageBlob, ObjectKey};
use crate::service::{build_http_client, ImageStore};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// Uploads images to a bucket path behind the API gateway with a single PUT.
pub struct StorageClient {
    client: Client,
    endpoints: EndpointConfig,
    bucket_path: String,
}

impl StorageClient {
    /// Client for visitor uploads (`endpoints.upload_path`).
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_bucket_path(config, &config.endpoints.upload_path)
    }

    /// Client for employee registration uploads (`endpoints.register_path`).
    pub fn registration(config: &Config) -> Result<Self> {
        let path = config.endpoints.register_path.as_deref().ok_or_else(|| {
            GateError::Config("endpoints.register_path is not set".into())
        })?;
        Self::with_bucket_path(config, path)
    }

    fn with_bucket_path(config: &Config, bucket_path: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&config.http)?,
            endpoints: config.endpoints.clone(),
            bucket_path: bucket_path.to_string(),
        })
    }

    pub fn object_url(&self, key: &ObjectKey) -> String {
        self.endpoints.url(&[&self.bucket_path, key.as_str()])
    }
}

#[async_trait]
impl ImageStore for StorageClient {
    async fn put_image(&self, key: &ObjectKey, image: &ImageBlob) -> Result<()> {
        let url = self.object_url(key);
        tracing::info!("Uploading {} ({} bytes, {})", key, image.len(), image.content_type());

        let response = self
            .client
            .put(&url)
            .query(&[("acl", self.endpoints.acl.as_str())])
            .header(CONTENT_TYPE, image.content_type())
            .body(image.bytes().clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Upload of {} rejected with {}: {}", key, status, body);
            return Err(GateError::UploadStatus(status));
        }

        tracing::debug!("Upload of {} accepted with {}", key, status);
        Ok(())
    }
}
