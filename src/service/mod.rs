pub mod client;
pub mod matcher;
pub mod protocol;
pub mod storage;

use crate::common::Result;
use crate::core::{ImageBlob, ObjectKey};
use async_trait::async_trait;

pub use client::build_http_client;
pub use matcher::MatchClient;
pub use protocol::{AuthOutcome, MatchPayload};
pub use storage::StorageClient;

/// Object storage accepting image uploads.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put_image(&self, key: &ObjectKey, image: &ImageBlob) -> Result<()>;
}

/// Matching service comparing a stored image against the employee directory.
#[async_trait]
pub trait FaceMatcher: Send + Sync {
    async fn authenticate(&self, key: &ObjectKey) -> Result<MatchPayload>;
}
