use crate::common::{GateError, Result};
use crate::core::{ImageBlob, ObjectKey};
use crate::service::{AuthOutcome, FaceMatcher, ImageStore};
use tokio_util::sync::CancellationToken;

/// Uploads `image` under a fresh object key, then asks the matcher about that key.
/// The matcher is never called unless the upload succeeded.
pub async fn run(
    store: &dyn ImageStore,
    matcher: &dyn FaceMatcher,
    image: &ImageBlob,
    cancel: &CancellationToken,
) -> Result<(ObjectKey, AuthOutcome)> {
    let key = ObjectKey::generate();

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!("Submission for {} cancelled", key);
            Err(GateError::Cancelled)
        }
        outcome = upload_then_match(store, matcher, &key, image) => {
            outcome.map(|outcome| (key, outcome))
        }
    }
}

async fn upload_then_match(
    store: &dyn ImageStore,
    matcher: &dyn FaceMatcher,
    key: &ObjectKey,
    image: &ImageBlob,
) -> Result<AuthOutcome> {
    store.put_image(key, image).await?;

    let payload = matcher.authenticate(key).await?;
    let outcome = AuthOutcome::from(payload);
    tracing::info!("Authentication for {}: {:?}", key, outcome);
    Ok(outcome)
}

/// Uploads an enrollment photo as `<First>_<Last>.jpeg` to the registration bucket.
pub async fn register_employee(
    store: &dyn ImageStore,
    first_name: &str,
    last_name: &str,
    image: &ImageBlob,
) -> Result<ObjectKey> {
    let key = ObjectKey::employee(first_name, last_name)?;
    store.put_image(&key, image).await?;
    tracing::info!("Uploaded registration photo {}", key);
    Ok(key)
}
