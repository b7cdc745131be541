use crate::camera::{CameraController, FrameSource};
use crate::common::Result;
use crate::core::state::{reduce, Event, SubmissionId, SubmitFailure, UiState};
use crate::core::{submission, ImageBlob};
use crate::service::{FaceMatcher, ImageStore};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Receiving end for results of submissions spawned by a [`Kiosk`].
pub struct KioskEvents {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl KioskEvents {
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// The capture-and-authenticate component: camera, file input, submission
/// and the state they drive.
pub struct Kiosk<S: FrameSource> {
    state: UiState,
    camera: CameraController<S>,
    store: Arc<dyn ImageStore>,
    matcher: Arc<dyn FaceMatcher>,
    events: mpsc::UnboundedSender<Event>,
    cancel: Option<CancellationToken>,
}

impl<S: FrameSource> Kiosk<S> {
    pub fn new(
        camera: CameraController<S>,
        store: Arc<dyn ImageStore>,
        matcher: Arc<dyn FaceMatcher>,
    ) -> (Self, KioskEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let kiosk = Self {
            state: UiState::default(),
            camera,
            store,
            matcher,
            events: tx,
            cancel: None,
        };
        (kiosk, KioskEvents { rx })
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_active()
    }

    pub fn apply(&mut self, event: Event) {
        if let Event::SubmissionFinished { id, .. } = &event {
            if self.state.in_flight == Some(*id) {
                self.cancel = None;
            }
        }
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    pub fn start_camera(&mut self) {
        match self.camera.start() {
            Ok(()) => self.apply(Event::CameraStarted),
            Err(e) => {
                tracing::error!("Error accessing the camera: {}", e);
                self.apply(Event::CameraFailed);
            }
        }
    }

    pub fn preview_frame(&mut self) -> Result<DynamicImage> {
        self.camera.preview_frame()
    }

    /// Returns `false` when the capture failed; the pending image is then unchanged.
    pub fn capture_photo(&mut self) -> bool {
        match self.camera.capture() {
            Ok(image) => {
                self.apply(Event::PhotoCaptured(image));
                true
            }
            Err(e) => {
                tracing::error!("Capture failed: {}", e);
                self.apply(Event::CaptureFailed);
                false
            }
        }
    }

    pub fn stop_camera(&mut self) {
        self.camera.stop();
    }

    /// Returns `false` when the file was rejected.
    pub fn select_file(&mut self, path: &Path) -> bool {
        match ImageBlob::from_file(path) {
            Ok(image) => {
                self.apply(Event::FileSelected(image));
                true
            }
            Err(e) => {
                self.apply(Event::FileRejected(format!(
                    "Unable to use {}: {}", path.display(), e
                )));
                false
            }
        }
    }

    /// Starts a submission of the pending image on a background task.
    /// Returns `None` when there is no image or another submission is in flight.
    pub fn submit(&mut self) -> Option<SubmissionId> {
        let (id, image) = match self.state.submission_ticket() {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::debug!("Submit rejected: {}", e);
                self.apply(Event::SubmitRejected(e));
                return None;
            }
        };

        self.apply(Event::SubmissionStarted(id));

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        let store = Arc::clone(&self.store);
        let matcher = Arc::clone(&self.matcher);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = match submission::run(store.as_ref(), matcher.as_ref(), &image, &token).await {
                Ok((_, outcome)) => Ok(outcome),
                Err(e) => {
                    tracing::error!("Submission {} failed: {}", id, e);
                    Err(SubmitFailure::from(&e))
                }
            };
            // Receiver is gone only when the kiosk shut down
            let _ = events.send(Event::SubmissionFinished { id, result });
        });

        Some(id)
    }

    /// Cancels the in-flight submission, if any.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Applies incoming events until no submission is in flight.
    pub async fn wait_idle(&mut self, events: &mut KioskEvents) {
        while self.state.in_flight.is_some() {
            match events.next().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.cancel();
        self.camera.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::fake::FakeSource;
    use crate::common::config::CameraConfig;
    use crate::common::GateError;
    use crate::core::state::*;
    use crate::core::ObjectKey;
    use crate::service::MatchPayload;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeStore {
        reject: bool,
        stall: bool,
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageStore for FakeStore {
        async fn put_image(&self, key: &ObjectKey, _image: &ImageBlob) -> Result<()> {
            self.keys.lock().unwrap().push(key.to_string());
            if self.stall {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.reject {
                return Err(GateError::UploadStatus(reqwest::StatusCode::FORBIDDEN));
            }
            Ok(())
        }
    }

    struct FakeMatcher {
        payload: Option<MatchPayload>,
        keys: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl FakeMatcher {
        fn answering(json: &str) -> Self {
            Self {
                payload: Some(serde_json::from_str(json).unwrap()),
                keys: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn broken() -> Self {
            Self { payload: None, keys: Mutex::new(Vec::new()), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl FaceMatcher for FakeMatcher {
        async fn authenticate(&self, key: &ObjectKey) -> Result<MatchPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.keys.lock().unwrap().push(key.to_string());
            self.payload
                .clone()
                .ok_or_else(|| GateError::AuthTransport("connection reset".into()))
        }
    }

    fn kiosk(store: Arc<FakeStore>, matcher: Arc<FakeMatcher>) -> (Kiosk<FakeSource>, KioskEvents) {
        let camera = CameraController::new(FakeSource::default(), &CameraConfig::default());
        Kiosk::new(camera, store, matcher)
    }

    fn pending_image(kiosk: &mut Kiosk<FakeSource>) {
        kiosk.start_camera();
        assert!(kiosk.capture_photo());
        assert_eq!(kiosk.state().message, MSG_CAPTURED);
    }

    #[tokio::test]
    async fn submit_without_image_makes_no_requests() {
        let store = Arc::new(FakeStore::default());
        let matcher = Arc::new(FakeMatcher::answering(r#"{"message":"Success"}"#));
        let (mut kiosk, _events) = kiosk(store.clone(), matcher.clone());

        assert_eq!(kiosk.submit(), None);
        assert_eq!(kiosk.state().message, MSG_NO_IMAGE);
        assert!(store.keys.lock().unwrap().is_empty());
        assert_eq!(matcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upload_failure_skips_authentication() {
        let store = Arc::new(FakeStore { reject: true, ..Default::default() });
        let matcher = Arc::new(FakeMatcher::answering(r#"{"message":"Success"}"#));
        let (mut kiosk, mut events) = kiosk(store, matcher.clone());

        pending_image(&mut kiosk);
        kiosk.submit().unwrap();
        kiosk.wait_idle(&mut events).await;

        assert_eq!(kiosk.state().message, MSG_UPLOAD_FAILED);
        assert!(!kiosk.state().authenticated);
        assert_eq!(matcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_uses_the_uploaded_key() {
        let store = Arc::new(FakeStore::default());
        let matcher = Arc::new(FakeMatcher::answering(
            r#"{"message":"Success","firstName":"Jane","lastName":"Doe","signedUrl":"https://x/y.jpg"}"#,
        ));
        let (mut kiosk, mut events) = kiosk(store.clone(), matcher.clone());

        pending_image(&mut kiosk);
        kiosk.submit().unwrap();
        kiosk.wait_idle(&mut events).await;

        let state = kiosk.state();
        assert!(state.authenticated);
        assert!(state.message.contains("Jane") && state.message.contains("Doe"));
        assert_eq!(state.display, DisplayImage::Remote("https://x/y.jpg".into()));

        let uploaded = store.keys.lock().unwrap().clone();
        let queried = matcher.keys.lock().unwrap().clone();
        assert_eq!(uploaded, queried);
        // Object key is generated per submission, not reused from the capture name
        let capture_name = state.pending.as_ref().unwrap().file_name().to_string();
        assert_ne!(uploaded[0], capture_name);
    }

    #[tokio::test]
    async fn transport_failure_reports_generic_error() {
        let store = Arc::new(FakeStore::default());
        let matcher = Arc::new(FakeMatcher::broken());
        let (mut kiosk, mut events) = kiosk(store, matcher);

        pending_image(&mut kiosk);
        kiosk.submit().unwrap();
        kiosk.wait_idle(&mut events).await;

        assert_eq!(kiosk.state().message, MSG_AUTH_FAILED);
        assert!(!kiosk.state().authenticated);
    }

    #[tokio::test]
    async fn duplicate_submit_is_rejected_and_cancel_works() {
        let store = Arc::new(FakeStore { stall: true, ..Default::default() });
        let matcher = Arc::new(FakeMatcher::answering(r#"{"message":"Success"}"#));
        let (mut kiosk, mut events) = kiosk(store, matcher.clone());

        pending_image(&mut kiosk);
        let id = kiosk.submit().unwrap();
        assert_eq!(kiosk.submit(), None);
        assert_eq!(kiosk.state().message, MSG_BUSY);
        assert_eq!(kiosk.state().in_flight, Some(id));

        assert!(kiosk.cancel());
        kiosk.wait_idle(&mut events).await;
        assert_eq!(kiosk.state().message, MSG_CANCELLED);
        assert_eq!(matcher.calls.load(Ordering::SeqCst), 0);
        assert!(!kiosk.cancel());
    }

    #[tokio::test]
    async fn capture_without_camera_reports_failure() {
        let (mut kiosk, _events) = kiosk(
            Arc::new(FakeStore::default()),
            Arc::new(FakeMatcher::broken()),
        );

        assert!(!kiosk.capture_photo());
        assert_eq!(kiosk.state().message, MSG_CAPTURE_FAILED);
        assert!(kiosk.state().pending.is_none());

        kiosk.stop_camera();
        kiosk.stop_camera();
        assert!(!kiosk.camera_active());
    }

    #[tokio::test]
    async fn denied_camera_reports_permissions_message() {
        let camera = CameraController::new(
            FakeSource { deny: true, ..Default::default() },
            &CameraConfig::default(),
        );
        let (mut kiosk, _events) = Kiosk::new(
            camera,
            Arc::new(FakeStore::default()),
            Arc::new(FakeMatcher::broken()),
        );

        kiosk.start_camera();
        assert!(!kiosk.camera_active());
        assert_eq!(kiosk.state().message, MSG_CAMERA_DENIED);
    }

    #[tokio::test]
    async fn unreadable_file_leaves_pending_image() {
        let (mut kiosk, _events) = kiosk(
            Arc::new(FakeStore::default()),
            Arc::new(FakeMatcher::broken()),
        );
        pending_image(&mut kiosk);

        assert!(!kiosk.select_file(Path::new("/definitely/missing.jpeg")));
        assert!(kiosk.state().message.starts_with("Unable to use"));
        assert!(kiosk.state().pending.is_some());
    }
}
