pub mod camera;
pub mod cli;
pub mod common;
pub mod core;
pub mod service;

// Re-export commonly used types
pub use common::{Config, ErrorStatusPolicy, GateError, Result};
pub use camera::{CameraController, FrameSource, V4l2Source};
pub use self::core::{DisplayImage, Event, ImageBlob, Kiosk, KioskEvents, ObjectKey, UiState};
pub use service::{AuthOutcome, FaceMatcher, ImageStore, MatchClient, MatchPayload, StorageClient};
