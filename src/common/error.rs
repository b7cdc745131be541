use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("No image selected")]
    NoImageSelected,

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Image upload failed with status {0}")]
    UploadStatus(reqwest::StatusCode),

    #[error("Authentication request failed: {0}")]
    AuthTransport(String),

    #[error("Unexpected authentication result: {0}")]
    AuthUnexpected(String),

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Submission cancelled")]
    Cancelled,

    #[error("Invalid employee name: {0}")]
    InvalidName(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GateError>;
