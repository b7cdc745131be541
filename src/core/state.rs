//! Kiosk UI state and the single reducer that updates it.
//!
//! Every user action and every finished submission becomes an [`Event`];
//! [`reduce`] is the only place the status text, the authenticated flag and
//! the displayed image change.

use crate::common::GateError;
use crate::core::ImageBlob;
use crate::service::AuthOutcome;
use chrono::{DateTime, Local};

pub const MSG_READY: &str = "Please upload or capture an image to authenticate.";
pub const MSG_CAMERA_STARTED: &str = "Camera started. Capture a photo when ready.";
pub const MSG_CAMERA_DENIED: &str = "Unable to access camera. Please check device permissions.";
pub const MSG_CAPTURED: &str = "Photo captured successfully. Click \"Authenticate\" to proceed.";
pub const MSG_CAPTURE_FAILED: &str = "Failed to capture photo. Please try again.";
pub const MSG_NO_IMAGE: &str = "No image selected. Please capture or upload an image to authenticate.";
pub const MSG_BUSY: &str = "An authentication is already in progress.";
pub const MSG_SUBMITTING: &str = "Authenticating...";
pub const MSG_UPLOAD_FAILED: &str = "Image upload failed. Please check your storage configuration.";
pub const MSG_AUTH_FAILED: &str = "There was an error during the authentication process. Please try again.";
pub const MSG_NOT_EMPLOYEE: &str = "Authentication Failed: This person is not an employee.";
pub const MSG_UNKNOWN: &str = "Unknown error occurred during authentication.";
pub const MSG_CANCELLED: &str = "Authentication cancelled.";

pub fn welcome_message(first_name: &str, last_name: &str) -> String {
    format!("Hi {} {}, Welcome to work.", first_name, last_name)
}

pub type SubmissionId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayImage {
    Placeholder,
    Remote(String),
}

/// Why a submission ended without an [`AuthOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitFailure {
    Upload,
    Authentication,
    Cancelled,
}

impl From<&GateError> for SubmitFailure {
    fn from(err: &GateError) -> Self {
        match err {
            GateError::UploadStatus(_) | GateError::Http(_) => SubmitFailure::Upload,
            GateError::Cancelled => SubmitFailure::Cancelled,
            _ => SubmitFailure::Authentication,
        }
    }
}

#[derive(Debug)]
pub enum Event {
    CameraStarted,
    CameraFailed,
    PhotoCaptured(ImageBlob),
    CaptureFailed,
    FileSelected(ImageBlob),
    FileRejected(String),
    SubmitRejected(GateError),
    SubmissionStarted(SubmissionId),
    SubmissionFinished {
        id: SubmissionId,
        result: Result<AuthOutcome, SubmitFailure>,
    },
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub pending: Option<ImageBlob>,
    pub message: String,
    pub authenticated: bool,
    pub display: DisplayImage,
    pub in_flight: Option<SubmissionId>,
    pub updated_at: DateTime<Local>,
    next_submission: SubmissionId,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            pending: None,
            message: MSG_READY.to_string(),
            authenticated: false,
            display: DisplayImage::Placeholder,
            in_flight: None,
            updated_at: Local::now(),
            next_submission: 1,
        }
    }
}

impl UiState {
    /// Id and image for a new submission, if one may start now.
    pub fn submission_ticket(&self) -> Result<(SubmissionId, ImageBlob), GateError> {
        if self.in_flight.is_some() {
            return Err(GateError::SubmissionInFlight);
        }
        let image = self.pending.clone().ok_or(GateError::NoImageSelected)?;
        Ok((self.next_submission, image))
    }

    fn fail(&mut self, message: &str) {
        self.authenticated = false;
        self.message = message.to_string();
    }
}

pub fn reduce(mut state: UiState, event: Event) -> UiState {
    match event {
        Event::CameraStarted => {
            state.message = MSG_CAMERA_STARTED.to_string();
        }
        Event::CameraFailed => {
            state.message = MSG_CAMERA_DENIED.to_string();
        }
        Event::PhotoCaptured(image) => {
            state.pending = Some(image);
            state.message = MSG_CAPTURED.to_string();
        }
        Event::CaptureFailed => {
            state.message = MSG_CAPTURE_FAILED.to_string();
        }
        Event::FileSelected(image) => {
            state.message = format!("Selected {}. Submit it to authenticate.", image.file_name());
            state.pending = Some(image);
        }
        Event::FileRejected(reason) => {
            state.message = reason;
        }
        Event::SubmitRejected(err) => match err {
            GateError::SubmissionInFlight => state.message = MSG_BUSY.to_string(),
            _ => state.fail(MSG_NO_IMAGE),
        },
        Event::SubmissionStarted(id) => {
            state.in_flight = Some(id);
            state.next_submission = id + 1;
            state.authenticated = false;
            state.display = DisplayImage::Placeholder;
            state.message = MSG_SUBMITTING.to_string();
        }
        Event::SubmissionFinished { id, result } => {
            if state.in_flight != Some(id) {
                tracing::debug!("Dropping result of stale submission {}", id);
                return state;
            }
            state.in_flight = None;

            match result {
                Ok(AuthOutcome::Success { first_name, last_name, signed_url }) => {
                    state.authenticated = true;
                    state.message = welcome_message(&first_name, &last_name);
                    state.display = display_for(signed_url);
                }
                Ok(AuthOutcome::NotFound { signed_url }) => {
                    state.fail(MSG_NOT_EMPLOYEE);
                    state.display = display_for(signed_url);
                }
                Ok(AuthOutcome::Error { message }) => {
                    tracing::warn!("Matching service reported: {}", message);
                    state.fail(MSG_UNKNOWN);
                }
                Err(SubmitFailure::Upload) => state.fail(MSG_UPLOAD_FAILED),
                Err(SubmitFailure::Authentication) => state.fail(MSG_AUTH_FAILED),
                Err(SubmitFailure::Cancelled) => state.fail(MSG_CANCELLED),
            }
        }
    }

    state.updated_at = Local::now();
    state
}

fn display_for(signed_url: Option<String>) -> DisplayImage {
    match signed_url {
        Some(url) if !url.is_empty() => DisplayImage::Remote(url),
        _ => DisplayImage::Placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> ImageBlob {
        ImageBlob::new(vec![0xFFu8, 0xD8], "image/jpeg", "a.jpeg")
    }

    fn started() -> (UiState, SubmissionId) {
        let state = reduce(UiState::default(), Event::FileSelected(blob()));
        let (id, _) = state.submission_ticket().unwrap();
        (reduce(state, Event::SubmissionStarted(id)), id)
    }

    #[test]
    fn ticket_requires_an_image() {
        let state = UiState::default();
        assert!(matches!(state.submission_ticket(), Err(GateError::NoImageSelected)));

        let state = reduce(state, Event::SubmitRejected(GateError::NoImageSelected));
        assert_eq!(state.message, MSG_NO_IMAGE);
        assert!(!state.authenticated);
    }

    #[test]
    fn second_ticket_is_refused_while_in_flight() {
        let (state, _) = started();
        assert!(matches!(state.submission_ticket(), Err(GateError::SubmissionInFlight)));

        let state = reduce(state, Event::SubmitRejected(GateError::SubmissionInFlight));
        assert_eq!(state.message, MSG_BUSY);
        assert!(state.in_flight.is_some());
    }

    #[test]
    fn success_shows_welcome_and_signed_url() {
        let (state, id) = started();
        let state = reduce(state, Event::SubmissionFinished {
            id,
            result: Ok(AuthOutcome::Success {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                signed_url: Some("https://x/y.jpg".into()),
            }),
        });

        assert!(state.authenticated);
        assert_eq!(state.message, "Hi Jane Doe, Welcome to work.");
        assert_eq!(state.display, DisplayImage::Remote("https://x/y.jpg".into()));
        assert!(state.in_flight.is_none());
    }

    #[test]
    fn not_found_shows_rejection_and_signed_url() {
        let (state, id) = started();
        let state = reduce(state, Event::SubmissionFinished {
            id,
            result: Ok(AuthOutcome::NotFound { signed_url: Some("https://x/y.jpg".into()) }),
        });

        assert!(!state.authenticated);
        assert_eq!(state.message, MSG_NOT_EMPLOYEE);
        assert_eq!(state.display, DisplayImage::Remote("https://x/y.jpg".into()));
    }

    #[test]
    fn unknown_message_keeps_placeholder() {
        let (state, id) = started();
        let state = reduce(state, Event::SubmissionFinished {
            id,
            result: Ok(AuthOutcome::Error { message: "Something Else".into() }),
        });

        assert!(!state.authenticated);
        assert_eq!(state.message, MSG_UNKNOWN);
        assert_eq!(state.display, DisplayImage::Placeholder);
    }

    #[test]
    fn stale_results_are_ignored() {
        let (state, id) = started();
        let state = reduce(state, Event::SubmissionFinished {
            id: id + 7,
            result: Ok(AuthOutcome::Success {
                first_name: "Eve".into(),
                last_name: "Intruder".into(),
                signed_url: None,
            }),
        });

        assert!(!state.authenticated);
        assert_eq!(state.message, MSG_SUBMITTING);
        assert_eq!(state.in_flight, Some(id));
    }

    #[test]
    fn new_submission_resets_previous_result() {
        let (state, id) = started();
        let state = reduce(state, Event::SubmissionFinished {
            id,
            result: Ok(AuthOutcome::NotFound { signed_url: Some("https://x/old.jpg".into()) }),
        });

        let (next, _) = state.submission_ticket().unwrap();
        assert_eq!(next, id + 1);
        let state = reduce(state, Event::SubmissionStarted(next));
        assert_eq!(state.display, DisplayImage::Placeholder);
    }

    #[test]
    fn failed_capture_keeps_pending_image() {
        let state = reduce(UiState::default(), Event::PhotoCaptured(blob()));
        let state = reduce(state, Event::CaptureFailed);
        assert_eq!(state.message, MSG_CAPTURE_FAILED);
        assert_eq!(state.pending, Some(blob()));
    }

    #[test]
    fn failures_map_to_messages() {
        for (failure, message) in [
            (SubmitFailure::Upload, MSG_UPLOAD_FAILED),
            (SubmitFailure::Authentication, MSG_AUTH_FAILED),
            (SubmitFailure::Cancelled, MSG_CANCELLED),
        ] {
            let (state, id) = started();
            let state = reduce(state, Event::SubmissionFinished { id, result: Err(failure) });
            assert_eq!(state.message, message);
            assert!(!state.authenticated);
        }
    }
}
