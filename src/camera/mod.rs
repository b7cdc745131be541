pub mod v4l2;

use crate::common::config::CameraConfig;
use crate::common::{GateError, Result};
use crate::core::ImageBlob;
use image::DynamicImage;

pub use v4l2::{CameraInfo, V4l2Source};

/// A hardware (or fake) video source.
pub trait FrameSource: Send {
    /// Acquire the device. Failing here means permission denied or no camera.
    fn open(&mut self) -> Result<()>;
    /// Read the current frame from an open device.
    fn grab(&mut self) -> Result<DynamicImage>;
    /// Release the device. Must be safe to call when nothing is open.
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Start, preview, capture and stop on top of a [`FrameSource`].
pub struct CameraController<S: FrameSource> {
    source: S,
    width: u32,
    height: u32,
    quality: u8,
}

impl<S: FrameSource> CameraController<S> {
    pub fn new(source: S, config: &CameraConfig) -> Self {
        Self {
            source,
            width: config.width,
            height: config.height,
            quality: config.jpeg_quality,
        }
    }

    pub fn is_active(&self) -> bool {
        self.source.is_open()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.source.is_open() {
            tracing::debug!("Camera already started");
            return Ok(());
        }

        self.source.open().map_err(|e| match e {
            GateError::CameraUnavailable(_) => e,
            other => GateError::CameraUnavailable(other.to_string()),
        })?;
        tracing::info!("Camera started");
        Ok(())
    }

    pub fn preview_frame(&mut self) -> Result<DynamicImage> {
        if !self.source.is_open() {
            return Err(GateError::CameraUnavailable("camera is not started".into()));
        }
        self.source.grab()
    }

    /// Grabs a frame, encodes it as JPEG at the configured resolution and
    /// stops the camera, whether or not the capture worked.
    pub fn capture(&mut self) -> Result<ImageBlob> {
        let result = self.grab_encoded();
        self.stop();
        result
    }

    fn grab_encoded(&mut self) -> Result<ImageBlob> {
        if !self.source.is_open() {
            return Err(GateError::Capture("no active camera stream".into()));
        }

        let frame = self.source.grab().map_err(|e| match e {
            GateError::Capture(_) => e,
            other => GateError::Capture(other.to_string()),
        })?;

        ImageBlob::from_frame(&frame, self.width, self.height, self.quality)
    }

    pub fn stop(&mut self) {
        if self.source.is_open() {
            self.source.close();
            tracing::info!("Camera stopped");
        }
    }
}
