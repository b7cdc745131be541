use crate::camera::FrameSource;
use crate::common::config::CameraConfig;
use crate::common::{GateError, Result};
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use std::fs;
use std::time::Duration;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

#[derive(Debug, Clone)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
    pub formats: Vec<String>,
    pub can_capture: bool,
}

/// V4L2 webcam. The device handle is held only between `open` and `close`.
pub struct V4l2Source {
    device_index: u32,
    width: u32,
    height: u32,
    warmup_frames: u32,
    warmup_delay_ms: u64,
    device: Option<Device>,
}

impl V4l2Source {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            device_index: config.device_index,
            width: config.width,
            height: config.height,
            warmup_frames: config.warmup_frames,
            warmup_delay_ms: config.warmup_delay_ms,
            device: None,
        }
    }

    /// List all available cameras with their capabilities
    pub fn list_all_cameras() -> Result<Vec<CameraInfo>> {
        let mut cameras = Vec::new();

        for entry in fs::read_dir("/dev")? {
            let entry = entry?;
            let path = entry.path();
            let filename = path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("");

            let Some(index) = filename.strip_prefix("video").and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };

            let Ok(device) = Device::new(index as usize) else {
                continue;
            };
            let Ok(caps) = device.query_caps() else {
                continue;
            };

            let formats = device.enum_formats()
                .unwrap_or_default()
                .iter()
                .map(|fmt| fmt.fourcc.str().unwrap_or("UNKNOWN").to_string())
                .collect();

            cameras.push(CameraInfo {
                index,
                name: caps.card.clone(),
                formats,
                can_capture: caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE),
            });
        }

        cameras.sort_by_key(|c| c.index);
        Ok(cameras)
    }

    fn configure(&self, device: &Device) -> Result<v4l::Format> {
        let mut fmt = device.format()
            .map_err(|e| GateError::CameraUnavailable(format!("Failed to get format: {}", e)))?;

        fmt.width = self.width;
        fmt.height = self.height;
        fmt.fourcc = FourCC::new(b"MJPG");

        // Not every device supports MJPG at the requested size; keep whatever it settles on
        if let Err(e) = device.set_format(&fmt) {
            tracing::warn!("Could not set exact format: {}. Using device defaults.", e);
        }

        let actual = device.format()
            .map_err(|e| GateError::CameraUnavailable(format!("Failed to get final format: {}", e)))?;

        tracing::debug!(
            "Camera format: {}x{} {}",
            actual.width,
            actual.height,
            actual.fourcc.str().unwrap_or("UNKNOWN")
        );
        Ok(actual)
    }
}

impl FrameSource for V4l2Source {
    fn open(&mut self) -> Result<()> {
        tracing::info!("Opening camera device {}...", self.device_index);

        let device = Device::new(self.device_index as usize).map_err(|e| {
            GateError::CameraUnavailable(format!("Failed to open camera {}: {}", self.device_index, e))
        })?;

        let caps = device.query_caps()
            .map_err(|e| GateError::CameraUnavailable(format!("Failed to query capabilities: {}", e)))?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(GateError::CameraUnavailable(format!(
                "/dev/video{} ({}) does not support video capture", self.device_index, caps.card
            )));
        }

        self.configure(&device)?;
        self.device = Some(device);
        Ok(())
    }

    fn grab(&mut self) -> Result<DynamicImage> {
        let warmup_frames = self.warmup_frames;
        let warmup_delay = Duration::from_millis(self.warmup_delay_ms);
        let device = self.device.as_mut()
            .ok_or_else(|| GateError::Capture("camera is not started".into()))?;

        let fmt = device.format()
            .map_err(|e| GateError::Capture(format!("Failed to get format: {}", e)))?;

        let mut stream = v4l::io::mmap::Stream::with_buffers(device, Type::VideoCapture, 4)
            .map_err(|e| GateError::Capture(format!("Failed to create stream: {}", e)))?;

        // Auto exposure needs a few frames to settle
        for _ in 0..warmup_frames {
            stream.next()
                .map_err(|e| GateError::Capture(format!("Failed to capture warmup frame: {}", e)))?;
            std::thread::sleep(warmup_delay);
        }

        let (buf, meta) = stream.next()
            .map_err(|e| GateError::Capture(format!("Failed to capture: {}", e)))?;
        let used = (meta.bytesused as usize).min(buf.len());

        decode_frame(&buf[..used], fmt.width, fmt.height, fmt.fourcc)
    }

    fn close(&mut self) {
        if self.device.take().is_some() {
            tracing::debug!("Released /dev/video{}", self.device_index);
        }
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }
}

fn decode_frame(data: &[u8], width: u32, height: u32, fourcc: FourCC) -> Result<DynamicImage> {
    match &fourcc.repr {
        b"MJPG" => Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?),
        b"YUYV" => yuyv_to_image(data, width, height),
        b"GREY" => {
            let buffer = ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data.to_vec())
                .ok_or_else(|| GateError::Capture("Failed to create grayscale image buffer".into()))?;
            Ok(DynamicImage::ImageLuma8(buffer))
        }
        other => Err(GateError::Capture(format!(
            "Unsupported pixel format {}", String::from_utf8_lossy(other)
        ))),
    }
}

fn yuyv_to_image(data: &[u8], width: u32, height: u32) -> Result<DynamicImage> {
    let expected = (width * height * 2) as usize;
    if data.len() < expected {
        return Err(GateError::Capture(format!(
            "Short YUYV frame: {} of {} bytes", data.len(), expected
        )));
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for chunk in data[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
        rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
    }

    let buffer = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, rgb)
        .ok_or_else(|| GateError::Capture("Failed to create RGB image buffer".into()))?;
    Ok(DynamicImage::ImageRgb8(buffer))
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as f32 - 16.0;
    let d = u as f32 - 128.0;
    let e = v as f32 - 128.0;
    let clamp = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    [
        clamp(1.164 * c + 1.596 * e),
        clamp(1.164 * c - 0.392 * d - 0.813 * e),
        clamp(1.164 * c + 2.017 * d),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuyv_frame_decodes_to_rgb() {
        // 2x1 frame, mid grey
        let data = [128u8, 128, 128, 128];
        let image = yuyv_to_image(&data, 2, 1).unwrap();
        let rgb = image.to_rgb8();
        assert_eq!(rgb.dimensions(), (2, 1));
        let px = rgb.get_pixel(0, 0);
        assert!(px[0] > 120 && px[0] < 140);
        assert_eq!(px[0], px[1]);
    }

    #[test]
    fn short_frames_are_rejected() {
        assert!(yuyv_to_image(&[0u8; 3], 2, 1).is_err());
        assert!(decode_frame(&[0u8; 1], 2, 2, FourCC::new(b"GREY")).is_err());
    }

    #[test]
    fn unknown_pixel_formats_are_reported() {
        let err = decode_frame(&[0u8; 16], 2, 2, FourCC::new(b"NV12")).unwrap_err();
        assert!(err.to_string().contains("NV12"));
    }

    #[test]
    fn grab_without_open_fails() {
        let mut source = V4l2Source::new(&CameraConfig::default());
        assert!(!source.is_open());
        assert!(source.grab().is_err());
        source.close();
        source.close();
    }
}
