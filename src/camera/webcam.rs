//! Webcam backend built on nokhwa.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType, Resolution as NokhwaResolution,
};
use nokhwa::{query, Camera};

use super::device::{CaptureBackend, CaptureDevice};
use super::types::{CameraInfo, CaptureError, Frame, FrameFormat};

/// List all available camera devices on the system.
///
/// If no cameras are found, returns an empty vector (not an error).
pub fn list_devices() -> Result<Vec<CameraInfo>, CaptureError> {
    let devices = query(ApiBackend::Auto)
        .map_err(|e| CaptureError::Unsupported(format!("Failed to query cameras: {}", e)))?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

/// Opens physical webcams.
#[derive(Debug, Clone)]
pub struct WebcamBackend {
    /// Preferred capture width
    pub width: u32,
    /// Preferred capture height
    pub height: u32,
    /// Preferred frame rate
    pub fps: u32,
}

impl Default for WebcamBackend {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl CaptureBackend for WebcamBackend {
    type Device = Webcam;

    fn open(&mut self, device_id: u32) -> Result<Webcam, CaptureError> {
        let index = CameraIndex::Index(device_id);
        let mut camera = self.open_with_fallback(&index, device_id)?;

        camera
            .open_stream()
            .map_err(|e| CaptureError::DeviceUnavailable {
                device: device_id,
                reason: format!("failed to start stream: {}", e),
            })?;

        let res = camera.resolution();
        log::info!(
            "Webcam {} streaming at {}x{} @ {} fps",
            device_id,
            res.width(),
            res.height(),
            camera.frame_rate()
        );

        Ok(Webcam { camera })
    }
}

impl WebcamBackend {
    /// Try a few format strategies in order of preference:
    /// NV12 (native on macOS), MJPEG, then whatever runs fastest.
    fn open_with_fallback(
        &self,
        index: &CameraIndex,
        device_id: u32,
    ) -> Result<Camera, CaptureError> {
        let resolution = NokhwaResolution::new(self.width, self.height);
        let attempts = [
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
                resolution,
                NokhwaFrameFormat::NV12,
                self.fps,
            ))),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
                resolution,
                NokhwaFrameFormat::MJPEG,
                self.fps,
            ))),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        ];

        let mut last_error = String::from("no format attempted");
        for requested in attempts {
            match Camera::new(index.clone(), requested) {
                Ok(cam) => return Ok(cam),
                Err(e) => {
                    log::debug!("Camera {} rejected format: {}", device_id, e);
                    last_error = e.to_string();
                }
            }
        }

        let msg = last_error.to_lowercase();
        let reason = if msg.contains("permission")
            || msg.contains("denied")
            || msg.contains("authorization")
        {
            format!(
                "permission denied ({}). On macOS, grant access in System Settings > Privacy & Security > Camera",
                last_error
            )
        } else {
            last_error
        };
        Err(CaptureError::DeviceUnavailable {
            device: device_id,
            reason,
        })
    }
}

/// An open webcam stream.
pub struct Webcam {
    camera: Camera,
}

impl CaptureDevice for Webcam {
    fn read(&mut self) -> Result<Option<Frame>, CaptureError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

        // Frames that fail to decode are dropped like an empty read
        let decoded = match buffer.decode_image::<RgbFormat>() {
            Ok(img) => img,
            Err(e) => {
                log::debug!("Dropping undecodable frame: {}", e);
                return Ok(None);
            }
        };
        let resolution = buffer.resolution();

        Ok(Some(Frame::new(
            decoded.into_raw(),
            resolution.width(),
            resolution.height(),
            FrameFormat::Rgb,
        )))
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        self.camera
            .stop_stream()
            .map_err(|e| CaptureError::ReleaseFailed(e.to_string()))
    }
}
