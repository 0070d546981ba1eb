//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

use thiserror::Error;

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Pixel layout of a captured frame, as delivered by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Packed RGB (3 bytes per pixel)
    Rgb,
    /// Single-channel luminance (1 byte per pixel)
    Gray,
}

/// A captured camera frame.
///
/// The pixel buffer is handed through exactly as the backend produced it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, row-major
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Build a frame stamped with the current instant.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: FrameFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
            timestamp: Instant::now(),
        }
    }

    /// Number of bytes per pixel for this frame's format.
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
            FrameFormat::Gray => 1,
        }
    }

    /// Buffer length implied by the dimensions and format.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel()
    }
}

/// Errors that can occur while driving a capture device.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened
    #[error("Camera device {device} unavailable: {reason}")]
    DeviceUnavailable { device: u32, reason: String },

    /// A poll was attempted without an open device handle
    #[error("Camera is not initialized; call initialize() first")]
    NotInitialized,

    /// The device reported a hard failure during a read
    #[error("Failed to capture frame: {0}")]
    CaptureFailed(String),

    /// The device could not be released cleanly
    #[error("Failed to release camera: {0}")]
    ReleaseFailed(String),

    /// The requested backend is not available in this build
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_info_display() {
        let info = CameraInfo {
            index: 0,
            name: "Test Camera".to_string(),
            description: "Built-in".to_string(),
        };
        assert_eq!(format!("{}", info), "[0] Test Camera (Built-in)");
    }

    #[test]
    fn test_frame_bytes_per_pixel() {
        let rgb = Frame::new(vec![0; 6], 2, 1, FrameFormat::Rgb);
        assert_eq!(rgb.bytes_per_pixel(), 3);
        assert_eq!(rgb.expected_len(), 6);

        let gray = Frame::new(vec![0; 4], 2, 2, FrameFormat::Gray);
        assert_eq!(gray.bytes_per_pixel(), 1);
        assert_eq!(gray.expected_len(), 4);
    }

    #[test]
    fn test_capture_error_display() {
        let err = CaptureError::DeviceUnavailable {
            device: 3,
            reason: "no such device".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Camera device 3 unavailable: no such device"
        );
        assert_eq!(
            CaptureError::CaptureFailed("unplugged".to_string()).to_string(),
            "Failed to capture frame: unplugged"
        );
        assert!(CaptureError::NotInitialized
            .to_string()
            .contains("not initialized"));
        assert_eq!(
            CaptureError::ReleaseFailed("busy".to_string()).to_string(),
            "Failed to release camera: busy"
        );
    }
}
