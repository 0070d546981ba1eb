//! Device seams between the capture gate and a concrete capture library.

use super::types::{CaptureError, Frame};

/// Opens capture devices by index.
pub trait CaptureBackend {
    /// The open device handle produced by this backend.
    type Device: CaptureDevice;

    /// Open the device with the given index.
    ///
    /// # Errors
    /// * `CaptureError::DeviceUnavailable` - If the device cannot be opened
    fn open(&mut self, device_id: u32) -> Result<Self::Device, CaptureError>;
}

/// An open capture device handle.
pub trait CaptureDevice {
    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the device simply had nothing to deliver, and
    /// `Err(CaptureError::CaptureFailed)` for hard failures such as a
    /// disconnected device.
    fn read(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Release the underlying device resource.
    fn release(&mut self) -> Result<(), CaptureError>;
}
