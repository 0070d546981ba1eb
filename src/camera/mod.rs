//! Camera access and interval-gated frame capture.
//!
//! This module provides:
//! - The [`CaptureGate`] that pulls at most one fresh frame per interval
//! - Device seams via [`CaptureBackend`] and [`CaptureDevice`]
//! - Time sources via [`Clock`]
//! - An in-memory [`ScriptedBackend`] and, with the `webcam` feature, a
//!   nokhwa-backed [`WebcamBackend`]

mod clock;
mod device;
mod gate;
mod scripted;
mod types;
#[cfg(feature = "webcam")]
mod webcam;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use device::{CaptureBackend, CaptureDevice};
pub use gate::{CaptureGate, GateSettings, DEFAULT_DISCARD_COUNT, DEFAULT_INTERVAL};
pub use scripted::{ReadOutcome, ScriptStats, ScriptedBackend, ScriptedDevice};
pub use types::{CameraInfo, CaptureError, Frame, FrameFormat};
#[cfg(feature = "webcam")]
pub use webcam::{list_devices, Webcam, WebcamBackend};

/// List available cameras.
///
/// Without the `webcam` feature there is no way to enumerate devices.
#[cfg(not(feature = "webcam"))]
pub fn list_devices() -> Result<Vec<CameraInfo>, CaptureError> {
    Err(CaptureError::Unsupported(
        "built without webcam support; rebuild with --features webcam".to_string(),
    ))
}
