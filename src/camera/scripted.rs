//! In-memory capture backend that replays a script of read outcomes.
//!
//! Used by the test suite and by the CLI's `--backend simulated` mode, where no
//! physical camera is involved.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::device::{CaptureBackend, CaptureDevice};
use super::types::{CaptureError, Frame, FrameFormat};

/// What a single scripted read produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A synthetic frame in the backend's format
    Frame,
    /// An ordinary empty read
    Empty,
    /// A hard device failure
    Fail,
}

/// Shared counters describing how a scripted backend has been used.
#[derive(Debug, Clone, Default)]
pub struct ScriptStats {
    opens: Rc<Cell<u32>>,
    reads: Rc<Cell<u32>>,
    releases: Rc<Cell<u32>>,
}

impl ScriptStats {
    pub fn opens(&self) -> u32 {
        self.opens.get()
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }

    pub fn releases(&self) -> u32 {
        self.releases.get()
    }

    fn bump(counter: &Cell<u32>) -> u32 {
        counter.set(counter.get() + 1);
        counter.get()
    }
}

/// Backend whose devices replay queued [`ReadOutcome`]s.
///
/// The queue is shared by every device the backend opens, so a script keeps
/// its position across release and re-initialization. Once the queue runs
/// dry every read yields the fallback outcome (a frame by default).
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    script: Rc<RefCell<VecDeque<ReadOutcome>>>,
    fallback: ReadOutcome,
    available: bool,
    release_fails: bool,
    width: u32,
    height: u32,
    format: FrameFormat,
    stats: ScriptStats,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: Rc::new(RefCell::new(VecDeque::new())),
            fallback: ReadOutcome::Frame,
            available: true,
            release_fails: false,
            width: 4,
            height: 3,
            format: FrameFormat::Rgb,
            stats: ScriptStats::default(),
        }
    }

    /// Queue read outcomes, consumed in order.
    pub fn with_reads(self, outcomes: impl IntoIterator<Item = ReadOutcome>) -> Self {
        self.script.borrow_mut().extend(outcomes);
        self
    }

    /// Outcome used once the queue is exhausted.
    pub fn with_fallback(mut self, outcome: ReadOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    /// Dimensions of synthetic frames.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Pixel format of synthetic frames.
    pub fn with_format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }

    /// Refuse to open any device.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Make every device report an error on release.
    pub fn failing_release(mut self) -> Self {
        self.release_fails = true;
        self
    }

    /// Handle to the usage counters.
    pub fn stats(&self) -> ScriptStats {
        self.stats.clone()
    }
}

impl CaptureBackend for ScriptedBackend {
    type Device = ScriptedDevice;

    fn open(&mut self, device_id: u32) -> Result<ScriptedDevice, CaptureError> {
        if !self.available {
            return Err(CaptureError::DeviceUnavailable {
                device: device_id,
                reason: "scripted device is unavailable".to_string(),
            });
        }
        ScriptStats::bump(&self.stats.opens);

        Ok(ScriptedDevice {
            script: Rc::clone(&self.script),
            fallback: self.fallback,
            release_fails: self.release_fails,
            width: self.width,
            height: self.height,
            format: self.format,
            stats: self.stats.clone(),
        })
    }
}

/// An open scripted device.
#[derive(Debug)]
pub struct ScriptedDevice {
    script: Rc<RefCell<VecDeque<ReadOutcome>>>,
    fallback: ReadOutcome,
    release_fails: bool,
    width: u32,
    height: u32,
    format: FrameFormat,
    stats: ScriptStats,
}

impl CaptureDevice for ScriptedDevice {
    fn read(&mut self) -> Result<Option<Frame>, CaptureError> {
        let n = ScriptStats::bump(&self.stats.reads);
        let outcome = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.fallback);

        match outcome {
            ReadOutcome::Frame => {
                // Fill with the read number so frames are distinguishable
                let mut frame = Frame::new(Vec::new(), self.width, self.height, self.format);
                frame.data = vec![(n % 256) as u8; frame.expected_len()];
                Ok(Some(frame))
            }
            ReadOutcome::Empty => Ok(None),
            ReadOutcome::Fail => Err(CaptureError::CaptureFailed(
                "scripted read failure".to_string(),
            )),
        }
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        ScriptStats::bump(&self.stats.releases);
        if self.release_fails {
            Err(CaptureError::ReleaseFailed(
                "scripted release failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
