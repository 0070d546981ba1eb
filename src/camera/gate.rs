//! Interval-gated frame capture.

use std::time::Duration;

use super::clock::{Clock, MonotonicClock};
use super::device::{CaptureBackend, CaptureDevice};
use super::types::{CaptureError, Frame};

/// Default minimum time between captures.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Default number of buffered frames flushed before every poll.
pub const DEFAULT_DISCARD_COUNT: u32 = 5;

/// Settings for a capture gate.
#[derive(Debug, Clone, PartialEq)]
pub struct GateSettings {
    /// Minimum time between successful captures
    pub interval: Duration,
    /// Camera device index
    pub device_id: u32,
    /// Discard-reads performed on every poll
    pub discard_count: u32,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            device_id: 0,
            discard_count: DEFAULT_DISCARD_COUNT,
        }
    }
}

/// Pulls at most one frame per interval from a capture device.
///
/// Every poll first drains a few buffered frames from the device so that the
/// frame handed back is as fresh as the device allows. The device handle is
/// opened by [`initialize`](Self::initialize) and closed by
/// [`release`](Self::release) or when the gate is dropped.
pub struct CaptureGate<B: CaptureBackend, C: Clock = MonotonicClock> {
    backend: B,
    clock: C,
    settings: GateSettings,
    device: Option<B::Device>,
    /// `None` until the first successful capture
    last_capture_time: Option<Duration>,
}

impl<B: CaptureBackend, C: Clock> std::fmt::Debug for CaptureGate<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGate")
            .field("settings", &self.settings)
            .field("is_initialized", &self.is_initialized())
            .field("last_capture_time", &self.last_capture_time)
            .finish_non_exhaustive()
    }
}

impl<B: CaptureBackend> CaptureGate<B, MonotonicClock> {
    /// Create a gate timed by a monotonic clock. No device is opened yet.
    pub fn new(backend: B, settings: GateSettings) -> Self {
        Self::with_clock(backend, settings, MonotonicClock::new())
    }
}

impl<B: CaptureBackend, C: Clock> CaptureGate<B, C> {
    /// Create a gate timed by the given clock. No device is opened yet.
    pub fn with_clock(backend: B, settings: GateSettings, clock: C) -> Self {
        Self {
            backend,
            clock,
            settings,
            device: None,
            last_capture_time: None,
        }
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    pub fn interval(&self) -> Duration {
        self.settings.interval
    }

    pub fn device_id(&self) -> u32 {
        self.settings.device_id
    }

    pub fn discard_count(&self) -> u32 {
        self.settings.discard_count
    }

    /// Clock reading of the last successful capture, if any.
    pub fn last_capture_time(&self) -> Option<Duration> {
        self.last_capture_time
    }

    /// Check whether a device handle is currently open.
    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// Open the configured device.
    ///
    /// Does nothing if the device is already open. On failure the gate stays
    /// uninitialized, so the call may simply be retried.
    ///
    /// # Errors
    /// * `CaptureError::DeviceUnavailable` - If the device cannot be opened
    pub fn initialize(&mut self) -> Result<(), CaptureError> {
        if self.device.is_some() {
            return Ok(());
        }

        let device_id = self.settings.device_id;
        let device = self.backend.open(device_id).map_err(|e| match e {
            CaptureError::DeviceUnavailable { .. } => e,
            other => CaptureError::DeviceUnavailable {
                device: device_id,
                reason: other.to_string(),
            },
        })?;

        log::info!(
            "Camera {} opened (interval {:?}, discarding {} frames per poll)",
            device_id,
            self.settings.interval,
            self.settings.discard_count
        );
        self.device = Some(device);
        Ok(())
    }

    /// Flush buffered frames and capture one if the interval has elapsed.
    ///
    /// Returns `Ok(None)` when the interval has not elapsed yet or when the
    /// device delivered nothing. A failed read leaves the last capture time
    /// untouched, so the next poll tries again right away.
    ///
    /// # Errors
    /// * `CaptureError::NotInitialized` - If no device is open
    /// * `CaptureError::CaptureFailed` - If the real read hits a hard failure
    pub fn poll_for_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let device = self.device.as_mut().ok_or(CaptureError::NotInitialized)?;
        let now = self.clock.now();

        for _ in 0..self.settings.discard_count {
            if let Err(e) = device.read() {
                log::trace!("Ignoring error from discard read: {}", e);
            }
        }

        let elapsed = match self.last_capture_time {
            None => true,
            Some(last) => now
                .checked_sub(last)
                .is_some_and(|since| since >= self.settings.interval),
        };
        if !elapsed {
            return Ok(None);
        }

        match device.read()? {
            Some(frame) => {
                log::debug!(
                    "Captured {}x{} {:?} frame at {:?}",
                    frame.width,
                    frame.height,
                    frame.format,
                    now
                );
                self.last_capture_time = Some(now);
                Ok(Some(frame))
            }
            None => {
                log::debug!("Camera returned no frame, retrying on next poll");
                Ok(None)
            }
        }
    }

    /// Close the device if it is open.
    ///
    /// Safe to call repeatedly. Release errors are logged, not returned; the
    /// handle is considered released either way.
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            match device.release() {
                Ok(()) => log::info!("Camera {} released", self.settings.device_id),
                Err(e) => log::warn!(
                    "Camera {} did not release cleanly: {}",
                    self.settings.device_id,
                    e
                ),
            }
        }
    }
}

impl<B: CaptureBackend, C: Clock> Drop for CaptureGate<B, C> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::clock::ManualClock;
    use crate::camera::scripted::{ReadOutcome, ScriptedBackend};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn gate(backend: ScriptedBackend) -> (CaptureGate<ScriptedBackend, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let gate = CaptureGate::with_clock(backend, GateSettings::default(), clock.clone());
        (gate, clock)
    }

    #[test]
    fn test_settings_default() {
        let settings = GateSettings::default();
        assert_eq!(settings.interval, secs(10));
        assert_eq!(settings.device_id, 0);
        assert_eq!(settings.discard_count, 5);
    }

    #[test]
    fn test_new_gate_is_uninitialized() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        let (gate, _) = gate(backend);
        assert!(!gate.is_initialized());
        assert_eq!(gate.last_capture_time(), None);
        assert_eq!(stats.opens(), 0);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        let (mut gate, _) = gate(backend);

        gate.initialize().unwrap();
        gate.initialize().unwrap();
        assert!(gate.is_initialized());
        assert_eq!(stats.opens(), 1);
    }

    #[test]
    fn test_initialize_failure_leaves_gate_uninitialized() {
        let backend = ScriptedBackend::new().unavailable();
        let (mut gate, _) = gate(backend);

        match gate.initialize() {
            Err(CaptureError::DeviceUnavailable { device, .. }) => assert_eq!(device, 0),
            other => panic!("Expected DeviceUnavailable, got {:?}", other),
        }
        assert!(!gate.is_initialized());
    }

    #[test]
    fn test_poll_before_initialize_is_an_error() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        let (mut gate, _) = gate(backend);

        assert!(matches!(
            gate.poll_for_frame(),
            Err(CaptureError::NotInitialized)
        ));
        assert_eq!(stats.reads(), 0);
    }

    #[test]
    fn test_first_poll_captures_immediately() {
        let (mut gate, _) = gate(ScriptedBackend::new());
        gate.initialize().unwrap();

        assert!(gate.poll_for_frame().unwrap().is_some());
        assert_eq!(gate.last_capture_time(), Some(Duration::ZERO));
    }

    #[test]
    fn test_every_poll_discards_five_frames() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        let (mut gate, clock) = gate(backend);
        gate.initialize().unwrap();

        // Capture: 5 discards + 1 real read
        gate.poll_for_frame().unwrap();
        assert_eq!(stats.reads(), 6);

        // Gated: 5 discards only
        clock.set(secs(1));
        assert!(gate.poll_for_frame().unwrap().is_none());
        assert_eq!(stats.reads(), 11);
    }

    #[test]
    fn test_discard_count_is_configurable() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        let settings = GateSettings {
            discard_count: 0,
            ..GateSettings::default()
        };
        let mut gate = CaptureGate::with_clock(backend, settings, ManualClock::new());
        gate.initialize().unwrap();

        gate.poll_for_frame().unwrap();
        assert_eq!(stats.reads(), 1);
    }

    #[test]
    fn test_discard_errors_are_ignored() {
        let mut outcomes = vec![ReadOutcome::Fail; 5];
        outcomes.push(ReadOutcome::Frame);
        let (mut gate, _) = gate(ScriptedBackend::new().with_reads(outcomes));
        gate.initialize().unwrap();

        assert!(gate.poll_for_frame().unwrap().is_some());
    }

    #[test]
    fn test_empty_read_does_not_advance_timestamp() {
        let mut outcomes = vec![ReadOutcome::Frame; 5];
        outcomes.push(ReadOutcome::Empty);
        let (mut gate, clock) = gate(ScriptedBackend::new().with_reads(outcomes));
        gate.initialize().unwrap();

        assert!(gate.poll_for_frame().unwrap().is_none());
        assert_eq!(gate.last_capture_time(), None);

        // Next poll retries without waiting a full interval
        clock.set(Duration::from_millis(1));
        assert!(gate.poll_for_frame().unwrap().is_some());
        assert_eq!(gate.last_capture_time(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_hard_failure_propagates_and_gate_stays_usable() {
        let mut outcomes = vec![ReadOutcome::Frame; 5];
        outcomes.push(ReadOutcome::Fail);
        let (mut gate, _) = gate(ScriptedBackend::new().with_reads(outcomes));
        gate.initialize().unwrap();

        assert!(matches!(
            gate.poll_for_frame(),
            Err(CaptureError::CaptureFailed(_))
        ));
        assert_eq!(gate.last_capture_time(), None);
        assert!(gate.is_initialized());
        assert!(gate.poll_for_frame().unwrap().is_some());
    }

    #[test]
    fn test_interval_scenario() {
        let (mut gate, clock) = gate(ScriptedBackend::new());
        gate.initialize().unwrap();

        assert!(gate.poll_for_frame().unwrap().is_some());
        assert_eq!(gate.last_capture_time(), Some(secs(0)));

        clock.set(secs(5));
        assert!(gate.poll_for_frame().unwrap().is_none());
        assert_eq!(gate.last_capture_time(), Some(secs(0)));

        clock.set(secs(10));
        assert!(gate.poll_for_frame().unwrap().is_some());
        assert_eq!(gate.last_capture_time(), Some(secs(10)));

        clock.set(secs(21));
        assert!(gate.poll_for_frame().unwrap().is_some());
        assert_eq!(gate.last_capture_time(), Some(secs(21)));
    }

    #[test]
    fn test_zero_interval_captures_every_poll() {
        let settings = GateSettings {
            interval: Duration::ZERO,
            ..GateSettings::default()
        };
        let mut gate =
            CaptureGate::with_clock(ScriptedBackend::new(), settings, ManualClock::new());
        gate.initialize().unwrap();

        for _ in 0..3 {
            assert!(gate.poll_for_frame().unwrap().is_some());
        }
    }

    #[test]
    fn test_clock_behind_last_capture_is_not_elapsed() {
        let (mut gate, clock) = gate(ScriptedBackend::new());
        gate.initialize().unwrap();

        clock.set(secs(50));
        assert!(gate.poll_for_frame().unwrap().is_some());

        clock.set(secs(20));
        assert!(gate.poll_for_frame().unwrap().is_none());
    }

    #[test]
    fn test_release_is_idempotent() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        let (mut gate, _) = gate(backend);
        gate.initialize().unwrap();

        gate.release();
        assert!(!gate.is_initialized());
        gate.release();
        assert!(!gate.is_initialized());
        assert_eq!(stats.releases(), 1);
    }

    #[test]
    fn test_release_failure_still_drops_handle() {
        let backend = ScriptedBackend::new().failing_release();
        let stats = backend.stats();
        let (mut gate, _) = gate(backend);
        gate.initialize().unwrap();

        gate.release();
        assert!(!gate.is_initialized());
        assert_eq!(stats.releases(), 1);
    }

    #[test]
    fn test_reinitialize_keeps_last_capture_time() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        let (mut gate, clock) = gate(backend);
        gate.initialize().unwrap();
        gate.poll_for_frame().unwrap();
        gate.release();

        gate.initialize().unwrap();
        assert_eq!(stats.opens(), 2);
        assert_eq!(gate.last_capture_time(), Some(Duration::ZERO));

        clock.set(secs(3));
        assert!(gate.poll_for_frame().unwrap().is_none());
        clock.set(secs(12));
        assert!(gate.poll_for_frame().unwrap().is_some());
    }

    #[test]
    fn test_drop_releases_device() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        {
            let (mut gate, _) = gate(backend);
            gate.initialize().unwrap();
        }
        assert_eq!(stats.releases(), 1);
    }
}
