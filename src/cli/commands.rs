//! Subcommand handlers for run, list-cameras and config actions.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::args::{Args, Command, ConfigAction};
use super::enums::BackendKind;
use crate::camera::{
    self, CaptureBackend, CaptureError, CaptureGate, Clock, GateSettings, ScriptedBackend,
};
use crate::config::{self, interval_from_secs, Config, ConfigError, DEFAULT_CONFIG};

/// Settings for the polling loop driven by `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Pause between polls
    pub poll_interval: Duration,
    /// Stop after this many captures; 0 runs until stopped
    pub max_frames: u64,
}

/// Run the subcommand selected on the command line.
///
/// Configuration is only loaded for the commands that use it, so a broken
/// config file does not get in the way of `list-cameras`.
pub fn execute(args: &Args, stop: &AtomicBool) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Some(Command::ListCameras) => list_cameras()?,
        Some(Command::Config { ref action }) => {
            let (cfg, config_path) = load_config(args)?;
            let (gate, run) = resolve_settings(args, &cfg)?;
            handle_config_action(action, &gate, &run, &config_path)?;
        }
        Some(Command::Run) | None => {
            let (cfg, config_path) = load_config(args)?;
            let (gate, run) = resolve_settings(args, &cfg)?;

            log::info!(
                "Polling camera {} every {:?}, capturing at most once per {:?} (config: {})",
                gate.device_id,
                run.poll_interval,
                gate.interval,
                config_path.display()
            );
            let captured = run_with_backend(args.backend, gate, &run, stop)?;
            println!("Captured {} frame(s)", captured);
        }
    }
    Ok(())
}

/// Load the configuration the command line points at, with its path.
///
/// An explicit `--config` file must exist, except for `config init`, which
/// is what creates it. Without `--config` a missing or broken default file
/// falls back to built-in defaults.
pub fn load_config(args: &Args) -> Result<(Config, PathBuf), ConfigError> {
    let creating = matches!(
        args.command,
        Some(Command::Config {
            action: ConfigAction::Init
        })
    );

    match args.config {
        Some(ref path) if creating => Ok((Config::default(), path.clone())),
        Some(ref path) => Ok((Config::load_from_explicit(path)?, path.clone())),
        None => {
            let cfg = Config::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config file: {}. Using default settings.", e);
                Config::default()
            });
            Ok((cfg, config::default_path()))
        }
    }
}

/// Merge settings: CLI args > config file > built-in defaults.
pub fn resolve_settings(
    args: &Args,
    config: &Config,
) -> Result<(GateSettings, RunSettings), ConfigError> {
    let mut gate = config.gate_settings()?;
    if let Some(device) = args.camera {
        gate.device_id = device;
    }
    if let Some(secs) = args.interval {
        gate.interval = interval_from_secs(secs)?;
    }
    if let Some(discard) = args.discard {
        gate.discard_count = discard;
    }

    let run = RunSettings {
        poll_interval: Duration::from_millis(args.poll_ms.unwrap_or(config.run.poll_interval_ms)),
        max_frames: args.max_frames.unwrap_or(config.run.max_frames),
    };
    Ok((gate, run))
}

/// Initialize the gate and poll it until `stop` is set or enough frames
/// have been captured. Returns the number of captured frames.
///
/// Hard read failures are logged and polling continues; the device is
/// released before returning.
pub fn run_gate<B: CaptureBackend, C: Clock>(
    gate: &mut CaptureGate<B, C>,
    run: &RunSettings,
    stop: &AtomicBool,
) -> Result<u64, CaptureError> {
    gate.initialize()?;

    let mut captured = 0u64;
    while !stop.load(Ordering::SeqCst) {
        match gate.poll_for_frame() {
            Ok(Some(frame)) => {
                captured += 1;
                log::info!(
                    "Frame {}: {}x{} {:?} ({} bytes)",
                    captured,
                    frame.width,
                    frame.height,
                    frame.format,
                    frame.data.len()
                );
                if run.max_frames > 0 && captured >= run.max_frames {
                    break;
                }
            }
            Ok(None) => {}
            Err(e @ CaptureError::CaptureFailed(_)) => log::warn!("{}", e),
            Err(e) => {
                gate.release();
                return Err(e);
            }
        }
        thread::sleep(run.poll_interval);
    }

    gate.release();
    Ok(captured)
}

/// Build a gate on the requested backend and run it.
pub fn run_with_backend(
    kind: BackendKind,
    settings: GateSettings,
    run: &RunSettings,
    stop: &AtomicBool,
) -> Result<u64, CaptureError> {
    match kind {
        BackendKind::Simulated => {
            let mut gate = CaptureGate::new(ScriptedBackend::new().with_resolution(640, 480), settings);
            run_gate(&mut gate, run, stop)
        }
        #[cfg(feature = "webcam")]
        BackendKind::Webcam => {
            let mut gate = CaptureGate::new(camera::WebcamBackend::default(), settings);
            run_gate(&mut gate, run, stop)
        }
        #[cfg(not(feature = "webcam"))]
        BackendKind::Webcam => Err(CaptureError::Unsupported(
            "built without webcam support; rebuild with --features webcam or use --backend simulated"
                .to_string(),
        )),
    }
}

/// List available cameras and print them to stdout.
pub fn list_cameras() -> Result<(), CaptureError> {
    let devices = camera::list_devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: &ConfigAction,
    gate: &GateSettings,
    run: &RunSettings,
    config_path: &Path,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Camera: {}", gate.device_id);
            println!("  Interval: {:?}", gate.interval);
            println!("  Discard per poll: {}", gate.discard_count);
            println!("  Poll period: {:?}", run.poll_interval);
            if run.max_frames == 0 {
                println!("  Max frames: unlimited");
            } else {
                println!("  Max frames: {}", run.max_frames);
            }
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(ConfigError::Invalid(format!(
                    "config file already exists: {}",
                    config_path.display()
                )));
            }

            let io_err = |e: std::io::Error| ConfigError::Io {
                path: config_path.to_path_buf(),
                source: e,
            };
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
            std::fs::write(config_path, DEFAULT_CONFIG).map_err(io_err)?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}
