//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::BackendKind;

/// Parse and validate a capture interval in seconds (non-negative)
fn parse_interval(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of seconds", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("Interval must be a non-negative number, got {}", s));
    }
    Ok(secs)
}

/// Parse and validate the poll period in milliseconds (at least 1)
fn parse_poll_ms(s: &str) -> Result<u64, String> {
    let ms: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of milliseconds", s))?;
    if ms == 0 {
        return Err("Poll period must be at least 1 ms".to_string());
    }
    Ok(ms)
}

/// Grab a fresh camera frame at a fixed interval
#[derive(Parser, Debug)]
#[command(name = "capture-gate")]
#[command(version, about = "Grab a fresh camera frame at a fixed interval", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Minimum seconds between captured frames
    #[arg(long, short, value_parser = parse_interval)]
    pub interval: Option<f64>,

    /// Buffered frames to discard before every poll
    #[arg(long)]
    pub discard: Option<u32>,

    /// How often to poll the camera, in milliseconds
    #[arg(long, value_parser = parse_poll_ms)]
    pub poll_ms: Option<u64>,

    /// Stop after this many captured frames (0 = until Ctrl+C)
    #[arg(long, short = 'n')]
    pub max_frames: Option<u64>,

    /// Capture backend (webcam when built with the `webcam` feature)
    #[arg(long, short, value_enum, default_value_t = BackendKind::default())]
    pub backend: BackendKind,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll the camera and report captured frames (default)
    Run,
    /// List available cameras
    ListCameras,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Create default config file
    Init,
}
