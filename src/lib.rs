//! capture-gate library crate.
//!
//! Pulls at most one fresh camera frame per interval, flushing buffered
//! frames before every poll. See [`camera::CaptureGate`].

pub mod camera;
pub mod cli;
pub mod config;
