//! Command-line interface definitions and helpers.
//!
//! This module contains CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, Command, ConfigAction};
pub use commands::{
    execute, handle_config_action, list_cameras, load_config, resolve_settings, run_gate, run_with_backend,
    RunSettings,
};
pub use enums::BackendKind;
