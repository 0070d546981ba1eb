use std::sync::atomic::{AtomicBool, Ordering};

use capture_gate::cli::{self, Args, Command};
use clap::Parser;

/// Set by the Ctrl+C handler; the run loop checks it between polls.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Set up the Ctrl+C handler.
fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })
}

/// Install the logger. `RUST_LOG` wins over `-v` flags.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut result: Result<(), Box<dyn std::error::Error>> = Ok(());
    if matches!(args.command, Some(Command::Run) | None) {
        result = setup_ctrlc_handler().map_err(Into::into);
    }
    let result = result.and_then(|()| cli::execute(&args, &CTRLC_RECEIVED));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
