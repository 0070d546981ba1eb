//! CLI enum types.

use clap::ValueEnum;

/// Which capture backend the `run` command drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Physical camera via nokhwa (needs the `webcam` feature)
    Webcam,
    /// In-memory device producing synthetic frames
    Simulated,
}

/// The webcam when it is compiled in, the simulated device otherwise.
impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "webcam") {
            BackendKind::Webcam
        } else {
            BackendKind::Simulated
        }
    }
}

impl BackendKind {
    /// Whether this backend is usable in the current build.
    pub fn is_available(self) -> bool {
        match self {
            BackendKind::Webcam => cfg!(feature = "webcam"),
            BackendKind::Simulated => true,
        }
    }
}
