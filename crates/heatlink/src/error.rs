//! CLI error types with miette diagnostics.
//!
//! Maps engine errors and rejected commands into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use heatlink_core::{CoreError, DetailCode};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("No device host given")]
    #[diagnostic(
        code(heatlink::no_host),
        help("Pass --host <HOSTNAME> or set the HEATLINK_HOST environment variable.")
    )]
    NoHost,

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(heatlink::validation))]
    Validation { field: String, reason: String },

    #[error("Device is offline ({detail})")]
    #[diagnostic(
        code(heatlink::offline),
        help(
            "Check that the device is powered and reachable on the local network.\n\
             CONFIGURATION_ERROR usually means a bad hostname or API key;\n\
             COMMUNICATION_ERROR means the device did not answer or answered badly."
        )
    )]
    Offline {
        detail: DetailCode,
        description: Option<String>,
    },

    #[error("Command rejected: {message}")]
    #[diagnostic(code(heatlink::rejected))]
    Rejected { message: String },

    #[error(transparent)]
    #[diagnostic(code(heatlink::engine))]
    Engine(#[from] CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoHost | Self::Validation { .. } => exit_code::USAGE,
            Self::Offline { .. } => exit_code::CONNECTION,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Engine(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}
