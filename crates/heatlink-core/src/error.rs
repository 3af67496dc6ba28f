// ── Core error types ──
//
// Handle-level failures from heatlink-core. Classified API errors never
// surface here: the poll loop converts them into connectivity transitions
// and the command gateway converts them into CommandOutcome strings.
// CoreError is for misuse of the engine itself.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Device engine already started")]
    AlreadyStarted,

    #[error("Device engine is not running")]
    NotRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<heatlink_api::Error> for CoreError {
    fn from(err: heatlink_api::Error) -> Self {
        match err {
            heatlink_api::Error::Configuration { message } => CoreError::Config { message },
            heatlink_api::Error::Communication { message } => CoreError::Internal(message),
        }
    }
}
