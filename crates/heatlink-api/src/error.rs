use thiserror::Error;

/// Top-level error type for the `heatlink-api` crate.
///
/// The taxonomy is deliberately closed at two kinds. Everything a call can
/// fail with is folded into one of them before it leaves this crate, so
/// `heatlink-core` only ever has to translate two cases into connectivity
/// detail codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The device identity or a request parameter is unusable: blank
    /// hostname, URL that fails to parse, invalid or incomplete command
    /// parameters, mismatched confirmation token. Never retried
    /// automatically -- requires external correction.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The device could not be reached or answered badly: transport
    /// failure, timeout, non-2xx HTTP status, malformed JSON, missing or
    /// non-OK response envelope. Transient -- the next scheduled poll is
    /// the retry; this crate never retries internally.
    #[error("Communication error: {message}")]
    Communication { message: String },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a transient error expected to self-heal
    /// on a later poll.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Communication { .. })
    }

    /// The human-readable message carried by either kind.
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration { message } | Self::Communication { message } => message,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration {
            message: format!("invalid device address: {err}"),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Communication {
                message: "request timed out".into(),
            }
        } else if err.is_connect() {
            Self::Communication {
                message: format!("connection failed: {err}"),
            }
        } else {
            Self::Communication {
                message: format!("transport error: {err}"),
            }
        }
    }
}
