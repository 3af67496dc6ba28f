// ── Connectivity state machine ──
//
// Maps API outcomes onto the small status lattice downstream consumers
// use for automation: UNKNOWN at start, ONLINE after a fully successful
// tick, OFFLINE with a detail code after any classified failure. The
// detail code only carries meaning while OFFLINE.

use tokio::sync::watch;
use tracing::debug;

use heatlink_api::Error;

/// Coarse classification attached to an offline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DetailCode {
    None,
    ConfigurationError,
    CommunicationError,
}

/// Connectivity of one device as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityStatus {
    /// Engine started, first poll not yet concluded.
    Unknown,
    /// Last poll tick of either cadence completed its full sequence.
    Online,
    /// A poll tick or command failed with a classified error.
    Offline {
        detail: DetailCode,
        /// Human-readable failure description. Blank descriptions are
        /// normalized away so status surfaces never render empty lines.
        description: Option<String>,
    },
}

impl ConnectivityStatus {
    /// Build the offline status for a classified error.
    pub fn offline_from(err: &Error) -> Self {
        let detail = match err {
            Error::Configuration { .. } => DetailCode::ConfigurationError,
            Error::Communication { .. } => DetailCode::CommunicationError,
        };
        let message = err.message().trim();
        Self::Offline {
            detail,
            description: if message.is_empty() {
                None
            } else {
                Some(message.to_owned())
            },
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    /// The detail code; `NONE` unless offline.
    pub fn detail(&self) -> DetailCode {
        match self {
            Self::Offline { detail, .. } => *detail,
            Self::Unknown | Self::Online => DetailCode::None,
        }
    }
}

/// Watch-published connectivity tracker, mutated only by the device actor.
#[derive(Debug)]
pub(crate) struct StatusTracker {
    tx: watch::Sender<ConnectivityStatus>,
}

impl StatusTracker {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(ConnectivityStatus::Unknown);
        Self { tx }
    }

    /// A tick completed its full sequence (or a command succeeded after a
    /// poll did): transition to ONLINE, clearing any prior detail.
    pub(crate) fn on_success(&self) {
        self.tx.send_if_modified(|status| {
            if status.is_online() {
                false
            } else {
                debug!(from = ?status, "connectivity -> ONLINE");
                *status = ConnectivityStatus::Online;
                true
            }
        });
    }

    /// A tick or command failed with a classified error.
    pub(crate) fn on_failure(&self, err: &Error) {
        let next = ConnectivityStatus::offline_from(err);
        self.tx.send_if_modified(|status| {
            if *status == next {
                false
            } else {
                debug!(from = ?status, to = ?next, "connectivity -> OFFLINE");
                *status = next.clone();
                true
            }
        });
    }

    pub(crate) fn current(&self) -> ConnectivityStatus {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.tx.subscribe()
    }
}
