// Shared transport configuration for building the reqwest::Client.
//
// The HTTP client (connection pool) is process-wide: the embedding
// application calls `build_client()` once and hands clones of the
// resulting client (cheap, internally reference-counted) to each
// per-device LocalClient. Per-operation timeouts are applied on
// individual requests, not here.

use std::time::Duration;

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Fallback timeout for requests that don't set their own.
    pub timeout: Duration,
    /// Accept self-signed certificates. Devices in the field present
    /// self-signed certs on their HTTPS endpoint, so this defaults on.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
        }
    }
}

impl TransportConfig {
    /// Build the process-wide `reqwest::Client`. Call once; clone the
    /// result per device.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("heatlink/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| Error::communication(format!("failed to build HTTP client: {e}")))
    }
}
