// ── Runtime device configuration ──
//
// Describes *how* to reach and poll one device. Carries the identity
// (hostname + optional API key) and the scheduling/timeout tuning, but
// never touches disk. The CLI (or a hosting framework) constructs a
// DeviceConfig and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use crate::model::DeviceKind;

/// Configuration for one device instance.
///
/// Built by the embedding application, passed to [`crate::Device`] — core
/// never reads config files. The two poll intervals are deployment
/// configuration; the frequent interval must be strictly shorter than the
/// infrequent one.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Hostname or IP of the device (no scheme — the engine picks the
    /// scheme from API-key presence).
    pub hostname: String,
    /// Static API key. Present implies HTTPS, absent implies HTTP.
    pub api_key: Option<SecretString>,
    /// Device variant, selecting the capability set.
    pub kind: DeviceKind,
    /// Interval of the frequent cadence (fast-changing control values).
    pub frequent_interval: Duration,
    /// Interval of the infrequent cadence (configuration/identity values).
    pub infrequent_interval: Duration,
    /// Timeout for read operations.
    pub read_timeout: Duration,
    /// Timeout for ordinary write operations.
    pub write_timeout: Duration,
    /// Timeout for API-key rotation, which waits out the device's
    /// reboot-and-rehandshake cycle.
    pub rotate_key_timeout: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            api_key: None,
            kind: DeviceKind::PanelHeater,
            frequent_interval: Duration::from_secs(10),
            infrequent_interval: Duration::from_secs(300),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(8),
            rotate_key_timeout: Duration::from_secs(45),
        }
    }
}
