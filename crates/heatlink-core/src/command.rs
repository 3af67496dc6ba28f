// ── Command API ──
//
// All write operations flow through a unified `Command` enum, routed over
// an mpsc channel into the device actor so they serialize with poll
// ticks. The gateway converts every classified error into a textual
// `CommandOutcome` — automation callers never see an Err.

use secrecy::SecretString;

use heatlink_api::proto::{
    ControllerKind, DisplayUnit, OperationMode, PredictiveHeatingKind, TemperatureMode,
};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub reply_tx: tokio::sync::oneshot::Sender<CommandOutcome>,
}

/// All write operations against the device.
///
/// Multi-field parameter sets (PID, hysteresis, open-window) are complete
/// by construction here; the [`crate::Device`] gateway methods validate
/// optional inputs before a variant is ever built, so a partial update
/// can't reach the network.
#[derive(Debug, Clone)]
pub enum Command {
    Reboot,
    SetOperationMode {
        mode: OperationMode,
    },
    SetTemperature {
        mode: TemperatureMode,
        value: f64,
    },
    SetCalibrationOffset {
        value: f64,
    },
    SetDisplayUnit {
        unit: DisplayUnit,
    },
    SetControllerType {
        kind: ControllerKind,
    },
    SetPredictiveHeatingType {
        kind: PredictiveHeatingKind,
    },
    SetTimezoneOffset {
        minutes: i32,
    },
    SetCloudCommunication {
        enabled: bool,
    },
    SetCommercialLock {
        enabled: bool,
    },
    SetCustomName {
        name: String,
    },
    SetHysteresisParameters {
        upper: f64,
        lower: f64,
    },
    SetOpenWindowParameters {
        drop_temperature_threshold: f64,
        drop_time_range: u32,
        increase_temperature_threshold: f64,
        increase_time_range: u32,
        enabled: bool,
    },
    SetPidParameters {
        kp: f64,
        ki: f64,
        kd: f64,
        kd_filter_n: f64,
        windup_limit_percentage: f64,
    },
    SetOilHeaterPower {
        value: f64,
    },
    /// Rotate the API key. `confirm` was already checked against the
    /// device operation key by the gateway; the long rotate timeout
    /// covers the device's reboot-and-rehandshake cycle.
    SetApiKey {
        key: SecretString,
    },
}

impl Command {
    /// Short operation name used in outcome messages and logs.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::SetOperationMode { .. } => "set operation mode",
            Self::SetTemperature { .. } => "set temperature",
            Self::SetCalibrationOffset { .. } => "set calibration offset",
            Self::SetDisplayUnit { .. } => "set display unit",
            Self::SetControllerType { .. } => "set controller type",
            Self::SetPredictiveHeatingType { .. } => "set predictive heating type",
            Self::SetTimezoneOffset { .. } => "set timezone offset",
            Self::SetCloudCommunication { .. } => "set cloud communication",
            Self::SetCommercialLock { .. } => "set commercial lock",
            Self::SetCustomName { .. } => "set custom name",
            Self::SetHysteresisParameters { .. } => "set hysteresis parameters",
            Self::SetOpenWindowParameters { .. } => "set open window parameters",
            Self::SetPidParameters { .. } => "set PID parameters",
            Self::SetOilHeaterPower { .. } => "set oil heater power",
            Self::SetApiKey { .. } => "set API key",
        }
    }
}

/// Result of a command: a plain accepted/rejected flag with a
/// human-readable message. Never an error type — automation-triggered
/// commands must not crash their caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub accepted: bool,
    pub message: String,
}

impl CommandOutcome {
    pub(crate) fn accepted(message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
        }
    }

    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
        }
    }
}
