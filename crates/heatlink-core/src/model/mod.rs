//! Domain model: device variants as capability sets, mirrored attributes,
//! and the numeric precision table.

pub mod precision;

pub use precision::PrecisionPolicy;

/// Device variant, expressed as a declared capability set rather than a
/// type hierarchy. Poll sequences and command validation consult these
/// predicates, so per-variant behavior stays data-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DeviceKind {
    PanelHeater,
    ConvectionHeater,
    OilHeater,
    Socket,
    /// Lab/test firmware exposing every endpoint.
    AllFunctions,
}

impl DeviceKind {
    /// PID regulation parameters are only served by panel heaters.
    pub fn supports_pid(self) -> bool {
        matches!(self, Self::PanelHeater | Self::AllFunctions)
    }

    /// Hysteresis bounds exist on the variants with slow thermal mass.
    pub fn supports_hysteresis(self) -> bool {
        matches!(self, Self::ConvectionHeater | Self::OilHeater | Self::AllFunctions)
    }

    /// Oil heaters expose a power-level limit.
    pub fn supports_oil_power(self) -> bool {
        matches!(self, Self::OilHeater | Self::AllFunctions)
    }

    /// Sockets switch a load on and off; they have no set-points.
    pub fn supports_temperature_control(self) -> bool {
        !matches!(self, Self::Socket)
    }
}

/// Every logical attribute the mirror tracks. Used for change
/// notification and to key the precision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Attribute {
    AmbientTemperature,
    RawAmbientTemperature,
    CurrentPower,
    ControlSignal,
    LockState,
    OpenWindowState,
    SetTemperature,
    SetTemperatureComfort,
    SetTemperatureSleep,
    SetTemperatureAway,
    SetTemperatureIndependent,
    OperatingMode,
    ControllerType,
    PidParameters,
    HysteresisParameters,
    OpenWindowParameters,
    DisplayUnit,
    PredictiveHeatingType,
    CloudCommunication,
    CommercialLock,
    CustomName,
    TimezoneOffset,
    CalibrationOffset,
    OilHeaterPower,
    Identity,
}
