// Wire protocol types for the local device API.
//
// Every response body is a JSON object carrying at minimum a `status`
// string (the envelope). Readings are tolerant by construction: fields the
// firmware omits decode to `None`, and enumerated strings the firmware
// invents decode to an `Unrecognized` sentinel instead of failing the
// whole response. Pure serde types -- no state, safe to share.

use serde::{Deserialize, Serialize};

// ── Response envelope ────────────────────────────────────────────────

/// Device-level status reported in every response body.
///
/// Independent of the HTTP status: a 200 with `status != ok` is still a
/// failed call for every default read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    ParseFailed,
    RequestFailed,
    TooLong,
    ResponseFailed,
    /// Forward-compatibility sentinel for status strings newer firmware
    /// may introduce.
    #[serde(other)]
    Unrecognized,
}

impl ResponseStatus {
    /// Human-readable description used in error messages.
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "request handled successfully",
            Self::ParseFailed => "device failed to parse the request",
            Self::RequestFailed => "device could not execute the request",
            Self::TooLong => "request message was too long",
            Self::ResponseFailed => "device failed to produce a response",
            Self::Unrecognized => "unrecognized response status",
        }
    }
}

// ── Enumerated device values ─────────────────────────────────────────

/// Operating mode of the regulator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OperationMode {
    Control,
    WeeklyProgram,
    Independent,
    Off,
    #[serde(other)]
    Unrecognized,
}

/// Set-point slot a temperature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemperatureMode {
    Comfort,
    Sleep,
    Away,
    Independent,
    #[serde(other)]
    Unrecognized,
}

impl TemperatureMode {
    /// The set-point slots polled each frequent tick, in declared order.
    pub const POLLED: [Self; 4] = [Self::Comfort, Self::Sleep, Self::Away, Self::Independent];
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DisplayUnit {
    Celsius,
    Fahrenheit,
    #[serde(other)]
    Unrecognized,
}

/// Regulation algorithm selected on the device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ControllerKind {
    Hysteresis,
    Pid,
    #[serde(other)]
    Unrecognized,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PredictiveHeatingKind {
    Off,
    Simple,
    Advanced,
    #[serde(other)]
    Unrecognized,
}

/// Physical-button lock state reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LockState {
    NoLock,
    ChildLock,
    CommercialLock,
    #[serde(other)]
    Unrecognized,
}

/// Open-window detection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpenWindowState {
    Disabled,
    Enabled,
    Active,
    #[serde(other)]
    Unrecognized,
}

// ── Read responses ───────────────────────────────────────────────────
//
// The `status` envelope field is extracted and checked by LocalClient
// before these shapes are decoded, so they only model the payload.

/// `GET /status` -- identity and firmware info (infrequent cadence).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceStatus {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Device-derived identifier; doubles as the confirmation token for
    /// API-key rotation.
    #[serde(default)]
    pub operation_key: Option<String>,
}

/// `GET /control-status` -- fast-changing regulation values (frequent cadence).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlStatus {
    #[serde(default)]
    pub ambient_temperature: Option<f64>,
    #[serde(default)]
    pub raw_ambient_temperature: Option<f64>,
    #[serde(default)]
    pub current_power: Option<f64>,
    #[serde(default)]
    pub control_signal: Option<f64>,
    #[serde(default)]
    pub lock_active: Option<LockState>,
    #[serde(default)]
    pub open_window_active: Option<OpenWindowState>,
    #[serde(default)]
    pub set_temperature: Option<f64>,
    #[serde(default)]
    pub operating_mode: Option<OperationMode>,
}

/// `GET /operation-mode`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationModeReading {
    #[serde(default)]
    pub mode: Option<OperationMode>,
}

/// `GET /set-temperature?mode=…`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetTemperatureReading {
    #[serde(default)]
    pub value: Option<f64>,
}

/// `GET /temperature-calibration-offset`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalibrationOffsetReading {
    #[serde(default)]
    pub value: Option<f64>,
}

/// `GET /display-unit`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayUnitReading {
    #[serde(default)]
    pub value: Option<DisplayUnit>,
}

/// `GET /controller-type`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerTypeReading {
    #[serde(default)]
    pub controller_type: Option<ControllerKind>,
}

/// `GET /predictive-heating-type`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictiveHeatingReading {
    #[serde(default)]
    pub predictive_heating_type: Option<PredictiveHeatingKind>,
}

/// `GET /timezone-offset` -- minutes east of UTC.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimezoneOffsetReading {
    #[serde(default)]
    pub timezone_offset: Option<i32>,
}

/// `GET /pid-parameters` (PID-capable variants only).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PidParameters {
    #[serde(default)]
    pub kp: Option<f64>,
    #[serde(default)]
    pub ki: Option<f64>,
    #[serde(default)]
    pub kd: Option<f64>,
    #[serde(default)]
    pub kd_filter_n: Option<f64>,
    #[serde(default)]
    pub windup_limit_percentage: Option<f64>,
}

/// `GET /cloud-communication`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloudCommunicationReading {
    #[serde(default)]
    pub value: Option<bool>,
}

/// `GET /hysteresis-parameters` (hysteresis-capable variants only).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HysteresisParameters {
    #[serde(default)]
    pub temperature_hysteresis_upper: Option<f64>,
    #[serde(default)]
    pub temperature_hysteresis_lower: Option<f64>,
}

/// `GET /commercial-lock`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommercialLockReading {
    #[serde(default)]
    pub value: Option<bool>,
}

/// `GET /open-window` -- detection parameters (all five travel together).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpenWindowParameters {
    #[serde(default)]
    pub drop_temperature_threshold: Option<f64>,
    #[serde(default)]
    pub drop_time_range: Option<u32>,
    #[serde(default)]
    pub increase_temperature_threshold: Option<f64>,
    #[serde(default)]
    pub increase_time_range: Option<u32>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// `GET /oil-heater-power` (oil-heater variants only).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OilHeaterPowerReading {
    #[serde(default)]
    pub value: Option<f64>,
}

/// Status-only response to a write. The envelope is the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {}

// ── Write requests ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SetOperationModeRequest {
    pub mode: OperationMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetTemperatureRequest {
    #[serde(rename = "type")]
    pub mode: TemperatureMode,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetCalibrationOffsetRequest {
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetDisplayUnitRequest {
    pub value: DisplayUnit,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetControllerTypeRequest {
    pub controller_type: ControllerKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetPredictiveHeatingRequest {
    pub predictive_heating_type: PredictiveHeatingKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetTimezoneOffsetRequest {
    pub timezone_offset: i32,
}

/// All five gains travel together; the device rejects partial updates.
#[derive(Debug, Clone, Serialize)]
pub struct SetPidParametersRequest {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub kd_filter_n: f64,
    pub windup_limit_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetCloudCommunicationRequest {
    pub value: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetHysteresisParametersRequest {
    pub temperature_hysteresis_upper: f64,
    pub temperature_hysteresis_lower: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetCommercialLockRequest {
    pub value: bool,
}

/// All five fields travel together; the device rejects partial updates.
#[derive(Debug, Clone, Serialize)]
pub struct SetOpenWindowParametersRequest {
    pub drop_temperature_threshold: f64,
    pub drop_time_range: u32,
    pub increase_temperature_threshold: f64,
    pub increase_time_range: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetCustomNameRequest {
    pub device_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetOilHeaterPowerRequest {
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RebootRequest {}
