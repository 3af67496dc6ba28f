// ── Device mirror ──
//
// The in-memory cache of last-known device attribute values. One record
// per device, published as a snapshot through a watch channel, with
// per-attribute change events on a broadcast channel. Only the device
// actor mutates it: polls on successful decode, never commands (a write
// is confirmed by the next successful poll, not assumed).

use tokio::sync::{broadcast, watch};

use heatlink_api::proto::{
    ControlStatus, ControllerKind, DeviceStatus, DisplayUnit, HysteresisParameters, LockState,
    OpenWindowParameters, OpenWindowState, OperationMode, PidParameters, PredictiveHeatingKind,
    TemperatureMode,
};

use crate::model::Attribute;

const UPDATE_CHANNEL_SIZE: usize = 64;

/// Last-known values per logical attribute. Every field is independently
/// unknown until first successfully polled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorSnapshot {
    // Identity
    pub name: Option<String>,
    pub custom_name: Option<String>,
    pub version: Option<String>,
    /// Device-derived identifier; the confirmation token for key rotation.
    pub operation_key: Option<String>,

    // Frequent cadence
    pub ambient_temperature: Option<f64>,
    pub raw_ambient_temperature: Option<f64>,
    pub current_power: Option<f64>,
    pub control_signal: Option<f64>,
    pub lock_state: Option<LockState>,
    pub open_window_state: Option<OpenWindowState>,
    pub set_temperature: Option<f64>,
    pub operating_mode: Option<OperationMode>,
    pub comfort_temperature: Option<f64>,
    pub sleep_temperature: Option<f64>,
    pub away_temperature: Option<f64>,
    pub independent_temperature: Option<f64>,

    // Infrequent cadence
    pub calibration_offset: Option<f64>,
    pub display_unit: Option<DisplayUnit>,
    pub controller_type: Option<ControllerKind>,
    pub predictive_heating_type: Option<PredictiveHeatingKind>,
    pub timezone_offset: Option<i32>,
    pub pid_parameters: Option<PidParameters>,
    pub cloud_communication: Option<bool>,
    pub hysteresis_parameters: Option<HysteresisParameters>,
    pub commercial_lock: Option<bool>,
    pub open_window_parameters: Option<OpenWindowParameters>,
    pub oil_heater_power: Option<f64>,
}

impl MirrorSnapshot {
    /// The stored set-point for one temperature mode.
    pub fn set_temperature_for(&self, mode: TemperatureMode) -> Option<f64> {
        match mode {
            TemperatureMode::Comfort => self.comfort_temperature,
            TemperatureMode::Sleep => self.sleep_temperature,
            TemperatureMode::Away => self.away_temperature,
            TemperatureMode::Independent => self.independent_temperature,
            TemperatureMode::Unrecognized => None,
        }
    }
}

/// Store a decimal value, reporting a change only when it moved by at
/// least the attribute's precision delta (or was previously unknown).
/// The value is stored either way — overwriting is idempotent.
fn store_scalar(
    slot: &mut Option<f64>,
    new: f64,
    attr: Attribute,
    changed: &mut Vec<Attribute>,
) {
    let material = match *slot {
        None => true,
        Some(old) => attr.precision().materially_changed(old, new),
    };
    *slot = Some(new);
    if material {
        changed.push(attr);
    }
}

/// Store a non-decimal value, reporting a change on any inequality.
fn store_value<T: PartialEq>(
    slot: &mut Option<T>,
    new: T,
    attr: Attribute,
    changed: &mut Vec<Attribute>,
) {
    let material = slot.as_ref() != Some(&new);
    *slot = Some(new);
    if material {
        changed.push(attr);
    }
}

/// Watch-published mirror of one device's state.
#[derive(Debug)]
pub struct Mirror {
    snapshot: watch::Sender<MirrorSnapshot>,
    updates: broadcast::Sender<Attribute>,
}

impl Mirror {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(MirrorSnapshot::default());
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self { snapshot, updates }
    }

    /// A consistent copy of the current state.
    pub fn snapshot(&self) -> MirrorSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes. The receiver is only woken for
    /// material changes per the precision policy.
    pub fn subscribe(&self) -> watch::Receiver<MirrorSnapshot> {
        self.snapshot.subscribe()
    }

    /// Subscribe to per-attribute change events.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<Attribute> {
        self.updates.subscribe()
    }

    /// Run a mutation, waking watch subscribers and emitting attribute
    /// events only when something materially changed.
    fn apply(&self, mutate: impl FnOnce(&mut MirrorSnapshot, &mut Vec<Attribute>)) {
        let mut changed = Vec::new();
        self.snapshot.send_if_modified(|snap| {
            mutate(snap, &mut changed);
            !changed.is_empty()
        });
        for attr in changed {
            let _ = self.updates.send(attr);
        }
    }

    // ── Typed stores, one per endpoint the poll sequences read ──────
    //
    // Fields the firmware omitted stay at their previous value; a reading
    // never erases knowledge.

    pub(crate) fn store_device_status(&self, status: &DeviceStatus) {
        self.apply(|snap, changed| {
            if let Some(v) = &status.name {
                store_value(&mut snap.name, v.clone(), Attribute::Identity, changed);
            }
            if let Some(v) = &status.version {
                store_value(&mut snap.version, v.clone(), Attribute::Identity, changed);
            }
            if let Some(v) = &status.operation_key {
                store_value(
                    &mut snap.operation_key,
                    v.clone(),
                    Attribute::Identity,
                    changed,
                );
            }
            if let Some(v) = &status.custom_name {
                store_value(
                    &mut snap.custom_name,
                    v.clone(),
                    Attribute::CustomName,
                    changed,
                );
            }
            changed.dedup();
        });
    }

    pub(crate) fn store_control_status(&self, cs: &ControlStatus) {
        self.apply(|snap, changed| {
            if let Some(v) = cs.ambient_temperature {
                store_scalar(
                    &mut snap.ambient_temperature,
                    v,
                    Attribute::AmbientTemperature,
                    changed,
                );
            }
            if let Some(v) = cs.raw_ambient_temperature {
                store_scalar(
                    &mut snap.raw_ambient_temperature,
                    v,
                    Attribute::RawAmbientTemperature,
                    changed,
                );
            }
            if let Some(v) = cs.current_power {
                store_scalar(&mut snap.current_power, v, Attribute::CurrentPower, changed);
            }
            if let Some(v) = cs.control_signal {
                store_scalar(&mut snap.control_signal, v, Attribute::ControlSignal, changed);
            }
            if let Some(v) = cs.lock_active {
                store_value(&mut snap.lock_state, v, Attribute::LockState, changed);
            }
            if let Some(v) = cs.open_window_active {
                store_value(
                    &mut snap.open_window_state,
                    v,
                    Attribute::OpenWindowState,
                    changed,
                );
            }
            if let Some(v) = cs.set_temperature {
                store_scalar(&mut snap.set_temperature, v, Attribute::SetTemperature, changed);
            }
            if let Some(v) = cs.operating_mode {
                store_value(&mut snap.operating_mode, v, Attribute::OperatingMode, changed);
            }
        });
    }

    pub(crate) fn store_set_temperature(&self, mode: TemperatureMode, value: f64) {
        self.apply(|snap, changed| match mode {
            TemperatureMode::Comfort => store_scalar(
                &mut snap.comfort_temperature,
                value,
                Attribute::SetTemperatureComfort,
                changed,
            ),
            TemperatureMode::Sleep => store_scalar(
                &mut snap.sleep_temperature,
                value,
                Attribute::SetTemperatureSleep,
                changed,
            ),
            TemperatureMode::Away => store_scalar(
                &mut snap.away_temperature,
                value,
                Attribute::SetTemperatureAway,
                changed,
            ),
            TemperatureMode::Independent => store_scalar(
                &mut snap.independent_temperature,
                value,
                Attribute::SetTemperatureIndependent,
                changed,
            ),
            TemperatureMode::Unrecognized => {}
        });
    }

    pub(crate) fn store_calibration_offset(&self, value: f64) {
        self.apply(|snap, changed| {
            store_scalar(
                &mut snap.calibration_offset,
                value,
                Attribute::CalibrationOffset,
                changed,
            );
        });
    }

    pub(crate) fn store_display_unit(&self, value: DisplayUnit) {
        self.apply(|snap, changed| {
            store_value(&mut snap.display_unit, value, Attribute::DisplayUnit, changed);
        });
    }

    pub(crate) fn store_controller_type(&self, value: ControllerKind) {
        self.apply(|snap, changed| {
            store_value(
                &mut snap.controller_type,
                value,
                Attribute::ControllerType,
                changed,
            );
        });
    }

    pub(crate) fn store_predictive_heating_type(&self, value: PredictiveHeatingKind) {
        self.apply(|snap, changed| {
            store_value(
                &mut snap.predictive_heating_type,
                value,
                Attribute::PredictiveHeatingType,
                changed,
            );
        });
    }

    pub(crate) fn store_timezone_offset(&self, minutes: i32) {
        self.apply(|snap, changed| {
            store_value(
                &mut snap.timezone_offset,
                minutes,
                Attribute::TimezoneOffset,
                changed,
            );
        });
    }

    pub(crate) fn store_pid_parameters(&self, params: PidParameters) {
        self.apply(|snap, changed| {
            store_value(
                &mut snap.pid_parameters,
                params,
                Attribute::PidParameters,
                changed,
            );
        });
    }

    pub(crate) fn store_cloud_communication(&self, enabled: bool) {
        self.apply(|snap, changed| {
            store_value(
                &mut snap.cloud_communication,
                enabled,
                Attribute::CloudCommunication,
                changed,
            );
        });
    }

    pub(crate) fn store_hysteresis_parameters(&self, params: HysteresisParameters) {
        self.apply(|snap, changed| {
            store_value(
                &mut snap.hysteresis_parameters,
                params,
                Attribute::HysteresisParameters,
                changed,
            );
        });
    }

    pub(crate) fn store_commercial_lock(&self, enabled: bool) {
        self.apply(|snap, changed| {
            store_value(
                &mut snap.commercial_lock,
                enabled,
                Attribute::CommercialLock,
                changed,
            );
        });
    }

    pub(crate) fn store_open_window_parameters(&self, params: OpenWindowParameters) {
        self.apply(|snap, changed| {
            store_value(
                &mut snap.open_window_parameters,
                params,
                Attribute::OpenWindowParameters,
                changed,
            );
        });
    }

    pub(crate) fn store_oil_heater_power(&self, value: f64) {
        self.apply(|snap, changed| {
            store_scalar(
                &mut snap.oil_heater_power,
                value,
                Attribute::OilHeaterPower,
                changed,
            );
        });
    }
}
