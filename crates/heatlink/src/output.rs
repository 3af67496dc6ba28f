//! Terminal rendering of mirror snapshots and connectivity.

use owo_colors::OwoColorize;
use tabled::Tabled;
use tabled::settings::Style;

use heatlink_core::{Attribute, ConnectivityStatus, MirrorSnapshot};

// ── Connectivity ────────────────────────────────────────────────────

/// One-line colored connectivity summary.
pub fn connectivity_line(status: &ConnectivityStatus) -> String {
    match status {
        ConnectivityStatus::Unknown => "UNKNOWN".yellow().to_string(),
        ConnectivityStatus::Online => "ONLINE".green().to_string(),
        ConnectivityStatus::Offline {
            detail,
            description,
        } => {
            let head = format!("{} ({detail})", "OFFLINE".red());
            match description {
                Some(text) => format!("{head}: {text}"),
                None => head,
            }
        }
    }
}

// ── Snapshot table ──────────────────────────────────────────────────

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    attribute: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(attribute: &str, value: Option<String>) -> Option<AttributeRow> {
    value.map(|value| AttributeRow {
        attribute: attribute.to_owned(),
        value,
    })
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// Render every mirrored attribute that has been read at least once.
#[allow(clippy::too_many_lines, clippy::redundant_closure_for_method_calls)]
pub fn snapshot_table(snap: &MirrorSnapshot) -> String {
    let rows: Vec<AttributeRow> = [
        row("name", snap.name.clone()),
        row("custom name", snap.custom_name.clone()),
        row("firmware version", snap.version.clone()),
        row("operation key", snap.operation_key.clone()),
        row(
            "ambient temperature",
            snap.ambient_temperature.map(|v| format!("{v:.1}")),
        ),
        row(
            "raw ambient temperature",
            snap.raw_ambient_temperature.map(|v| format!("{v:.2}")),
        ),
        row("current power", snap.current_power.map(|v| format!("{v:.0} W"))),
        row(
            "control signal",
            snap.control_signal.map(|v| format!("{v:.0} %")),
        ),
        row("lock state", snap.lock_state.map(|v| v.to_string())),
        row(
            "open window state",
            snap.open_window_state.map(|v| v.to_string()),
        ),
        row(
            "set temperature",
            snap.set_temperature.map(|v| format!("{v:.1}")),
        ),
        row("operating mode", snap.operating_mode.map(|v| v.to_string())),
        row(
            "comfort temperature",
            snap.comfort_temperature.map(|v| format!("{v:.1}")),
        ),
        row(
            "sleep temperature",
            snap.sleep_temperature.map(|v| format!("{v:.1}")),
        ),
        row(
            "away temperature",
            snap.away_temperature.map(|v| format!("{v:.1}")),
        ),
        row(
            "independent temperature",
            snap.independent_temperature.map(|v| format!("{v:.1}")),
        ),
        row(
            "calibration offset",
            snap.calibration_offset.map(|v| format!("{v:.1}")),
        ),
        row("display unit", snap.display_unit.map(|v| v.to_string())),
        row(
            "controller type",
            snap.controller_type.map(|v| v.to_string()),
        ),
        row(
            "predictive heating",
            snap.predictive_heating_type.map(|v| v.to_string()),
        ),
        row(
            "timezone offset",
            snap.timezone_offset.map(|v| format!("{v} min")),
        ),
        row(
            "PID parameters",
            snap.pid_parameters.as_ref().map(|p| {
                format!(
                    "kp={} ki={} kd={} n={} windup={}",
                    opt(p.kp),
                    opt(p.ki),
                    opt(p.kd),
                    opt(p.kd_filter_n),
                    opt(p.windup_limit_percentage)
                )
            }),
        ),
        row(
            "cloud communication",
            snap.cloud_communication.map(|v| v.to_string()),
        ),
        row(
            "hysteresis",
            snap.hysteresis_parameters.as_ref().map(|h| {
                format!(
                    "upper={} lower={}",
                    opt(h.temperature_hysteresis_upper),
                    opt(h.temperature_hysteresis_lower)
                )
            }),
        ),
        row("commercial lock", snap.commercial_lock.map(|v| v.to_string())),
        row(
            "open window config",
            snap.open_window_parameters.as_ref().map(|w| {
                format!(
                    "drop={}/{}s rise={}/{}s enabled={}",
                    opt(w.drop_temperature_threshold),
                    opt(w.drop_time_range),
                    opt(w.increase_temperature_threshold),
                    opt(w.increase_time_range),
                    opt(w.enabled)
                )
            }),
        ),
        row(
            "oil heater power",
            snap.oil_heater_power.map(|v| format!("{v:.0} %")),
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if rows.is_empty() {
        return "(no attributes read yet)".to_owned();
    }
    let mut table = tabled::Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

// ── Watch output ────────────────────────────────────────────────────

/// Current rendered value of one attribute, for `watch` update lines.
#[allow(clippy::too_many_lines, clippy::redundant_closure_for_method_calls)]
pub fn attribute_value(snap: &MirrorSnapshot, attribute: Attribute) -> String {
    let text = match attribute {
        Attribute::AmbientTemperature => snap.ambient_temperature.map(|v| format!("{v:.1}")),
        Attribute::RawAmbientTemperature => {
            snap.raw_ambient_temperature.map(|v| format!("{v:.2}"))
        }
        Attribute::CurrentPower => snap.current_power.map(|v| format!("{v:.0} W")),
        Attribute::ControlSignal => snap.control_signal.map(|v| format!("{v:.0} %")),
        Attribute::LockState => snap.lock_state.map(|v| v.to_string()),
        Attribute::OpenWindowState => snap.open_window_state.map(|v| v.to_string()),
        Attribute::SetTemperature => snap.set_temperature.map(|v| format!("{v:.1}")),
        Attribute::SetTemperatureComfort => snap.comfort_temperature.map(|v| format!("{v:.1}")),
        Attribute::SetTemperatureSleep => snap.sleep_temperature.map(|v| format!("{v:.1}")),
        Attribute::SetTemperatureAway => snap.away_temperature.map(|v| format!("{v:.1}")),
        Attribute::SetTemperatureIndependent => {
            snap.independent_temperature.map(|v| format!("{v:.1}"))
        }
        Attribute::OperatingMode => snap.operating_mode.map(|v| v.to_string()),
        Attribute::ControllerType => snap.controller_type.map(|v| v.to_string()),
        Attribute::PidParameters => snap.pid_parameters.as_ref().map(|_| "updated".to_owned()),
        Attribute::HysteresisParameters => snap
            .hysteresis_parameters
            .as_ref()
            .map(|_| "updated".to_owned()),
        Attribute::OpenWindowParameters => snap
            .open_window_parameters
            .as_ref()
            .map(|_| "updated".to_owned()),
        Attribute::DisplayUnit => snap.display_unit.map(|v| v.to_string()),
        Attribute::PredictiveHeatingType => snap.predictive_heating_type.map(|v| v.to_string()),
        Attribute::CloudCommunication => snap.cloud_communication.map(|v| v.to_string()),
        Attribute::CommercialLock => snap.commercial_lock.map(|v| v.to_string()),
        Attribute::CustomName => snap.custom_name.clone(),
        Attribute::TimezoneOffset => snap.timezone_offset.map(|v| format!("{v} min")),
        Attribute::CalibrationOffset => snap.calibration_offset.map(|v| format!("{v:.1}")),
        Attribute::OilHeaterPower => snap.oil_heater_power.map(|v| format!("{v:.0} %")),
        Attribute::Identity => snap.name.clone(),
    };
    text.unwrap_or_else(|| "-".to_owned())
}
