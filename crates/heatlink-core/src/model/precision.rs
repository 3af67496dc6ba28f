// ── Numeric precision policy ──
//
// A static, total table mapping each decimal-valued attribute to a
// comparison delta and a display scale. Unlisted attributes fall back to
// the integer policy (delta 0, scale 0). The delta decides whether a
// freshly polled value counts as "changed" for notification purposes;
// the scale rounds values for display and comparison.

use crate::model::Attribute;

/// Comparison delta and display scale for one attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionPolicy {
    /// Two values closer than this are not a material change.
    pub delta: f64,
    /// Decimal places kept when rounding for display.
    pub scale: u32,
}

/// Default policy for attributes not listed in the table.
pub const INTEGER: PrecisionPolicy = PrecisionPolicy {
    delta: 0.0,
    scale: 0,
};

const TEMPERATURE: PrecisionPolicy = PrecisionPolicy {
    delta: 0.1,
    scale: 1,
};

const RAW_TEMPERATURE: PrecisionPolicy = PrecisionPolicy {
    delta: 0.01,
    scale: 2,
};

const PERCENTAGE: PrecisionPolicy = PrecisionPolicy {
    delta: 1.0,
    scale: 0,
};

impl Attribute {
    /// The precision policy for this attribute. Total: everything not in
    /// the decimal table resolves to [`INTEGER`].
    pub fn precision(self) -> PrecisionPolicy {
        match self {
            Self::AmbientTemperature
            | Self::SetTemperature
            | Self::SetTemperatureComfort
            | Self::SetTemperatureSleep
            | Self::SetTemperatureAway
            | Self::SetTemperatureIndependent
            | Self::CalibrationOffset => TEMPERATURE,
            Self::RawAmbientTemperature => RAW_TEMPERATURE,
            Self::CurrentPower | Self::ControlSignal | Self::OilHeaterPower => PERCENTAGE,
            _ => INTEGER,
        }
    }
}

impl PrecisionPolicy {
    /// Round `value` to this policy's display scale.
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(i32::try_from(self.scale).unwrap_or(0));
        (value * factor).round() / factor
    }

    /// Whether `new` differs materially from `old`. With delta 0 any
    /// inequality counts; otherwise differences below the delta are
    /// treated as noise.
    pub fn materially_changed(&self, old: f64, new: f64) -> bool {
        if self.delta == 0.0 {
            old != new
        } else {
            (new - old).abs() >= self.delta
        }
    }
}
