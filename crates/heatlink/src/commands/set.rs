//! `set` command handlers: one gateway call per writable attribute.

use heatlink_core::{
    ControllerKind, Device, DisplayUnit, OperationMode, PredictiveHeatingKind,
};

use crate::cli::SetCommand;
use crate::error::CliError;

use super::util;

pub async fn handle(device: &Device, cmd: SetCommand) -> Result<(), CliError> {
    let outcome = match cmd {
        SetCommand::Temperature { value } => {
            device.set_independent_temperature(Some(value)).await
        }
        SetCommand::Mode { mode } => {
            let mode = util::parse_enum("mode", &mode, OperationMode::Unrecognized)?;
            device.set_operation_mode(mode).await
        }
        SetCommand::Name { name } => device.set_custom_name(Some(name)).await,
        SetCommand::Timezone { minutes } => device.set_timezone_offset(Some(minutes)).await,
        SetCommand::Cloud { enabled } => device.set_cloud_communication(Some(enabled)).await,
        SetCommand::DisplayUnit { unit } => {
            let unit = util::parse_enum("unit", &unit, DisplayUnit::Unrecognized)?;
            device.set_display_unit(unit).await
        }
        SetCommand::Calibration { value } => device.set_calibration_offset(Some(value)).await,
        SetCommand::Lock { enabled } => device.set_commercial_lock(Some(enabled)).await,
        SetCommand::ControllerType { kind } => {
            let kind = util::parse_enum("kind", &kind, ControllerKind::Unrecognized)?;
            device.set_controller_type(kind).await
        }
        SetCommand::PredictiveHeating { kind } => {
            let kind = util::parse_enum("kind", &kind, PredictiveHeatingKind::Unrecognized)?;
            device.set_predictive_heating_type(kind).await
        }
        SetCommand::OilPower { value } => device.set_oil_heater_power(Some(value)).await,
        SetCommand::Pid {
            kp,
            ki,
            kd,
            kd_filter_n,
            windup_limit,
        } => {
            device
                .set_pid_parameters(
                    Some(kp),
                    Some(ki),
                    Some(kd),
                    Some(kd_filter_n),
                    Some(windup_limit),
                )
                .await
        }
        SetCommand::Hysteresis { upper, lower } => {
            device
                .set_hysteresis_parameters(Some(upper), Some(lower))
                .await
        }
        SetCommand::OpenWindow {
            drop_threshold,
            drop_time,
            increase_threshold,
            increase_time,
            enabled,
        } => {
            device
                .set_open_window_parameters(
                    Some(drop_threshold),
                    Some(drop_time),
                    Some(increase_threshold),
                    Some(increase_time),
                    Some(enabled),
                )
                .await
        }
    };
    util::report(outcome)
}
