//! Command dispatch: bridges CLI args -> device gateway calls -> output.

pub mod admin;
pub mod set;
pub mod status;
pub mod util;
pub mod watch;

use heatlink_core::Device;

use crate::cli::Command;
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, device: &Device) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(device).await,
        Command::Watch { duration } => watch::handle(device, duration.map(Into::into)).await,
        Command::Set(set_cmd) => set::handle(device, set_cmd).await,
        Command::Reboot => admin::reboot(device).await,
        Command::RotateKey { new_key, confirm } => {
            admin::rotate_key(device, new_key, &confirm).await
        }
    }
}
