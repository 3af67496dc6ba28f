//! Lifecycle-affecting commands: reboot and API-key rotation.

use std::time::Duration;

use secrecy::SecretString;
use tokio::time::timeout;

use heatlink_core::Device;

use crate::error::CliError;

use super::util;

/// Key rotation needs the device operation key from a status poll; give
/// the first poll this long to deliver it.
const OPERATION_KEY_WAIT: Duration = Duration::from_secs(15);

pub async fn reboot(device: &Device) -> Result<(), CliError> {
    util::report(device.reboot().await)
}

pub async fn rotate_key(device: &Device, new_key: String, confirm: &str) -> Result<(), CliError> {
    wait_for_operation_key(device).await;
    let outcome = device
        .rotate_api_key(Some(SecretString::from(new_key)), Some(confirm))
        .await;
    util::report(outcome)
}

/// Best-effort wait; if the key never shows up, the gateway produces the
/// authoritative rejection message.
async fn wait_for_operation_key(device: &Device) {
    let mut snapshots = device.subscribe_snapshot();
    let _ = timeout(OPERATION_KEY_WAIT, async {
        loop {
            if snapshots.borrow_and_update().operation_key.is_some() {
                break;
            }
            if snapshots.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
}
