//! `status` command: one-shot poll and snapshot dump.

use std::time::Duration;

use tokio::time::timeout;

use heatlink_core::{ConnectivityStatus, Device, DetailCode};

use crate::error::CliError;
use crate::output;

/// How long to wait for the engine's first poll to classify the device.
const CONNECT_WAIT: Duration = Duration::from_secs(30);

/// Quiescence window: once no mirror change lands for this long, the
/// first pass of both cadences is assumed to be complete.
const SETTLE: Duration = Duration::from_millis(750);

pub async fn handle(device: &Device) -> Result<(), CliError> {
    let mut connectivity = device.subscribe_connectivity();
    let known = timeout(CONNECT_WAIT, async {
        loop {
            if !matches!(*connectivity.borrow_and_update(), ConnectivityStatus::Unknown) {
                break;
            }
            if connectivity.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
    if known.is_err() {
        return Err(CliError::Offline {
            detail: DetailCode::CommunicationError,
            description: Some("timed out waiting for the first poll".into()),
        });
    }

    if let ConnectivityStatus::Offline {
        detail,
        description,
    } = device.connectivity()
    {
        return Err(CliError::Offline {
            detail,
            description,
        });
    }

    let mut snapshots = device.subscribe_snapshot();
    while let Ok(Ok(())) = timeout(SETTLE, snapshots.changed()).await {}

    println!(
        "connectivity: {}",
        output::connectivity_line(&device.connectivity())
    );
    println!("{}", output::snapshot_table(&device.snapshot()));
    Ok(())
}
