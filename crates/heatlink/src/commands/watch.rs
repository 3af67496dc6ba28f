//! `watch` command: stream attribute updates and connectivity
//! transitions until Ctrl-C or an optional deadline.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use heatlink_core::Device;

use crate::error::CliError;
use crate::output;

pub async fn handle(device: &Device, duration: Option<Duration>) -> Result<(), CliError> {
    let mut updates = device.subscribe_updates();
    let mut connectivity = device.subscribe_connectivity();
    let deadline = duration.map(|d| tokio::time::Instant::now() + d);

    println!(
        "connectivity: {}",
        output::connectivity_line(&device.connectivity())
    );

    loop {
        let timer = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = timer => break,
            changed = connectivity.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = output::connectivity_line(&connectivity.borrow_and_update());
                println!("connectivity: {line}");
            }
            update = updates.recv() => match update {
                Ok(attribute) => {
                    let snap = device.snapshot();
                    println!("{attribute} = {}", output::attribute_value(&snap, attribute));
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "update stream lagged; some changes were not printed");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}
