mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use heatlink_api::TransportConfig;
use heatlink_core::{CoreError, Device, DeviceConfig, DeviceKind};

use crate::cli::{Cli, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = build_device_config(&cli.global)?;
    // One HTTP client per process; devices share its connection pool.
    let http = TransportConfig::default()
        .build_client()
        .map_err(CoreError::from)?;
    let device = Device::new(config, http)?;
    device.start().await?;

    tracing::debug!(command = ?cli.command, "dispatching command");
    let result = commands::dispatch(cli.command, &device).await;

    // In-flight polls are abandoned on teardown; their results are
    // discarded with the engine.
    device.shutdown().await;
    result
}

/// Build a `DeviceConfig` from CLI flags and environment variables.
fn build_device_config(global: &GlobalOpts) -> Result<DeviceConfig, CliError> {
    let hostname = global.host.clone().ok_or(CliError::NoHost)?;

    let kind: DeviceKind = global.kind.parse().map_err(|_| CliError::Validation {
        field: "kind".into(),
        reason: format!("unknown device kind '{}'", global.kind),
    })?;

    // A blank key means "no key": plain HTTP, no Authentication header.
    let api_key = global
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .map(|key| SecretString::from(key.to_owned()));

    Ok(DeviceConfig {
        hostname,
        api_key,
        kind,
        frequent_interval: global.frequent_interval.into(),
        infrequent_interval: global.infrequent_interval.into(),
        ..DeviceConfig::default()
    })
}
