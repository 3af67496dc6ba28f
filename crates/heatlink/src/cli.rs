//! Clap derive structures for the `heatlink` CLI.
//!
//! Defines the command tree and global flags. Every subcommand talks to a
//! single device identified by `--host` (or `HEATLINK_HOST`).

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// heatlink -- poll and control heater-class devices over their local API
#[derive(Debug, Parser)]
#[command(
    name = "heatlink",
    version,
    about = "Poll and control heater-class devices from the command line",
    long_about = "A client for the local JSON-over-HTTP control API of \
        heater-class devices.\n\n\
        Reads mirror the device state on two polling cadences; writes go \
        through a command gateway serialized against the polls.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device hostname or IP address (no scheme)
    #[arg(long, short = 'H', env = "HEATLINK_HOST", global = true)]
    pub host: Option<String>,

    /// Static API key; presence switches the connection to HTTPS
    #[arg(long, env = "HEATLINK_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Device variant (panel-heater, convection-heater, oil-heater,
    /// socket, all-functions)
    #[arg(long, env = "HEATLINK_KIND", default_value = "panel-heater", global = true)]
    pub kind: String,

    /// Interval of the frequent poll cadence
    #[arg(long, default_value = "10s", global = true)]
    pub frequent_interval: humantime::Duration,

    /// Interval of the infrequent poll cadence
    #[arg(long, default_value = "5m", global = true)]
    pub infrequent_interval: humantime::Duration,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the device once and print the mirrored state
    Status,

    /// Keep polling and print attribute updates as they arrive
    Watch {
        /// Stop watching after this long (default: until Ctrl-C)
        #[arg(long)]
        duration: Option<humantime::Duration>,
    },

    /// Write one device setting
    #[command(subcommand)]
    Set(SetCommand),

    /// Reboot the device
    Reboot,

    /// Rotate the static API key
    RotateKey {
        /// The new API key to install
        #[arg(long)]
        new_key: String,
        /// Confirmation token; must match the device operation key shown
        /// by `heatlink status`
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Independent-mode target temperature (degrees)
    Temperature { value: f64 },

    /// Operating mode (control, weekly_program, independent, off)
    Mode { mode: String },

    /// Custom device name
    Name { name: String },

    /// Timezone offset in minutes east of UTC
    Timezone { minutes: i32 },

    /// Cloud communication flag
    Cloud { enabled: bool },

    /// Display unit (celsius, fahrenheit)
    DisplayUnit { unit: String },

    /// Temperature calibration offset (degrees)
    Calibration { value: f64 },

    /// Commercial lock flag
    Lock { enabled: bool },

    /// Regulation algorithm (hysteresis, pid)
    ControllerType { kind: String },

    /// Predictive heating type (off, simple, advanced)
    PredictiveHeating { kind: String },

    /// Oil heater power limit (percent)
    OilPower { value: f64 },

    /// PID regulation parameters (all five gains required together)
    Pid {
        kp: f64,
        ki: f64,
        kd: f64,
        kd_filter_n: f64,
        windup_limit: f64,
    },

    /// Hysteresis bounds (both required together)
    Hysteresis { upper: f64, lower: f64 },

    /// Open-window detection parameters (all five required together)
    OpenWindow {
        drop_threshold: f64,
        drop_time: u32,
        increase_threshold: f64,
        increase_time: u32,
        enabled: bool,
    },
}
