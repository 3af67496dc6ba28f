//! Device synchronization engine between `heatlink-api` and consumers.
//!
//! This crate owns the per-device state and the machinery that keeps it
//! fresh against an unreliable embedded HTTP server:
//!
//! - **[`Device`]** — Central facade managing the full lifecycle:
//!   [`start()`](Device::start) performs the initial status read, then runs
//!   a single actor task that owns both polling cadences and the command
//!   channel, so at most one poll tick or command mutates device state at
//!   any instant.
//!
//! - **[`Mirror`]** — In-memory cache of the last known device attribute
//!   values behind a `tokio::sync::watch` snapshot, with per-attribute
//!   change notification gated by the [`model::precision`] policy.
//!
//! - **[`ConnectivityStatus`]** — The `Unknown | Online | Offline(detail)`
//!   lattice downstream automation consumes. Each poll tick converges it;
//!   classified command failures push it offline too.
//!
//! - **[`Command`]** — Typed write requests routed through an `mpsc`
//!   channel into the actor. Every command resolves to a
//!   [`CommandOutcome`] string result — classified errors never escape
//!   the gateway.
//!
//! - **Domain model** ([`model`]) — Device variants as a declared
//!   capability set ([`DeviceKind`]), mirrored attributes ([`Attribute`]),
//!   and the numeric precision table.

pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod mirror;
pub mod model;
pub mod status;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandOutcome};
pub use config::DeviceConfig;
pub use device::Device;
pub use error::CoreError;
pub use mirror::{Mirror, MirrorSnapshot};
pub use model::{Attribute, DeviceKind};
pub use status::{ConnectivityStatus, DetailCode};

// Re-export the wire-level enums consumers see in snapshots.
pub use heatlink_api::proto::{
    ControllerKind, DisplayUnit, LockState, OpenWindowState, OperationMode,
    PredictiveHeatingKind, TemperatureMode,
};
