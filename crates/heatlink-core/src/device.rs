// ── Device abstraction ──
//
// Full lifecycle management for one device. A single actor task owns the
// HTTP client, both polling cadences, and the command channel, so at most
// one poll tick or one command mutates the mirror and connectivity status
// at any instant. Cadence timers skip missed ticks instead of queueing,
// and an in-flight tick is abandoned mid-call on shutdown.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use heatlink_api::proto::{
    ControllerKind, DisplayUnit, OperationMode, PredictiveHeatingKind,
    SetHysteresisParametersRequest, SetOpenWindowParametersRequest, SetPidParametersRequest,
    TemperatureMode,
};
use heatlink_api::{Error as ApiError, LocalClient};

use crate::command::{Command, CommandEnvelope, CommandOutcome};
use crate::config::DeviceConfig;
use crate::error::CoreError;
use crate::mirror::{Mirror, MirrorSnapshot};
use crate::model::Attribute;
use crate::status::{ConnectivityStatus, StatusTracker};

const COMMAND_CHANNEL_SIZE: usize = 16;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. [`start()`](Self::start) spawns the actor
/// task; reads go through mirror/status snapshots, writes through the
/// command gateway methods, which never return an error — only a
/// [`CommandOutcome`].
#[derive(Debug, Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

#[derive(Debug)]
struct DeviceInner {
    config: DeviceConfig,
    /// Clone of the process-wide HTTP client; every device and every
    /// rebuilt `LocalClient` shares the one connection pool.
    http: reqwest::Client,
    mirror: Mirror,
    status: StatusTracker,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    /// Built eagerly in `new` so configuration problems surface before
    /// any network traffic; handed to the actor on `start`.
    client: Mutex<Option<LocalClient>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Device {
    /// Create a device instance. `http` is the process-wide client built
    /// once via `TransportConfig::build_client`; all devices share it.
    /// Validates the identity (hostname, key) immediately; does NOT touch
    /// the network — call [`start()`](Self::start) to begin polling.
    pub fn new(config: DeviceConfig, http: reqwest::Client) -> Result<Self, CoreError> {
        let client = LocalClient::new(&config.hostname, config.api_key.clone(), http.clone())
            .map_err(CoreError::from)?;
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(DeviceInner {
                config,
                http,
                mirror: Mirror::new(),
                status: StatusTracker::new(),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                client: Mutex::new(Some(client)),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        })
    }

    /// Access the device configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the synchronization engine.
    ///
    /// Connectivity begins at `Unknown`; the actor performs one blocking
    /// status read (success → `Online`, classified failure → `Offline`
    /// with detail), then runs both cadences either way so an unreachable
    /// device recovers once it comes back.
    pub async fn start(&self) -> Result<(), CoreError> {
        let command_rx = self
            .inner
            .command_rx
            .lock()
            .await
            .take()
            .ok_or(CoreError::AlreadyStarted)?;
        let client = self
            .inner
            .client
            .lock()
            .await
            .take()
            .ok_or(CoreError::AlreadyStarted)?;

        info!(host = %self.inner.config.hostname, kind = %self.inner.config.kind, "starting device engine");
        let actor = Actor {
            inner: Arc::clone(&self.inner),
            client,
        };
        let handle = tokio::spawn(actor.run(command_rx));
        *self.inner.task.lock().await = Some(handle);
        Ok(())
    }

    /// Tear the engine down. Any in-flight tick is abandoned mid-call and
    /// its result discarded; no mirror update is applied after teardown
    /// begins.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// A consistent snapshot of the mirrored device state.
    pub fn snapshot(&self) -> MirrorSnapshot {
        self.inner.mirror.snapshot()
    }

    /// Subscribe to mirror snapshot changes.
    pub fn subscribe_snapshot(&self) -> watch::Receiver<MirrorSnapshot> {
        self.inner.mirror.subscribe()
    }

    /// Subscribe to per-attribute update events.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<Attribute> {
        self.inner.mirror.subscribe_updates()
    }

    /// The current connectivity status.
    pub fn connectivity(&self) -> ConnectivityStatus {
        self.inner.status.current()
    }

    /// Subscribe to connectivity transitions.
    pub fn subscribe_connectivity(&self) -> watch::Receiver<ConnectivityStatus> {
        self.inner.status.subscribe()
    }

    // ── Command gateway ──────────────────────────────────────────────
    //
    // One entry point per writable attribute. Missing parameters are
    // rejected here, before anything reaches the channel or the network.
    // Every method resolves to a CommandOutcome; classified errors from
    // the wire are converted inside the actor.

    async fn submit(&self, command: Command) -> CommandOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = CommandEnvelope { command, reply_tx };
        if self.inner.command_tx.send(envelope).await.is_err() {
            return CommandOutcome::rejected("device engine is not running");
        }
        reply_rx
            .await
            .unwrap_or_else(|_| CommandOutcome::rejected("device engine stopped before replying"))
    }

    pub async fn reboot(&self) -> CommandOutcome {
        self.submit(Command::Reboot).await
    }

    pub async fn set_operation_mode(&self, mode: OperationMode) -> CommandOutcome {
        self.submit(Command::SetOperationMode { mode }).await
    }

    /// Set the independent-mode target temperature.
    pub async fn set_independent_temperature(&self, value: Option<f64>) -> CommandOutcome {
        let value = match require(value, "temperature value") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        self.submit(Command::SetTemperature {
            mode: TemperatureMode::Independent,
            value,
        })
        .await
    }

    pub async fn set_calibration_offset(&self, value: Option<f64>) -> CommandOutcome {
        let value = match require(value, "calibration offset") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        self.submit(Command::SetCalibrationOffset { value }).await
    }

    pub async fn set_display_unit(&self, unit: DisplayUnit) -> CommandOutcome {
        self.submit(Command::SetDisplayUnit { unit }).await
    }

    pub async fn set_controller_type(&self, kind: ControllerKind) -> CommandOutcome {
        self.submit(Command::SetControllerType { kind }).await
    }

    pub async fn set_predictive_heating_type(&self, kind: PredictiveHeatingKind) -> CommandOutcome {
        self.submit(Command::SetPredictiveHeatingType { kind }).await
    }

    pub async fn set_timezone_offset(&self, minutes: Option<i32>) -> CommandOutcome {
        let minutes = match require(minutes, "timezone offset") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        self.submit(Command::SetTimezoneOffset { minutes }).await
    }

    pub async fn set_cloud_communication(&self, enabled: Option<bool>) -> CommandOutcome {
        let enabled = match require(enabled, "cloud communication flag") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        self.submit(Command::SetCloudCommunication { enabled }).await
    }

    pub async fn set_commercial_lock(&self, enabled: Option<bool>) -> CommandOutcome {
        let enabled = match require(enabled, "commercial lock flag") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        self.submit(Command::SetCommercialLock { enabled }).await
    }

    pub async fn set_custom_name(&self, name: Option<String>) -> CommandOutcome {
        let name = match require(name, "device name") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        if name.trim().is_empty() {
            return CommandOutcome::rejected("device name must not be blank");
        }
        self.submit(Command::SetCustomName { name }).await
    }

    /// Both hysteresis bounds travel together.
    pub async fn set_hysteresis_parameters(
        &self,
        upper: Option<f64>,
        lower: Option<f64>,
    ) -> CommandOutcome {
        let (upper, lower) = match (
            require(upper, "upper hysteresis bound"),
            require(lower, "lower hysteresis bound"),
        ) {
            (Ok(u), Ok(l)) => (u, l),
            (Err(outcome), _) | (_, Err(outcome)) => return outcome,
        };
        self.submit(Command::SetHysteresisParameters { upper, lower })
            .await
    }

    /// All five open-window fields are required together; a partial
    /// update is rejected without any network call.
    #[allow(clippy::similar_names)]
    pub async fn set_open_window_parameters(
        &self,
        drop_temperature_threshold: Option<f64>,
        drop_time_range: Option<u32>,
        increase_temperature_threshold: Option<f64>,
        increase_time_range: Option<u32>,
        enabled: Option<bool>,
    ) -> CommandOutcome {
        let drop_temperature_threshold =
            match require(drop_temperature_threshold, "drop temperature threshold") {
                Ok(v) => v,
                Err(outcome) => return outcome,
            };
        let drop_time_range = match require(drop_time_range, "drop time range") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let increase_temperature_threshold = match require(
            increase_temperature_threshold,
            "increase temperature threshold",
        ) {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let increase_time_range = match require(increase_time_range, "increase time range") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let enabled = match require(enabled, "enabled flag") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        self.submit(Command::SetOpenWindowParameters {
            drop_temperature_threshold,
            drop_time_range,
            increase_temperature_threshold,
            increase_time_range,
            enabled,
        })
        .await
    }

    /// All five PID gains are required together; a partial update is
    /// rejected without any network call.
    pub async fn set_pid_parameters(
        &self,
        kp: Option<f64>,
        ki: Option<f64>,
        kd: Option<f64>,
        kd_filter_n: Option<f64>,
        windup_limit_percentage: Option<f64>,
    ) -> CommandOutcome {
        let kp = match require(kp, "proportional gain") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let ki = match require(ki, "integral gain") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let kd = match require(kd, "derivative gain") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let kd_filter_n = match require(kd_filter_n, "derivative filter coefficient") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let windup_limit_percentage = match require(windup_limit_percentage, "windup limit") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        self.submit(Command::SetPidParameters {
            kp,
            ki,
            kd,
            kd_filter_n,
            windup_limit_percentage,
        })
        .await
    }

    pub async fn set_oil_heater_power(&self, value: Option<f64>) -> CommandOutcome {
        let value = match require(value, "power level") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        self.submit(Command::SetOilHeaterPower { value }).await
    }

    /// Rotate the static API key.
    ///
    /// `confirm` must match the device operation key captured by the
    /// status poll — a mismatch (or an operation key the engine has never
    /// learned) is rejected before any network call.
    pub async fn rotate_api_key(
        &self,
        key: Option<SecretString>,
        confirm: Option<&str>,
    ) -> CommandOutcome {
        let key = match require(key, "new API key") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let confirm = match require(confirm, "confirmation token") {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        match self.inner.mirror.snapshot().operation_key {
            None => CommandOutcome::rejected(
                "device operation key is not known yet; wait for a successful poll",
            ),
            Some(expected) if expected != confirm => {
                CommandOutcome::rejected("confirmation token does not match the device operation key")
            }
            Some(_) => self.submit(Command::SetApiKey { key }).await,
        }
    }
}

fn require<T>(value: Option<T>, what: &str) -> Result<T, CommandOutcome> {
    value.ok_or_else(|| CommandOutcome::rejected(format!("{what} must be set")))
}

// ── Actor ────────────────────────────────────────────────────────────

/// Owns the HTTP client and executes everything that touches per-device
/// state. Single task — the serialization discipline for the whole
/// engine.
struct Actor {
    inner: Arc<DeviceInner>,
    client: LocalClient,
}

impl Actor {
    async fn run(mut self, mut command_rx: mpsc::Receiver<CommandEnvelope>) {
        let cancel = self.inner.cancel.clone();

        // Initial blocking status read. Failure does not terminate the
        // engine; the cadences below give the device a path to recover.
        tokio::select! {
            () = cancel.cancelled() => return,
            () = self.initial_read() => {}
        }

        let mut frequent = tokio::time::interval(self.inner.config.frequent_interval);
        frequent.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut infrequent = tokio::time::interval(self.inner.config.infrequent_interval);
        infrequent.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = frequent.tick() => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = self.frequent_tick() => {}
                    }
                }
                _ = infrequent.tick() => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = self.infrequent_tick() => {}
                    }
                }
                envelope = command_rx.recv() => {
                    let Some(envelope) = envelope else { break };
                    tokio::select! {
                        () = cancel.cancelled() => {
                            let _ = envelope
                                .reply_tx
                                .send(CommandOutcome::rejected("device engine shut down"));
                            break;
                        }
                        outcome = self.execute(envelope.command) => {
                            let _ = envelope.reply_tx.send(outcome);
                        }
                    }
                }
            }
        }
        debug!(host = %self.inner.config.hostname, "device engine stopped");
    }

    async fn initial_read(&self) {
        match self
            .client
            .device_status(self.inner.config.read_timeout)
            .await
        {
            Ok(status) => {
                self.inner.mirror.store_device_status(&status);
                self.inner.status.on_success();
            }
            Err(err) => {
                warn!(error = %err, "initial status read failed");
                self.inner.status.on_failure(&err);
            }
        }
    }

    // ── Poll ticks ───────────────────────────────────────────────────
    //
    // Connectivity is updated once per tick: the first failing call ends
    // its tick (values written by earlier calls in the tick stay
    // written), a completed sequence converges the status to ONLINE.

    async fn frequent_tick(&self) {
        match self.frequent_sequence().await {
            Ok(()) => self.inner.status.on_success(),
            Err(err) => {
                warn!(error = %err, "frequent poll tick failed");
                self.inner.status.on_failure(&err);
            }
        }
    }

    async fn frequent_sequence(&self) -> Result<(), ApiError> {
        let timeout = self.inner.config.read_timeout;

        let control = self.client.control_status(timeout).await?;
        self.inner.mirror.store_control_status(&control);

        if self.inner.config.kind.supports_temperature_control() {
            for mode in TemperatureMode::POLLED {
                let reading = self.client.set_temperature_for(mode, timeout).await?;
                if let Some(value) = reading.value {
                    self.inner.mirror.store_set_temperature(mode, value);
                }
            }
        }
        Ok(())
    }

    async fn infrequent_tick(&self) {
        match self.infrequent_sequence().await {
            Ok(()) => self.inner.status.on_success(),
            Err(err) => {
                warn!(error = %err, "infrequent poll tick failed");
                self.inner.status.on_failure(&err);
            }
        }
    }

    #[allow(clippy::cognitive_complexity)]
    async fn infrequent_sequence(&self) -> Result<(), ApiError> {
        let timeout = self.inner.config.read_timeout;
        let kind = self.inner.config.kind;
        let mirror = &self.inner.mirror;

        let status = self.client.device_status(timeout).await?;
        mirror.store_device_status(&status);

        if let Some(value) = self.client.calibration_offset(timeout).await?.value {
            mirror.store_calibration_offset(value);
        }
        if let Some(value) = self.client.display_unit(timeout).await?.value {
            mirror.store_display_unit(value);
        }
        if let Some(value) = self.client.controller_type(timeout).await?.controller_type {
            mirror.store_controller_type(value);
        }
        if let Some(value) = self
            .client
            .predictive_heating_type(timeout)
            .await?
            .predictive_heating_type
        {
            mirror.store_predictive_heating_type(value);
        }
        if let Some(value) = self.client.timezone_offset(timeout).await?.timezone_offset {
            mirror.store_timezone_offset(value);
        }
        if kind.supports_pid() {
            let pid = self.client.pid_parameters(timeout).await?;
            mirror.store_pid_parameters(pid);
        }
        if let Some(value) = self.client.cloud_communication(timeout).await?.value {
            mirror.store_cloud_communication(value);
        }
        if kind.supports_hysteresis() {
            let hysteresis = self.client.hysteresis_parameters(timeout).await?;
            mirror.store_hysteresis_parameters(hysteresis);
        }
        // The commercial-lock customization endpoint is excluded here: a
        // documented firmware defect truncates its response body. The
        // plain commercial-lock read is the substitute; re-enable via
        // LocalClient::commercial_lock_customization once fixed firmware
        // is the baseline.
        if let Some(value) = self.client.commercial_lock(timeout).await?.value {
            mirror.store_commercial_lock(value);
        }
        let open_window = self.client.open_window_parameters(timeout).await?;
        mirror.store_open_window_parameters(open_window);

        if kind.supports_oil_power() {
            if let Some(value) = self.client.oil_heater_power(timeout).await?.value {
                mirror.store_oil_heater_power(value);
            }
        }
        Ok(())
    }

    // ── Command execution ────────────────────────────────────────────
    //
    // The mirror is never optimistically mutated: the device API does not
    // echo new values, so the next successful poll is the confirmation.

    #[allow(clippy::too_many_lines)]
    async fn execute(&mut self, command: Command) -> CommandOutcome {
        let name = command.name();
        let kind = self.inner.config.kind;
        let timeout = self.inner.config.write_timeout;

        // Capability gating: a variant that doesn't carry an endpoint
        // rejects the command before any network traffic.
        let unsupported = match &command {
            Command::SetPidParameters { .. } => !kind.supports_pid(),
            Command::SetHysteresisParameters { .. } => !kind.supports_hysteresis(),
            Command::SetOilHeaterPower { .. } => !kind.supports_oil_power(),
            Command::SetTemperature { .. } => !kind.supports_temperature_control(),
            _ => false,
        };
        if unsupported {
            return CommandOutcome::rejected(format!(
                "{name} is not supported by the {kind} variant"
            ));
        }

        let result: Result<String, ApiError> = match command {
            Command::Reboot => self
                .client
                .reboot(timeout)
                .await
                .map(|_| "reboot requested; device is restarting".to_owned()),
            Command::SetOperationMode { mode } => self
                .client
                .set_operation_mode(mode, timeout)
                .await
                .map(|_| format!("operation mode set to {mode}")),
            Command::SetTemperature { mode, value } => self
                .client
                .set_temperature(mode, value, timeout)
                .await
                .map(|_| format!("{mode} temperature set to {value}")),
            Command::SetCalibrationOffset { value } => self
                .client
                .set_calibration_offset(value, timeout)
                .await
                .map(|_| format!("calibration offset set to {value}")),
            Command::SetDisplayUnit { unit } => self
                .client
                .set_display_unit(unit, timeout)
                .await
                .map(|_| format!("display unit set to {unit}")),
            Command::SetControllerType { kind } => self
                .client
                .set_controller_type(kind, timeout)
                .await
                .map(|_| format!("controller type set to {kind}")),
            Command::SetPredictiveHeatingType { kind } => self
                .client
                .set_predictive_heating_type(kind, timeout)
                .await
                .map(|_| format!("predictive heating type set to {kind}")),
            Command::SetTimezoneOffset { minutes } => self
                .client
                .set_timezone_offset(minutes, timeout)
                .await
                .map(|_| format!("timezone offset set to {minutes} minutes")),
            Command::SetCloudCommunication { enabled } => self
                .client
                .set_cloud_communication(enabled, timeout)
                .await
                .map(|_| format!("cloud communication set to {enabled}")),
            Command::SetCommercialLock { enabled } => self
                .client
                .set_commercial_lock(enabled, timeout)
                .await
                .map(|_| format!("commercial lock set to {enabled}")),
            Command::SetCustomName { name } => self
                .client
                .set_custom_name(&name, timeout)
                .await
                .map(|_| format!("device name set to {name:?}")),
            Command::SetHysteresisParameters { upper, lower } => self
                .client
                .set_hysteresis_parameters(
                    &SetHysteresisParametersRequest {
                        temperature_hysteresis_upper: upper,
                        temperature_hysteresis_lower: lower,
                    },
                    timeout,
                )
                .await
                .map(|_| "hysteresis parameters updated".to_owned()),
            Command::SetOpenWindowParameters {
                drop_temperature_threshold,
                drop_time_range,
                increase_temperature_threshold,
                increase_time_range,
                enabled,
            } => self
                .client
                .set_open_window_parameters(
                    &SetOpenWindowParametersRequest {
                        drop_temperature_threshold,
                        drop_time_range,
                        increase_temperature_threshold,
                        increase_time_range,
                        enabled,
                    },
                    timeout,
                )
                .await
                .map(|_| "open window parameters updated".to_owned()),
            Command::SetPidParameters {
                kp,
                ki,
                kd,
                kd_filter_n,
                windup_limit_percentage,
            } => self
                .client
                .set_pid_parameters(
                    &SetPidParametersRequest {
                        kp,
                        ki,
                        kd,
                        kd_filter_n,
                        windup_limit_percentage,
                    },
                    timeout,
                )
                .await
                .map(|_| "PID parameters updated".to_owned()),
            Command::SetOilHeaterPower { value } => self
                .client
                .set_oil_heater_power(value, timeout)
                .await
                .map(|_| format!("oil heater power set to {value}")),
            Command::SetApiKey { key } => {
                let result = self
                    .client
                    .set_api_key(&key, self.inner.config.rotate_key_timeout)
                    .await;
                if result.is_ok() {
                    self.rotate_local_key(key);
                }
                result.map(|_| "API key rotated; device is rebooting".to_owned())
            }
        };

        match result {
            Ok(message) => {
                debug!(command = name, "command accepted");
                CommandOutcome::accepted(message)
            }
            Err(err) => {
                warn!(command = name, error = %err, "command failed");
                // A classified failure from a command drives connectivity
                // just like a failing poll tick does.
                self.inner.status.on_failure(&err);
                CommandOutcome::rejected(format!("{name} failed: {}", err.message()))
            }
        }
    }

    /// After the device accepts a new key it reboots into HTTPS with that
    /// key, so the actor's client must follow. The shared connection pool
    /// is reused; only the base URL and header change.
    fn rotate_local_key(&mut self, key: SecretString) {
        match LocalClient::new(
            &self.inner.config.hostname,
            Some(key),
            self.inner.http.clone(),
        ) {
            Ok(client) => self.client = client,
            Err(err) => {
                warn!(error = %err, "failed to rebuild client after key rotation");
            }
        }
    }
}
