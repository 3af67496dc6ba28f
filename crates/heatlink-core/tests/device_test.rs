#![allow(clippy::unwrap_used)]
// End-to-end tests for the Device engine against a wiremock device.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use heatlink_api::TransportConfig;
use heatlink_core::{
    ConnectivityStatus, DetailCode, Device, DeviceConfig, DeviceKind, TemperatureMode,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// The per-process HTTP client; each test builds one and clones it into
/// every device it creates, like the CLI does.
fn http_client() -> reqwest::Client {
    TransportConfig::default()
        .build_client()
        .expect("transport")
}

fn config_for(server: &MockServer, kind: DeviceKind) -> DeviceConfig {
    DeviceConfig {
        hostname: server.address().to_string(),
        kind,
        frequent_interval: Duration::from_millis(50),
        infrequent_interval: Duration::from_millis(150),
        read_timeout: Duration::from_secs(1),
        write_timeout: Duration::from_secs(1),
        rotate_key_timeout: Duration::from_secs(1),
        ..DeviceConfig::default()
    }
}

fn ok_json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Mount a healthy panel-heater fixture: every read endpoint answers OK.
async fn mount_healthy_device(server: &MockServer) {
    let reads: &[(&str, serde_json::Value)] = &[
        (
            "/status",
            json!({
                "status": "ok",
                "name": "panel heater gen3",
                "version": "0x211b2",
                "operation_key": "a1:b2:c3:d4:e5:f6"
            }),
        ),
        (
            "/control-status",
            json!({
                "status": "ok",
                "ambient_temperature": 21.3,
                "raw_ambient_temperature": 21.27,
                "current_power": 600.0,
                "control_signal": 42.0,
                "lock_active": "no_lock",
                "open_window_active": "disabled",
                "set_temperature": 22.0,
                "operating_mode": "independent"
            }),
        ),
        ("/set-temperature", json!({"status": "ok", "value": 22.0})),
        (
            "/temperature-calibration-offset",
            json!({"status": "ok", "value": -0.5}),
        ),
        ("/display-unit", json!({"status": "ok", "value": "celsius"})),
        (
            "/controller-type",
            json!({"status": "ok", "controller_type": "pid"}),
        ),
        (
            "/predictive-heating-type",
            json!({"status": "ok", "predictive_heating_type": "advanced"}),
        ),
        (
            "/timezone-offset",
            json!({"status": "ok", "timezone_offset": 60}),
        ),
        (
            "/pid-parameters",
            json!({
                "status": "ok",
                "kp": 70.0, "ki": 0.02, "kd": 4500.0,
                "kd_filter_n": 60.0, "windup_limit_percentage": 95.0
            }),
        ),
        ("/cloud-communication", json!({"status": "ok", "value": false})),
        (
            "/hysteresis-parameters",
            json!({
                "status": "ok",
                "temperature_hysteresis_upper": 1.0,
                "temperature_hysteresis_lower": 0.5
            }),
        ),
        ("/commercial-lock", json!({"status": "ok", "value": false})),
        (
            "/open-window",
            json!({
                "status": "ok",
                "drop_temperature_threshold": 5.0,
                "drop_time_range": 900,
                "increase_temperature_threshold": 3.0,
                "increase_time_range": 900,
                "enabled": true
            }),
        ),
        ("/oil-heater-power", json!({"status": "ok", "value": 60.0})),
    ];

    for (endpoint, body) in reads {
        Mock::given(method("GET"))
            .and(path(*endpoint))
            .respond_with(ok_json(body.clone()))
            .mount(server)
            .await;
    }
}

async fn wait_for_status(
    device: &Device,
    what: &str,
    pred: impl Fn(&ConnectivityStatus) -> bool,
) {
    let mut rx = device.subscribe_connectivity();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let current = rx.borrow().clone();
            if pred(&current) {
                break;
            }
            rx.changed().await.expect("status channel open");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("device never reached status: {what}"));
}

fn requests_to(requests: &[wiremock::Request], endpoint: &str) -> usize {
    requests
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}

// ── Poll lifecycle ──────────────────────────────────────────────────

#[tokio::test]
async fn full_successful_poll_goes_online_and_fills_mirror() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();

    wait_for_status(&device, "online", ConnectivityStatus::is_online).await;

    // Let both cadences complete at least one full tick.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let snap = device.snapshot();
    assert_eq!(snap.ambient_temperature, Some(21.3));
    assert_eq!(snap.operation_key.as_deref(), Some("a1:b2:c3:d4:e5:f6"));
    assert_eq!(snap.set_temperature_for(TemperatureMode::Comfort), Some(22.0));
    assert_eq!(snap.timezone_offset, Some(60));
    assert!(snap.pid_parameters.is_some());
    assert_eq!(snap.open_window_parameters.as_ref().unwrap().drop_time_range, Some(900));

    // Idempotence: further ticks with unchanged values keep the same
    // mirror and status, with no spurious transitions.
    let status_before = device.connectivity();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(device.snapshot(), snap);
    assert_eq!(device.connectivity(), status_before);
    assert_eq!(device.connectivity().detail(), DetailCode::None);

    device.shutdown().await;
}

#[tokio::test]
async fn initial_failure_goes_offline_then_recovers() {
    let server = MockServer::start().await;

    // First /status answers 500, everything after that is healthy.
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_healthy_device(&server).await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();

    wait_for_status(&device, "offline with communication detail", |s| {
        s.detail() == DetailCode::CommunicationError
    })
    .await;

    // The cadences were still scheduled, so the device recovers.
    wait_for_status(&device, "online after recovery", ConnectivityStatus::is_online).await;

    device.shutdown().await;
}

#[tokio::test]
async fn first_failing_call_aborts_the_rest_of_the_tick() {
    let server = MockServer::start().await;

    // Initial read succeeds; control-status always fails; set-temperature
    // is never mounted and must never be asked for.
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ok_json(json!({"status": "ok", "operation_key": "k"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/control-status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();

    wait_for_status(&device, "offline", |s| {
        s.detail() == DetailCode::CommunicationError
    })
    .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    device.shutdown().await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests_to(&requests, "/control-status") >= 1);
    assert_eq!(requests_to(&requests, "/set-temperature"), 0);
}

#[tokio::test]
async fn socket_variant_skips_gated_endpoints() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;

    let device =
        Device::new(config_for(&server, DeviceKind::Socket), http_client()).unwrap();
    device.start().await.unwrap();

    wait_for_status(&device, "online", ConnectivityStatus::is_online).await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    device.shutdown().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests_to(&requests, "/set-temperature"), 0);
    assert_eq!(requests_to(&requests, "/pid-parameters"), 0);
    assert_eq!(requests_to(&requests, "/hysteresis-parameters"), 0);
    assert_eq!(requests_to(&requests, "/oil-heater-power"), 0);
    // The firmware-defect endpoint stays out of every default sequence.
    assert_eq!(requests_to(&requests, "/commercial-lock-customization"), 0);
    assert!(requests_to(&requests, "/commercial-lock") >= 1);
}

// ── Command gateway ─────────────────────────────────────────────────

#[tokio::test]
async fn partial_parameter_sets_are_rejected_without_network() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();
    wait_for_status(&device, "online", ConnectivityStatus::is_online).await;

    let outcome = device
        .set_pid_parameters(Some(70.0), Some(0.02), None, Some(60.0), Some(95.0))
        .await;
    assert!(!outcome.accepted);
    assert!(outcome.message.contains("derivative gain"));

    let outcome = device
        .set_open_window_parameters(Some(5.0), Some(900), Some(3.0), Some(900), None)
        .await;
    assert!(!outcome.accepted);
    assert!(outcome.message.contains("enabled flag"));

    device.shutdown().await;

    let requests = server.received_requests().await.unwrap();
    assert!(!requests.iter().any(|r| r.method == wiremock::http::Method::POST));
}

#[tokio::test]
async fn key_rotation_requires_matching_confirmation_token() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();
    wait_for_status(&device, "online", ConnectivityStatus::is_online).await;

    let outcome = device
        .rotate_api_key(
            Some(secrecy::SecretString::from("new-key".to_owned())),
            Some("ff:ff:ff:ff:ff:ff"),
        )
        .await;
    assert!(!outcome.accepted);
    assert!(outcome.message.contains("confirmation token"));

    device.shutdown().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests_to(&requests, "/set-api-key"), 0);
}

#[tokio::test]
async fn key_rotation_rejected_while_operation_key_unknown() {
    let server = MockServer::start().await;
    // Engine never started: the mirror has no operation key, and the
    // rejection happens before anything reaches the command channel.
    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();

    let outcome = device
        .rotate_api_key(
            Some(secrecy::SecretString::from("new-key".to_owned())),
            Some("a1:b2:c3:d4:e5:f6"),
        )
        .await;
    assert!(!outcome.accepted);
    assert!(outcome.message.contains("not known yet"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn successful_write_reports_acceptance_without_touching_mirror() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;
    Mock::given(method("POST"))
        .and(path("/set-temperature"))
        .respond_with(ok_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();
    wait_for_status(&device, "online", ConnectivityStatus::is_online).await;

    // Let the frequent cadence settle so the slot holds the polled value.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let before = device.snapshot().independent_temperature;
    assert_eq!(before, Some(22.0));
    let outcome = device.set_independent_temperature(Some(19.5)).await;
    assert!(outcome.accepted, "unexpected rejection: {}", outcome.message);

    // No optimistic mirror mutation: the write itself changes nothing;
    // the next poll (which still reports 22.0) is the confirmation.
    assert_eq!(device.snapshot().independent_temperature, before);

    device.shutdown().await;
}

#[tokio::test]
async fn failing_command_drives_connectivity_offline() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;
    Mock::given(method("POST"))
        .and(path("/reboot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "request_failed"})))
        .mount(&server)
        .await;

    // Long intervals so no poll tick pulls the status back online while
    // we assert.
    let mut config = config_for(&server, DeviceKind::PanelHeater);
    config.frequent_interval = Duration::from_secs(30);
    config.infrequent_interval = Duration::from_secs(60);

    let device = Device::new(config, http_client()).unwrap();
    device.start().await.unwrap();
    wait_for_status(&device, "online", ConnectivityStatus::is_online).await;

    let outcome = device.reboot().await;
    assert!(!outcome.accepted);
    assert!(outcome.message.contains("reboot failed"));
    assert_eq!(device.connectivity().detail(), DetailCode::CommunicationError);

    device.shutdown().await;
}

#[tokio::test]
async fn unsupported_command_is_rejected_by_capability_set() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;

    let device =
        Device::new(config_for(&server, DeviceKind::Socket), http_client()).unwrap();
    device.start().await.unwrap();
    wait_for_status(&device, "online", ConnectivityStatus::is_online).await;

    let outcome = device
        .set_pid_parameters(Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0))
        .await;
    assert!(!outcome.accepted);
    assert!(outcome.message.contains("not supported"));

    device.shutdown().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests_to(&requests, "/pid-parameters"), 0);
}

#[tokio::test]
async fn devices_share_one_http_client() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_healthy_device(&first).await;
    mount_healthy_device(&second).await;

    // One pool serves both devices, and survives a key-rotation rebuild
    // of either device's LocalClient.
    let http = http_client();
    let device_a = Device::new(config_for(&first, DeviceKind::PanelHeater), http.clone()).unwrap();
    let device_b = Device::new(config_for(&second, DeviceKind::Socket), http).unwrap();
    device_a.start().await.unwrap();
    device_b.start().await.unwrap();

    wait_for_status(&device_a, "first device online", ConnectivityStatus::is_online).await;
    wait_for_status(&device_b, "second device online", ConnectivityStatus::is_online).await;

    device_a.shutdown().await;
    device_b.shutdown().await;
}

// ── Lifecycle edges ─────────────────────────────────────────────────

#[tokio::test]
async fn teardown_discards_results_of_in_flight_polls() {
    let server = MockServer::start().await;

    // /status answers promptly; /control-status hangs well past the
    // 1s read timeout, so a tick is guaranteed to be mid-call when we
    // tear the engine down.
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ok_json(json!({"status": "ok", "operation_key": "k"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/control-status"))
        .respond_with(
            ok_json(json!({
                "status": "ok",
                "ambient_temperature": 21.3,
                "set_temperature": 22.0
            }))
            .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();

    // Give the first tick time to get stuck inside /control-status.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot_before = device.snapshot();
    let status_before = device.connectivity();

    // Teardown must abandon the in-flight call, not wait it out.
    tokio::time::timeout(Duration::from_millis(500), device.shutdown())
        .await
        .expect("shutdown waited for the in-flight poll");

    // Sleep past the point where the abandoned call would have timed
    // out: neither its result nor its failure may be applied now.
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(device.snapshot(), snapshot_before);
    assert_eq!(device.snapshot().ambient_temperature, None);
    assert_eq!(device.connectivity(), status_before);
}

#[tokio::test]
async fn commands_after_shutdown_are_rejected() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();
    wait_for_status(&device, "online", ConnectivityStatus::is_online).await;
    device.shutdown().await;

    let outcome = device.reboot().await;
    assert!(!outcome.accepted);
    assert!(outcome.message.contains("not running"));
}

#[tokio::test]
async fn starting_twice_is_an_error() {
    let server = MockServer::start().await;
    mount_healthy_device(&server).await;

    let device = Device::new(config_for(&server, DeviceKind::PanelHeater), http_client())
        .unwrap();
    device.start().await.unwrap();
    assert!(device.start().await.is_err());
    device.shutdown().await;
}

#[tokio::test]
async fn blank_hostname_fails_before_any_network_call() {
    let config = DeviceConfig {
        hostname: "   ".into(),
        ..DeviceConfig::default()
    };
    let err = Device::new(config, http_client()).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}
