#![allow(clippy::unwrap_used)]
// Integration tests for `LocalClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use heatlink_api::proto::{
    DisplayUnit, LockState, OperationMode, ResponseStatus, SetPidParametersRequest,
    TemperatureMode,
};
use heatlink_api::{Error, LocalClient};

const TIMEOUT: Duration = Duration::from_secs(2);

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, LocalClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = LocalClient::with_client(reqwest::Client::new(), base_url, None);
    (server, client)
}

// ── Read path ───────────────────────────────────────────────────────

#[tokio::test]
async fn control_status_decodes_typed_values() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/control-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "ambient_temperature": 21.3,
            "raw_ambient_temperature": 21.27,
            "current_power": 600.0,
            "control_signal": 42.0,
            "lock_active": "child_lock",
            "open_window_active": "enabled",
            "set_temperature": 22.0,
            "operating_mode": "independent"
        })))
        .mount(&server)
        .await;

    let cs = client.control_status(TIMEOUT).await.unwrap();
    assert_eq!(cs.ambient_temperature, Some(21.3));
    assert_eq!(cs.lock_active, Some(LockState::ChildLock));
    assert_eq!(cs.operating_mode, Some(OperationMode::Independent));
}

#[tokio::test]
async fn set_temperature_read_uses_mode_query_param() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/set-temperature"))
        .and(query_param("mode", "comfort"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "value": 23.0
        })))
        .mount(&server)
        .await;

    let reading = client
        .set_temperature_for(TemperatureMode::Comfort, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(reading.value, Some(23.0));
}

#[tokio::test]
async fn unknown_enum_string_degrades_to_unrecognized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/display-unit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "value": "kelvin"
        })))
        .mount(&server)
        .await;

    let reading = client.display_unit(TIMEOUT).await.unwrap();
    assert_eq!(reading.value, Some(DisplayUnit::Unrecognized));
}

// ── Envelope contract ───────────────────────────────────────────────

#[tokio::test]
async fn http_200_with_non_ok_envelope_is_a_communication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "request_failed"
        })))
        .mount(&server)
        .await;

    let err = client.device_status(TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::Communication { .. }));
    assert!(err.message().contains("could not execute"));
}

#[tokio::test]
async fn missing_envelope_status_is_a_communication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "heater"
        })))
        .mount(&server)
        .await;

    let err = client.device_status(TIMEOUT).await.unwrap_err();
    assert_eq!(err.message(), "No response status");
}

#[tokio::test]
async fn empty_body_is_a_communication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let err = client.device_status(TIMEOUT).await.unwrap_err();
    assert_eq!(err.message(), "No response status");
}

#[tokio::test]
async fn malformed_json_is_a_communication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client.device_status(TIMEOUT).await.unwrap_err();
    assert!(err.message().starts_with("JSON parsing failed"));
}

#[tokio::test]
async fn lenient_read_returns_payload_and_envelope_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "response_failed",
            "name": "heater"
        })))
        .mount(&server)
        .await;

    let (status, envelope): (heatlink_api::proto::DeviceStatus, _) =
        client.get_lenient("status", TIMEOUT).await.unwrap();
    assert_eq!(envelope, ResponseStatus::ResponseFailed);
    assert_eq!(status.name.as_deref(), Some("heater"));
}

// ── HTTP status classification ──────────────────────────────────────

#[tokio::test]
async fn http_4xx_is_a_communication_error_with_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.device_status(TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::Communication { .. }));
    assert!(err.message().contains("404"));
}

#[tokio::test]
async fn http_5xx_is_a_communication_error_with_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/control-status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.control_status(TIMEOUT).await.unwrap_err();
    assert!(err.message().contains("503"));
}

#[tokio::test]
async fn slow_response_times_out_as_communication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = client
        .device_status(Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Communication { .. }));
    assert!(err.message().contains("timed out"));
}

// ── Write path ──────────────────────────────────────────────────────

#[tokio::test]
async fn write_posts_typed_body_and_checks_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/pid-parameters"))
        .and(body_json(json!({
            "kp": 70.0,
            "ki": 0.02,
            "kd": 4500.0,
            "kd_filter_n": 60.0,
            "windup_limit_percentage": 95.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set_pid_parameters(
            &SetPidParametersRequest {
                kp: 70.0,
                ki: 0.02,
                kd: 4500.0,
                kd_filter_n: 60.0,
                windup_limit_percentage: 95.0,
            },
            TIMEOUT,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_write_surfaces_envelope_description() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/set-temperature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "parse_failed"
        })))
        .mount(&server)
        .await;

    let err = client
        .set_temperature(TemperatureMode::Independent, 21.0, TIMEOUT)
        .await
        .unwrap_err();
    assert!(err.message().contains("parse"));
}

// ── Authentication header ───────────────────────────────────────────

#[tokio::test]
async fn api_key_travels_in_authentication_header() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = LocalClient::with_client(
        reqwest::Client::new(),
        base_url,
        Some(secrecy::SecretString::from("sekrit-key".to_owned())),
    );

    Mock::given(method("GET"))
        .and(path("/status"))
        .and(header("Authentication", "sekrit-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    client.device_status(TIMEOUT).await.unwrap();
}
