// Hand-crafted async HTTP client for the local device control API.
//
// Wraps `reqwest::Client` with device-specific URL construction, the
// `status` envelope check, and the two-kind error taxonomy. Scheme
// selection is tied to authentication: an API key forces HTTPS, no key
// means plain HTTP.

use std::time::Duration;

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::proto::{
    Ack, CalibrationOffsetReading, CloudCommunicationReading, CommercialLockReading,
    ControlStatus, ControllerKind, ControllerTypeReading, DeviceStatus, DisplayUnit,
    DisplayUnitReading, HysteresisParameters, OilHeaterPowerReading, OpenWindowParameters,
    OperationMode, OperationModeReading, PidParameters, PredictiveHeatingKind,
    PredictiveHeatingReading, RebootRequest, ResponseStatus, SetApiKeyRequest,
    SetCalibrationOffsetRequest, SetCloudCommunicationRequest, SetCommercialLockRequest,
    SetControllerTypeRequest, SetCustomNameRequest, SetDisplayUnitRequest,
    SetHysteresisParametersRequest, SetOilHeaterPowerRequest, SetOpenWindowParametersRequest,
    SetOperationModeRequest, SetPidParametersRequest, SetPredictiveHeatingRequest,
    SetTemperatureReading, SetTemperatureRequest, SetTimezoneOffsetRequest, TemperatureMode,
    TimezoneOffsetReading,
};

/// Header carrying the static API key, when one is configured.
const AUTH_HEADER: &str = "Authentication";

/// Async client for one device's local HTTP API.
///
/// Never retries and never mutates state: classification of failures into
/// [`Error`] is its whole job beyond the request/decode mechanics. The
/// polling engine in `heatlink-core` decides when to call again.
#[derive(Debug)]
pub struct LocalClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl LocalClient {
    /// Build a client for the device at `hostname`.
    ///
    /// `http` is the process-wide client built once via
    /// [`TransportConfig::build_client`](crate::TransportConfig::build_client);
    /// clones share the same connection pool. A present, non-blank API key
    /// switches the scheme to `https` and attaches the `Authentication`
    /// header on every request; without a key the device only serves
    /// plain `http`. A blank hostname or an unparseable URL fails here,
    /// before any network traffic.
    pub fn new(
        hostname: &str,
        api_key: Option<SecretString>,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(Error::configuration("device hostname is not set"));
        }

        let api_key = api_key.filter(|k| !k.expose_secret().trim().is_empty());
        let scheme = if api_key.is_some() { "https" } else { "http" };
        let base_url = Url::parse(&format!("{scheme}://{hostname}/"))?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Wrap an existing `reqwest::Client` (used by tests to point at a
    /// mock server with an explicit base URL).
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// The resolved device base URL (scheme reflects key presence).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::configuration(format!("invalid endpoint path {path:?}: {e}")))
    }

    /// Attach the API key header, marked sensitive so it never shows up
    /// in logs.
    fn authenticated(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let Some(key) = &self.api_key else {
            return Ok(req);
        };
        let mut value = HeaderValue::from_str(key.expose_secret())
            .map_err(|_| Error::configuration("API key contains invalid header characters"))?;
        value.set_sensitive(true);
        Ok(req.header(AUTH_HEADER, value))
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<reqwest::Response, Error> {
        let req = self.authenticated(req)?.timeout(timeout);
        req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::communication(format!(
                    "request timed out after {}s",
                    timeout.as_secs()
                ))
            } else {
                e.into()
            }
        })
    }

    /// Interpret an HTTP response: status class, body decode, envelope.
    ///
    /// `strict` is the default for all reads and writes -- a decoded
    /// envelope other than `ok` fails the call. The lenient path exists
    /// as an opt-out seam and additionally hands back the raw envelope
    /// status.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        strict: bool,
    ) -> Result<(T, ResponseStatus), Error> {
        let http_status = resp.status();
        if !http_status.is_success() {
            let reason = http_status.canonical_reason().unwrap_or("unknown");
            return Err(Error::communication(format!(
                "HTTP {}: {reason}",
                http_status.as_u16()
            )));
        }

        let body = resp.text().await?;
        trace!(body = %body, "response body");
        if body.trim().is_empty() {
            return Err(Error::communication("No response status"));
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| Error::communication(format!("JSON parsing failed: {e}")))?;

        let status = value
            .get("status")
            .map(|s| {
                serde_json::from_value::<ResponseStatus>(s.clone())
                    .unwrap_or(ResponseStatus::Unrecognized)
            })
            .ok_or_else(|| Error::communication("No response status"))?;

        if strict && status != ResponseStatus::Ok {
            return Err(Error::communication(status.description()));
        }

        let decoded = T::deserialize(value)
            .map_err(|e| Error::communication(format!("JSON parsing failed: {e}")))?;
        Ok((decoded, status))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, timeout: Duration) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let resp = self.send(self.http.get(url), timeout).await?;
        self.handle_response(resp, true).await.map(|(t, _)| t)
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!(%url, ?params, "GET");
        let resp = self
            .send(self.http.get(url).query(params), timeout)
            .await?;
        self.handle_response(resp, true).await.map(|(t, _)| t)
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let resp = self.send(self.http.post(url).json(body), timeout).await?;
        self.handle_response(resp, true).await.map(|(t, _)| t)
    }

    /// Lenient read: decodes the payload even when the envelope status is
    /// not `ok`, returning the status alongside. No default operation
    /// uses this -- it is the documented opt-out for callers that
    /// intentionally tolerate non-OK envelopes.
    pub async fn get_lenient<T: DeserializeOwned>(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<(T, ResponseStatus), Error> {
        let url = self.url(path)?;
        debug!(%url, "GET (lenient)");
        let resp = self.send(self.http.get(url), timeout).await?;
        self.handle_response(resp, false).await
    }

    /// Lenient write counterpart of [`get_lenient`](Self::get_lenient).
    pub async fn post_lenient<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<(T, ResponseStatus), Error> {
        let url = self.url(path)?;
        debug!(%url, "POST (lenient)");
        let resp = self.send(self.http.post(url).json(body), timeout).await?;
        self.handle_response(resp, false).await
    }

    // ── Read endpoints ───────────────────────────────────────────────

    /// `GET /status` -- identity, firmware version, operation key.
    pub async fn device_status(&self, timeout: Duration) -> Result<DeviceStatus, Error> {
        self.get("status", timeout).await
    }

    /// `GET /control-status` -- the fast-changing regulation values.
    pub async fn control_status(&self, timeout: Duration) -> Result<ControlStatus, Error> {
        self.get("control-status", timeout).await
    }

    pub async fn operation_mode(&self, timeout: Duration) -> Result<OperationModeReading, Error> {
        self.get("operation-mode", timeout).await
    }

    /// `GET /set-temperature?mode=…` -- one set-point slot.
    pub async fn set_temperature_for(
        &self,
        mode: TemperatureMode,
        timeout: Duration,
    ) -> Result<SetTemperatureReading, Error> {
        self.get_with_params("set-temperature", &[("mode", mode.to_string())], timeout)
            .await
    }

    pub async fn calibration_offset(
        &self,
        timeout: Duration,
    ) -> Result<CalibrationOffsetReading, Error> {
        self.get("temperature-calibration-offset", timeout).await
    }

    pub async fn display_unit(&self, timeout: Duration) -> Result<DisplayUnitReading, Error> {
        self.get("display-unit", timeout).await
    }

    pub async fn controller_type(
        &self,
        timeout: Duration,
    ) -> Result<ControllerTypeReading, Error> {
        self.get("controller-type", timeout).await
    }

    pub async fn predictive_heating_type(
        &self,
        timeout: Duration,
    ) -> Result<PredictiveHeatingReading, Error> {
        self.get("predictive-heating-type", timeout).await
    }

    pub async fn timezone_offset(
        &self,
        timeout: Duration,
    ) -> Result<TimezoneOffsetReading, Error> {
        self.get("timezone-offset", timeout).await
    }

    pub async fn pid_parameters(&self, timeout: Duration) -> Result<PidParameters, Error> {
        self.get("pid-parameters", timeout).await
    }

    pub async fn cloud_communication(
        &self,
        timeout: Duration,
    ) -> Result<CloudCommunicationReading, Error> {
        self.get("cloud-communication", timeout).await
    }

    pub async fn hysteresis_parameters(
        &self,
        timeout: Duration,
    ) -> Result<HysteresisParameters, Error> {
        self.get("hysteresis-parameters", timeout).await
    }

    pub async fn commercial_lock(
        &self,
        timeout: Duration,
    ) -> Result<CommercialLockReading, Error> {
        self.get("commercial-lock", timeout).await
    }

    /// `GET /commercial-lock-customization`.
    ///
    /// Known firmware defect: the device answers this with a truncated
    /// body on several firmware lines, so no default poll sequence calls
    /// it. It stays available here as the extension point for firmwares
    /// that fix it; the plain [`commercial_lock`](Self::commercial_lock)
    /// read is the supported substitute.
    pub async fn commercial_lock_customization(
        &self,
        timeout: Duration,
    ) -> Result<CommercialLockReading, Error> {
        self.get("commercial-lock-customization", timeout).await
    }

    pub async fn open_window_parameters(
        &self,
        timeout: Duration,
    ) -> Result<OpenWindowParameters, Error> {
        self.get("open-window", timeout).await
    }

    pub async fn oil_heater_power(
        &self,
        timeout: Duration,
    ) -> Result<OilHeaterPowerReading, Error> {
        self.get("oil-heater-power", timeout).await
    }

    // ── Write endpoints ──────────────────────────────────────────────

    pub async fn set_operation_mode(
        &self,
        mode: OperationMode,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post("operation-mode", &SetOperationModeRequest { mode }, timeout)
            .await
    }

    pub async fn set_temperature(
        &self,
        mode: TemperatureMode,
        value: f64,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post(
            "set-temperature",
            &SetTemperatureRequest { mode, value },
            timeout,
        )
        .await
    }

    pub async fn set_calibration_offset(
        &self,
        value: f64,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post(
            "temperature-calibration-offset",
            &SetCalibrationOffsetRequest { value },
            timeout,
        )
        .await
    }

    pub async fn set_display_unit(
        &self,
        value: DisplayUnit,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post("display-unit", &SetDisplayUnitRequest { value }, timeout)
            .await
    }

    pub async fn set_controller_type(
        &self,
        controller_type: ControllerKind,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post(
            "controller-type",
            &SetControllerTypeRequest { controller_type },
            timeout,
        )
        .await
    }

    pub async fn set_predictive_heating_type(
        &self,
        predictive_heating_type: PredictiveHeatingKind,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post(
            "predictive-heating-type",
            &SetPredictiveHeatingRequest {
                predictive_heating_type,
            },
            timeout,
        )
        .await
    }

    pub async fn set_timezone_offset(
        &self,
        timezone_offset: i32,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post(
            "timezone-offset",
            &SetTimezoneOffsetRequest { timezone_offset },
            timeout,
        )
        .await
    }

    pub async fn set_pid_parameters(
        &self,
        req: &SetPidParametersRequest,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post("pid-parameters", req, timeout).await
    }

    pub async fn set_cloud_communication(
        &self,
        value: bool,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post(
            "cloud-communication",
            &SetCloudCommunicationRequest { value },
            timeout,
        )
        .await
    }

    pub async fn set_hysteresis_parameters(
        &self,
        req: &SetHysteresisParametersRequest,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post("hysteresis-parameters", req, timeout).await
    }

    pub async fn set_commercial_lock(&self, value: bool, timeout: Duration) -> Result<Ack, Error> {
        self.post(
            "commercial-lock",
            &SetCommercialLockRequest { value },
            timeout,
        )
        .await
    }

    pub async fn set_open_window_parameters(
        &self,
        req: &SetOpenWindowParametersRequest,
        timeout: Duration,
    ) -> Result<Ack, Error> {
        self.post("open-window", req, timeout).await
    }

    pub async fn set_custom_name(&self, name: &str, timeout: Duration) -> Result<Ack, Error> {
        self.post(
            "set-custom-name",
            &SetCustomNameRequest {
                device_name: name.to_owned(),
            },
            timeout,
        )
        .await
    }

    pub async fn set_oil_heater_power(&self, value: f64, timeout: Duration) -> Result<Ack, Error> {
        self.post(
            "oil-heater-power",
            &SetOilHeaterPowerRequest { value },
            timeout,
        )
        .await
    }

    /// `POST /reboot`. The device drops the connection while restarting,
    /// so callers should treat a timeout here as expected.
    pub async fn reboot(&self, timeout: Duration) -> Result<Ack, Error> {
        self.post("reboot", &RebootRequest {}, timeout).await
    }

    /// `POST /set-api-key`. The device reboots and re-handshakes after
    /// accepting a new key, hence the caller passes a write timeout long
    /// enough to cover that cycle.
    pub async fn set_api_key(&self, key: &SecretString, timeout: Duration) -> Result<Ack, Error> {
        self.post(
            "set-api-key",
            &SetApiKeyRequest {
                api_key: key.expose_secret().to_owned(),
            },
            timeout,
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::TransportConfig;

    fn http() -> reqwest::Client {
        TransportConfig::default().build_client().expect("transport")
    }

    #[test]
    fn blank_hostname_is_a_configuration_error() {
        let err = LocalClient::new("   ", None, http()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn scheme_follows_api_key_presence() {
        // One shared pool serves both clients.
        let http = http();
        let plain = LocalClient::new("192.168.1.50", None, http.clone()).expect("client");
        assert_eq!(plain.base_url().scheme(), "http");

        let keyed = LocalClient::new(
            "192.168.1.50",
            Some(SecretString::from("super-secret".to_owned())),
            http,
        )
        .expect("client");
        assert_eq!(keyed.base_url().scheme(), "https");
    }

    #[test]
    fn blank_api_key_counts_as_absent() {
        let client = LocalClient::new(
            "192.168.1.50",
            Some(SecretString::from("  ".to_owned())),
            http(),
        )
        .expect("client");
        assert_eq!(client.base_url().scheme(), "http");
    }

    #[test]
    fn invalid_hostname_is_a_configuration_error() {
        let err = LocalClient::new("not a host name", None, http()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
