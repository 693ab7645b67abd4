//! Downstream telemetry forwarding.
//!
//! [`TelemetryClient`] sends a decoded uplink reading to the remote
//! telemetry API as a GraphQL `createTelemetry` mutation over HTTP POST.
//! The uplink handler dispatches the call with [`spawn_forward`] so the
//! webhook response never waits on the remote write; the outcome is logged
//! independently. A single attempt is made per uplink, there is no retry.

use std::sync::Arc;
use std::time::Duration;

use sigrelay_core::codec::Reading;

use crate::routes::callbacks::CallbackPayload;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The mutation the telemetry API expects.
const CREATE_TELEMETRY_MUTATION: &str = "\
mutation($data: TelemetryCreateInput!) {
  createTelemetry(data: $data) {
    id
  }
}";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for telemetry delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Telemetry endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// TelemetryClient
// ---------------------------------------------------------------------------

/// Delivers decoded readings to the telemetry API.
pub struct TelemetryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TelemetryClient {
    /// Create a new client for the given endpoint URL.
    pub fn new(endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, endpoint }
    }

    /// POST one `createTelemetry` mutation for the given uplink.
    pub async fn create_telemetry(
        &self,
        payload: &CallbackPayload,
        reading: &Reading,
    ) -> Result<(), TelemetryError> {
        let body = mutation_body(payload, reading);
        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TelemetryError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Build the GraphQL request body for one decoded uplink.
///
/// The measurement fields are strings with exactly two decimal digits;
/// the remaining fields pass through from the webhook payload. Kept as a
/// separate pure function so the wire shape is unit-testable.
pub fn mutation_body(payload: &CallbackPayload, reading: &Reading) -> serde_json::Value {
    serde_json::json!({
        "query": CREATE_TELEMETRY_MUTATION,
        "variables": {
            "data": {
                "rawreading": payload.data,
                "reading": reading.fill_level_display(),
                "batlevel": reading.battery_level_display(),
                "station": payload.station,
                "rssi": payload.rssi,
                "snr": payload.snr,
                "avgSnr": payload.avg_snr,
                "sigfoxid": payload.device,
                "device": {
                    "connect": {
                        "sigfoxid": payload.device,
                    }
                }
            }
        }
    })
}

/// Dispatch a telemetry write as a detached task.
///
/// Returns immediately; success or failure is logged from the task.
pub fn spawn_forward(client: Arc<TelemetryClient>, payload: CallbackPayload, reading: Reading) {
    tokio::spawn(async move {
        match client.create_telemetry(&payload, &reading).await {
            Ok(()) => {
                tracing::info!(device = %payload.device, "Telemetry record created");
            }
            Err(e) => {
                tracing::error!(device = %payload.device, error = %e, "Telemetry forward failed");
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use sigrelay_core::codec::decode_reading;

    use super::*;

    fn payload() -> CallbackPayload {
        CallbackPayload {
            device: "12AB34".to_string(),
            station: "0a0b".to_string(),
            rssi: -122.0,
            data: Some("000fa0000".to_string()),
            duplicate: Some(false),
            reading: Some("000FA0000".to_string()),
            snr: Some(9.3),
            avg_snr: Some(8.7),
        }
    }

    #[test]
    fn mutation_body_carries_fixed_point_strings() {
        let reading = decode_reading("000FA0000").unwrap();
        let body = mutation_body(&payload(), &reading);

        let data = &body["variables"]["data"];
        assert_eq!(data["reading"], "-99.85");
        assert_eq!(data["batlevel"], "6453.60");
        assert_eq!(data["rawreading"], "000fa0000");
        assert_eq!(data["station"], "0a0b");
        assert_eq!(data["rssi"], -122.0);
        assert_eq!(data["sigfoxid"], "12AB34");
        assert_eq!(data["device"]["connect"]["sigfoxid"], "12AB34");
    }

    #[test]
    fn mutation_body_names_the_mutation() {
        let reading = decode_reading("000FA0000").unwrap();
        let body = mutation_body(&payload(), &reading);
        let query = body["query"].as_str().unwrap();
        assert!(query.contains("createTelemetry"));
        assert!(query.contains("TelemetryCreateInput"));
    }
}
