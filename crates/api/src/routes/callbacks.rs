//! Webhook handlers for the device network's callbacks.
//!
//! The network POSTs one JSON body per device message. Uplinks are logged
//! and their sensor reading (when present) is decoded and forwarded to the
//! telemetry API without blocking the response. Downlinks are logged and
//! answered with the 8-byte payload the device should receive, keyed by the
//! originating device id as the network requires.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sigrelay_core::codec::{decode_reading, encode_downlink};
use sigrelay_db::models::callback::{CallbackKind, NewCallback};
use sigrelay_db::repositories::CallbackRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::telemetry;

/// How many rows the callback listing returns.
const LIST_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Payload / response types
// ---------------------------------------------------------------------------

/// An inbound callback body from the device network.
///
/// `device`, `station` and `rssi` are always sent; the rest depend on the
/// callback type and device firmware. `rssi` arrives as a JSON number and
/// may be fractional.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackPayload {
    /// Device identifier (hex string assigned by the network).
    pub device: String,
    /// Receiving base station id, a hex string.
    pub station: String,
    /// Received signal strength at that station, in dBm.
    pub rssi: f64,
    /// Raw data frame as sent by the device.
    pub data: Option<String>,
    /// Whether the network flagged this message as a duplicate reception.
    pub duplicate: Option<bool>,
    /// Raw hex sensor reading (uplinks only).
    pub reading: Option<String>,
    /// Signal-to-noise ratio of this reception.
    pub snr: Option<f64>,
    /// Average signal-to-noise ratio across receptions.
    #[serde(rename = "avgSnr")]
    pub avg_snr: Option<f64>,
}

impl CallbackPayload {
    fn to_new_callback(&self, kind: CallbackKind) -> NewCallback {
        NewCallback {
            kind,
            device: self.device.clone(),
            data: self.data.clone(),
            station_id: Some(self.station.clone()),
            rssi: Some(self.rssi),
            duplicate: self.duplicate,
        }
    }
}

/// The per-device value in a downlink response.
#[derive(Debug, Serialize)]
pub struct DownlinkData {
    /// 16 lowercase hex characters: the 8-byte payload for the device.
    #[serde(rename = "downlinkData")]
    pub downlink_data: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /callbacks -- recent callback log, newest first.
async fn list_callbacks(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let callbacks = CallbackRepo::list_recent(&state.pool, LIST_LIMIT).await?;
    Ok(Json(DataResponse { data: callbacks }))
}

/// POST /uplink -- log the callback and forward the decoded reading.
///
/// Always answers `200 Callback received`: the network treats any other
/// status as a delivery failure and retries, and neither a failed insert
/// nor a failed telemetry write should trigger that. Both are logged.
async fn uplink_callback(
    State(state): State<AppState>,
    Json(payload): Json<CallbackPayload>,
) -> impl IntoResponse {
    match CallbackRepo::insert(&state.pool, &payload.to_new_callback(CallbackKind::Uplink)).await {
        Ok(id) => tracing::info!(id, device = %payload.device, "New uplink callback record"),
        Err(e) => tracing::error!(device = %payload.device, error = %e, "Uplink insert failed"),
    }

    forward_reading(&state, &payload);

    (StatusCode::OK, "Callback received")
}

/// Decode the uplink's reading and dispatch the telemetry write.
///
/// Runs entirely off the response path: a missing or undecodable reading
/// and an unconfigured endpoint are logged, never surfaced to the network.
fn forward_reading(state: &AppState, payload: &CallbackPayload) {
    let Some(raw) = payload.reading.as_deref() else {
        tracing::warn!(device = %payload.device, "Uplink without reading, nothing to forward");
        return;
    };

    let reading = match decode_reading(raw) {
        Ok(reading) => reading,
        Err(e) => {
            tracing::warn!(device = %payload.device, error = %e, "Reading could not be decoded");
            return;
        }
    };

    match &state.telemetry {
        Some(client) => telemetry::spawn_forward(client.clone(), payload.clone(), reading),
        None => tracing::warn!("ENDPOINT not configured, dropping decoded reading"),
    }
}

/// POST /downlink -- log the callback and answer with the device's payload.
///
/// The freshly generated row id becomes the record id inside the payload,
/// so every downlink a device receives names the log entry that produced it.
async fn downlink_callback(
    State(state): State<AppState>,
    Json(payload): Json<CallbackPayload>,
) -> AppResult<Json<HashMap<String, DownlinkData>>> {
    let id =
        CallbackRepo::insert(&state.pool, &payload.to_new_callback(CallbackKind::Downlink)).await?;
    tracing::info!(id, device = %payload.device, "New downlink callback record");

    // Truncation toward zero matches the network's own integer coercion
    // of fractional RSSI values.
    let downlink_data = encode_downlink(id, &payload.station, payload.rssi as i32)?;

    let mut body = HashMap::with_capacity(1);
    body.insert(payload.device, DownlinkData { downlink_data });
    Ok(Json(body))
}

/// Mount the callback routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/callbacks", get(list_callbacks))
        .route("/uplink", post(uplink_callback))
        .route("/downlink", post(downlink_callback))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_deserializes_with_optional_fields_absent() {
        let payload: CallbackPayload = serde_json::from_str(
            r#"{"device": "12AB34", "station": "0a0b", "rssi": -122.5}"#,
        )
        .unwrap();
        assert_eq!(payload.device, "12AB34");
        assert_eq!(payload.station, "0a0b");
        assert_eq!(payload.rssi, -122.5);
        assert!(payload.reading.is_none());
        assert!(payload.avg_snr.is_none());
    }

    #[test]
    fn payload_missing_required_field_is_rejected() {
        let result: Result<CallbackPayload, _> =
            serde_json::from_str(r#"{"device": "12AB34", "rssi": -122.5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn payload_deserializes_avg_snr_by_wire_name() {
        let payload: CallbackPayload = serde_json::from_str(
            r#"{"device": "1", "station": "2", "rssi": -1, "snr": 9.3, "avgSnr": 8.7}"#,
        )
        .unwrap();
        assert_eq!(payload.avg_snr, Some(8.7));
    }

    #[test]
    fn downlink_response_is_keyed_by_device() {
        let mut body = HashMap::new();
        body.insert(
            "12AB34".to_string(),
            DownlinkData {
                downlink_data: "00010a0b0c0dffff".to_string(),
            },
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["12AB34"]["downlinkData"], "00010a0b0c0dffff");
    }

    #[test]
    fn new_callback_carries_payload_fields() {
        let payload: CallbackPayload = serde_json::from_str(
            r#"{"device": "d1", "station": "1f", "rssi": -100, "data": "000fa0000", "duplicate": true}"#,
        )
        .unwrap();
        let new = payload.to_new_callback(CallbackKind::Uplink);
        assert_eq!(new.kind, CallbackKind::Uplink);
        assert_eq!(new.station_id.as_deref(), Some("1f"));
        assert_eq!(new.rssi, Some(-100.0));
        assert_eq!(new.duplicate, Some(true));
    }
}
