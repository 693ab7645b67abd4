//! Callback log entity models.

use serde::Serialize;
use sigrelay_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Which direction a logged callback travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Uplink,
    Downlink,
}

impl CallbackKind {
    /// The value stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackKind::Uplink => "data/uplink",
            CallbackKind::Downlink => "data/downlink",
        }
    }
}

/// A row from the `callbacks` log table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Callback {
    pub id: DbId,
    pub date: Timestamp,
    /// `data/uplink` or `data/downlink`.
    #[serde(rename = "type")]
    pub kind: String,
    pub device: String,
    pub data: Option<String>,
    #[serde(rename = "stationId")]
    pub station_id: Option<String>,
    pub rssi: Option<f64>,
    pub duplicate: Option<bool>,
}

/// Fields for inserting a new callback row; `id` and `date` are generated
/// by the database.
#[derive(Debug, Clone)]
pub struct NewCallback {
    pub kind: CallbackKind,
    pub device: String,
    pub data: Option<String>,
    pub station_id: Option<String>,
    pub rssi: Option<f64>,
    pub duplicate: Option<bool>,
}
