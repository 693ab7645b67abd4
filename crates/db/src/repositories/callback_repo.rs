//! Repository for the `callbacks` log table.

use sigrelay_core::types::DbId;
use sqlx::PgPool;

use crate::models::callback::{Callback, NewCallback};

/// Column list for `callbacks` queries. `type` is aliased because it is a
/// reserved word and the entity struct names the field `kind`.
const CALLBACK_COLUMNS: &str =
    "id, date, type AS kind, device, data, station_id, rssi, duplicate";

/// Provides read/write operations for logged callbacks.
pub struct CallbackRepo;

impl CallbackRepo {
    /// Insert a new callback row, returning the generated ID.
    pub async fn insert(pool: &PgPool, new: &NewCallback) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO callbacks (type, device, data, station_id, rssi, duplicate) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(new.kind.as_str())
        .bind(&new.device)
        .bind(&new.data)
        .bind(&new.station_id)
        .bind(new.rssi)
        .bind(new.duplicate)
        .fetch_one(pool)
        .await
    }

    /// List recent callbacks ordered newest-first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Callback>, sqlx::Error> {
        let query = format!("SELECT {CALLBACK_COLUMNS} FROM callbacks ORDER BY date DESC LIMIT $1");
        sqlx::query_as::<_, Callback>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
