// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level operations on the `key_value` table.

use daybook_core::DaybookError;
use rusqlite::params;
use tracing::warn;

use crate::database::{map_tr_err, Database};
use crate::models::StoredValue;

/// Read every key. Rows that fail to decode are skipped with a warning.
pub async fn load_all(db: &Database) -> Result<Vec<(String, StoredValue)>, DaybookError> {
    let rows = db
        .connection()
        .call(|conn| -> Result<Vec<(String, String, String)>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT key, kind, value FROM key_value")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;

    Ok(rows
        .into_iter()
        .filter_map(|(key, kind, value)| match StoredValue::decode(&kind, value) {
            Some(decoded) => Some((key, decoded)),
            None => {
                warn!(key = %key, kind = %kind, "skipping undecodable key-value row");
                None
            }
        })
        .collect())
}

/// Read a single key straight from disk.
pub async fn get(db: &Database, key: &str) -> Result<Option<StoredValue>, DaybookError> {
    let key = key.to_string();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<(String, String)>, rusqlite::Error> {
            match conn.query_row(
                "SELECT kind, value FROM key_value WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            ) {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    Ok(row.and_then(|(kind, value)| StoredValue::decode(&kind, value)))
}

/// Insert or replace a key.
pub async fn upsert(db: &Database, key: &str, value: &StoredValue) -> Result<(), DaybookError> {
    let key = key.to_string();
    let kind = value.kind();
    let encoded = value.encode();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO key_value (key, kind, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET kind = excluded.kind, value = excluded.value,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![key, kind, encoded],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a key. Deleting a missing key succeeds.
pub async fn delete(db: &Database, key: &str) -> Result<(), DaybookError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute("DELETE FROM key_value WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
