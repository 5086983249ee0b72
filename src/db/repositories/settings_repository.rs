use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

/// Scheduler keys share this prefix in the key/value table.
pub const SCHEDULER_KEY_PREFIX: &str = "scheduler.";

#[derive(Debug, Clone)]
pub struct AppSettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for AppSettingRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct SettingsRepository;

impl SettingsRepository {
    pub fn get(conn: &Connection, key: &str) -> AppResult<Option<AppSettingRow>> {
        let mut stmt =
            conn.prepare("SELECT key, value, updated_at FROM app_settings WHERE key = ?1")?;

        let row = stmt
            .query_row([key], |row| AppSettingRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn list_with_prefix(conn: &Connection, prefix: &str) -> AppResult<Vec<AppSettingRow>> {
        let mut stmt = conn.prepare(
            "SELECT key, value, updated_at FROM app_settings WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key ASC",
        )?;

        let rows = stmt
            .query_map([prefix], |row| AppSettingRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn upsert(conn: &Connection, key: &str, value: &str, updated_at: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO app_settings (key, value, updated_at)
                VALUES (:key, :value, :updated_at)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
            "#,
            named_params! {":key": key, ":value": value, ":updated_at": updated_at},
        )?;

        Ok(())
    }
}
