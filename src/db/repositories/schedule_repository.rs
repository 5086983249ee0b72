use std::convert::TryFrom;

use chrono::{DateTime, FixedOffset};
use rusqlite::{named_params, Connection, Row};

use crate::error::{AppError, AppResult};
use crate::models::schedule::{ScheduleRecord, ScheduleType};

const BASE_SELECT: &str = r#"
    SELECT
        s.id,
        s.task_id,
        s.profile_id,
        s.start_at,
        s.end_at,
        s.confidence,
        s.schedule_type,
        s.conflicts,
        s.recommendations,
        s.created_at,
        t.title AS task_title
    FROM schedules s
    JOIN tasks t ON t.id = s.task_id
"#;

#[derive(Debug, Clone)]
pub struct ScheduleRow {
    pub id: String,
    pub task_id: String,
    pub profile_id: String,
    pub start_at: String,
    pub end_at: String,
    pub confidence: f64,
    pub schedule_type: String,
    pub conflicts: Option<String>,
    pub recommendations: Option<String>,
    pub created_at: String,
}

impl ScheduleRow {
    pub fn from_record(record: &ScheduleRecord) -> AppResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            task_id: record.task_id.clone(),
            profile_id: record.profile_id.clone(),
            start_at: record.start_at.clone(),
            end_at: record.end_at.clone(),
            confidence: record.confidence,
            schedule_type: record.schedule_type.as_str().to_string(),
            conflicts: serialize_vec(&record.conflicts)?,
            recommendations: serialize_vec(&record.recommendations)?,
            created_at: record.created_at.clone(),
        })
    }

    pub fn into_record(self) -> AppResult<ScheduleRecord> {
        let schedule_type =
            ScheduleType::try_from(self.schedule_type.as_str()).map_err(AppError::database)?;

        Ok(ScheduleRecord {
            id: self.id,
            task_id: self.task_id,
            profile_id: self.profile_id,
            start_at: self.start_at,
            end_at: self.end_at,
            confidence: self.confidence,
            schedule_type,
            conflicts: deserialize_vec(self.conflicts)?,
            recommendations: deserialize_vec(self.recommendations)?,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<&Row<'_>> for ScheduleRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            task_id: row.get("task_id")?,
            profile_id: row.get("profile_id")?,
            start_at: row.get("start_at")?,
            end_at: row.get("end_at")?,
            confidence: row.get("confidence")?,
            schedule_type: row.get("schedule_type")?,
            conflicts: row.get("conflicts")?,
            recommendations: row.get("recommendations")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// A schedule row together with the title of the task it books.
#[derive(Debug, Clone)]
pub struct LabelledScheduleRow {
    pub schedule: ScheduleRow,
    pub task_title: String,
}

impl TryFrom<&Row<'_>> for LabelledScheduleRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            schedule: ScheduleRow::try_from(row)?,
            task_title: row.get("task_title")?,
        })
    }
}

pub struct ScheduleRepository;

impl ScheduleRepository {
    pub fn insert(conn: &Connection, row: &ScheduleRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO schedules (
                    id,
                    task_id,
                    profile_id,
                    start_at,
                    end_at,
                    confidence,
                    schedule_type,
                    conflicts,
                    recommendations,
                    created_at
                ) VALUES (
                    :id,
                    :task_id,
                    :profile_id,
                    :start_at,
                    :end_at,
                    :confidence,
                    :schedule_type,
                    :conflicts,
                    :recommendations,
                    :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":task_id": &row.task_id,
                ":profile_id": &row.profile_id,
                ":start_at": &row.start_at,
                ":end_at": &row.end_at,
                ":confidence": row.confidence,
                ":schedule_type": &row.schedule_type,
                ":conflicts": &row.conflicts,
                ":recommendations": &row.recommendations,
                ":created_at": &row.created_at,
            },
        )?;
        Ok(())
    }

    /// Schedules of the profile starting at or after `from`, with their task
    /// titles, earliest first. Offsets may differ between rows, so both the cut
    /// and the ordering use parsed instants rather than the stored text.
    pub fn list_for_profile_from(
        conn: &Connection,
        profile_id: &str,
        from: DateTime<FixedOffset>,
    ) -> AppResult<Vec<LabelledScheduleRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE s.profile_id = ?1 ORDER BY s.start_at ASC",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map([profile_id], |row| LabelledScheduleRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut upcoming = Vec::with_capacity(rows.len());
        for row in rows {
            let start = DateTime::parse_from_rfc3339(&row.schedule.start_at).map_err(|err| {
                AppError::database(format!(
                    "stored schedule {} has invalid start: {err}",
                    row.schedule.id
                ))
            })?;
            if start >= from {
                upcoming.push((start, row));
            }
        }
        upcoming.sort_by_key(|(start, _)| *start);
        Ok(upcoming.into_iter().map(|(_, row)| row).collect())
    }

    pub fn list_for_task(
        conn: &Connection,
        profile_id: &str,
        task_id: &str,
    ) -> AppResult<Vec<ScheduleRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE s.profile_id = ?1 AND s.task_id = ?2 ORDER BY s.created_at ASC, s.id ASC",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map([profile_id, task_id], |row| ScheduleRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn serialize_vec(values: &[String]) -> AppResult<Option<String>> {
    if values.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(values)?))
    }
}

fn deserialize_vec(raw: Option<String>) -> AppResult<Vec<String>> {
    match raw {
        Some(value) if !value.is_empty() => Ok(serde_json::from_str(&value)?),
        _ => Ok(Vec::new()),
    }
}
