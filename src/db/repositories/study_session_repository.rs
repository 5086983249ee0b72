use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::study_session::{SessionType, StudySessionRecord};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        task_id,
        profile_id,
        started_at,
        completed_at,
        planned_minutes,
        actual_minutes,
        productivity_rating,
        session_type,
        created_at
    FROM study_sessions
"#;

#[derive(Debug, Clone)]
pub struct StudySessionRow {
    pub id: String,
    pub task_id: String,
    pub profile_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub planned_minutes: i64,
    pub actual_minutes: Option<i64>,
    pub productivity_rating: Option<f64>,
    pub session_type: String,
    pub created_at: String,
}

impl StudySessionRow {
    pub fn from_record(record: &StudySessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            task_id: record.task_id.clone(),
            profile_id: record.profile_id.clone(),
            started_at: record.started_at.clone(),
            completed_at: record.completed_at.clone(),
            planned_minutes: record.planned_minutes,
            actual_minutes: record.actual_minutes,
            productivity_rating: record.productivity_rating,
            session_type: record.session_type.as_str().to_string(),
            created_at: record.created_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<StudySessionRecord> {
        let session_type =
            SessionType::try_from(self.session_type.as_str()).map_err(AppError::database)?;

        Ok(StudySessionRecord {
            id: self.id,
            task_id: self.task_id,
            profile_id: self.profile_id,
            started_at: self.started_at,
            completed_at: self.completed_at,
            planned_minutes: self.planned_minutes,
            actual_minutes: self.actual_minutes,
            productivity_rating: self.productivity_rating,
            session_type,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<&Row<'_>> for StudySessionRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            task_id: row.get("task_id")?,
            profile_id: row.get("profile_id")?,
            started_at: row.get("started_at")?,
            completed_at: row.get("completed_at")?,
            planned_minutes: row.get("planned_minutes")?,
            actual_minutes: row.get("actual_minutes")?,
            productivity_rating: row.get("productivity_rating")?,
            session_type: row.get("session_type")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct StudySessionRepository;

impl StudySessionRepository {
    pub fn insert(conn: &Connection, row: &StudySessionRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO study_sessions (
                    id,
                    task_id,
                    profile_id,
                    started_at,
                    completed_at,
                    planned_minutes,
                    actual_minutes,
                    productivity_rating,
                    session_type,
                    created_at
                ) VALUES (
                    :id,
                    :task_id,
                    :profile_id,
                    :started_at,
                    :completed_at,
                    :planned_minutes,
                    :actual_minutes,
                    :productivity_rating,
                    :session_type,
                    :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":task_id": &row.task_id,
                ":profile_id": &row.profile_id,
                ":started_at": &row.started_at,
                ":completed_at": &row.completed_at,
                ":planned_minutes": row.planned_minutes,
                ":actual_minutes": &row.actual_minutes,
                ":productivity_rating": &row.productivity_rating,
                ":session_type": &row.session_type,
                ":created_at": &row.created_at,
            },
        )?;
        Ok(())
    }

    pub fn update_completion(conn: &Connection, row: &StudySessionRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE study_sessions SET
                    completed_at = :completed_at,
                    actual_minutes = :actual_minutes,
                    productivity_rating = :productivity_rating
                WHERE id = :id AND profile_id = :profile_id
            "#,
            named_params! {
                ":id": &row.id,
                ":profile_id": &row.profile_id,
                ":completed_at": &row.completed_at,
                ":actual_minutes": &row.actual_minutes,
                ":productivity_rating": &row.productivity_rating,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_for_profile(
        conn: &Connection,
        profile_id: &str,
        id: &str,
    ) -> AppResult<Option<StudySessionRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE id = ?1 AND profile_id = ?2",
            BASE_SELECT
        ))?;
        let row = stmt
            .query_row([id, profile_id], |row| StudySessionRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Newest sessions first, capped at `limit`. Ordering is by stored text,
    /// which matches chronological order for timestamps written in UTC.
    pub fn list_recent(
        conn: &Connection,
        profile_id: &str,
        limit: usize,
    ) -> AppResult<Vec<StudySessionRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE profile_id = :profile_id ORDER BY started_at DESC, id ASC LIMIT :limit",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map(
                named_params! {":profile_id": profile_id, ":limit": limit as i64},
                |row| StudySessionRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
