use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use crate::db::repositories::study_session_repository::{
    StudySessionRepository, StudySessionRow,
};
use crate::db::repositories::task_repository::TaskRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::study_session::{
    SessionCompleteInput, SessionStartInput, SessionType, StudySessionRecord,
};
use crate::services::schedule_utils;

const MIN_RATING: f64 = 1.0;
const MAX_RATING: f64 = 5.0;

#[derive(Clone)]
pub struct StudySessionService {
    db: DbPool,
}

impl StudySessionService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn start_session(
        &self,
        profile_id: &str,
        input: SessionStartInput,
    ) -> AppResult<StudySessionRecord> {
        if input.planned_minutes <= 0 {
            return Err(AppError::validation("planned minutes must be greater than zero"));
        }

        let started_at = match input.started_at.as_deref() {
            Some(raw) => schedule_utils::parse_datetime(raw)?,
            None => schedule_utils::now_fixed(),
        };
        let session_type = match input.session_type.as_deref() {
            Some(raw) => SessionType::try_from(raw).map_err(AppError::validation)?,
            None => SessionType::Pomodoro,
        };

        let record = StudySessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: input.task_id.clone(),
            profile_id: profile_id.to_string(),
            // stored in UTC so text ordering is chronological
            started_at: to_utc_string(started_at),
            completed_at: None,
            planned_minutes: input.planned_minutes,
            actual_minutes: None,
            productivity_rating: None,
            session_type,
            created_at: Utc::now().to_rfc3339(),
        };

        let row = StudySessionRow::from_record(&record);
        self.db.with_connection(|conn| {
            TaskRepository::find_for_profile(conn, profile_id, &input.task_id)?
                .ok_or_else(AppError::not_found)?;
            StudySessionRepository::insert(conn, &row)
        })?;

        info!(
            target: "app::sessions",
            profile_id,
            task_id = %record.task_id,
            session_id = %record.id,
            "study session started"
        );
        Ok(record)
    }

    /// Closes a session. `actual_minutes` falls back to the elapsed wall time.
    pub fn complete_session(
        &self,
        profile_id: &str,
        session_id: &str,
        input: SessionCompleteInput,
    ) -> AppResult<StudySessionRecord> {
        if let Some(rating) = input.productivity_rating {
            if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(AppError::validation_with_details(
                    "productivity rating must be between 1 and 5",
                    json!({ "value": rating }),
                ));
            }
        }

        let mut record = self
            .db
            .with_connection(|conn| {
                StudySessionRepository::find_for_profile(conn, profile_id, session_id)
            })?
            .ok_or_else(AppError::not_found)?
            .into_record()?;

        if record.completed_at.is_some() {
            return Err(AppError::conflict(format!(
                "study session {session_id} is already completed"
            )));
        }

        let started_at = schedule_utils::parse_datetime(&record.started_at)?;
        let completed_at = match input.completed_at.as_deref() {
            Some(raw) => schedule_utils::parse_datetime(raw)?,
            None => schedule_utils::now_fixed(),
        };
        let elapsed = schedule_utils::duration_minutes(started_at, completed_at)?;

        let actual_minutes = match input.actual_minutes {
            Some(minutes) if minutes < 0 => {
                return Err(AppError::validation("actual minutes must not be negative"));
            }
            Some(minutes) => minutes,
            None => elapsed,
        };

        record.completed_at = Some(to_utc_string(completed_at));
        record.actual_minutes = Some(actual_minutes);
        record.productivity_rating = input.productivity_rating;

        let row = StudySessionRow::from_record(&record);
        self.db
            .with_connection(|conn| StudySessionRepository::update_completion(conn, &row))?;

        info!(
            target: "app::sessions",
            profile_id,
            session_id,
            actual_minutes,
            rating = ?record.productivity_rating,
            "study session completed"
        );
        Ok(record)
    }

    pub fn list_recent(&self, profile_id: &str, limit: usize) -> AppResult<Vec<StudySessionRecord>> {
        let rows = self
            .db
            .with_connection(|conn| StudySessionRepository::list_recent(conn, profile_id, limit))?;
        let sessions = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;
        debug!(target: "app::sessions", profile_id, count = sessions.len(), "sessions listed");
        Ok(sessions)
    }
}

fn to_utc_string(dt: chrono::DateTime<chrono::FixedOffset>) -> String {
    dt.with_timezone(&Utc).to_rfc3339()
}
