use chrono::Utc;
use tracing::{debug, info};

use crate::db::repositories::profile_repository::ProfileRepository;
use crate::db::repositories::task_repository::{TaskRepository, TaskRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::task::{
    TaskCreateInput, TaskPriority, TaskRecord, TaskStatus, TaskUpdateInput,
};
use crate::services::schedule_utils;

const MAX_TITLE_CHARS: usize = 160;
const MAX_ESTIMATED_MINUTES: i64 = 60 * 24 * 30;

#[derive(Clone)]
pub struct TaskService {
    db: DbPool,
}

impl TaskService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_task(&self, profile_id: &str, input: TaskCreateInput) -> AppResult<TaskRecord> {
        let now = Utc::now().to_rfc3339();
        let mut record = build_record_from_create(profile_id, input)?;
        record.id = uuid::Uuid::new_v4().to_string();
        record.created_at = now.clone();
        record.updated_at = now.clone();
        if record.status.is_completed() {
            record.completed_at = Some(now);
        }

        let row = TaskRow::from_record(&record);
        self.db.with_connection(|conn| {
            ProfileRepository::find_by_id(conn, profile_id)?.ok_or_else(AppError::not_found)?;
            TaskRepository::insert(conn, &row)
        })?;
        info!(target: "app::tasks", profile_id, task_id = %record.id, "task created");
        Ok(record)
    }

    pub fn update_task(
        &self,
        profile_id: &str,
        id: &str,
        update: TaskUpdateInput,
    ) -> AppResult<TaskRecord> {
        let mut existing = self.get_task(profile_id, id)?;
        let now = Utc::now().to_rfc3339();
        apply_update(&mut existing, update, &now)?;
        existing.updated_at = now;

        let row = TaskRow::from_record(&existing);
        self.db
            .with_connection(|conn| TaskRepository::update(conn, &row))?;
        info!(target: "app::tasks", profile_id, task_id = %existing.id, "task updated");
        Ok(existing)
    }

    pub fn delete_task(&self, profile_id: &str, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| TaskRepository::delete(conn, profile_id, id))?;
        info!(target: "app::tasks", profile_id, task_id = %id, "task deleted");
        Ok(())
    }

    pub fn get_task(&self, profile_id: &str, id: &str) -> AppResult<TaskRecord> {
        let row = self
            .db
            .with_connection(|conn| TaskRepository::find_for_profile(conn, profile_id, id))?
            .ok_or_else(AppError::not_found)?;
        let record = row.into_record()?;
        debug!(target: "app::tasks", task_id = %record.id, "task fetched");
        Ok(record)
    }

    pub fn list_tasks(&self, profile_id: &str) -> AppResult<Vec<TaskRecord>> {
        let rows = self
            .db
            .with_connection(|conn| TaskRepository::list_for_profile(conn, profile_id))?;
        let tasks = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;
        debug!(target: "app::tasks", profile_id, count = tasks.len(), "tasks listed");
        Ok(tasks)
    }
}

fn build_record_from_create(profile_id: &str, mut input: TaskCreateInput) -> AppResult<TaskRecord> {
    Ok(TaskRecord {
        id: String::new(),
        profile_id: profile_id.to_string(),
        title: normalize_title(&input.title)?,
        description: normalize_optional_string(input.description.take()),
        status: normalize_status(input.status.take())?,
        priority: normalize_priority(input.priority.take())?,
        due_at: normalize_datetime_opt(input.due_at.take())?,
        completed_at: None,
        estimated_minutes: normalize_estimated_minutes(input.estimated_minutes.take())?,
        subject: normalize_optional_string(input.subject.take()),
        created_at: String::new(),
        updated_at: String::new(),
    })
}

fn apply_update(record: &mut TaskRecord, update: TaskUpdateInput, now: &str) -> AppResult<()> {
    if let Some(title) = update.title {
        record.title = normalize_title(&title)?;
    }

    if let Some(description) = update.description {
        record.description = normalize_optional_string(description);
    }

    if let Some(status) = update.status {
        let status = normalize_status(Some(status))?;
        match (record.status.is_completed(), status.is_completed()) {
            (false, true) => record.completed_at = Some(now.to_string()),
            (true, false) => record.completed_at = None,
            _ => {}
        }
        record.status = status;
    }

    if let Some(priority) = update.priority {
        record.priority = normalize_priority(Some(priority))?;
    }

    if let Some(due_at) = update.due_at {
        record.due_at = normalize_datetime_opt(due_at)?;
    }

    if let Some(estimated_minutes) = update.estimated_minutes {
        record.estimated_minutes = normalize_estimated_minutes(estimated_minutes)?;
    }

    if let Some(subject) = update.subject {
        record.subject = normalize_optional_string(subject);
    }

    Ok(())
}

fn normalize_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_status(status: Option<String>) -> AppResult<TaskStatus> {
    match status {
        Some(value) => TaskStatus::try_from(value.as_str()).map_err(AppError::validation),
        None => Ok(TaskStatus::Todo),
    }
}

fn normalize_priority(priority: Option<String>) -> AppResult<TaskPriority> {
    match priority {
        Some(value) => TaskPriority::try_from(value.as_str()).map_err(AppError::validation),
        None => Ok(TaskPriority::Medium),
    }
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|val| {
        let trimmed = val.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn normalize_datetime_opt(value: Option<String>) -> AppResult<Option<String>> {
    match value {
        Some(value) if !value.trim().is_empty() => {
            let parsed = schedule_utils::parse_datetime(&value)?;
            Ok(Some(schedule_utils::format_datetime(parsed)))
        }
        _ => Ok(None),
    }
}

fn normalize_estimated_minutes(value: Option<i64>) -> AppResult<Option<i64>> {
    if let Some(minutes) = value {
        if minutes <= 0 {
            return Err(AppError::validation("estimated minutes must be greater than zero"));
        }
        if minutes > MAX_ESTIMATED_MINUTES {
            return Err(AppError::validation("estimated minutes must not exceed 30 days"));
        }
        Ok(Some(minutes))
    } else {
        Ok(None)
    }
}
