use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::task::{TaskPriority, TaskRecord, TaskStatus};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        profile_id,
        title,
        description,
        status,
        priority,
        due_at,
        completed_at,
        estimated_minutes,
        subject,
        created_at,
        updated_at
    FROM tasks
"#;

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub profile_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_at: Option<String>,
    pub completed_at: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub subject: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRow {
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            id: record.id.clone(),
            profile_id: record.profile_id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            status: record.status.as_str().to_string(),
            priority: record.priority.as_str().to_string(),
            due_at: record.due_at.clone(),
            completed_at: record.completed_at.clone(),
            estimated_minutes: record.estimated_minutes,
            subject: record.subject.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<TaskRecord> {
        let status = TaskStatus::try_from(self.status.as_str()).map_err(AppError::database)?;
        let priority =
            TaskPriority::try_from(self.priority.as_str()).map_err(AppError::database)?;

        Ok(TaskRecord {
            id: self.id,
            profile_id: self.profile_id,
            title: self.title,
            description: self.description,
            status,
            priority,
            due_at: self.due_at,
            completed_at: self.completed_at,
            estimated_minutes: self.estimated_minutes,
            subject: self.subject,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for TaskRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(TaskRow {
            id: row.get("id")?,
            profile_id: row.get("profile_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            due_at: row.get("due_at")?,
            completed_at: row.get("completed_at")?,
            estimated_minutes: row.get("estimated_minutes")?,
            subject: row.get("subject")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct TaskRepository;

impl TaskRepository {
    pub fn insert(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO tasks (
                    id,
                    profile_id,
                    title,
                    description,
                    status,
                    priority,
                    due_at,
                    completed_at,
                    estimated_minutes,
                    subject,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :profile_id,
                    :title,
                    :description,
                    :status,
                    :priority,
                    :due_at,
                    :completed_at,
                    :estimated_minutes,
                    :subject,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":profile_id": &row.profile_id,
                ":title": &row.title,
                ":description": &row.description,
                ":status": &row.status,
                ":priority": &row.priority,
                ":due_at": &row.due_at,
                ":completed_at": &row.completed_at,
                ":estimated_minutes": &row.estimated_minutes,
                ":subject": &row.subject,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE tasks SET
                    title = :title,
                    description = :description,
                    status = :status,
                    priority = :priority,
                    due_at = :due_at,
                    completed_at = :completed_at,
                    estimated_minutes = :estimated_minutes,
                    subject = :subject,
                    updated_at = :updated_at
                WHERE id = :id AND profile_id = :profile_id
            "#,
            named_params! {
                ":id": &row.id,
                ":profile_id": &row.profile_id,
                ":title": &row.title,
                ":description": &row.description,
                ":status": &row.status,
                ":priority": &row.priority,
                ":due_at": &row.due_at,
                ":completed_at": &row.completed_at,
                ":estimated_minutes": &row.estimated_minutes,
                ":subject": &row.subject,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, profile_id: &str, id: &str) -> AppResult<()> {
        let affected = conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND profile_id = ?2",
            [id, profile_id],
        )?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    /// Looks a task up only within the given profile, so foreign ids read as absent.
    pub fn find_for_profile(
        conn: &Connection,
        profile_id: &str,
        id: &str,
    ) -> AppResult<Option<TaskRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE id = ?1 AND profile_id = ?2",
            BASE_SELECT
        ))?;
        let row = stmt
            .query_row([id, profile_id], |row| TaskRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list_for_profile(conn: &Connection, profile_id: &str) -> AppResult<Vec<TaskRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE profile_id = ?1 ORDER BY created_at DESC, id ASC",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map([profile_id], |row| TaskRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
