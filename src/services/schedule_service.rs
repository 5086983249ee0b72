use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info};

use crate::db::repositories::schedule_repository::{ScheduleRepository, ScheduleRow};
use crate::db::repositories::task_repository::TaskRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::schedule::{
    ScheduleRecord, ScheduleTaskRequest, ScheduleTaskResponse, ScheduleType,
};
use crate::models::task::{SchedulingTask, TaskPriority};
use crate::services::schedule_utils;
use crate::services::settings_service::SettingsService;
use crate::services::slot_proposer::{self, CommittedSlot, SlotOptions, SlotPolicy};

/// Books AI-generated slots for tasks. Each call appends a new schedule row;
/// earlier rows for the same task are kept and become conflict sources.
pub struct ScheduleService {
    db: DbPool,
    settings: Arc<SettingsService>,
}

impl ScheduleService {
    pub fn new(db: DbPool, settings: Arc<SettingsService>) -> Self {
        Self { db, settings }
    }

    pub fn schedule_task(
        &self,
        profile_id: &str,
        request: ScheduleTaskRequest,
    ) -> AppResult<ScheduleTaskResponse> {
        self.schedule_task_at(profile_id, request, schedule_utils::now_fixed())
    }

    /// Same as [`schedule_task`](Self::schedule_task) with an explicit clock.
    pub fn schedule_task_at(
        &self,
        profile_id: &str,
        request: ScheduleTaskRequest,
        now: DateTime<FixedOffset>,
    ) -> AppResult<ScheduleTaskResponse> {
        let settings = self.settings.get()?;
        let policy = SlotPolicy::from_settings(&settings)?;

        let preferred_date = request
            .preferred_date
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| schedule_utils::parse_preferred_date(raw, policy.tz))
            .transpose()?;
        let priority_override = request
            .priority
            .as_deref()
            .map(|raw| TaskPriority::try_from(raw).map_err(AppError::validation))
            .transpose()?;

        let record = self.db.with_connection(|conn| {
            let task = TaskRepository::find_for_profile(conn, profile_id, &request.task_id)?
                .ok_or_else(AppError::not_found)?
                .into_record()?;

            let mut scheduling_task = SchedulingTask::from(&task);
            if let Some(priority) = priority_override {
                scheduling_task.priority = priority;
            }

            let existing_slots = load_committed_slots(conn, profile_id, now)?;
            debug!(
                target: "app::schedule",
                profile_id,
                task_id = %task.id,
                existing = existing_slots.len(),
                preferred_slots = request.preferred_time_slots.as_ref().map(Vec::len).unwrap_or(0),
                "proposing slot"
            );

            let proposal = slot_proposer::propose_slot(
                &scheduling_task,
                &SlotOptions {
                    preferred_date,
                    existing_slots,
                },
                &policy,
                now,
            )?;

            let record = ScheduleRecord {
                id: uuid::Uuid::new_v4().to_string(),
                task_id: task.id.clone(),
                profile_id: profile_id.to_string(),
                start_at: schedule_utils::format_datetime(proposal.start),
                end_at: schedule_utils::format_datetime(proposal.end),
                confidence: proposal.confidence,
                schedule_type: ScheduleType::AiGenerated,
                conflicts: proposal.conflicts,
                recommendations: proposal.recommendations,
                created_at: Utc::now().to_rfc3339(),
            };
            ScheduleRepository::insert(conn, &ScheduleRow::from_record(&record)?)?;
            Ok(record)
        })?;

        info!(
            target: "app::schedule",
            profile_id,
            task_id = %record.task_id,
            schedule_id = %record.id,
            confidence = record.confidence,
            conflicts = record.conflicts.len(),
            "task scheduled"
        );
        Ok(ScheduleTaskResponse::from(&record))
    }

    pub fn list_task_schedules(
        &self,
        profile_id: &str,
        task_id: &str,
    ) -> AppResult<Vec<ScheduleRecord>> {
        self.db.with_connection(|conn| {
            TaskRepository::find_for_profile(conn, profile_id, task_id)?
                .ok_or_else(AppError::not_found)?;
            ScheduleRepository::list_for_task(conn, profile_id, task_id)?
                .into_iter()
                .map(|row| row.into_record())
                .collect::<AppResult<Vec<_>>>()
        })
    }
}

fn load_committed_slots(
    conn: &rusqlite::Connection,
    profile_id: &str,
    now: DateTime<FixedOffset>,
) -> AppResult<Vec<CommittedSlot>> {
    ScheduleRepository::list_for_profile_from(conn, profile_id, now)?
        .into_iter()
        .map(|row| {
            Ok(CommittedSlot {
                start: schedule_utils::parse_datetime(&row.schedule.start_at)?,
                end: schedule_utils::parse_datetime(&row.schedule.end_at)?,
                label: row.task_title,
            })
        })
        .collect()
}
