use serde::Deserialize;

use crate::models::task::{TaskCreateInput, TaskRecord, TaskStatus, TaskUpdateInput};

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskListFilters {
    pub statuses: Option<Vec<String>>,
    pub subject: Option<String>,
    pub include_completed: Option<bool>,
}

pub async fn tasks_list(
    state: &AppState,
    profile_id: String,
    filters: Option<TaskListFilters>,
) -> CommandResult<Vec<TaskRecord>> {
    let service = state.tasks();
    let filters = filters.unwrap_or_default();
    let records = run_blocking(move || service.list_tasks(&profile_id)).await?;
    Ok(apply_filters(records, &filters))
}

pub async fn tasks_create(
    state: &AppState,
    profile_id: String,
    payload: TaskCreateInput,
) -> CommandResult<TaskRecord> {
    let service = state.tasks();
    run_blocking(move || service.create_task(&profile_id, payload)).await
}

pub async fn tasks_update(
    state: &AppState,
    profile_id: String,
    id: String,
    payload: TaskUpdateInput,
) -> CommandResult<TaskRecord> {
    let service = state.tasks();
    run_blocking(move || service.update_task(&profile_id, &id, payload)).await
}

pub async fn tasks_delete(state: &AppState, profile_id: String, id: String) -> CommandResult<()> {
    let service = state.tasks();
    run_blocking(move || service.delete_task(&profile_id, &id)).await
}

fn apply_filters(records: Vec<TaskRecord>, filters: &TaskListFilters) -> Vec<TaskRecord> {
    let statuses: Option<Vec<TaskStatus>> = filters.statuses.as_ref().map(|values| {
        values
            .iter()
            .filter_map(|value| TaskStatus::try_from(value.as_str()).ok())
            .collect()
    });
    let subject = filters
        .subject
        .as_ref()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());
    let include_completed = filters.include_completed.unwrap_or(true);

    records
        .into_iter()
        .filter(|task| include_completed || !task.status.is_completed())
        .filter(|task| {
            statuses
                .as_ref()
                .map(|allowed| allowed.contains(&task.status))
                .unwrap_or(true)
        })
        .filter(|task| match subject.as_ref() {
            Some(expected) => task
                .subject
                .as_ref()
                .map(|value| value.to_lowercase() == *expected)
                .unwrap_or(false),
            None => true,
        })
        .collect()
}
