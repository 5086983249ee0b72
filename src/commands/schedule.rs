use tracing::debug;

use crate::models::schedule::{ScheduleRecord, ScheduleTaskRequest, ScheduleTaskResponse};

use super::{run_blocking, AppState, CommandResult};

pub async fn schedule_task(
    state: &AppState,
    profile_id: String,
    request: ScheduleTaskRequest,
) -> CommandResult<ScheduleTaskResponse> {
    debug!(target: "app::command", %profile_id, task_id = %request.task_id, "schedule_task");
    let service = state.schedules();
    run_blocking(move || service.schedule_task(&profile_id, request)).await
}

pub async fn list_task_schedules(
    state: &AppState,
    profile_id: String,
    task_id: String,
) -> CommandResult<Vec<ScheduleRecord>> {
    let service = state.schedules();
    run_blocking(move || service.list_task_schedules(&profile_id, &task_id)).await
}
