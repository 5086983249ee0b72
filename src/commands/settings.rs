use crate::models::settings::{SchedulerSettings, SettingsUpdateInput};

use super::{run_blocking, AppState, CommandResult};

pub async fn settings_get(state: &AppState) -> CommandResult<SchedulerSettings> {
    let service = state.settings();
    run_blocking(move || service.get()).await
}

pub async fn settings_update(
    state: &AppState,
    payload: SettingsUpdateInput,
) -> CommandResult<SchedulerSettings> {
    let service = state.settings();
    run_blocking(move || service.update(payload)).await
}
