use crate::models::profile::ProfileRecord;

use super::{run_blocking, AppState, CommandResult};

/// Resolves the scheduling profile for an authenticated user id.
pub async fn profiles_ensure(state: &AppState, user_id: String) -> CommandResult<ProfileRecord> {
    let service = state.profiles();
    run_blocking(move || service.ensure_for_user(&user_id)).await
}
