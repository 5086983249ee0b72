use crate::models::study_session::{SessionCompleteInput, SessionStartInput, StudySessionRecord};

use super::{run_blocking, AppState, CommandResult};

pub async fn sessions_start(
    state: &AppState,
    profile_id: String,
    payload: SessionStartInput,
) -> CommandResult<StudySessionRecord> {
    let service = state.sessions();
    run_blocking(move || service.start_session(&profile_id, payload)).await
}

pub async fn sessions_complete(
    state: &AppState,
    profile_id: String,
    session_id: String,
    payload: SessionCompleteInput,
) -> CommandResult<StudySessionRecord> {
    let service = state.sessions();
    run_blocking(move || service.complete_session(&profile_id, &session_id, payload)).await
}
