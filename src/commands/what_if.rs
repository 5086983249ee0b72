use crate::models::scenario::{AnalyzeWhatIfRequest, ScenarioImpact};
use crate::models::study_pattern::StudyPatterns;

use super::{run_blocking, AppState, CommandResult};

pub async fn analyze_what_if(
    state: &AppState,
    profile_id: String,
    request: AnalyzeWhatIfRequest,
) -> CommandResult<ScenarioImpact> {
    let service = state.what_if();
    run_blocking(move || service.analyze_scenario(&profile_id, request)).await
}

pub async fn analyze_study_patterns(
    state: &AppState,
    profile_id: String,
) -> CommandResult<StudyPatterns> {
    let service = state.patterns();
    run_blocking(move || service.analyze_patterns(&profile_id)).await
}
