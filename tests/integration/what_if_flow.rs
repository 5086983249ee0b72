use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use studysync_app_lib::commands::AppState;
use studysync_app_lib::db::DbPool;
use studysync_app_lib::models::scenario::{
    AnalyzeWhatIfRequest, ScenarioParams, ScenarioParamsInput, ScenarioType, StudyPreferences,
    TimeBlockInput, WorkloadDistribution,
};
use studysync_app_lib::models::study_pattern::StudyPatterns;
use studysync_app_lib::models::study_session::{SessionCompleteInput, SessionStartInput};
use studysync_app_lib::models::task::{TaskCreateInput, TaskUpdateInput};
use studysync_app_lib::services::what_if_service::{
    PlaceholderHeuristics, ScenarioHeuristics, ScenarioTask,
};
use tempfile::tempdir;

fn setup_with(heuristics: Option<Arc<dyn ScenarioHeuristics>>) -> (tempfile::TempDir, AppState, String) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("what_if.sqlite")).expect("db pool");
    let state = match heuristics {
        Some(custom) => AppState::with_heuristics(pool, custom),
        None => AppState::new(pool),
    };
    let profile = state.profiles().ensure_for_user("student-3").expect("profile");
    (dir, state, profile.id)
}

fn setup() -> (tempfile::TempDir, AppState, String) {
    setup_with(None)
}

fn create_tasks(state: &AppState, profile_id: &str, total: usize, completed: usize) -> Vec<String> {
    (0..total)
        .map(|idx| {
            let task = state
                .tasks()
                .create_task(
                    profile_id,
                    TaskCreateInput {
                        title: format!("Assignment {idx}"),
                        due_at: Some(format!("2025-06-{:02}T17:00:00Z", idx + 1)),
                        ..Default::default()
                    },
                )
                .expect("task");
            if idx < completed {
                state
                    .tasks()
                    .update_task(
                        profile_id,
                        &task.id,
                        TaskUpdateInput {
                            status: Some("completed".into()),
                            ..Default::default()
                        },
                    )
                    .expect("completed");
            }
            task.id
        })
        .collect()
}

fn request(params: ScenarioParamsInput) -> AnalyzeWhatIfRequest {
    AnalyzeWhatIfRequest {
        scenario_type: ScenarioType::Schedule,
        params,
    }
}

#[test]
fn seventy_percent_history_keeps_baseline() {
    let (_dir, state, profile_id) = setup();
    create_tasks(&state, &profile_id, 10, 7);

    let impact = state
        .what_if()
        .analyze_scenario(&profile_id, request(ScenarioParamsInput::default()))
        .expect("impact");

    assert!((impact.completion_probability - 0.7).abs() < 1e-9);
    assert!((impact.stress_level - 78.0).abs() < 1e-9);
    assert_eq!(impact.productivity_score, 0.0);
    assert!(impact.timeline_adjustments.is_empty());
    assert!(impact.risks.is_empty());
}

#[test]
fn empty_profile_uses_zero_completion_rate() {
    let (_dir, state, profile_id) = setup();

    let impact = state
        .what_if()
        .analyze_scenario(&profile_id, request(ScenarioParamsInput::default()))
        .expect("impact");

    assert!((impact.completion_probability - 0.49).abs() < 1e-9);
    assert!(impact.recommendations.is_empty());
}

#[test]
fn preferences_and_distribution_raise_scores() {
    let (_dir, state, profile_id) = setup();
    let task_ids = create_tasks(&state, &profile_id, 1, 0);

    for day in 1..=3 {
        let start: DateTime<FixedOffset> =
            DateTime::parse_from_rfc3339(&format!("2025-02-{day:02}T14:00:00Z")).expect("start");
        let session = state
            .sessions()
            .start_session(
                &profile_id,
                SessionStartInput {
                    task_id: task_ids[0].clone(),
                    started_at: Some(start.to_rfc3339()),
                    planned_minutes: 25,
                    session_type: None,
                },
            )
            .expect("session");
        state
            .sessions()
            .complete_session(
                &profile_id,
                &session.id,
                SessionCompleteInput {
                    completed_at: Some((start + Duration::minutes(25)).to_rfc3339()),
                    actual_minutes: None,
                    productivity_rating: Some(4.0),
                },
            )
            .expect("completed");
    }

    let impact = state
        .what_if()
        .analyze_scenario(
            &profile_id,
            request(ScenarioParamsInput {
                study_preferences: Some(StudyPreferences {
                    preferred_times: Some(vec!["14:00".into(), "20:00".into()]),
                    break_duration: Some(5),
                    session_length: Some(25),
                }),
                workload_distribution: Some("frontend-heavy".into()),
                time_blocks: Some(vec![TimeBlockInput {
                    start: "2025-06-01T09:00:00Z".into(),
                    end: "2025-06-01T12:00:00Z".into(),
                }]),
                adjusted_deadlines: Some(vec!["2025-06-10T17:00:00Z".into()]),
            }),
        )
        .expect("impact");

    // 0.49 + 0.2 * 0.5 + 0.1 * 0.1
    assert!((impact.completion_probability - 0.6).abs() < 1e-9);
    // 4 * 20 + 30 * 0.7, clamped
    assert!((impact.productivity_score - 100.0).abs() < 1e-9);
    assert_eq!(impact.recommendations.len(), 2);
    assert!(impact.recommendations[0].contains("14:00"));
    assert!(impact.recommendations[1].contains("25-minute"));
    assert!(impact.risks.is_empty());
}

struct PullEverythingForward;

impl ScenarioHeuristics for PullEverythingForward {
    fn workload_impact(&self, distribution: WorkloadDistribution, tasks: &[ScenarioTask]) -> f64 {
        PlaceholderHeuristics.workload_impact(distribution, tasks)
    }

    fn deadline_density(&self, _tasks: &[ScenarioTask], _params: &ScenarioParams) -> f64 {
        0.95
    }

    fn workload_pressure(&self, _tasks: &[ScenarioTask], _params: &ScenarioParams) -> f64 {
        1.0
    }

    fn alignment_score(&self, _preferences: &StudyPreferences, _patterns: &StudyPatterns) -> f64 {
        0.1
    }

    fn optimal_date(
        &self,
        _task: &ScenarioTask,
        due_at: DateTime<FixedOffset>,
        _patterns: &StudyPatterns,
        _params: &ScenarioParams,
    ) -> DateTime<FixedOffset> {
        due_at - Duration::days(2)
    }
}

#[test]
fn injected_heuristics_drive_risks_and_adjustments() {
    let (_dir, state, profile_id) = setup_with(Some(Arc::new(PullEverythingForward)));
    create_tasks(&state, &profile_id, 3, 1);

    let impact = state
        .what_if()
        .analyze_scenario(
            &profile_id,
            request(ScenarioParamsInput {
                study_preferences: Some(StudyPreferences::default()),
                ..Default::default()
            }),
        )
        .expect("impact");

    assert!((impact.stress_level - 99.0).abs() < 1e-9);
    assert_eq!(impact.risks.len(), 3);
    assert_eq!(impact.timeline_adjustments.len(), 2);
    for adjustment in &impact.timeline_adjustments {
        assert!(adjustment.reason.contains("2 days earlier"));
        assert_ne!(adjustment.original_date, adjustment.suggested_date);
    }
    assert!(impact
        .recommendations
        .iter()
        .any(|line| line.contains("redistributing")));
}

#[test]
fn invalid_scenario_inputs_are_rejected() {
    let (_dir, state, profile_id) = setup();
    let cases = vec![
        ScenarioParamsInput {
            adjusted_deadlines: Some(vec!["soon".into()]),
            ..Default::default()
        },
        ScenarioParamsInput {
            workload_distribution: Some("middle-heavy".into()),
            ..Default::default()
        },
        ScenarioParamsInput {
            time_blocks: Some(vec![TimeBlockInput {
                start: "2025-06-01T12:00:00Z".into(),
                end: "2025-06-01T09:00:00Z".into(),
            }]),
            ..Default::default()
        },
    ];

    for params in cases {
        let err = state
            .what_if()
            .analyze_scenario(&profile_id, request(params))
            .expect_err("rejected");
        assert!(err.is_validation());
    }
}
