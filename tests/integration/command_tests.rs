use studysync_app_lib::commands::{profile, schedule, session, settings, task, what_if, AppState};
use studysync_app_lib::db::DbPool;
use studysync_app_lib::models::scenario::AnalyzeWhatIfRequest;
use studysync_app_lib::models::schedule::ScheduleTaskRequest;
use studysync_app_lib::models::settings::SettingsUpdateInput;
use studysync_app_lib::models::study_session::{SessionCompleteInput, SessionStartInput};
use studysync_app_lib::models::task::{TaskCreateInput, TaskUpdateInput};
use tempfile::tempdir;

fn setup() -> (tempfile::TempDir, AppState) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("commands.sqlite")).expect("db pool");
    (dir, AppState::new(pool))
}

#[tokio::test]
async fn schedule_round_trip_through_commands() {
    let (_dir, state) = setup();
    let profile = profile::profiles_ensure(&state, "student-cmd".into())
        .await
        .expect("profile");

    let created = task::tasks_create(
        &state,
        profile.id.clone(),
        TaskCreateInput {
            title: "Statistics homework".into(),
            priority: Some("high".into()),
            subject: Some("Stats".into()),
            estimated_minutes: Some(45),
            ..Default::default()
        },
    )
    .await
    .expect("task");

    let response = schedule::schedule_task(
        &state,
        profile.id.clone(),
        ScheduleTaskRequest {
            task_id: created.id.clone(),
            ..Default::default()
        },
    )
    .await
    .expect("scheduled");
    assert_eq!(response.confidence, 1.0);
    assert!(response.conflicts.is_empty());

    let history = schedule::list_task_schedules(&state, profile.id.clone(), created.id.clone())
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, response.schedule_id);

    let listed = task::tasks_list(&state, profile.id.clone(), None)
        .await
        .expect("tasks");
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn errors_surface_as_command_codes() {
    let (_dir, state) = setup();
    let profile = profile::profiles_ensure(&state, "student-codes".into())
        .await
        .expect("profile");

    let err = schedule::schedule_task(
        &state,
        profile.id.clone(),
        ScheduleTaskRequest {
            task_id: "missing".into(),
            ..Default::default()
        },
    )
    .await
    .expect_err("unknown task");
    assert_eq!(err.code, "NOT_FOUND");

    let err = task::tasks_create(
        &state,
        profile.id.clone(),
        TaskCreateInput {
            title: String::new(),
            ..Default::default()
        },
    )
    .await
    .expect_err("empty title");
    assert_eq!(err.code, "VALIDATION_ERROR");

    let err = settings::settings_update(
        &state,
        SettingsUpdateInput {
            timezone: Some("Nowhere/Special".into()),
            ..Default::default()
        },
    )
    .await
    .expect_err("bad timezone");
    assert_eq!(err.code, "VALIDATION_ERROR");

    let err = what_if::analyze_study_patterns(&state, "unknown".into())
        .await
        .expect_err("unknown profile");
    assert_eq!(err.code, "NOT_FOUND");
}

#[tokio::test]
async fn sessions_feed_pattern_and_scenario_commands() {
    let (_dir, state) = setup();
    let profile = profile::profiles_ensure(&state, "student-sessions".into())
        .await
        .expect("profile");
    let created = task::tasks_create(
        &state,
        profile.id.clone(),
        TaskCreateInput {
            title: "Vocabulary".into(),
            ..Default::default()
        },
    )
    .await
    .expect("task");

    let started = session::sessions_start(
        &state,
        profile.id.clone(),
        SessionStartInput {
            task_id: created.id.clone(),
            started_at: Some("2025-01-20T16:00:00Z".into()),
            planned_minutes: 25,
            session_type: None,
        },
    )
    .await
    .expect("started");
    session::sessions_complete(
        &state,
        profile.id.clone(),
        started.id,
        SessionCompleteInput {
            completed_at: Some("2025-01-20T16:30:00Z".into()),
            actual_minutes: None,
            productivity_rating: Some(5.0),
        },
    )
    .await
    .expect("completed");

    let patterns = what_if::analyze_study_patterns(&state, profile.id.clone())
        .await
        .expect("patterns");
    assert_eq!(patterns.preferred_times, vec!["16:00".to_string()]);

    task::tasks_update(
        &state,
        profile.id.clone(),
        created.id.clone(),
        TaskUpdateInput {
            status: Some("completed".into()),
            ..Default::default()
        },
    )
    .await
    .expect("updated");

    let impact = what_if::analyze_what_if(&state, profile.id.clone(), AnalyzeWhatIfRequest::default())
        .await
        .expect("impact");
    // one task, completed: 0.7 + 0.3 * (1.0 - 0.7)
    assert!((impact.completion_probability - 0.79).abs() < 1e-9);
    assert!((impact.productivity_score - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn settings_commands_round_trip() {
    let (_dir, state) = setup();
    let defaults = settings::settings_get(&state).await.expect("defaults");
    assert_eq!(defaults.default_start_hour, 9);

    let updated = settings::settings_update(
        &state,
        SettingsUpdateInput {
            default_start_hour: Some(8),
            preferred_hour_count: Some(5),
            ..Default::default()
        },
    )
    .await
    .expect("updated");
    assert_eq!(updated.default_start_hour, 8);

    let fetched = settings::settings_get(&state).await.expect("fetched");
    assert_eq!(fetched, updated);
}
