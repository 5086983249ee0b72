use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use studysync_app_lib::db::DbPool;
use studysync_app_lib::models::profile::ProfileCreateInput;
use studysync_app_lib::models::settings::SettingsUpdateInput;
use studysync_app_lib::models::study_session::{SessionCompleteInput, SessionStartInput};
use studysync_app_lib::models::task::TaskCreateInput;
use studysync_app_lib::services::profile_service::ProfileService;
use studysync_app_lib::services::settings_service::SettingsService;
use studysync_app_lib::services::study_pattern_service::StudyPatternService;
use studysync_app_lib::services::study_session_service::StudySessionService;
use studysync_app_lib::services::task_service::TaskService;
use tempfile::tempdir;

struct Env {
    _dir: tempfile::TempDir,
    profile_id: String,
    task_id: String,
    sessions: StudySessionService,
    settings: Arc<SettingsService>,
    patterns: StudyPatternService,
}

fn setup() -> Env {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("patterns.sqlite")).expect("db pool");
    let profile = ProfileService::new(pool.clone())
        .create_profile(ProfileCreateInput {
            user_id: "student-7".into(),
            display_name: None,
        })
        .expect("profile");
    let task = TaskService::new(pool.clone())
        .create_task(
            &profile.id,
            TaskCreateInput {
                title: "Organic chemistry".into(),
                ..Default::default()
            },
        )
        .expect("task");
    let settings = Arc::new(SettingsService::new(pool.clone()));
    Env {
        _dir: dir,
        profile_id: profile.id,
        task_id: task.id,
        sessions: StudySessionService::new(pool.clone()),
        patterns: StudyPatternService::new(pool, Arc::clone(&settings)),
        settings,
    }
}

fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(&format!("2025-02-{day:02}T{hour:02}:00:00Z")).expect("datetime")
}

fn record_session(env: &Env, start: DateTime<FixedOffset>, minutes: i64, rating: Option<f64>) {
    let session = env
        .sessions
        .start_session(
            &env.profile_id,
            SessionStartInput {
                task_id: env.task_id.clone(),
                started_at: Some(start.to_rfc3339()),
                planned_minutes: 25,
                session_type: None,
            },
        )
        .expect("session started");
    env.sessions
        .complete_session(
            &env.profile_id,
            &session.id,
            SessionCompleteInput {
                completed_at: Some((start + Duration::minutes(minutes)).to_rfc3339()),
                actual_minutes: None,
                productivity_rating: rating,
            },
        )
        .expect("session completed");
}

#[test]
fn no_sessions_yield_empty_patterns() {
    let env = setup();
    let patterns = env.patterns.analyze_patterns(&env.profile_id).expect("patterns");
    assert_eq!(patterns.avg_productivity, 0.0);
    assert!(patterns.preferred_times.is_empty());
    assert_eq!(patterns.success_patterns.session_count, 0);
}

#[test]
fn consistent_afternoon_sessions() {
    let env = setup();
    for day in 1..=20 {
        record_session(&env, at(day, 14), 50, Some(5.0));
    }

    let patterns = env.patterns.analyze_patterns(&env.profile_id).expect("patterns");
    assert_eq!(patterns.avg_productivity, 5.0);
    assert_eq!(patterns.preferred_times, vec!["14:00".to_string()]);
    assert_eq!(patterns.success_patterns.session_count, 20);
    assert!((patterns.success_patterns.avg_duration_minutes - 50.0).abs() < 1e-9);
}

#[test]
fn only_the_most_recent_twenty_sessions_count() {
    let env = setup();
    for day in 1..=5 {
        record_session(&env, at(day, 8), 30, Some(1.0));
    }
    for day in 6..=25 {
        record_session(&env, at(day, 19), 30, Some(4.0));
    }

    let patterns = env.patterns.analyze_patterns(&env.profile_id).expect("patterns");
    assert_eq!(patterns.avg_productivity, 4.0);
    assert_eq!(patterns.preferred_times, vec!["19:00".to_string()]);
}

#[test]
fn unrated_and_open_sessions_follow_zero_rules() {
    let env = setup();
    record_session(&env, at(1, 9), 40, Some(4.0));
    record_session(&env, at(2, 10), 40, None);
    // started but never completed
    env.sessions
        .start_session(
            &env.profile_id,
            SessionStartInput {
                task_id: env.task_id.clone(),
                started_at: Some(at(3, 11).to_rfc3339()),
                planned_minutes: 25,
                session_type: Some("freestyle".into()),
            },
        )
        .expect("open session");

    let patterns = env.patterns.analyze_patterns(&env.profile_id).expect("patterns");
    assert!((patterns.avg_productivity - 4.0 / 3.0).abs() < 1e-9);
    assert_eq!(
        patterns.preferred_times,
        vec!["9:00".to_string(), "10:00".to_string(), "11:00".to_string()]
    );
    assert_eq!(patterns.success_patterns.session_count, 1);
    assert!((patterns.success_patterns.avg_duration_minutes - 40.0).abs() < 1e-9);
}

#[test]
fn settings_drive_window_and_hour_grouping() {
    let env = setup();
    env.settings
        .update(SettingsUpdateInput {
            timezone: Some("America/New_York".into()),
            pattern_window: Some(2),
            preferred_hour_count: Some(1),
            ..Default::default()
        })
        .expect("settings");

    record_session(&env, at(1, 14), 30, Some(2.0));
    record_session(&env, at(2, 14), 30, Some(5.0));
    record_session(&env, at(3, 15), 30, Some(3.0));

    let patterns = env.patterns.analyze_patterns(&env.profile_id).expect("patterns");
    // 14:00Z and 15:00Z are 9:00 and 10:00 in New York during February
    assert_eq!(patterns.avg_productivity, 4.0);
    assert_eq!(patterns.preferred_times, vec!["9:00".to_string()]);
}

#[test]
fn unknown_profile_is_not_found() {
    let env = setup();
    let err = env
        .patterns
        .analyze_patterns("no-such-profile")
        .expect_err("missing profile");
    assert!(err.is_not_found());
}
