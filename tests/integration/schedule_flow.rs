use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Timelike};
use studysync_app_lib::db::DbPool;
use studysync_app_lib::models::profile::ProfileCreateInput;
use studysync_app_lib::models::schedule::{ScheduleTaskRequest, ScheduleType};
use studysync_app_lib::models::settings::SettingsUpdateInput;
use studysync_app_lib::models::task::TaskCreateInput;
use studysync_app_lib::services::profile_service::ProfileService;
use studysync_app_lib::services::schedule_service::ScheduleService;
use studysync_app_lib::services::settings_service::SettingsService;
use studysync_app_lib::services::slot_proposer::{
    CONFLICT_ADVICE, PEAK_HOURS_ADVICE, SPLIT_SESSIONS_ADVICE,
};
use studysync_app_lib::services::task_service::TaskService;
use tempfile::tempdir;

struct Env {
    _dir: tempfile::TempDir,
    profile_id: String,
    tasks: TaskService,
    settings: Arc<SettingsService>,
    schedules: ScheduleService,
}

fn setup() -> Env {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("schedule.sqlite")).expect("db pool");
    let profile = ProfileService::new(pool.clone())
        .create_profile(ProfileCreateInput {
            user_id: "student-1".into(),
            display_name: Some("Student".into()),
        })
        .expect("profile");
    let settings = Arc::new(SettingsService::new(pool.clone()));
    Env {
        _dir: dir,
        profile_id: profile.id,
        tasks: TaskService::new(pool.clone()),
        schedules: ScheduleService::new(pool, Arc::clone(&settings)),
        settings,
    }
}

fn now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-03-10T12:00:00Z").expect("fixed clock")
}

fn parse(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).expect("rfc3339 output")
}

fn create_task(env: &Env, title: &str, minutes: i64, priority: &str, subject: Option<&str>) -> String {
    env.tasks
        .create_task(
            &env.profile_id,
            TaskCreateInput {
                title: title.into(),
                priority: Some(priority.into()),
                estimated_minutes: Some(minutes),
                subject: subject.map(str::to_string),
                ..Default::default()
            },
        )
        .expect("task created")
        .id
}

#[test]
fn stale_preferred_date_moves_two_hours_ahead() {
    let env = setup();
    let task_id = create_task(&env, "Calculus problem set", 120, "high", Some("Math"));

    let response = env
        .schedules
        .schedule_task_at(
            &env.profile_id,
            ScheduleTaskRequest {
                task_id: task_id.clone(),
                preferred_date: Some("2025-03-09T10:00:00Z".into()),
                ..Default::default()
            },
            now(),
        )
        .expect("scheduled");

    let start = parse(&response.scheduled_start);
    let end = parse(&response.scheduled_end);
    assert_eq!(start, now() + Duration::hours(2));
    assert_eq!(end - start, Duration::minutes(120));
    assert_eq!(response.confidence, 1.0);
    assert!(response.conflicts.is_empty());
    assert_eq!(
        response.recommendations,
        vec![PEAK_HOURS_ADVICE.to_string(), SPLIT_SESSIONS_ADVICE.to_string()]
    );

    let stored = env
        .schedules
        .list_task_schedules(&env.profile_id, &task_id)
        .expect("listed");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, response.schedule_id);
    assert_eq!(stored[0].schedule_type, ScheduleType::AiGenerated);
    assert_eq!(stored[0].recommendations, response.recommendations);
}

#[test]
fn overlapping_commitment_lowers_confidence() {
    let env = setup();
    let task_id = create_task(&env, "Calculus problem set", 120, "high", Some("Math"));
    let request = ScheduleTaskRequest {
        task_id: task_id.clone(),
        preferred_date: Some("2025-03-09T10:00:00Z".into()),
        ..Default::default()
    };

    env.schedules
        .schedule_task_at(&env.profile_id, request.clone(), now())
        .expect("first booking");
    let second = env
        .schedules
        .schedule_task_at(&env.profile_id, request, now())
        .expect("second booking");

    assert_eq!(second.conflicts.len(), 1);
    assert!(second.conflicts[0].contains("Calculus problem set"));
    assert!((second.confidence - 0.9).abs() < 1e-9);
    assert_eq!(
        second.recommendations.last().map(String::as_str),
        Some(CONFLICT_ADVICE)
    );

    let stored = env
        .schedules
        .list_task_schedules(&env.profile_id, &task_id)
        .expect("listed");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].conflicts, second.conflicts);
}

#[test]
fn conflicts_follow_start_time_across_offsets() {
    let env = setup();
    let berlin = create_task(&env, "Seminar prep", 60, "medium", None);
    let utc = create_task(&env, "Lab report", 60, "medium", None);
    let revision = create_task(&env, "Exam revision", 120, "medium", None);

    // 10:00+02:00 is 08:00Z and starts before 08:30Z
    for (task_id, start) in [
        (utc, "2025-03-11T08:30:00Z"),
        (berlin, "2025-03-11T10:00:00+02:00"),
    ] {
        env.schedules
            .schedule_task_at(
                &env.profile_id,
                ScheduleTaskRequest {
                    task_id,
                    preferred_date: Some(start.into()),
                    ..Default::default()
                },
                now(),
            )
            .expect("booked");
    }

    let response = env
        .schedules
        .schedule_task_at(
            &env.profile_id,
            ScheduleTaskRequest {
                task_id: revision,
                preferred_date: Some("2025-03-11T08:00:00Z".into()),
                ..Default::default()
            },
            now(),
        )
        .expect("scheduled");

    assert_eq!(response.conflicts.len(), 2);
    assert!(response.conflicts[0].contains("Seminar prep"));
    assert!(response.conflicts[1].contains("Lab report"));
}

#[test]
fn schedules_in_the_past_are_not_conflicts() {
    let env = setup();
    let task_id = create_task(&env, "Reading", 60, "medium", None);
    let request = ScheduleTaskRequest {
        task_id,
        preferred_date: Some("2025-03-10T15:00:00Z".into()),
        ..Default::default()
    };

    env.schedules
        .schedule_task_at(&env.profile_id, request.clone(), now())
        .expect("first booking");

    // a week later the earlier slot has elapsed; the stale date falls back to now+2h
    let later = now() + Duration::days(7);
    let response = env
        .schedules
        .schedule_task_at(&env.profile_id, request, later)
        .expect("second booking");
    assert!(response.conflicts.is_empty());
    assert_eq!(parse(&response.scheduled_start), later + Duration::hours(2));
}

#[test]
fn missing_preferred_date_defaults_to_next_day() {
    let env = setup();
    let task_id = create_task(&env, "Flashcards", 30, "low", None);

    let response = env
        .schedules
        .schedule_task_at(
            &env.profile_id,
            ScheduleTaskRequest {
                task_id,
                ..Default::default()
            },
            now(),
        )
        .expect("scheduled");

    assert_eq!(parse(&response.scheduled_start), now() + Duration::hours(24));
    assert!((response.confidence - 0.9).abs() < 1e-9);
    assert!(response.recommendations.is_empty());
}

#[test]
fn bare_date_starts_at_nine_in_configured_zone() {
    let env = setup();
    env.settings
        .update(SettingsUpdateInput {
            timezone: Some("Europe/Berlin".into()),
            ..Default::default()
        })
        .expect("settings");
    let task_id = create_task(&env, "Essay outline", 45, "medium", Some("History"));

    let response = env
        .schedules
        .schedule_task_at(
            &env.profile_id,
            ScheduleTaskRequest {
                task_id,
                preferred_date: Some("2025-07-01".into()),
                ..Default::default()
            },
            now(),
        )
        .expect("scheduled");

    let start = parse(&response.scheduled_start);
    assert_eq!(start.hour(), 9);
    assert_eq!(start.offset().local_minus_utc(), 2 * 3600);
    assert_eq!(start.to_rfc3339(), "2025-07-01T09:00:00+02:00");
}

#[test]
fn priority_override_applies_to_the_proposal_only() {
    let env = setup();
    let task_id = create_task(&env, "Lab write-up", 60, "medium", None);

    let response = env
        .schedules
        .schedule_task_at(
            &env.profile_id,
            ScheduleTaskRequest {
                task_id: task_id.clone(),
                priority: Some("high".into()),
                preferred_time_slots: Some(vec!["morning".into()]),
                ..Default::default()
            },
            now(),
        )
        .expect("scheduled");

    assert_eq!(response.recommendations, vec![PEAK_HOURS_ADVICE.to_string()]);
    assert!((response.confidence - 1.0).abs() < 1e-9);

    let task = env
        .tasks
        .get_task(&env.profile_id, &task_id)
        .expect("task");
    assert!(!task.priority.is_high());
}

#[test]
fn foreign_or_unknown_tasks_are_not_found() {
    let env = setup();
    let task_id = create_task(&env, "Private task", 60, "medium", None);

    let err = env
        .schedules
        .schedule_task_at(
            "someone-else",
            ScheduleTaskRequest {
                task_id,
                ..Default::default()
            },
            now(),
        )
        .expect_err("not visible to other profiles");
    assert!(err.is_not_found());

    let err = env
        .schedules
        .schedule_task_at(
            &env.profile_id,
            ScheduleTaskRequest {
                task_id: "missing".into(),
                ..Default::default()
            },
            now(),
        )
        .expect_err("unknown task");
    assert!(err.is_not_found());
}

#[test]
fn malformed_preferred_date_is_rejected() {
    let env = setup();
    let task_id = create_task(&env, "Revision", 60, "medium", None);

    let err = env
        .schedules
        .schedule_task_at(
            &env.profile_id,
            ScheduleTaskRequest {
                task_id: task_id.clone(),
                preferred_date: Some("tomorrow-ish".into()),
                ..Default::default()
            },
            now(),
        )
        .expect_err("invalid date");
    assert!(err.is_validation());

    let stored = env
        .schedules
        .list_task_schedules(&env.profile_id, &task_id)
        .expect("listed");
    assert!(stored.is_empty());
}
