use studysync_app_lib::db::DbPool;
use studysync_app_lib::models::profile::ProfileCreateInput;
use studysync_app_lib::models::task::{TaskCreateInput, TaskPriority, TaskStatus, TaskUpdateInput};
use studysync_app_lib::services::profile_service::ProfileService;
use studysync_app_lib::services::task_service::TaskService;
use tempfile::tempdir;

fn setup() -> (tempfile::TempDir, TaskService, String) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("integration.sqlite")).expect("db pool");
    let profile = ProfileService::new(pool.clone())
        .create_profile(ProfileCreateInput {
            user_id: "student-9".into(),
            display_name: None,
        })
        .expect("profile");
    (dir, TaskService::new(pool), profile.id)
}

#[test]
fn task_crud_flow() {
    let (_dir, service, profile_id) = setup();

    // create
    let created = service
        .create_task(
            &profile_id,
            TaskCreateInput {
                title: "Integration Task".into(),
                status: Some("todo".into()),
                priority: Some("medium".into()),
                due_at: Some("2025-05-01T17:00:00+02:00".into()),
                estimated_minutes: Some(90),
                subject: Some(" Physics ".into()),
                ..Default::default()
            },
        )
        .expect("create task");

    assert!(!created.id.is_empty());
    assert_eq!(created.status, TaskStatus::Todo);
    assert_eq!(created.subject.as_deref(), Some("Physics"));
    assert_eq!(created.due_at.as_deref(), Some("2025-05-01T17:00:00+02:00"));

    // list
    let tasks = service.list_tasks(&profile_id).expect("list tasks");
    assert_eq!(tasks.len(), 1);

    // update
    let updated = service
        .update_task(
            &profile_id,
            &created.id,
            TaskUpdateInput {
                status: Some("completed".into()),
                priority: Some("high".into()),
                estimated_minutes: Some(None),
                due_at: Some(None),
                ..Default::default()
            },
        )
        .expect("update task");
    assert_eq!(updated.status, TaskStatus::Completed);
    assert_eq!(updated.priority, TaskPriority::High);
    assert!(updated.completed_at.is_some());
    assert_eq!(updated.estimated_minutes, None);
    assert_eq!(updated.effective_minutes(), 60);
    assert_eq!(updated.due_at, None);

    let reloaded = service.get_task(&profile_id, &created.id).expect("reload");
    assert_eq!(reloaded, updated);

    // delete
    service
        .delete_task(&profile_id, &created.id)
        .expect("delete task");

    let result = service.get_task(&profile_id, &created.id);
    assert!(result.is_err());
}

#[test]
fn delete_is_scoped_to_the_owning_profile() {
    let (_dir, service, profile_id) = setup();
    let created = service
        .create_task(
            &profile_id,
            TaskCreateInput {
                title: "Keep me".into(),
                ..Default::default()
            },
        )
        .expect("create task");

    let err = service
        .delete_task("intruder", &created.id)
        .expect_err("foreign delete");
    assert!(err.is_not_found());
    assert!(service.get_task(&profile_id, &created.id).is_ok());
}
