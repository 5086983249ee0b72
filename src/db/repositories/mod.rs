pub mod profile_repository;
pub mod schedule_repository;
pub mod settings_repository;
pub mod study_session_repository;
pub mod task_repository;
