pub mod profile_service;
pub mod schedule_service;
pub mod schedule_utils;
pub mod settings_service;
pub mod slot_proposer;
pub mod study_pattern_service;
pub mod study_session_service;
pub mod task_service;
pub mod what_if_service;
