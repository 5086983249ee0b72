pub mod profile;
pub mod scenario;
pub mod schedule;
pub mod settings;
pub mod study_pattern;
pub mod study_session;
pub mod task;
