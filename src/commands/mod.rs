pub mod profile;
pub mod schedule;
pub mod session;
pub mod settings;
pub mod task;
pub mod what_if;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::error;

use crate::db::DbPool;
use crate::error::AppError;
use crate::services::profile_service::ProfileService;
use crate::services::schedule_service::ScheduleService;
use crate::services::settings_service::SettingsService;
use crate::services::study_pattern_service::StudyPatternService;
use crate::services::study_session_service::StudySessionService;
use crate::services::task_service::TaskService;
use crate::services::what_if_service::{ScenarioHeuristics, WhatIfService};

/// Shared handles for the command layer. Cloning is cheap; every service sits
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    profile_service: Arc<ProfileService>,
    task_service: Arc<TaskService>,
    session_service: Arc<StudySessionService>,
    settings_service: Arc<SettingsService>,
    schedule_service: Arc<ScheduleService>,
    pattern_service: Arc<StudyPatternService>,
    what_if_service: Arc<WhatIfService>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> Self {
        let settings_service = Arc::new(SettingsService::new(db_pool.clone()));
        let pattern_service = Arc::new(StudyPatternService::new(
            db_pool.clone(),
            Arc::clone(&settings_service),
        ));
        let what_if_service = Arc::new(WhatIfService::new(
            db_pool.clone(),
            Arc::clone(&pattern_service),
        ));
        Self::assemble(db_pool, settings_service, pattern_service, what_if_service)
    }

    /// Builds the state with custom scenario heuristics in place of the
    /// placeholder constants.
    pub fn with_heuristics(db_pool: DbPool, heuristics: Arc<dyn ScenarioHeuristics>) -> Self {
        let settings_service = Arc::new(SettingsService::new(db_pool.clone()));
        let pattern_service = Arc::new(StudyPatternService::new(
            db_pool.clone(),
            Arc::clone(&settings_service),
        ));
        let what_if_service = Arc::new(WhatIfService::with_heuristics(
            db_pool.clone(),
            Arc::clone(&pattern_service),
            heuristics,
        ));
        Self::assemble(db_pool, settings_service, pattern_service, what_if_service)
    }

    fn assemble(
        db_pool: DbPool,
        settings_service: Arc<SettingsService>,
        pattern_service: Arc<StudyPatternService>,
        what_if_service: Arc<WhatIfService>,
    ) -> Self {
        Self {
            profile_service: Arc::new(ProfileService::new(db_pool.clone())),
            task_service: Arc::new(TaskService::new(db_pool.clone())),
            session_service: Arc::new(StudySessionService::new(db_pool.clone())),
            schedule_service: Arc::new(ScheduleService::new(
                db_pool.clone(),
                Arc::clone(&settings_service),
            )),
            db_pool,
            settings_service,
            pattern_service,
            what_if_service,
        }
    }

    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profile_service)
    }

    pub fn tasks(&self) -> Arc<TaskService> {
        Arc::clone(&self.task_service)
    }

    pub fn sessions(&self) -> Arc<StudySessionService> {
        Arc::clone(&self.session_service)
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    pub fn schedules(&self) -> Arc<ScheduleService> {
        Arc::clone(&self.schedule_service)
    }

    pub fn patterns(&self) -> Arc<StudyPatternService> {
        Arc::clone(&self.pattern_service)
    }

    pub fn what_if(&self) -> Arc<WhatIfService> {
        Arc::clone(&self.what_if_service)
    }

    pub fn db(&self) -> DbPool {
        self.db_pool.clone()
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => {
                CommandError::new("NOT_FOUND", "the requested resource does not exist", None)
            }
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::Computation { message } => {
                error!(target: "app::command", %message, "computation failed in command");
                CommandError::new("COMPUTATION_FAILED", message, None)
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "serialization failed", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "file system access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

/// Moves a synchronous service call off the async executor.
pub(crate) async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("task execution failed: {err}"), None))?
        .map_err(CommandError::from)
}
