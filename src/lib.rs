//! Smart scheduling and what-if analysis for student study planning.
//!
//! The pure core lives in [`services::slot_proposer`],
//! [`services::study_pattern_service`] and [`services::what_if_service`];
//! the remaining services wire it to SQLite storage and persisted settings,
//! and [`commands`] exposes async entry points for a host application.

pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;

use crate::commands::AppState;
use crate::db::DbPool;
use crate::error::AppResult;

const DATABASE_FILE: &str = "studysync.sqlite";

/// Sets up logging under `<data_dir>/logs`, opens the database in `data_dir`
/// and returns the command state.
pub fn bootstrap(data_dir: &Path) -> AppResult<AppState> {
    crate::utils::logger::init_logging(&data_dir.join("logs"))?;

    std::fs::create_dir_all(data_dir)?;
    let pool = DbPool::new(data_dir.join(DATABASE_FILE))?;
    tracing::info!(target: "app::db", data_dir = %data_dir.display(), "application state ready");
    Ok(AppState::new(pool))
}
