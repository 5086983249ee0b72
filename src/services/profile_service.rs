use chrono::Utc;
use tracing::info;

use crate::db::repositories::profile_repository::{ProfileRepository, ProfileRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::profile::{ProfileCreateInput, ProfileRecord};

/// Records scheduling profiles. Authentication happens elsewhere; a profile
/// only ties a user id to the tasks, sessions and schedules it owns.
#[derive(Clone)]
pub struct ProfileService {
    db: DbPool,
}

impl ProfileService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_profile(&self, input: ProfileCreateInput) -> AppResult<ProfileRecord> {
        let user_id = input.user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::validation("user id must not be empty"));
        }

        let record = ProfileRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            display_name: input
                .display_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            created_at: Utc::now().to_rfc3339(),
        };

        let row = ProfileRow::from_record(&record);
        self.db.with_connection(|conn| ProfileRepository::insert(conn, &row))?;
        info!(target: "app::profiles", profile_id = %record.id, "profile created");
        Ok(record)
    }

    pub fn get_profile(&self, id: &str) -> AppResult<ProfileRecord> {
        self.db
            .with_connection(|conn| ProfileRepository::find_by_id(conn, id))?
            .map(ProfileRow::into_record)
            .ok_or_else(AppError::not_found)
    }

    /// Returns the profile for `user_id`, creating it on first use.
    pub fn ensure_for_user(&self, user_id: &str) -> AppResult<ProfileRecord> {
        let existing = self
            .db
            .with_connection(|conn| ProfileRepository::find_by_user_id(conn, user_id.trim()))?;
        match existing {
            Some(row) => Ok(row.into_record()),
            None => self.create_profile(ProfileCreateInput {
                user_id: user_id.to_string(),
                display_name: None,
            }),
        }
    }
}
