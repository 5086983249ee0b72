use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;
use crate::models::profile::ProfileRecord;

const BASE_SELECT: &str = "SELECT id, user_id, display_name, created_at FROM profiles";

#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub created_at: String,
}

impl ProfileRow {
    pub fn from_record(record: &ProfileRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            display_name: record.display_name.clone(),
            created_at: record.created_at.clone(),
        }
    }

    pub fn into_record(self) -> ProfileRecord {
        ProfileRecord {
            id: self.id,
            user_id: self.user_id,
            display_name: self.display_name,
            created_at: self.created_at,
        }
    }
}

impl TryFrom<&Row<'_>> for ProfileRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            display_name: row.get("display_name")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct ProfileRepository;

impl ProfileRepository {
    pub fn insert(conn: &Connection, row: &ProfileRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO profiles (id, user_id, display_name, created_at)
                VALUES (:id, :user_id, :display_name, :created_at)
            "#,
            named_params! {
                ":id": &row.id,
                ":user_id": &row.user_id,
                ":display_name": &row.display_name,
                ":created_at": &row.created_at,
            },
        )?;
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<ProfileRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} WHERE id = ?1"))?;
        let row = stmt
            .query_row([id], |row| ProfileRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn find_by_user_id(conn: &Connection, user_id: &str) -> AppResult<Option<ProfileRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} WHERE user_id = ?1"))?;
        let row = stmt
            .query_row([user_id], |row| ProfileRow::try_from(row))
            .optional()?;
        Ok(row)
    }
}
