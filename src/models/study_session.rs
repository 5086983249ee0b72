use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Pomodoro,
    Freestyle,
    Break,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Pomodoro => "pomodoro",
            SessionType::Freestyle => "freestyle",
            SessionType::Break => "break",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SessionType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "pomodoro" => Ok(SessionType::Pomodoro),
            "freestyle" => Ok(SessionType::Freestyle),
            "break" => Ok(SessionType::Break),
            other => Err(format!("unsupported session type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionRecord {
    pub id: String,
    pub task_id: String,
    pub profile_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub planned_minutes: i64,
    pub actual_minutes: Option<i64>,
    pub productivity_rating: Option<f64>,
    pub session_type: SessionType,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartInput {
    pub task_id: String,
    #[serde(default)]
    pub started_at: Option<String>,
    pub planned_minutes: i64,
    #[serde(default)]
    pub session_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionCompleteInput {
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub actual_minutes: Option<i64>,
    #[serde(default)]
    pub productivity_rating: Option<f64>,
}
