use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    AiGenerated,
    Manual,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::AiGenerated => "ai_generated",
            ScheduleType::Manual => "manual",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ScheduleType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ai_generated" => Ok(ScheduleType::AiGenerated),
            "manual" => Ok(ScheduleType::Manual),
            other => Err(format!("unsupported schedule type: {other}")),
        }
    }
}

/// A committed time slot for a task. Rows are never merged; every scheduling
/// call appends a new one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub id: String,
    pub task_id: String,
    pub profile_id: String,
    pub start_at: String,
    pub end_at: String,
    pub confidence: f64,
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTaskRequest {
    pub task_id: String,
    /// RFC 3339 date-time or a bare `YYYY-MM-DD` date.
    #[serde(default)]
    pub preferred_date: Option<String>,
    /// Only checked for presence.
    #[serde(default)]
    pub preferred_time_slots: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTaskResponse {
    pub schedule_id: String,
    pub scheduled_start: String,
    pub scheduled_end: String,
    pub confidence: f64,
    pub conflicts: Vec<String>,
    pub recommendations: Vec<String>,
}

impl From<&ScheduleRecord> for ScheduleTaskResponse {
    fn from(record: &ScheduleRecord) -> Self {
        Self {
            schedule_id: record.id.clone(),
            scheduled_start: record.start_at.clone(),
            scheduled_end: record.end_at.clone(),
            confidence: record.confidence,
            conflicts: record.conflicts.clone(),
            recommendations: record.recommendations.clone(),
        }
    }
}
