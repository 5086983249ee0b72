use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Informational tag; does not change the arithmetic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioType {
    #[default]
    Schedule,
    Workload,
    Impact,
}

impl ScenarioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::Schedule => "schedule",
            ScenarioType::Workload => "workload",
            ScenarioType::Impact => "impact",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadDistribution {
    Even,
    FrontendHeavy,
    BackendHeavy,
}

impl WorkloadDistribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadDistribution::Even => "even",
            WorkloadDistribution::FrontendHeavy => "frontend-heavy",
            WorkloadDistribution::BackendHeavy => "backend-heavy",
        }
    }
}

impl fmt::Display for WorkloadDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkloadDistribution {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "even" => Ok(WorkloadDistribution::Even),
            "frontend-heavy" => Ok(WorkloadDistribution::FrontendHeavy),
            "backend-heavy" => Ok(WorkloadDistribution::BackendHeavy),
            other => Err(format!("unsupported workload distribution: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlockInput {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyPreferences {
    #[serde(default)]
    pub preferred_times: Option<Vec<String>>,
    #[serde(default)]
    pub break_duration: Option<i64>,
    #[serde(default)]
    pub session_length: Option<i64>,
}

/// Caller-facing scenario parameters with date strings still unparsed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParamsInput {
    #[serde(default)]
    pub adjusted_deadlines: Option<Vec<String>>,
    #[serde(default)]
    pub time_blocks: Option<Vec<TimeBlockInput>>,
    #[serde(default)]
    pub study_preferences: Option<StudyPreferences>,
    #[serde(default)]
    pub workload_distribution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeWhatIfRequest {
    #[serde(default)]
    pub scenario_type: ScenarioType,
    #[serde(default)]
    pub params: ScenarioParamsInput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeBlock {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Parsed scenario parameters. Consumed once per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioParams {
    pub adjusted_deadlines: Vec<DateTime<FixedOffset>>,
    pub time_blocks: Vec<TimeBlock>,
    pub study_preferences: Option<StudyPreferences>,
    pub workload_distribution: Option<WorkloadDistribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineAdjustment {
    pub task_id: String,
    pub title: String,
    pub original_date: String,
    pub suggested_date: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioImpact {
    pub completion_probability: f64,
    pub stress_level: f64,
    pub productivity_score: f64,
    pub recommendations: Vec<String>,
    pub risks: Vec<String>,
    pub timeline_adjustments: Vec<TimelineAdjustment>,
}
