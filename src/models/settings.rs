use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_START_HOUR: u32 = 9;
pub const DEFAULT_LEAD_HOURS: i64 = 24;
pub const FALLBACK_LEAD_HOURS: i64 = 2;
pub const DEFAULT_DURATION_MINUTES: i64 = 60;
pub const DEFAULT_PATTERN_WINDOW: usize = 20;
pub const DEFAULT_PREFERRED_HOUR_COUNT: usize = 3;
pub const DEFAULT_SUCCESS_RATING_THRESHOLD: f64 = 3.5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSettings {
    /// IANA zone used for bare dates and hour-of-day grouping.
    pub timezone: String,
    pub default_start_hour: u32,
    pub default_lead_hours: i64,
    pub fallback_lead_hours: i64,
    pub default_duration_minutes: i64,
    pub pattern_window: usize,
    pub preferred_hour_count: usize,
    pub success_rating_threshold: f64,
    pub updated_at: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            default_start_hour: DEFAULT_START_HOUR,
            default_lead_hours: DEFAULT_LEAD_HOURS,
            fallback_lead_hours: FALLBACK_LEAD_HOURS,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            pattern_window: DEFAULT_PATTERN_WINDOW,
            preferred_hour_count: DEFAULT_PREFERRED_HOUR_COUNT,
            success_rating_threshold: DEFAULT_SUCCESS_RATING_THRESHOLD,
            updated_at: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateInput {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub default_start_hour: Option<u32>,
    #[serde(default)]
    pub default_lead_hours: Option<i64>,
    #[serde(default)]
    pub fallback_lead_hours: Option<i64>,
    #[serde(default)]
    pub default_duration_minutes: Option<i64>,
    #[serde(default)]
    pub pattern_window: Option<usize>,
    #[serde(default)]
    pub preferred_hour_count: Option<usize>,
    #[serde(default)]
    pub success_rating_threshold: Option<f64>,
}
