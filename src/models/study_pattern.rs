use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SuccessPatterns {
    /// Sessions rated above the success threshold.
    pub session_count: usize,
    pub avg_duration_minutes: f64,
}

impl SuccessPatterns {
    pub fn found(&self) -> bool {
        self.session_count > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StudyPatterns {
    pub avg_productivity: f64,
    /// `"H:00"` labels, best hour first.
    pub preferred_times: Vec<String>,
    pub success_patterns: SuccessPatterns,
}
