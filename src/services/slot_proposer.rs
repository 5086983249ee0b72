use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::settings::{
    SchedulerSettings, DEFAULT_DURATION_MINUTES, DEFAULT_LEAD_HOURS, DEFAULT_START_HOUR,
    FALLBACK_LEAD_HOURS,
};
use crate::models::task::SchedulingTask;
use crate::services::schedule_utils::{self, PreferredDate};

const BASE_CONFIDENCE: f64 = 0.7;
const NO_CONFLICT_BONUS: f64 = 0.2;
const HIGH_PRIORITY_BONUS: f64 = 0.1;
const SUBJECT_BONUS: f64 = 0.1;
const LONG_TASK_MINUTES: i64 = 90;

pub const PEAK_HOURS_ADVICE: &str =
    "High priority task: schedule it during your peak focus hours";
pub const SPLIT_SESSIONS_ADVICE: &str =
    "Long task: consider breaking it into several focused study sessions";
pub const CONFLICT_ADVICE: &str =
    "Scheduling conflicts detected: consider adjusting the time or splitting the task";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSlot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotOptions {
    pub preferred_date: Option<PreferredDate>,
    pub existing_slots: Vec<CommittedSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotProposal {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub confidence: f64,
    pub conflicts: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Tunables the proposer reads; built from persisted settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPolicy {
    pub tz: Tz,
    pub default_start_hour: u32,
    pub default_lead_hours: i64,
    pub fallback_lead_hours: i64,
    pub default_duration_minutes: i64,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            tz: Tz::UTC,
            default_start_hour: DEFAULT_START_HOUR,
            default_lead_hours: DEFAULT_LEAD_HOURS,
            fallback_lead_hours: FALLBACK_LEAD_HOURS,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

impl SlotPolicy {
    pub fn from_settings(settings: &SchedulerSettings) -> AppResult<Self> {
        Ok(Self {
            tz: schedule_utils::parse_timezone(&settings.timezone)?,
            default_start_hour: settings.default_start_hour,
            default_lead_hours: settings.default_lead_hours,
            fallback_lead_hours: settings.fallback_lead_hours,
            default_duration_minutes: settings.default_duration_minutes,
        })
    }
}

/// Proposes exactly one slot for `task`. The slot always starts after `now`.
pub fn propose_slot(
    task: &SchedulingTask,
    options: &SlotOptions,
    policy: &SlotPolicy,
    now: DateTime<FixedOffset>,
) -> AppResult<SlotProposal> {
    let preferred_start = match options.preferred_date {
        Some(PreferredDate::DateTime(start)) => start,
        Some(PreferredDate::Date(date)) => {
            schedule_utils::at_time_of_day(policy.tz, date, policy.default_start_hour)?
        }
        None => schedule_utils::add_hours(now, policy.default_lead_hours)?,
    };

    // A bare date that resolves to an elapsed 09:00 is still pushed forward.
    let start = if preferred_start > now {
        preferred_start
    } else {
        schedule_utils::add_hours(now, policy.fallback_lead_hours)?
    };

    let minutes = task
        .estimated_minutes
        .unwrap_or(policy.default_duration_minutes);
    if minutes <= 0 {
        return Err(AppError::validation(format!(
            "task {} has a non-positive duration of {minutes} minutes",
            task.id
        )));
    }
    let end = schedule_utils::add_minutes(start, minutes)?;

    let upcoming: Vec<CommittedSlot> = options
        .existing_slots
        .iter()
        .filter(|slot| slot.start >= now)
        .cloned()
        .collect();

    let conflicts = detect_conflicts(&[Slot { start, end }], &upcoming);
    let confidence = score_confidence(task, conflicts.len());
    let recommendations = generate_recommendations(task, &conflicts, policy);

    Ok(SlotProposal {
        start,
        end,
        confidence,
        conflicts,
        recommendations,
    })
}

/// One message per overlapping (candidate, existing) pair, candidates outer.
pub fn detect_conflicts(candidates: &[Slot], existing: &[CommittedSlot]) -> Vec<String> {
    let mut conflicts = Vec::new();
    for candidate in candidates {
        for slot in existing {
            if schedule_utils::overlaps(candidate.start, candidate.end, slot.start, slot.end) {
                conflicts.push(format!(
                    "Conflicts with \"{}\" scheduled at {}",
                    slot.label,
                    schedule_utils::format_datetime(slot.start)
                ));
            }
        }
    }
    conflicts
}

pub fn score_confidence(task: &SchedulingTask, conflict_count: usize) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if conflict_count == 0 {
        confidence += NO_CONFLICT_BONUS;
    }
    if task.priority.is_high() {
        confidence += HIGH_PRIORITY_BONUS;
    }
    if task.has_subject() {
        confidence += SUBJECT_BONUS;
    }
    confidence.min(1.0)
}

pub fn generate_recommendations(
    task: &SchedulingTask,
    conflicts: &[String],
    policy: &SlotPolicy,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    if task.priority.is_high() {
        recommendations.push(PEAK_HOURS_ADVICE.to_string());
    }
    if task
        .estimated_minutes
        .unwrap_or(policy.default_duration_minutes)
        > LONG_TASK_MINUTES
    {
        recommendations.push(SPLIT_SESSIONS_ADVICE.to_string());
    }
    if !conflicts.is_empty() {
        recommendations.push(CONFLICT_ADVICE.to_string());
    }
    recommendations
}
