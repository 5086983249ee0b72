use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde_json::json;
use tracing::{debug, info};

use crate::db::repositories::task_repository::TaskRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::scenario::{
    AnalyzeWhatIfRequest, ScenarioImpact, ScenarioParams, ScenarioParamsInput, StudyPreferences,
    TimeBlock, TimelineAdjustment, WorkloadDistribution,
};
use crate::models::study_pattern::StudyPatterns;
use crate::models::task::{TaskRecord, TaskStatus, DEFAULT_ESTIMATED_MINUTES};
use crate::services::schedule_utils;
use crate::services::study_pattern_service::StudyPatternService;

const BASE_COMPLETION: f64 = 0.7;
const HISTORY_WEIGHT: f64 = 0.3;
const TIME_ALIGNMENT_WEIGHT: f64 = 0.2;
const WORKLOAD_WEIGHT: f64 = 0.1;

const BASE_STRESS: f64 = 50.0;
const DEADLINE_DENSITY_WEIGHT: f64 = 20.0;
const WORKLOAD_PRESSURE_WEIGHT: f64 = 30.0;

const RATING_TO_SCORE: f64 = 20.0;
const ALIGNMENT_WEIGHT: f64 = 30.0;

const REDISTRIBUTE_PRESSURE: f64 = 0.7;
const DEADLINE_RISK_DENSITY: f64 = 0.8;
const BURNOUT_PRESSURE: f64 = 0.9;
const DEVIATION_ALIGNMENT: f64 = 0.3;

pub const PLACEHOLDER_WORKLOAD_IMPACT: f64 = 0.1;
pub const PLACEHOLDER_DEADLINE_DENSITY: f64 = 0.5;
pub const PLACEHOLDER_WORKLOAD_PRESSURE: f64 = 0.6;
pub const PLACEHOLDER_ALIGNMENT_SCORE: f64 = 0.7;

/// The fields of a task the evaluator reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioTask {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub due_at: Option<DateTime<FixedOffset>>,
    pub estimated_minutes: i64,
}

impl ScenarioTask {
    pub fn from_record(record: &TaskRecord) -> AppResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            title: record.title.clone(),
            status: record.status,
            due_at: schedule_utils::parse_optional_datetime(record.due_at.as_ref())?,
            estimated_minutes: record.estimated_minutes.unwrap_or(DEFAULT_ESTIMATED_MINUTES),
        })
    }
}

/// Sub-calculations of the scenario model that are still simplified.
pub trait ScenarioHeuristics: Send + Sync {
    fn workload_impact(&self, distribution: WorkloadDistribution, tasks: &[ScenarioTask]) -> f64;

    /// Share of tasks whose deadlines sit close together, 0..1.
    fn deadline_density(&self, tasks: &[ScenarioTask], params: &ScenarioParams) -> f64;

    /// Estimated work relative to time-block capacity, 0..1.
    fn workload_pressure(&self, tasks: &[ScenarioTask], params: &ScenarioParams) -> f64;

    fn alignment_score(&self, preferences: &StudyPreferences, patterns: &StudyPatterns) -> f64;

    fn optimal_date(
        &self,
        task: &ScenarioTask,
        due_at: DateTime<FixedOffset>,
        patterns: &StudyPatterns,
        params: &ScenarioParams,
    ) -> DateTime<FixedOffset>;
}

/// Fixed values; the optimal date is the current due date.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderHeuristics;

impl ScenarioHeuristics for PlaceholderHeuristics {
    fn workload_impact(&self, _distribution: WorkloadDistribution, _tasks: &[ScenarioTask]) -> f64 {
        PLACEHOLDER_WORKLOAD_IMPACT
    }

    fn deadline_density(&self, _tasks: &[ScenarioTask], _params: &ScenarioParams) -> f64 {
        PLACEHOLDER_DEADLINE_DENSITY
    }

    fn workload_pressure(&self, _tasks: &[ScenarioTask], _params: &ScenarioParams) -> f64 {
        PLACEHOLDER_WORKLOAD_PRESSURE
    }

    fn alignment_score(&self, _preferences: &StudyPreferences, _patterns: &StudyPatterns) -> f64 {
        PLACEHOLDER_ALIGNMENT_SCORE
    }

    fn optimal_date(
        &self,
        _task: &ScenarioTask,
        due_at: DateTime<FixedOffset>,
        _patterns: &StudyPatterns,
        _params: &ScenarioParams,
    ) -> DateTime<FixedOffset> {
        due_at
    }
}

pub fn evaluate_scenario(
    tasks: &[ScenarioTask],
    patterns: &StudyPatterns,
    params: &ScenarioParams,
    heuristics: &dyn ScenarioHeuristics,
) -> ScenarioImpact {
    let density = heuristics.deadline_density(tasks, params);
    let pressure = heuristics.workload_pressure(tasks, params);
    let alignment = params
        .study_preferences
        .as_ref()
        .map(|prefs| heuristics.alignment_score(prefs, patterns));

    let completion_probability = completion_probability(tasks, patterns, params, heuristics);
    let stress_level = (BASE_STRESS
        + DEADLINE_DENSITY_WEIGHT * density
        + WORKLOAD_PRESSURE_WEIGHT * pressure)
        .clamp(0.0, 100.0);
    let productivity_score = (patterns.avg_productivity * RATING_TO_SCORE
        + alignment.map(|a| ALIGNMENT_WEIGHT * a).unwrap_or(0.0))
    .clamp(0.0, 100.0);

    ScenarioImpact {
        completion_probability,
        stress_level,
        productivity_score,
        recommendations: scenario_recommendations(patterns, pressure),
        risks: scenario_risks(density, pressure, alignment),
        timeline_adjustments: timeline_adjustments(tasks, patterns, params, heuristics),
    }
}

pub fn historical_completion_rate(tasks: &[ScenarioTask]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks.iter().filter(|t| t.status.is_completed()).count();
    completed as f64 / tasks.len() as f64
}

/// Share of `proposed` hour labels that the analyzer also ranked as preferred.
pub fn time_alignment(proposed: &[String], preferred: &[String]) -> f64 {
    if proposed.is_empty() {
        return 0.0;
    }
    let preferred: HashSet<String> = preferred.iter().map(|l| normalize_hour_label(l)).collect();
    let matched = proposed
        .iter()
        .filter(|label| preferred.contains(&normalize_hour_label(label)))
        .count();
    matched as f64 / proposed.len() as f64
}

fn normalize_hour_label(label: &str) -> String {
    let trimmed = label.trim();
    let hour = trimmed
        .split_once(':')
        .map(|(hour, _)| hour)
        .unwrap_or(trimmed);
    match hour.parse::<u32>() {
        Ok(value) if value < 24 => format!("{value}:00"),
        _ => trimmed.to_string(),
    }
}

fn completion_probability(
    tasks: &[ScenarioTask],
    patterns: &StudyPatterns,
    params: &ScenarioParams,
    heuristics: &dyn ScenarioHeuristics,
) -> f64 {
    let rate = historical_completion_rate(tasks);
    let mut probability = BASE_COMPLETION + HISTORY_WEIGHT * (rate - BASE_COMPLETION);

    if let Some(proposed) = params
        .study_preferences
        .as_ref()
        .and_then(|prefs| prefs.preferred_times.as_ref())
    {
        probability += TIME_ALIGNMENT_WEIGHT * time_alignment(proposed, &patterns.preferred_times);
    }

    if let Some(distribution) = params.workload_distribution {
        probability += WORKLOAD_WEIGHT * heuristics.workload_impact(distribution, tasks);
    }

    probability.clamp(0.0, 1.0)
}

fn scenario_recommendations(patterns: &StudyPatterns, pressure: f64) -> Vec<String> {
    let mut recommendations = Vec::new();
    if !patterns.preferred_times.is_empty() {
        recommendations.push(format!(
            "Schedule demanding study sessions during your most productive hours: {}",
            patterns.preferred_times.join(", ")
        ));
    }
    if pressure > REDISTRIBUTE_PRESSURE {
        recommendations.push(
            "Workload is heavy for the available time: consider redistributing tasks across more days"
                .to_string(),
        );
    }
    if patterns.success_patterns.found() {
        recommendations.push(format!(
            "Keep a 25-minute focus / 5-minute break rhythm; your best sessions average {:.0} minutes",
            patterns.success_patterns.avg_duration_minutes
        ));
    }
    recommendations
}

fn scenario_risks(density: f64, pressure: f64, alignment: Option<f64>) -> Vec<String> {
    let mut risks = Vec::new();
    if density > DEADLINE_RISK_DENSITY {
        risks.push(
            "High risk of deadline conflicts: several deadlines are clustered together".to_string(),
        );
    }
    if pressure > BURNOUT_PRESSURE {
        risks.push("Potential burnout risk: planned work exceeds comfortable capacity".to_string());
    }
    if alignment.map(|a| a < DEVIATION_ALIGNMENT).unwrap_or(false) {
        risks.push("Significant deviation from successful study patterns".to_string());
    }
    risks
}

fn timeline_adjustments(
    tasks: &[ScenarioTask],
    patterns: &StudyPatterns,
    params: &ScenarioParams,
    heuristics: &dyn ScenarioHeuristics,
) -> Vec<TimelineAdjustment> {
    tasks
        .iter()
        .filter(|task| !task.status.is_completed())
        .filter_map(|task| {
            let due_at = task.due_at?;
            let suggested = heuristics.optimal_date(task, due_at, patterns, params);
            if suggested == due_at {
                return None;
            }
            let reason = match schedule_utils::day_delta(due_at, suggested) {
                d if d > 0 => format!(
                    "Suggesting a delay of {d} days based on productivity patterns and workload"
                ),
                d => format!(
                    "Recommending completion {} days earlier based on upcoming workload and peak productivity times",
                    d.abs()
                ),
            };
            Some(TimelineAdjustment {
                task_id: task.id.clone(),
                title: task.title.clone(),
                original_date: schedule_utils::format_datetime(due_at),
                suggested_date: schedule_utils::format_datetime(suggested),
                reason,
            })
        })
        .collect()
}

/// Parses caller-supplied date strings into instants.
pub fn parse_scenario_params(input: &ScenarioParamsInput) -> AppResult<ScenarioParams> {
    let adjusted_deadlines = input
        .adjusted_deadlines
        .iter()
        .flatten()
        .map(|raw| schedule_utils::parse_datetime(raw))
        .collect::<AppResult<Vec<_>>>()?;

    let time_blocks = input
        .time_blocks
        .iter()
        .flatten()
        .map(|block| {
            let start = schedule_utils::parse_datetime(&block.start)?;
            let end = schedule_utils::parse_datetime(&block.end)?;
            schedule_utils::ensure_window(start, end)?;
            Ok(TimeBlock { start, end })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let workload_distribution = input
        .workload_distribution
        .as_deref()
        .map(|raw| {
            WorkloadDistribution::try_from(raw).map_err(|message| {
                AppError::validation_with_details(message, json!({ "value": raw }))
            })
        })
        .transpose()?;

    if let Some(prefs) = &input.study_preferences {
        for (field, value) in [
            ("breakDuration", prefs.break_duration),
            ("sessionLength", prefs.session_length),
        ] {
            if let Some(minutes) = value {
                if minutes <= 0 {
                    return Err(AppError::validation_with_details(
                        "study preference durations must be positive",
                        json!({ "field": field, "value": minutes }),
                    ));
                }
            }
        }
    }

    Ok(ScenarioParams {
        adjusted_deadlines,
        time_blocks,
        study_preferences: input.study_preferences.clone(),
        workload_distribution,
    })
}

pub struct WhatIfService {
    db: DbPool,
    patterns: Arc<StudyPatternService>,
    heuristics: Arc<dyn ScenarioHeuristics>,
}

impl WhatIfService {
    pub fn new(db: DbPool, patterns: Arc<StudyPatternService>) -> Self {
        Self::with_heuristics(db, patterns, Arc::new(PlaceholderHeuristics))
    }

    pub fn with_heuristics(
        db: DbPool,
        patterns: Arc<StudyPatternService>,
        heuristics: Arc<dyn ScenarioHeuristics>,
    ) -> Self {
        Self {
            db,
            patterns,
            heuristics,
        }
    }

    pub fn analyze_scenario(
        &self,
        profile_id: &str,
        request: AnalyzeWhatIfRequest,
    ) -> AppResult<ScenarioImpact> {
        let params = parse_scenario_params(&request.params)?;
        let patterns = self.patterns.analyze_patterns(profile_id)?;

        let records = self.db.with_connection(|conn| {
            let rows = TaskRepository::list_for_profile(conn, profile_id)?;
            rows.into_iter()
                .map(|row| row.into_record())
                .collect::<AppResult<Vec<_>>>()
        })?;
        let tasks = records
            .iter()
            .map(ScenarioTask::from_record)
            .collect::<AppResult<Vec<_>>>()?;
        debug!(
            target: "app::what_if",
            profile_id,
            scenario = %request.scenario_type,
            tasks = tasks.len(),
            "evaluating scenario"
        );

        let impact = evaluate_scenario(&tasks, &patterns, &params, self.heuristics.as_ref());
        info!(
            target: "app::what_if",
            profile_id,
            completion = impact.completion_probability,
            stress = impact.stress_level,
            productivity = impact.productivity_score,
            adjustments = impact.timeline_adjustments.len(),
            "scenario analyzed"
        );
        Ok(impact)
    }
}
