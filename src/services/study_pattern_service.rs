use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::db::repositories::profile_repository::ProfileRepository;
use crate::db::repositories::study_session_repository::StudySessionRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::{
    SchedulerSettings, DEFAULT_PATTERN_WINDOW, DEFAULT_PREFERRED_HOUR_COUNT,
    DEFAULT_SUCCESS_RATING_THRESHOLD,
};
use crate::models::study_pattern::{StudyPatterns, SuccessPatterns};
use crate::models::study_session::StudySessionRecord;
use crate::services::schedule_utils;
use crate::services::settings_service::SettingsService;

/// The fields of a study session the analyzer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSample {
    pub started_at: DateTime<FixedOffset>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub productivity_rating: Option<f64>,
}

impl SessionSample {
    pub fn from_record(record: &StudySessionRecord) -> AppResult<Self> {
        Ok(Self {
            started_at: schedule_utils::parse_datetime(&record.started_at)?,
            completed_at: schedule_utils::parse_optional_datetime(record.completed_at.as_ref())?,
            productivity_rating: record.productivity_rating,
        })
    }

    fn rating_or_zero(&self) -> f64 {
        self.productivity_rating.unwrap_or(0.0)
    }

    fn elapsed_minutes(&self) -> f64 {
        match self.completed_at {
            Some(done) => done.signed_duration_since(self.started_at).num_seconds() as f64 / 60.0,
            None => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternPolicy {
    pub tz: Tz,
    pub window: usize,
    pub preferred_hour_count: usize,
    pub success_rating_threshold: f64,
}

impl Default for PatternPolicy {
    fn default() -> Self {
        Self {
            tz: Tz::UTC,
            window: DEFAULT_PATTERN_WINDOW,
            preferred_hour_count: DEFAULT_PREFERRED_HOUR_COUNT,
            success_rating_threshold: DEFAULT_SUCCESS_RATING_THRESHOLD,
        }
    }
}

impl PatternPolicy {
    pub fn from_settings(settings: &SchedulerSettings) -> AppResult<Self> {
        Ok(Self {
            tz: schedule_utils::parse_timezone(&settings.timezone)?,
            window: settings.pattern_window,
            preferred_hour_count: settings.preferred_hour_count,
            success_rating_threshold: settings.success_rating_threshold,
        })
    }
}

/// Aggregates the most recent `policy.window` sessions. Unrated sessions count
/// as a rating of 0 in every average.
pub fn analyze_sessions(samples: &[SessionSample], policy: &PatternPolicy) -> StudyPatterns {
    let mut recent: Vec<&SessionSample> = samples.iter().collect();
    recent.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    recent.truncate(policy.window);

    if recent.is_empty() {
        return StudyPatterns::default();
    }

    let avg_productivity =
        recent.iter().map(|s| s.rating_or_zero()).sum::<f64>() / recent.len() as f64;

    StudyPatterns {
        avg_productivity,
        preferred_times: preferred_hours(&recent, policy),
        success_patterns: success_patterns(&recent, policy.success_rating_threshold),
    }
}

fn preferred_hours(sessions: &[&SessionSample], policy: &PatternPolicy) -> Vec<String> {
    let mut by_hour: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for session in sessions {
        let hour = schedule_utils::hour_in(session.started_at, policy.tz);
        let entry = by_hour.entry(hour).or_insert((0.0, 0));
        entry.0 += session.rating_or_zero();
        entry.1 += 1;
    }

    let mut ranked: Vec<(u32, f64)> = by_hour
        .into_iter()
        .map(|(hour, (sum, count))| (hour, sum / count as f64))
        .collect();
    // stable sort keeps earlier hours first on ties
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    ranked
        .into_iter()
        .take(policy.preferred_hour_count)
        .map(|(hour, _)| format!("{hour}:00"))
        .collect()
}

fn success_patterns(sessions: &[&SessionSample], threshold: f64) -> SuccessPatterns {
    let successful: Vec<&&SessionSample> = sessions
        .iter()
        .filter(|s| s.productivity_rating.map(|r| r > threshold).unwrap_or(false))
        .collect();

    if successful.is_empty() {
        return SuccessPatterns::default();
    }

    let total: f64 = successful.iter().map(|s| s.elapsed_minutes()).sum();
    SuccessPatterns {
        session_count: successful.len(),
        avg_duration_minutes: total / successful.len() as f64,
    }
}

pub struct StudyPatternService {
    db: DbPool,
    settings: Arc<SettingsService>,
}

impl StudyPatternService {
    pub fn new(db: DbPool, settings: Arc<SettingsService>) -> Self {
        Self { db, settings }
    }

    pub fn analyze_patterns(&self, profile_id: &str) -> AppResult<StudyPatterns> {
        let settings = self.settings.get()?;
        let policy = PatternPolicy::from_settings(&settings)?;

        let records = self.db.with_connection(|conn| {
            ProfileRepository::find_by_id(conn, profile_id)?.ok_or_else(AppError::not_found)?;
            let rows = StudySessionRepository::list_recent(conn, profile_id, policy.window)?;
            rows.into_iter()
                .map(|row| row.into_record())
                .collect::<AppResult<Vec<_>>>()
        })?;

        let samples = records
            .iter()
            .map(SessionSample::from_record)
            .collect::<AppResult<Vec<_>>>()?;
        debug!(target: "app::patterns", profile_id, sessions = samples.len(), "sessions loaded");

        let patterns = analyze_sessions(&samples, &policy);
        info!(
            target: "app::patterns",
            profile_id,
            avg_productivity = patterns.avg_productivity,
            preferred = ?patterns.preferred_times,
            "study patterns analyzed"
        );
        Ok(patterns)
    }
}
