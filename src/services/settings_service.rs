use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::{
    AppSettingRow, SettingsRepository, SCHEDULER_KEY_PREFIX,
};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::{SchedulerSettings, SettingsUpdateInput};
use crate::services::schedule_utils;

const KEY_TIMEZONE: &str = "scheduler.timezone";
const KEY_DEFAULT_START_HOUR: &str = "scheduler.default_start_hour";
const KEY_DEFAULT_LEAD_HOURS: &str = "scheduler.default_lead_hours";
const KEY_FALLBACK_LEAD_HOURS: &str = "scheduler.fallback_lead_hours";
const KEY_DEFAULT_DURATION: &str = "scheduler.default_duration_minutes";
const KEY_PATTERN_WINDOW: &str = "scheduler.pattern_window";
const KEY_PREFERRED_HOUR_COUNT: &str = "scheduler.preferred_hour_count";
const KEY_SUCCESS_THRESHOLD: &str = "scheduler.success_rating_threshold";

const MAX_PATTERN_WINDOW: usize = 200;
const MAX_PREFERRED_HOURS: usize = 24;

pub struct SettingsService {
    db: DbPool,
    cache: RwLock<Option<SchedulerSettings>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            cache: RwLock::new(None),
        }
    }

    pub fn get(&self) -> AppResult<SchedulerSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = self.load_settings_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    /// Applies the provided fields on top of the current settings. Nothing is
    /// written unless every field passes validation.
    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<SchedulerSettings> {
        let mut current = self.get()?;

        if let Some(timezone) = input.timezone.as_ref() {
            let trimmed = timezone.trim();
            schedule_utils::parse_timezone(trimmed)?;
            current.timezone = trimmed.to_string();
        }

        if let Some(hour) = input.default_start_hour {
            if hour > 23 {
                return Err(AppError::validation_with_details(
                    "default start hour must be between 0 and 23",
                    json!({ "field": "defaultStartHour", "value": hour }),
                ));
            }
            current.default_start_hour = hour;
        }

        if let Some(hours) = input.default_lead_hours {
            ensure_positive("defaultLeadHours", hours)?;
            current.default_lead_hours = hours;
        }

        if let Some(hours) = input.fallback_lead_hours {
            ensure_positive("fallbackLeadHours", hours)?;
            current.fallback_lead_hours = hours;
        }

        if let Some(minutes) = input.default_duration_minutes {
            ensure_positive("defaultDurationMinutes", minutes)?;
            current.default_duration_minutes = minutes;
        }

        if let Some(window) = input.pattern_window {
            if window == 0 || window > MAX_PATTERN_WINDOW {
                return Err(AppError::validation_with_details(
                    format!("pattern window must be between 1 and {MAX_PATTERN_WINDOW}"),
                    json!({ "field": "patternWindow", "value": window }),
                ));
            }
            current.pattern_window = window;
        }

        if let Some(count) = input.preferred_hour_count {
            if count == 0 || count > MAX_PREFERRED_HOURS {
                return Err(AppError::validation_with_details(
                    format!("preferred hour count must be between 1 and {MAX_PREFERRED_HOURS}"),
                    json!({ "field": "preferredHourCount", "value": count }),
                ));
            }
            current.preferred_hour_count = count;
        }

        if let Some(threshold) = input.success_rating_threshold {
            if !threshold.is_finite() || !(1.0..=5.0).contains(&threshold) {
                return Err(AppError::validation_with_details(
                    "success rating threshold must be between 1 and 5",
                    json!({ "field": "successRatingThreshold", "value": threshold }),
                ));
            }
            current.success_rating_threshold = threshold;
        }

        let now = Utc::now().to_rfc3339();
        self.persist(&current, &now)?;
        current.updated_at = now;

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(current.clone());
        }

        info!(
            target: "app::settings",
            timezone = %current.timezone,
            pattern_window = current.pattern_window,
            "scheduler settings updated"
        );
        Ok(current)
    }

    fn persist(&self, settings: &SchedulerSettings, now: &str) -> AppResult<()> {
        let entries = [
            (KEY_TIMEZONE, settings.timezone.clone()),
            (KEY_DEFAULT_START_HOUR, settings.default_start_hour.to_string()),
            (KEY_DEFAULT_LEAD_HOURS, settings.default_lead_hours.to_string()),
            (KEY_FALLBACK_LEAD_HOURS, settings.fallback_lead_hours.to_string()),
            (KEY_DEFAULT_DURATION, settings.default_duration_minutes.to_string()),
            (KEY_PATTERN_WINDOW, settings.pattern_window.to_string()),
            (KEY_PREFERRED_HOUR_COUNT, settings.preferred_hour_count.to_string()),
            (KEY_SUCCESS_THRESHOLD, settings.success_rating_threshold.to_string()),
        ];

        self.db.with_transaction(|conn| {
            for (key, value) in entries.iter() {
                SettingsRepository::upsert(conn, key, value, now)?;
            }
            Ok(())
        })
    }

    fn load_settings_from_db(&self) -> AppResult<SchedulerSettings> {
        let rows = self
            .db
            .with_connection(|conn| SettingsRepository::list_with_prefix(conn, SCHEDULER_KEY_PREFIX))?;

        let mut latest_updated_at: Option<String> = None;
        let mut map: HashMap<String, AppSettingRow> = HashMap::new();
        for row in rows {
            latest_updated_at = match latest_updated_at {
                Some(ref current) if current >= &row.updated_at => Some(current.clone()),
                _ => Some(row.updated_at.clone()),
            };
            map.insert(row.key.clone(), row);
        }

        let defaults = SchedulerSettings::default();
        let timezone = map
            .get(KEY_TIMEZONE)
            .map(|row| row.value.clone())
            .filter(|value| schedule_utils::parse_timezone(value).is_ok())
            .unwrap_or(defaults.timezone);

        Ok(SchedulerSettings {
            timezone,
            default_start_hour: parse_or(&map, KEY_DEFAULT_START_HOUR, defaults.default_start_hour),
            default_lead_hours: parse_or(&map, KEY_DEFAULT_LEAD_HOURS, defaults.default_lead_hours),
            fallback_lead_hours: parse_or(
                &map,
                KEY_FALLBACK_LEAD_HOURS,
                defaults.fallback_lead_hours,
            ),
            default_duration_minutes: parse_or(
                &map,
                KEY_DEFAULT_DURATION,
                defaults.default_duration_minutes,
            ),
            pattern_window: parse_or(&map, KEY_PATTERN_WINDOW, defaults.pattern_window),
            preferred_hour_count: parse_or(
                &map,
                KEY_PREFERRED_HOUR_COUNT,
                defaults.preferred_hour_count,
            ),
            success_rating_threshold: parse_or(
                &map,
                KEY_SUCCESS_THRESHOLD,
                defaults.success_rating_threshold,
            ),
            updated_at: latest_updated_at.unwrap_or_default(),
        })
    }
}

fn ensure_positive(field: &str, value: i64) -> AppResult<()> {
    if value <= 0 {
        return Err(AppError::validation_with_details(
            format!("{field} must be greater than zero"),
            json!({ "field": field, "value": value }),
        ));
    }
    Ok(())
}

fn parse_or<T: FromStr + Copy>(map: &HashMap<String, AppSettingRow>, key: &str, fallback: T) -> T {
    match map.get(key) {
        Some(row) => match row.value.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    target: "app::settings",
                    key,
                    value = %row.value,
                    "ignoring unparsable setting"
                );
                fallback
            }
        },
        None => fallback,
    }
}
