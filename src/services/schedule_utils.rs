use chrono::{
    offset::LocalResult, DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike,
};
use chrono_tz::Tz;
use serde_json::json;

use crate::error::{AppError, AppResult};

/// A caller-supplied preferred start, keeping track of whether a time of day
/// was given at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredDate {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

pub fn parse_datetime(value: &str) -> AppResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|err| {
        AppError::validation_with_details(
            "invalid datetime format",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn parse_optional_datetime(value: Option<&String>) -> AppResult<Option<DateTime<FixedOffset>>> {
    match value {
        Some(raw) => Ok(Some(parse_datetime(raw)?)),
        None => Ok(None),
    }
}

/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM[:SS]` read in `tz`, or a
/// bare `YYYY-MM-DD`.
pub fn parse_preferred_date(value: &str, tz: Tz) -> AppResult<PreferredDate> {
    let raw = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(PreferredDate::DateTime(parsed));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(PreferredDate::DateTime(resolve_local(tz, naive)?));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(PreferredDate::Date)
        .map_err(|err| {
            AppError::validation_with_details(
                "invalid preferred date",
                json!({"value": value, "error": err.to_string()}),
            )
        })
}

pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.trim().parse::<Tz>().map_err(|err| {
        AppError::validation_with_details(
            "unknown timezone",
            json!({"value": name, "error": err.to_string()}),
        )
    })
}

/// Pins a wall-clock time in `tz`. Inside a DST gap the next existing hour is
/// used.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> AppResult<DateTime<FixedOffset>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.fixed_offset()),
        LocalResult::Ambiguous(first, _) => Ok(first.fixed_offset()),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.fixed_offset())
            .ok_or_else(|| AppError::computation(format!("local time {naive} does not exist"))),
    }
}

pub fn at_time_of_day(tz: Tz, date: NaiveDate, hour: u32) -> AppResult<DateTime<FixedOffset>> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| AppError::validation(format!("hour out of range: {hour}")))?;
    resolve_local(tz, date.and_time(time))
}

pub fn hour_in(dt: DateTime<FixedOffset>, tz: Tz) -> u32 {
    dt.with_timezone(&tz).hour()
}

pub fn format_datetime(dt: DateTime<FixedOffset>) -> String {
    dt.to_rfc3339()
}

pub fn add_minutes(dt: DateTime<FixedOffset>, minutes: i64) -> AppResult<DateTime<FixedOffset>> {
    dt.checked_add_signed(Duration::minutes(minutes))
        .ok_or_else(|| AppError::computation("time arithmetic out of range"))
}

pub fn add_hours(dt: DateTime<FixedOffset>, hours: i64) -> AppResult<DateTime<FixedOffset>> {
    dt.checked_add_signed(Duration::hours(hours))
        .ok_or_else(|| AppError::computation("time arithmetic out of range"))
}

pub fn duration_minutes(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> AppResult<i64> {
    let total = end.signed_duration_since(start).num_minutes();
    if total < 0 {
        Err(AppError::validation("end time must not precede start time"))
    } else {
        Ok(total)
    }
}

/// Half-open `[start, end)` overlap; touching endpoints do not overlap.
pub fn overlaps(
    a_start: DateTime<FixedOffset>,
    a_end: DateTime<FixedOffset>,
    b_start: DateTime<FixedOffset>,
    b_end: DateTime<FixedOffset>,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn ensure_window(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> AppResult<()> {
    if end <= start {
        Err(AppError::validation("time window end must be after its start"))
    } else {
        Ok(())
    }
}

/// Days from `from` to `to`, rounded away from zero so that any shift counts
/// as at least one day.
pub fn day_delta(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> i64 {
    let shift = to.signed_duration_since(from);
    let whole = shift.num_days();
    if shift == Duration::days(whole) {
        whole
    } else {
        whole + if shift > Duration::zero() { 1 } else { -1 }
    }
}

pub fn now_fixed() -> DateTime<FixedOffset> {
    chrono::Utc::now().fixed_offset()
}
