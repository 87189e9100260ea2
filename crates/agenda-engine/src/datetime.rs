//! Wall-clock date helpers shared by the expander, the draft editor and the duplicator.
//!
//! Everything here is local wall-clock arithmetic on `chrono::Naive*` values. No timezone
//! conversion happens anywhere in the engine: a date-key is simply the calendar day of a
//! naive datetime.

use chrono::{Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ValidationError;
use crate::model::Frequency;

/// Format used for date-keys (`2024-01-15`).
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Format used for occurrence identifiers and draft round-trips (`2024-01-15T10:00:00`).
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format the draft editor presents for timed values (`2024-01-15T10:00`).
pub const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// The date-key of a wall-clock instant.
pub fn date_key(dt: NaiveDateTime) -> String {
    day_key(dt.date())
}

pub fn day_key(day: NaiveDate) -> String {
    day.format(DATE_KEY_FORMAT).to_string()
}

pub fn format_iso(dt: NaiveDateTime) -> String {
    dt.format(ISO_FORMAT).to_string()
}

pub fn format_local_input(dt: NaiveDateTime) -> String {
    dt.format(LOCAL_INPUT_FORMAT).to_string()
}

/// Parse a strict `YYYY-MM-DD` date-key. Out-of-range days (`2024-02-30`) are rejected.
pub fn parse_date_key(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_KEY_FORMAT).ok()
}

/// Parse `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    match raw.len() {
        16 => NaiveDateTime::parse_from_str(raw, LOCAL_INPUT_FORMAT).ok(),
        19 => NaiveDateTime::parse_from_str(raw, ISO_FORMAT).ok(),
        _ => None,
    }
}

/// Parse a draft field. All-day drafts hold a bare date (midnight is implied).
pub fn parse_draft_value(raw: &str, all_day: bool) -> Result<NaiveDateTime, ValidationError> {
    let raw = raw.trim();
    let parsed = if all_day {
        parse_date_key(raw).map(midnight)
    } else {
        parse_local_datetime(raw)
    };
    parsed.ok_or_else(|| {
        tracing::debug!(raw, all_day, "invalid draft date");
        ValidationError::InvalidDateTime(raw.to_string())
    })
}

pub fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

pub fn is_midnight(dt: NaiveDateTime) -> bool {
    dt.time() == NaiveTime::MIN
}

/// Exclusive end of an all-day span whose inclusive last day is `last_day`.
pub fn exclusive_all_day_end(last_day: NaiveDate) -> NaiveDateTime {
    midnight(last_day + Duration::days(1))
}

/// Inclusive last day of an all-day span ending (exclusively) at `end`.
pub fn inclusive_last_day(end: NaiveDateTime) -> NaiveDate {
    (end - Duration::seconds(1)).date()
}

/// Advance `base` by `steps` recurrence steps of `interval` units each.
///
/// Monthly steps are taken from `base` in one jump, so a series anchored on the 31st lands
/// on the last day of shorter months without drifting for the rest of the series.
pub fn add_recurrence_steps(
    base: NaiveDateTime,
    freq: Frequency,
    interval: u32,
    steps: u32,
) -> Option<NaiveDateTime> {
    let units = interval.checked_mul(steps)?;
    match freq {
        Frequency::Daily => base.checked_add_signed(Duration::days(i64::from(units))),
        Frequency::Weekly => base.checked_add_signed(Duration::days(i64::from(units) * 7)),
        Frequency::Monthly => base.checked_add_months(Months::new(units)),
    }
}

/// Shift by whole calendar days, keeping the time of day. `None` past the calendar's limits.
pub fn shift_days(dt: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    dt.checked_add_signed(Duration::try_days(days)?)
}

pub fn add_minutes(dt: NaiveDateTime, minutes: i64) -> Option<NaiveDateTime> {
    dt.checked_add_signed(Duration::try_minutes(minutes)?)
}

/// Signed number of calendar days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
