use chrono::{DateTime, Local, TimeZone, Utc};

/// Shown for values a device has not reported.
pub const MISSING: &str = "-";

/// Shown while a device's tags are still loading.
pub const LOADING: &str = "Loading...";

#[derive(Clone, Copy)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl Unit {
    fn seconds(self) -> f64 {
        match self {
            Unit::Second => 1.0,
            Unit::Minute => 60.0,
            Unit::Hour => 3_600.0,
            Unit::Day => 86_400.0,
            Unit::Month => 86_400.0 * 30.436_875,
            Unit::Year => 86_400.0 * 365.2425,
        }
    }
}

/// (label, upper bound of the rounded amount, unit the amount is measured in)
///
/// A row without its own unit keeps measuring in the previous row's unit,
/// so "a minute" covers up to 89 seconds and "a day" up to 35 hours.
const THRESHOLDS: &[(&str, Option<i64>, Option<Unit>)] = &[
    ("s", Some(44), Some(Unit::Second)),
    ("m", Some(89), None),
    ("mm", Some(44), Some(Unit::Minute)),
    ("h", Some(89), None),
    ("hh", Some(21), Some(Unit::Hour)),
    ("d", Some(35), None),
    ("dd", Some(25), Some(Unit::Day)),
    ("M", Some(45), None),
    ("MM", Some(10), Some(Unit::Month)),
    ("y", Some(17), None),
    ("yy", None, Some(Unit::Year)),
];

fn humanize(seconds: f64) -> String {
    let mut amount = 0;
    for (label, bound, unit) in THRESHOLDS {
        if let Some(unit) = unit {
            amount = (seconds / unit.seconds()).round() as i64;
        }
        if bound.map_or(true, |bound| amount <= bound) {
            return match *label {
                "s" => "a few seconds".to_string(),
                "m" => "a minute".to_string(),
                "mm" => format!("{} minutes", amount),
                "h" => "an hour".to_string(),
                "hh" => format!("{} hours", amount),
                "d" => "a day".to_string(),
                "dd" => format!("{} days", amount),
                "M" => "a month".to_string(),
                "MM" => format!("{} months", amount),
                "y" => "a year".to_string(),
                _ => format!("{} years", amount),
            };
        }
    }
    unreachable!("the last threshold is unbounded")
}

/// Epoch milliseconds as a UTC datetime, `None` when out of range.
pub fn datetime_from_millis(timestamp_ms: f64) -> Option<DateTime<Utc>> {
    if !timestamp_ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(timestamp_ms.round() as i64)
}

/// Relative time from `now`, e.g. "in 3 days" or "2 hours ago".
pub fn format_relative(timestamp_ms: f64, now: DateTime<Utc>) -> String {
    let Some(then) = datetime_from_millis(timestamp_ms) else {
        return MISSING.to_string();
    };
    let delta_ms = then.signed_duration_since(now).num_milliseconds();
    let text = humanize(delta_ms.unsigned_abs() as f64 / 1000.0);
    if delta_ms > 0 {
        format!("in {}", text)
    } else {
        format!("{} ago", text)
    }
}

/// Long absolute form in the local timezone, e.g.
/// "Thursday, August 16, 2018 8:02 PM".
pub fn format_absolute(timestamp_ms: f64) -> String {
    format_absolute_in(timestamp_ms, &Local)
}

pub fn format_absolute_in<Tz>(timestamp_ms: f64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match datetime_from_millis(timestamp_ms) {
        Some(then) => then
            .with_timezone(tz)
            .format("%A, %B %-d, %Y %-I:%M %p")
            .to_string(),
        None => MISSING.to_string(),
    }
}

pub fn is_past(timestamp_ms: f64, now: DateTime<Utc>) -> bool {
    datetime_from_millis(timestamp_ms).is_some_and(|then| then < now)
}

/// Round half up, so -2.5 becomes -2 and 2.5 becomes 3.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Whole-number display of a remaining amount, "-" when absent.
pub fn format_rounded(value: Option<f64>) -> String {
    value
        .map(|v| round_half_up(v).to_string())
        .unwrap_or_else(|| MISSING.to_string())
}
