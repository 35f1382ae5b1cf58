//! Date builtins.
//!
//! Dates are naive local datetimes. String inputs are coerced through the
//! same ISO formats the lexer accepts, so `year(due)` works whether `due`
//! was stored as a date or a string property.

use super::FunctionContext;
use crate::engine::errors::RuntimeError;
use crate::value::Value;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

/// Coerce a value to a datetime: dates pass through, strings try the ISO
/// forms, everything else is `None`.
pub(crate) fn coerce_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(*d),
        Value::String(s) => parse_iso(s),
        _ => None,
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub(crate) fn today_midnight() -> NaiveDateTime {
    Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
}

pub(super) fn now(_args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    Ok(Value::Date(Local::now().naive_local()))
}

/// `date()` — today at midnight; `date(x)` — coerce `x` to a date.
pub(super) fn date(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match args.first() {
        None => Ok(Value::Date(today_midnight())),
        Some(value) => Ok(coerce_date(value).map(Value::Date).unwrap_or(Value::Null)),
    }
}

macro_rules! date_field {
    ($name:ident, $get:expr) => {
        pub(super) fn $name(
            args: &[Value],
            _ctx: &dyn FunctionContext,
        ) -> Result<Value, RuntimeError> {
            let field = $get;
            Ok(coerce_date(&args[0])
                .map(|d| Value::Number(field(d) as f64))
                .unwrap_or(Value::Null))
        }
    };
}

date_field!(year, |d: NaiveDateTime| d.year());
date_field!(month, |d: NaiveDateTime| d.month());
date_field!(day, |d: NaiveDateTime| d.day());
// Sunday = 0, matching the host's calendar widgets.
date_field!(weekday, |d: NaiveDateTime| d.weekday().num_days_from_sunday());
date_field!(hours, |d: NaiveDateTime| d.hour());
date_field!(minutes, |d: NaiveDateTime| d.minute());

/// `format(date, pattern)` — `YYYY MM DD HH mm ss` placeholders.
pub(super) fn format(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    let Some(d) = coerce_date(&args[0]) else {
        return Ok(Value::Null);
    };
    let Value::String(pattern) = &args[1] else {
        return Ok(Value::Null);
    };
    let formatted = pattern
        .replace("YYYY", &d.format("%Y").to_string())
        .replace("MM", &d.format("%m").to_string())
        .replace("DD", &d.format("%d").to_string())
        .replace("HH", &d.format("%H").to_string())
        .replace("mm", &d.format("%M").to_string())
        .replace("ss", &d.format("%S").to_string());
    Ok(Value::String(formatted))
}

/// `dateDiff(from, to, unit?)` — elapsed time from `from` to `to`,
/// floored. Units: `ms`, `seconds`, `minutes`, `hours`, `days` (default).
pub(super) fn date_diff(args: &[Value], _ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    let (Some(from), Some(to)) = (coerce_date(&args[0]), coerce_date(&args[1])) else {
        return Ok(Value::Null);
    };
    let unit = match args.get(2) {
        Some(Value::String(u)) => u.as_str(),
        Some(_) => return Ok(Value::Null),
        None => "days",
    };
    let millis = (to - from).num_milliseconds() as f64;
    let divisor = match unit {
        "ms" => 1.0,
        "seconds" => 1_000.0,
        "minutes" => 60_000.0,
        "hours" => 3_600_000.0,
        "days" => 86_400_000.0,
        _ => return Ok(Value::Null),
    };
    Ok(Value::Number((millis / divisor).floor()))
}
