//! Trigger factory and fire-time computation.
//!
//! `construct_trigger` turns a declarative `TriggerDescriptor` into one of
//! three concrete triggers:
//! - `date`: fires once at `run_date`
//! - `interval`: fires every fixed period from `start_date`
//! - `cron`: fires on calendar field expressions, evaluated by `croner`
//!
//! Every failure surfaces as `TriggerError::InvalidTriggerSpec` carrying the
//! offending type and args. Nothing is silently defaulted except the fields
//! the trigger schemas document as optional.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use croner::parser::{CronParser, Seconds};
use serde_json::{Map, Value};

use cadence_types::error::TriggerError;
use cadence_types::trigger::{TriggerDescriptor, TriggerType};

/// Interval argument names and their length in seconds.
const INTERVAL_UNITS: [(&str, i64); 5] = [
    ("weeks", 7 * 24 * 3600),
    ("days", 24 * 3600),
    ("hours", 3600),
    ("minutes", 60),
    ("seconds", 1),
];

/// Cron argument names from most to least significant, with the value a
/// field takes when it is finer than every explicitly given field.
const CRON_FIELDS: [(&str, &str); 7] = [
    ("year", "*"),
    ("month", "1"),
    ("day", "1"),
    ("day_of_week", "*"),
    ("hour", "0"),
    ("minute", "0"),
    ("second", "0"),
];

/// Weekday names indexed by the Monday-first numbering cron args use.
const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Cron args with a meaning croner cannot express.
const UNSUPPORTED_CRON_KEYS: [&str; 1] = ["week"];

const DATE_KEYS: [&str; 1] = ["run_date"];
const BOUND_KEYS: [&str; 2] = ["start_date", "end_date"];

// ---------------------------------------------------------------------------
// Trigger types
// ---------------------------------------------------------------------------

/// Fires exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTrigger {
    pub run_date: DateTime<Utc>,
}

/// Fires every `every`, aligned to `start_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTrigger {
    pub every: Duration,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Fires whenever the pattern (`sec min hour day month dow [year]`) matches.
/// Day of month and day of week must both match when both are restricted.
#[derive(Clone)]
pub struct CronTrigger {
    pattern: String,
    schedule: Arc<croner::Cron>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl CronTrigger {
    /// The normalized pattern handed to the cron evaluator.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }
}

impl fmt::Debug for CronTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronTrigger")
            .field("pattern", &self.pattern)
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .finish()
    }
}

impl PartialEq for CronTrigger {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.start_date == other.start_date
            && self.end_date == other.end_date
    }
}

/// A validated trigger, ready to hand to the timer engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    OneOff(DateTrigger),
    Interval(IntervalTrigger),
    Cron(CronTrigger),
}

impl Trigger {
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            Trigger::OneOff(_) => TriggerType::Date,
            Trigger::Interval(_) => TriggerType::Interval,
            Trigger::Cron(_) => TriggerType::Cron,
        }
    }

    /// The first fire time after `previous`, or the first fire time at or
    /// after `now` when the trigger has never fired. `None` means the trigger
    /// is exhausted.
    pub fn next_fire_time(
        &self,
        previous: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match self {
            Trigger::OneOff(t) => match previous {
                Some(_) => None,
                None => Some(t.run_date),
            },
            Trigger::Interval(t) => {
                let next = match previous {
                    Some(prev) => prev.checked_add_signed(t.every)?,
                    None if t.start_date >= now => t.start_date,
                    None => {
                        let every_ms = t.every.num_milliseconds();
                        let elapsed_ms = (now - t.start_date).num_milliseconds();
                        let steps = (elapsed_ms + every_ms - 1) / every_ms;
                        let offset = Duration::milliseconds(every_ms.checked_mul(steps)?);
                        t.start_date.checked_add_signed(offset)?
                    }
                };
                bounded(next, t.end_date)
            }
            Trigger::Cron(t) => {
                let mut anchor = previous.unwrap_or(now);
                if let Some(start) = t.start_date {
                    if start > anchor {
                        anchor = start - Duration::seconds(1);
                    }
                }
                let next = t
                    .schedule
                    .iter_after(anchor)
                    .find(|candidate| t.start_date.is_none_or(|start| *candidate >= start))?;
                bounded(next, t.end_date)
            }
        }
    }

    /// Up to `count` upcoming fire times, starting from `now`.
    pub fn preview(&self, now: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let mut times = Vec::with_capacity(count);
        let mut previous = None;
        while times.len() < count {
            match self.next_fire_time(previous, now) {
                Some(next) => {
                    times.push(next);
                    previous = Some(next);
                }
                None => break,
            }
        }
        times
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::OneOff(t) => write!(f, "date[{}]", t.run_date.to_rfc3339()),
            Trigger::Interval(t) => write!(f, "interval[{}s]", t.every.num_seconds()),
            Trigger::Cron(t) => write!(f, "cron[{}]", t.pattern),
        }
    }
}

fn bounded(next: DateTime<Utc>, end_date: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match end_date {
        Some(end) if next > end => None,
        _ => Some(next),
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build a concrete trigger from a descriptor.
pub fn construct_trigger(descriptor: &TriggerDescriptor) -> Result<Trigger, TriggerError> {
    construct_trigger_at(descriptor, Utc::now())
}

/// Like `construct_trigger`, with `now` used for interval start defaults.
pub fn construct_trigger_at(
    descriptor: &TriggerDescriptor,
    now: DateTime<Utc>,
) -> Result<Trigger, TriggerError> {
    let invalid = |reason: String| {
        TriggerError::invalid(&descriptor.trigger_type, &descriptor.args, reason)
    };

    let trigger_type: TriggerType = descriptor
        .trigger_type
        .parse()
        .map_err(|_| invalid("unknown trigger type".to_string()))?;

    let args = match &descriptor.args {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        _ => return Err(invalid("trigger args must be an object".to_string())),
    };

    let allowed: Vec<&str> = match trigger_type {
        TriggerType::Date => DATE_KEYS.to_vec(),
        TriggerType::Interval => INTERVAL_UNITS
            .iter()
            .map(|(name, _)| *name)
            .chain(BOUND_KEYS)
            .collect(),
        TriggerType::Cron => CRON_FIELDS
            .iter()
            .map(|(name, _)| *name)
            .chain(BOUND_KEYS)
            .collect(),
    };
    let unsupported = args
        .keys()
        .find(|key| UNSUPPORTED_CRON_KEYS.contains(&key.as_str()));
    if let (TriggerType::Cron, Some(key)) = (trigger_type, unsupported) {
        return Err(invalid(format!("'{key}' is not supported by cron triggers")));
    }
    if let Some(unknown) = args.keys().find(|key| !allowed.contains(&key.as_str())) {
        return Err(invalid(format!("unexpected argument '{unknown}'")));
    }

    let date_arg = |key: &str| -> Result<Option<DateTime<Utc>>, TriggerError> {
        args.get(key)
            .filter(|value| !value.is_null())
            .map(|value| parse_datetime(value).map_err(|e| invalid(format!("{key}: {e}"))))
            .transpose()
    };

    match trigger_type {
        TriggerType::Date => {
            let run_date = date_arg("run_date")?
                .ok_or_else(|| invalid("missing required argument 'run_date'".to_string()))?;
            Ok(Trigger::OneOff(DateTrigger { run_date }))
        }
        TriggerType::Interval => {
            let mut total_secs: i64 = 0;
            for (name, unit_secs) in INTERVAL_UNITS {
                let Some(value) = args.get(name) else {
                    continue;
                };
                let amount = value
                    .as_u64()
                    .and_then(|n| i64::try_from(n).ok())
                    .ok_or_else(|| invalid(format!("{name} must be a non-negative integer")))?;
                total_secs = amount
                    .checked_mul(unit_secs)
                    .and_then(|secs| total_secs.checked_add(secs))
                    .ok_or_else(|| invalid("interval is too large".to_string()))?;
            }
            if total_secs == 0 {
                return Err(invalid("interval must be greater than zero".to_string()));
            }
            let every = Duration::try_seconds(total_secs)
                .ok_or_else(|| invalid("interval is too large".to_string()))?;
            let start_date = match date_arg("start_date")? {
                Some(start) => start,
                None => now
                    .checked_add_signed(every)
                    .ok_or_else(|| invalid("interval is too large".to_string()))?,
            };
            let end_date = date_arg("end_date")?;
            Ok(Trigger::Interval(IntervalTrigger {
                every,
                start_date,
                end_date,
            }))
        }
        TriggerType::Cron => {
            let pattern = cron_pattern(&args).map_err(invalid)?;
            let schedule = CronParser::builder()
                .seconds(Seconds::Required)
                .dom_and_dow(true)
                .build()
                .parse(&pattern)
                .map_err(|e| invalid(format!("invalid cron expression '{pattern}': {e}")))?;
            Ok(Trigger::Cron(CronTrigger {
                pattern,
                schedule: Arc::new(schedule),
                start_date: date_arg("start_date")?,
                end_date: date_arg("end_date")?,
            }))
        }
    }
}

/// Assemble the `sec min hour day month dow [year]` pattern from named fields.
///
/// Fields coarser than the finest given field default to `*`; finer ones
/// take their minimum value. With no fields at all every field is `*`.
/// The year field is only emitted when given.
fn cron_pattern(args: &Map<String, Value>) -> Result<String, String> {
    let given = CRON_FIELDS
        .iter()
        .filter(|(name, _)| args.contains_key(*name))
        .count();
    let mut seen = 0;
    let mut values = HashMap::new();

    for (name, default) in CRON_FIELDS {
        let expr = match args.get(name) {
            Some(value) => {
                seen += 1;
                let expr = cron_field(name, value)?;
                if name == "day_of_week" {
                    weekday_expr(&expr)?
                } else {
                    expr
                }
            }
            None if given > 0 && seen == given => default.to_string(),
            None => "*".to_string(),
        };
        values.insert(name, expr);
    }

    let field = |name: &str| values.get(name).map_or("*", String::as_str);
    let mut pattern = format!(
        "{} {} {} {} {} {}",
        field("second"),
        field("minute"),
        field("hour"),
        field("day"),
        field("month"),
        field("day_of_week"),
    );
    if args.contains_key("year") {
        pattern.push(' ');
        pattern.push_str(field("year"));
    }
    Ok(pattern)
}

/// Rewrite numeric weekdays (0 = Monday) as names so croner's Sunday-first
/// numbering never applies. Step values after `/` stay numeric.
fn weekday_expr(expr: &str) -> Result<String, String> {
    let name_of = |token: &str| -> Result<String, String> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(token.to_string());
        }
        token
            .parse::<usize>()
            .ok()
            .and_then(|n| WEEKDAYS.get(n))
            .map(|name| name.to_string())
            .ok_or_else(|| format!("day_of_week {token} is out of range 0 (mon) to 6 (sun)"))
    };

    let mut parts = Vec::new();
    for part in expr.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (part, None),
        };
        let mut translated = match range.split_once('-') {
            Some((from, to)) => format!("{}-{}", name_of(from)?, name_of(to)?),
            None => name_of(range)?,
        };
        if let Some(step) = step {
            translated.push('/');
            translated.push_str(step);
        }
        parts.push(translated);
    }
    Ok(parts.join(","))
}

fn cron_field(name: &str, value: &Value) -> Result<String, String> {
    let expr = match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n.to_string())
            .ok_or_else(|| format!("{name} must be a non-negative integer or an expression"))?,
        Value::String(s) => s.trim().to_string(),
        _ => return Err(format!("{name} must be a string or integer")),
    };
    if expr.is_empty() || expr.contains(char::is_whitespace) {
        return Err(format!("{name} has an invalid expression '{expr}'"));
    }
    Ok(expr)
}

/// Parse RFC 3339, `YYYY-MM-DD[ T]HH:MM:SS[.f]` or `YYYY-MM-DD`, naive values as UTC.
fn parse_datetime(value: &Value) -> Result<DateTime<Utc>, String> {
    let Some(raw) = value.as_str() else {
        return Err(format!("expected a date string, got {value}"));
    };
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("unrecognized date '{raw}'"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn build(trigger_type: &str, args: Value) -> Result<Trigger, TriggerError> {
        construct_trigger_at(
            &TriggerDescriptor::new(trigger_type, args),
            at(2026, 1, 1, 12, 0, 0),
        )
    }

    fn cron_pattern_of(args: Value) -> String {
        match build("cron", args).unwrap() {
            Trigger::Cron(t) => t.pattern().to_string(),
            other => panic!("expected cron trigger, got {other:?}"),
        }
    }

    // -------------------------------------------------------------------
    // Factory validation
    // -------------------------------------------------------------------

    #[test]
    fn test_unknown_type_is_invalid_spec() {
        let err = build("weekly", json!({})).unwrap_err();
        let TriggerError::InvalidTriggerSpec {
            trigger_type,
            reason,
            ..
        } = err;
        assert_eq!(trigger_type, "weekly");
        assert!(reason.contains("unknown trigger type"));
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        let err = build("interval", json!({"seconds": 5, "jitter": 2})).unwrap_err();
        assert!(err.to_string().contains("jitter"));
    }

    #[test]
    fn test_args_must_be_object() {
        assert!(build("interval", json!([1, 2])).is_err());
    }

    #[test]
    fn test_date_trigger_parses_formats() {
        for raw in [
            "2026-03-01T08:30:00Z",
            "2026-03-01T09:30:00+01:00",
            "2026-03-01 08:30:00",
            "2026-03-01T08:30:00",
        ] {
            let trigger = build("date", json!({ "run_date": raw })).unwrap();
            assert_eq!(
                trigger,
                Trigger::OneOff(DateTrigger {
                    run_date: at(2026, 3, 1, 8, 30, 0)
                }),
                "format {raw}"
            );
        }

        let midnight = build("date", json!({"run_date": "2026-03-01"})).unwrap();
        assert_eq!(
            midnight.next_fire_time(None, at(2026, 1, 1, 0, 0, 0)),
            Some(at(2026, 3, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_date_trigger_requires_valid_run_date() {
        assert!(build("date", json!({})).is_err());
        assert!(build("date", json!({"run_date": "tomorrow"})).is_err());
        assert!(build("date", json!({"run_date": 1234})).is_err());
    }

    #[test]
    fn test_interval_sums_units() {
        let trigger = build("interval", json!({"hours": 1, "minutes": 30})).unwrap();
        let Trigger::Interval(t) = trigger else {
            panic!("expected interval trigger");
        };
        assert_eq!(t.every, Duration::minutes(90));
        assert_eq!(t.start_date, at(2026, 1, 1, 13, 30, 0));
        assert_eq!(t.end_date, None);
    }

    #[test]
    fn test_interval_rejects_zero_and_negative() {
        assert!(build("interval", json!({})).is_err());
        assert!(build("interval", json!({"seconds": 0})).is_err());
        assert!(build("interval", json!({"seconds": -5})).is_err());
        assert!(build("interval", json!({"seconds": 1.5})).is_err());
        assert!(build("interval", json!({"seconds": "10"})).is_err());
    }

    #[test]
    fn test_cron_fields_default_like_calendar_units() {
        assert_eq!(cron_pattern_of(json!({"hour": 2})), "0 0 2 * * *");
        assert_eq!(cron_pattern_of(json!({"minute": "*/5"})), "0 */5 * * * *");
        assert_eq!(cron_pattern_of(json!({"month": 6})), "0 0 0 1 6 *");
        assert_eq!(
            cron_pattern_of(json!({"day_of_week": "mon-fri", "hour": 9, "minute": 30})),
            "0 30 9 * * mon-fri"
        );
        assert_eq!(cron_pattern_of(json!({"second": "*/10"})), "*/10 * * * * *");
        assert_eq!(cron_pattern_of(json!({})), "* * * * * *");
    }

    #[test]
    fn test_cron_rejects_bad_expressions() {
        assert!(build("cron", json!({"hour": "25"})).is_err());
        assert!(build("cron", json!({"minute": "1 2"})).is_err());
        assert!(build("cron", json!({"minute": ""})).is_err());
        assert!(build("cron", json!({"year": "abc"})).is_err());
        assert!(build("cron", json!({"hour": true})).is_err());
    }

    #[test]
    fn test_cron_weekday_numbers_start_on_monday() {
        assert_eq!(
            cron_pattern_of(json!({"day_of_week": 0, "hour": 9})),
            "0 0 9 * * mon"
        );
        assert_eq!(cron_pattern_of(json!({"day_of_week": "0-4"})), "0 0 0 * * mon-fri");
        assert_eq!(cron_pattern_of(json!({"day_of_week": "5,6"})), "0 0 0 * * sat,sun");
        assert!(build("cron", json!({"day_of_week": 7})).is_err());

        // 2026-01-05 is a Monday.
        let trigger = build("cron", json!({"day_of_week": 0, "hour": 9})).unwrap();
        assert_eq!(
            trigger.next_fire_time(None, at(2026, 1, 1, 12, 0, 0)),
            Some(at(2026, 1, 5, 9, 0, 0))
        );

        let weekend = build("cron", json!({"day_of_week": "5-6", "hour": 0})).unwrap();
        assert_eq!(
            weekend.preview(at(2026, 1, 1, 12, 0, 0), 2),
            vec![at(2026, 1, 3, 0, 0, 0), at(2026, 1, 4, 0, 0, 0)]
        );
    }

    #[test]
    fn test_cron_day_and_weekday_must_both_match() {
        // Friday the 13th: February and March 2026.
        let trigger = build("cron", json!({"day": 13, "day_of_week": "fri", "hour": 0})).unwrap();
        assert_eq!(
            trigger.preview(at(2026, 1, 1, 12, 0, 0), 2),
            vec![at(2026, 2, 13, 0, 0, 0), at(2026, 3, 13, 0, 0, 0)]
        );
    }

    #[test]
    fn test_cron_year_field_and_unsupported_week() {
        assert_eq!(cron_pattern_of(json!({"year": 2027})), "0 0 0 1 1 * 2027");
        let trigger = build("cron", json!({"year": 2027, "month": 3})).unwrap();
        assert_eq!(
            trigger.preview(at(2026, 1, 1, 12, 0, 0), 5),
            vec![at(2027, 3, 1, 0, 0, 0)]
        );

        let err = build("cron", json!({"week": 2})).unwrap_err();
        assert!(err.to_string().contains("'week' is not supported"), "{err}");
    }

    // -------------------------------------------------------------------
    // Fire time computation
    // -------------------------------------------------------------------

    #[test]
    fn test_one_off_fires_once() {
        let trigger = build("date", json!({"run_date": "2026-02-01T00:00:00Z"})).unwrap();
        let now = at(2026, 1, 1, 0, 0, 0);
        let first = trigger.next_fire_time(None, now);
        assert_eq!(first, Some(at(2026, 2, 1, 0, 0, 0)));
        assert_eq!(trigger.next_fire_time(first, now), None);
    }

    #[test]
    fn test_interval_aligns_to_start_date() {
        let trigger = build(
            "interval",
            json!({"minutes": 10, "start_date": "2026-01-01T00:00:00Z"}),
        )
        .unwrap();

        assert_eq!(
            trigger.next_fire_time(None, at(2025, 12, 31, 0, 0, 0)),
            Some(at(2026, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            trigger.next_fire_time(None, at(2026, 1, 1, 0, 25, 0)),
            Some(at(2026, 1, 1, 0, 30, 0))
        );
        assert_eq!(
            trigger.next_fire_time(Some(at(2026, 1, 1, 0, 30, 0)), at(2026, 1, 1, 0, 30, 0)),
            Some(at(2026, 1, 1, 0, 40, 0))
        );
    }

    #[test]
    fn test_interval_stops_at_end_date() {
        let trigger = build(
            "interval",
            json!({
                "hours": 1,
                "start_date": "2026-01-01 00:00:00",
                "end_date": "2026-01-01 02:00:00"
            }),
        )
        .unwrap();
        let times = trigger.preview(at(2025, 1, 1, 0, 0, 0), 10);
        assert_eq!(
            times,
            vec![
                at(2026, 1, 1, 0, 0, 0),
                at(2026, 1, 1, 1, 0, 0),
                at(2026, 1, 1, 2, 0, 0)
            ]
        );
    }

    #[test]
    fn test_cron_next_fire_time() {
        let trigger = build("cron", json!({"hour": 2})).unwrap();
        assert_eq!(
            trigger.next_fire_time(None, at(2026, 1, 1, 12, 0, 0)),
            Some(at(2026, 1, 2, 2, 0, 0))
        );
        assert_eq!(
            trigger.next_fire_time(Some(at(2026, 1, 2, 2, 0, 0)), at(2026, 1, 2, 2, 0, 0)),
            Some(at(2026, 1, 3, 2, 0, 0))
        );
    }

    #[test]
    fn test_cron_respects_start_and_end_dates() {
        let trigger = build(
            "cron",
            json!({
                "minute": 0,
                "start_date": "2026-05-01T00:00:00Z",
                "end_date": "2026-05-01T02:00:00Z"
            }),
        )
        .unwrap();
        let times = trigger.preview(at(2026, 1, 1, 0, 0, 0), 5);
        assert_eq!(
            times,
            vec![
                at(2026, 5, 1, 0, 0, 0),
                at(2026, 5, 1, 1, 0, 0),
                at(2026, 5, 1, 2, 0, 0)
            ]
        );
    }

    #[test]
    fn test_preview_of_one_off_has_single_entry() {
        let trigger = build("date", json!({"run_date": "2026-02-01T00:00:00Z"})).unwrap();
        assert_eq!(trigger.preview(at(2026, 1, 1, 0, 0, 0), 3).len(), 1);
    }

    #[test]
    fn test_display_names_trigger_type() {
        let trigger = build("interval", json!({"seconds": 30})).unwrap();
        assert_eq!(trigger.to_string(), "interval[30s]");
        assert_eq!(trigger.trigger_type(), TriggerType::Interval);
    }
}
