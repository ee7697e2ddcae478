//! Declarative trigger descriptors.
//!
//! Wire shape: `{ "type": "date" | "interval" | "cron", "args": { ... } }`.
//! The type is kept as a raw string so that unknown types surface as an
//! `InvalidTriggerSpec` from the trigger factory rather than a parse error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A trigger as supplied by an operator, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    #[serde(rename = "type")]
    pub trigger_type: String,
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    Value::Object(serde_json::Map::new())
}

impl TriggerDescriptor {
    pub fn new(trigger_type: impl Into<String>, args: Value) -> Self {
        Self {
            trigger_type: trigger_type.into(),
            args,
        }
    }

    /// One-off trigger firing at `run_date`.
    pub fn date(run_date: impl Into<String>) -> Self {
        Self::new(
            TriggerType::Date.to_string(),
            serde_json::json!({ "run_date": run_date.into() }),
        )
    }

    /// Recurring trigger firing every `seconds` seconds.
    pub fn every_seconds(seconds: u64) -> Self {
        Self::new(
            TriggerType::Interval.to_string(),
            serde_json::json!({ "seconds": seconds }),
        )
    }

    pub fn cron(args: Value) -> Self {
        Self::new(TriggerType::Cron.to_string(), args)
    }
}

/// The trigger types the factory knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Date,
    Interval,
    Cron,
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerType::Date => write!(f, "date"),
            TriggerType::Interval => write!(f, "interval"),
            TriggerType::Cron => write!(f, "cron"),
        }
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(TriggerType::Date),
            "interval" => Ok(TriggerType::Interval),
            "cron" => Ok(TriggerType::Cron),
            other => Err(format!("invalid trigger type: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_wire_shape() {
        let json = serde_json::json!({"type": "interval", "args": {"minutes": 5}});
        let desc: TriggerDescriptor = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(desc.trigger_type, "interval");
        assert_eq!(desc.args["minutes"], 5);
        assert_eq!(serde_json::to_value(&desc).unwrap(), json);
    }

    #[test]
    fn test_descriptor_missing_args_defaults_to_empty_object() {
        let desc: TriggerDescriptor =
            serde_json::from_value(serde_json::json!({"type": "cron"})).unwrap();
        assert_eq!(desc.args, serde_json::json!({}));
    }

    #[test]
    fn test_unknown_type_still_deserializes() {
        let desc: TriggerDescriptor =
            serde_json::from_value(serde_json::json!({"type": "weekly", "args": {}})).unwrap();
        assert!(desc.trigger_type.parse::<TriggerType>().is_err());
    }

    #[test]
    fn test_trigger_type_round_trips_through_display() {
        for t in [TriggerType::Date, TriggerType::Interval, TriggerType::Cron] {
            assert_eq!(t.to_string().parse::<TriggerType>().unwrap(), t);
        }
    }
}
