//! `cadence trigger` subcommands.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use cadence_core::scheduler::construct_trigger;
use cadence_types::trigger::TriggerDescriptor;

#[derive(Subcommand)]
pub enum TriggerCommand {
    /// Validate a trigger descriptor and print its upcoming fire times.
    Check {
        /// Trigger type: date, interval, or cron.
        #[arg(long = "type")]
        trigger_type: String,

        /// Trigger arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,

        /// How many upcoming fire times to show.
        #[arg(long, default_value = "5")]
        count: usize,
    },
}

pub fn handle_trigger_command(cmd: TriggerCommand, json: bool) -> Result<()> {
    match cmd {
        TriggerCommand::Check {
            trigger_type,
            args,
            count,
        } => check(&trigger_type, &args, count, json),
    }
}

fn check(trigger_type: &str, args: &str, count: usize, json: bool) -> Result<()> {
    let args: serde_json::Value = serde_json::from_str(args)
        .with_context(|| format!("Trigger args are not valid JSON: {args}"))?;
    let trigger = construct_trigger(&TriggerDescriptor::new(trigger_type, args))?;
    let now = Utc::now();
    let upcoming = trigger.preview(now, count);

    if json {
        let out = serde_json::json!({
            "trigger": trigger.to_string(),
            "type": trigger.trigger_type().to_string(),
            "upcoming": upcoming.iter().map(|t| t.to_rfc3339()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Trigger").bold(), style(&trigger).cyan());

    if upcoming.is_empty() {
        println!("  {}", style("No upcoming fire times.").yellow());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#"),
            Cell::new("Fire time (UTC)").fg(Color::Cyan),
            Cell::new("In"),
        ]);
    for (i, at) in upcoming.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(format_until(now, *at)),
        ]);
    }
    println!("{table}");
    println!();
    Ok(())
}

/// Coarse human-readable distance from `now` to `at`.
fn format_until(now: DateTime<Utc>, at: DateTime<Utc>) -> String {
    let secs = (at - now).num_seconds();
    if secs < 0 {
        return "overdue".to_string();
    }
    match secs {
        0..60 => format!("{secs}s"),
        60..3_600 => format!("{}m {}s", secs / 60, secs % 60),
        3_600..86_400 => format!("{}h {}m", secs / 3_600, (secs % 3_600) / 60),
        _ => format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3_600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_until_buckets() {
        let now = Utc::now();
        assert_eq!(format_until(now, now + Duration::seconds(5)), "5s");
        assert_eq!(format_until(now, now + Duration::seconds(125)), "2m 5s");
        assert_eq!(format_until(now, now + Duration::minutes(90)), "1h 30m");
        assert_eq!(format_until(now, now + Duration::hours(50)), "2d 2h");
        assert_eq!(format_until(now, now - Duration::seconds(1)), "overdue");
    }

    #[test]
    fn test_check_rejects_bad_json_and_bad_spec() {
        assert!(check("cron", "{not json", 3, true).is_err());
        assert!(check("weekly", "{}", 3, true).is_err());
        assert!(check("interval", r#"{"seconds": 30}"#, 3, true).is_ok());
    }
}
