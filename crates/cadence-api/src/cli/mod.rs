//! CLI command definitions for the `cadence` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (`cadence trigger check`, `cadence cases list`).

pub mod cases;
pub mod job_id;
pub mod run;
pub mod trigger;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Schedule workflows and record their lifecycle events into cases.
#[derive(Parser)]
#[command(name = "cadence", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry to stdout.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Path to config.toml (defaults to the data directory's config.toml).
    #[arg(long, global = true, env = "CADENCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the scheduler with the configured tasks and subscriptions,
    /// running until Ctrl+C.
    Run,

    /// Inspect trigger descriptors.
    Trigger {
        #[command(subcommand)]
        action: trigger::TriggerCommand,
    },

    /// Encode or decode scheduler job ids.
    #[command(name = "job-id")]
    JobId {
        #[command(subcommand)]
        action: job_id::JobIdCommand,
    },

    /// Inspect and delete recorded case logs.
    Cases {
        #[command(subcommand)]
        action: cases::CasesCommand,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_trigger_check() {
        let cli = Cli::try_parse_from([
            "cadence",
            "trigger",
            "check",
            "--type",
            "cron",
            "--args",
            r#"{"minute": "*/5"}"#,
            "--count",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Trigger {
                action:
                    trigger::TriggerCommand::Check {
                        trigger_type,
                        args,
                        count,
                    },
            } => {
                assert_eq!(trigger_type, "cron");
                assert!(args.contains("*/5"));
                assert_eq!(count, 3);
            }
            _ => panic!("expected trigger check"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["cadence", "cases", "list", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Cases {
                action: cases::CasesCommand::List
            }
        ));
    }

    #[test]
    fn test_job_id_requires_both_parts() {
        assert!(Cli::try_parse_from(["cadence", "job-id", "encode", "only-task"]).is_err());
    }
}
