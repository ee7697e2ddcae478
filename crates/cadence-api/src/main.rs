//! Cadence CLI entry point.
//!
//! Binary name: `cadence`
//!
//! Parses CLI arguments, sets up tracing, loads configuration, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,cadence_core=debug",
        _ => "trace",
    };
    cadence_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    // Pure commands need neither config nor storage.
    let result = match cli.command {
        Commands::Trigger { action } => cli::trigger::handle_trigger_command(action, cli.json),
        Commands::JobId { action } => cli::job_id::handle_job_id_command(action, cli.json),
        Commands::Run => {
            let state = AppState::init(cli.config).await?;
            cli::run::run(&state, cli.json).await
        }
        Commands::Cases { action } => {
            let state = AppState::init(cli.config).await?;
            cli::cases::handle_cases_command(action, &state, cli.json).await
        }
    };

    cadence_observe::tracing_setup::shutdown_tracing();
    result
}
