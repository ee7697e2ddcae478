//! `cadence cases` subcommands: inspect and delete persisted case logs.

use anyhow::{Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use cadence_core::repository::CaseRepository;
use cadence_types::case::CaseEvent;
use cadence_types::config::CaseBackend;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum CasesCommand {
    /// List cases that have recorded events.
    List,

    /// Show a case's recorded events in order.
    Show {
        /// Case name.
        name: String,
    },

    /// Delete a case's recorded events.
    Delete {
        /// Case name.
        name: String,
    },
}

pub async fn handle_cases_command(cmd: CasesCommand, state: &AppState, json: bool) -> Result<()> {
    if state.config.cases.backend == CaseBackend::Memory {
        bail!(
            "Case backend in {} is 'memory'; recorded cases only live inside `cadence run`",
            state.config_path.display()
        );
    }
    let repo = state.open_case_store().await?;

    match cmd {
        CasesCommand::List => handle_list(&repo, json).await,
        CasesCommand::Show { name } => handle_show(&name, &repo, json).await,
        CasesCommand::Delete { name } => handle_delete(&name, &repo, json).await,
    }
}

async fn handle_list(repo: &impl CaseRepository, json: bool) -> Result<()> {
    let cases = repo
        .list_cases()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list cases: {e}"))?;

    if json {
        let out: Vec<_> = cases
            .iter()
            .map(|c| {
                serde_json::json!({
                    "case_name": c.case_name,
                    "events": c.event_count,
                    "last_event_at": c.last_event_at.map(|t| t.to_rfc3339()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if cases.is_empty() {
        println!();
        println!("  No cases have recorded events.");
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Case").fg(Color::Cyan),
            Cell::new("Events"),
            Cell::new("Last event"),
        ]);
    for c in &cases {
        let last = c
            .last_event_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&c.case_name),
            Cell::new(c.event_count),
            Cell::new(last),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_show(name: &str, repo: &impl CaseRepository, json: bool) -> Result<()> {
    let events = repo
        .list_events(name)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read case '{name}': {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!();
        println!("  Case '{}' has no recorded events.", style(name).cyan());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Time (UTC)"),
            Cell::new("Entity").fg(Color::Cyan),
            Cell::new("Type"),
            Cell::new("Event"),
            Cell::new("Payload"),
        ]);
    for event in &events {
        table.add_row(event_row(event));
    }
    println!("{table}");
    Ok(())
}

fn event_row(event: &CaseEvent) -> Vec<Cell> {
    let payload = serde_json::to_string(&event.payload).unwrap_or_default();
    vec![
        Cell::new(event.timestamp.format("%Y-%m-%d %H:%M:%S%.3f")),
        Cell::new(&event.entity_id),
        Cell::new(event.entity_type),
        Cell::new(event.kind.signal_name()),
        Cell::new(payload),
    ]
}

async fn handle_delete(name: &str, repo: &impl CaseRepository, json: bool) -> Result<()> {
    let deleted = repo
        .delete_case(name)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete case '{name}': {e}"))?;

    if json {
        let out = serde_json::json!({ "case_name": name, "deleted": deleted });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if deleted == 0 {
        println!("  Case '{}' had no recorded events.", style(name).cyan());
    } else {
        println!(
            "  {} Deleted {} event(s) from case '{}'",
            style("*").green().bold(),
            deleted,
            style(name).cyan()
        );
    }
    Ok(())
}
