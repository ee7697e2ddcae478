//! `cadence job-id` subcommands.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use cadence_core::scheduler::job_id;

#[derive(Subcommand)]
pub enum JobIdCommand {
    /// Encode a task id and workflow id into a scheduler job id.
    Encode {
        task_id: String,
        workflow_id: String,
    },

    /// Split a scheduler job id back into its task id and workflow id.
    Decode { job_id: String },
}

pub fn handle_job_id_command(cmd: JobIdCommand, json: bool) -> Result<()> {
    match cmd {
        JobIdCommand::Encode {
            task_id,
            workflow_id,
        } => {
            let id = job_id::encode(&task_id, &workflow_id);
            if json {
                let out = serde_json::json!({
                    "job_id": id,
                    "task_id": task_id,
                    "workflow_id": workflow_id,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{id}");
            }
        }
        JobIdCommand::Decode { job_id: id } => {
            let (task_id, workflow_id) = job_id::decode(&id)?;
            if json {
                let out = serde_json::json!({
                    "job_id": id,
                    "task_id": task_id,
                    "workflow_id": workflow_id,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!();
                println!("  Task:     {}", style(&task_id).cyan());
                println!("  Workflow: {}", style(&workflow_id).cyan());
                println!();
            }
        }
    }
    Ok(())
}
