//! `cadence run`: the composition root.
//!
//! Builds one bus, one scheduler and one case recorder, applies the
//! configured subscriptions and tasks, and runs until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use cadence_core::case::{CaseRecorder, SubscriptionRegistry};
use cadence_core::event::EventBus;
use cadence_core::repository::{CaseRepository, InMemoryCaseRepository};
use cadence_core::scheduler::{Executable, Scheduler};
use cadence_types::config::CaseBackend;
use cadence_types::event::{EventKind, EventPayload};

use crate::state::AppState;

pub async fn run(state: &AppState, json: bool) -> Result<()> {
    match state.config.cases.backend {
        CaseBackend::Sqlite => {
            let repository = state.open_case_store().await?;
            run_until_shutdown(state, repository, json).await
        }
        CaseBackend::Memory => {
            run_until_shutdown(state, InMemoryCaseRepository::new(), json).await
        }
    }
}

async fn run_until_shutdown<R: CaseRepository>(
    state: &AppState,
    repository: R,
    json: bool,
) -> Result<()> {
    let config = &state.config;
    let bus = Arc::new(EventBus::new());
    let scheduler = Scheduler::new(&config.scheduler, Arc::clone(&bus));
    let recorder = CaseRecorder::start(
        &bus,
        Arc::new(SubscriptionRegistry::default()),
        Arc::new(repository),
    );
    recorder.set_subscriptions(config.subscriptions.clone());

    let executable = pending_executor(&bus);
    for task in &config.tasks {
        scheduler
            .schedule_task(task, &executable)
            .with_context(|| format!("Task '{}' has an invalid trigger", task.task_id))?;
    }
    scheduler.start()?;

    let jobs: usize = scheduler
        .get_all_scheduled_workflows()
        .values()
        .map(Vec::len)
        .sum();
    if json {
        let out = serde_json::json!({
            "scheduler": scheduler.id(),
            "state": scheduler.state().to_string(),
            "tasks": config.tasks.len(),
            "jobs": jobs,
            "cases": config.subscriptions.len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} Scheduler '{}' running",
            style("*").green().bold(),
            style(scheduler.id()).cyan()
        );
        println!(
            "  Tasks: {}  Jobs: {}  Cases: {}",
            config.tasks.len(),
            jobs,
            config.subscriptions.len()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    shutdown_signal().await?;

    scheduler.stop(true).await?;
    recorder.detach(&bus);
    recorder
        .flush()
        .await
        .context("Failed to persist recorded case events")?;
    if !json {
        println!("\n  Scheduler stopped.");
    }
    Ok(())
}

/// Executor stand-in: announces each fired workflow as pending on the bus.
/// Action execution is handed off to the external worker pool that listens
/// for `WorkflowExecutionPending`.
fn pending_executor(bus: &Arc<EventBus>) -> Executable {
    let bus = Arc::clone(bus);
    Arc::new(move |workflow_id: &str| {
        bus.publish(
            workflow_id,
            EventKind::WorkflowExecutionPending,
            EventPayload::Execution {
                workflow_execution_id: workflow_id.to_string(),
            },
        );
        Ok(())
    })
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl+C")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    tracing::info!("shutdown signal received");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use cadence_types::event::ExecutionEvent;

    #[test]
    fn test_pending_executor_publishes_pending_event() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.connect(
            EventKind::WorkflowExecutionPending,
            "test",
            Arc::new(move |event: &ExecutionEvent| {
                sink.lock().unwrap().push(event.clone());
                Ok(())
            }),
        );

        pending_executor(&bus)("wf-7").unwrap();

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_id, "wf-7");
        assert_eq!(
            events[0].payload,
            EventPayload::Execution {
                workflow_execution_id: "wf-7".to_string()
            }
        );
    }
}
