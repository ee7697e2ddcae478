//! Bridge from timer engine events to the execution event bus.

use std::sync::Arc;

use cadence_types::error::UnknownEngineEvent;
use cadence_types::event::{EventKind, EventPayload};

use super::engine::{EngineEvent, EngineListener, codes};
use super::job_id;
use crate::event::EventBus;

/// Engine codes republished on the bus.
pub const BRIDGED_EVENTS: u32 = codes::SCHEDULER_STARTED
    | codes::SCHEDULER_SHUTDOWN
    | codes::SCHEDULER_PAUSED
    | codes::SCHEDULER_RESUMED
    | codes::JOB_ADDED
    | codes::JOB_REMOVED
    | codes::JOB_EXECUTED
    | codes::JOB_ERROR;

/// The bus event kind for an engine code.
pub fn event_kind_for(code: u32) -> Result<EventKind, UnknownEngineEvent> {
    match code {
        codes::SCHEDULER_STARTED => Ok(EventKind::SchedulerStart),
        codes::SCHEDULER_SHUTDOWN => Ok(EventKind::SchedulerShutdown),
        codes::SCHEDULER_PAUSED => Ok(EventKind::SchedulerPaused),
        codes::SCHEDULER_RESUMED => Ok(EventKind::SchedulerResumed),
        codes::JOB_ADDED => Ok(EventKind::SchedulerJobAdded),
        codes::JOB_REMOVED => Ok(EventKind::SchedulerJobRemoved),
        codes::JOB_EXECUTED => Ok(EventKind::SchedulerJobExecuted),
        codes::JOB_ERROR => Ok(EventKind::SchedulerJobError),
        other => Err(UnknownEngineEvent(other)),
    }
}

/// Payload for a bridged engine event. Job ids that do not decode are
/// passed through without the task and workflow parts.
fn payload_for(event: &EngineEvent) -> EventPayload {
    let Some(id) = &event.job_id else {
        return EventPayload::Empty;
    };
    let (task_id, workflow_execution_id) = match job_id::decode(id) {
        Ok((task_id, workflow_id)) => (Some(task_id), Some(workflow_id)),
        Err(_) => (None, None),
    };
    match &event.error {
        Some(error) => EventPayload::JobError {
            job_id: id.clone(),
            task_id,
            workflow_execution_id,
            error: error.clone(),
        },
        None => EventPayload::Job {
            job_id: id.clone(),
            task_id,
            workflow_execution_id,
        },
    }
}

/// Build the engine listener that republishes engine events on `bus`,
/// sent from `scheduler_id`. Register it with `BRIDGED_EVENTS`.
pub fn bridge(bus: Arc<EventBus>, scheduler_id: &str) -> EngineListener {
    let scheduler_id = scheduler_id.to_string();
    Arc::new(move |event: &EngineEvent| match event_kind_for(event.code) {
        Ok(kind) => {
            bus.publish(&scheduler_id, kind, payload_for(event));
        }
        Err(e) => {
            tracing::error!(error = %e, job_id = ?event.job_id, "unknown scheduler event");
        }
    })
}
