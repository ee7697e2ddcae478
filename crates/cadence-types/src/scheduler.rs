//! Scheduler state and scheduled task types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trigger::TriggerDescriptor;

/// Scheduler lifecycle states.
///
/// - Stopped: initial state, no firing
/// - Running: jobs fire as their triggers come due
/// - Paused: jobs are kept but nothing fires
/// - ShuttingDown: transient, between a stop request and quiescence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    Running,
    Paused,
    ShuttingDown,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Stopped => write!(f, "stopped"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Paused => write!(f, "paused"),
            SchedulerState::ShuttingDown => write!(f, "shutting_down"),
        }
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        SchedulerState::Stopped
    }
}

/// An operator-declared schedule binding one trigger to one or more workflows.
///
/// The trigger is replaced wholesale on update, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: String,
    pub trigger: TriggerDescriptor,
    #[serde(default)]
    pub workflow_ids: Vec<String>,
}
