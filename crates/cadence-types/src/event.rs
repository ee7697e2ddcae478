//! Lifecycle event types carried by the Cadence event bus.
//!
//! Every execution entity (scheduler, job, workflow, action, branch,
//! condition, conditional expression, transform) reports its progress as an
//! `ExecutionEvent` whose `kind` is one of the `EventKind` signals below.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The kind of entity that emits a given event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Scheduler,
    Workflow,
    Action,
    Branch,
    Condition,
    ConditionalExpression,
    Transform,
    Other,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Scheduler => write!(f, "scheduler"),
            EntityType::Workflow => write!(f, "workflow"),
            EntityType::Action => write!(f, "action"),
            EntityType::Branch => write!(f, "branch"),
            EntityType::Condition => write!(f, "condition"),
            EntityType::ConditionalExpression => write!(f, "conditional_expression"),
            EntityType::Transform => write!(f, "transform"),
            EntityType::Other => write!(f, "other"),
        }
    }
}

/// A named lifecycle signal.
///
/// Serialized as the variant name (`"ActionStarted"`), which is also the
/// spelling used in subscription tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    // -- Scheduler --
    SchedulerStart,
    SchedulerShutdown,
    SchedulerPaused,
    SchedulerResumed,
    SchedulerJobAdded,
    SchedulerJobRemoved,
    SchedulerJobExecuted,
    SchedulerJobError,

    // -- Workflow --
    WorkflowExecutionPending,
    WorkflowExecutionStart,
    WorkflowPaused,
    WorkflowResumed,
    WorkflowAwaitingData,
    WorkflowTriggered,
    WorkflowShutdown,
    WorkflowAborted,
    WorkflowArgumentsValidated,
    WorkflowArgumentsInvalid,

    // -- Action --
    AppInstanceCreated,
    ActionStarted,
    ActionExecutionSuccess,
    ActionExecutionError,
    ActionArgumentsInvalid,
    TriggerActionAwaitingData,
    TriggerActionTaken,
    TriggerActionNotTaken,

    // -- Branch --
    BranchTaken,
    BranchNotTaken,

    // -- Condition --
    ConditionSuccess,
    ConditionError,

    // -- Conditional expression --
    ConditionalExpressionTrue,
    ConditionalExpressionFalse,
    ConditionalExpressionError,

    // -- Transform --
    TransformSuccess,
    TransformError,

    // -- Other --
    CommonWorkflowSignal,
    SendMessage,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 37] = [
        EventKind::SchedulerStart,
        EventKind::SchedulerShutdown,
        EventKind::SchedulerPaused,
        EventKind::SchedulerResumed,
        EventKind::SchedulerJobAdded,
        EventKind::SchedulerJobRemoved,
        EventKind::SchedulerJobExecuted,
        EventKind::SchedulerJobError,
        EventKind::WorkflowExecutionPending,
        EventKind::WorkflowExecutionStart,
        EventKind::WorkflowPaused,
        EventKind::WorkflowResumed,
        EventKind::WorkflowAwaitingData,
        EventKind::WorkflowTriggered,
        EventKind::WorkflowShutdown,
        EventKind::WorkflowAborted,
        EventKind::WorkflowArgumentsValidated,
        EventKind::WorkflowArgumentsInvalid,
        EventKind::AppInstanceCreated,
        EventKind::ActionStarted,
        EventKind::ActionExecutionSuccess,
        EventKind::ActionExecutionError,
        EventKind::ActionArgumentsInvalid,
        EventKind::TriggerActionAwaitingData,
        EventKind::TriggerActionTaken,
        EventKind::TriggerActionNotTaken,
        EventKind::BranchTaken,
        EventKind::BranchNotTaken,
        EventKind::ConditionSuccess,
        EventKind::ConditionError,
        EventKind::ConditionalExpressionTrue,
        EventKind::ConditionalExpressionFalse,
        EventKind::ConditionalExpressionError,
        EventKind::TransformSuccess,
        EventKind::TransformError,
        EventKind::CommonWorkflowSignal,
        EventKind::SendMessage,
    ];

    /// (identifier, human-readable signal name, emitting entity type)
    const fn meta(self) -> (&'static str, &'static str, EntityType) {
        use EntityType as E;
        match self {
            EventKind::SchedulerStart => ("SchedulerStart", "Scheduler Start", E::Scheduler),
            EventKind::SchedulerShutdown => {
                ("SchedulerShutdown", "Scheduler Shutdown", E::Scheduler)
            }
            EventKind::SchedulerPaused => ("SchedulerPaused", "Scheduler Paused", E::Scheduler),
            EventKind::SchedulerResumed => ("SchedulerResumed", "Scheduler Resumed", E::Scheduler),
            EventKind::SchedulerJobAdded => ("SchedulerJobAdded", "Job Added", E::Scheduler),
            EventKind::SchedulerJobRemoved => ("SchedulerJobRemoved", "Job Removed", E::Scheduler),
            EventKind::SchedulerJobExecuted => {
                ("SchedulerJobExecuted", "Job Executed", E::Scheduler)
            }
            EventKind::SchedulerJobError => ("SchedulerJobError", "Job Error", E::Scheduler),
            EventKind::WorkflowExecutionPending => (
                "WorkflowExecutionPending",
                "Workflow Execution Pending",
                E::Workflow,
            ),
            EventKind::WorkflowExecutionStart => (
                "WorkflowExecutionStart",
                "Workflow Execution Start",
                E::Workflow,
            ),
            EventKind::WorkflowPaused => ("WorkflowPaused", "Workflow Paused", E::Workflow),
            EventKind::WorkflowResumed => ("WorkflowResumed", "Workflow Resumed", E::Workflow),
            EventKind::WorkflowAwaitingData => {
                ("WorkflowAwaitingData", "Workflow Awaiting Data", E::Workflow)
            }
            EventKind::WorkflowTriggered => {
                ("WorkflowTriggered", "Workflow Triggered", E::Workflow)
            }
            EventKind::WorkflowShutdown => ("WorkflowShutdown", "Workflow Shut Down", E::Workflow),
            EventKind::WorkflowAborted => ("WorkflowAborted", "Workflow Aborted", E::Workflow),
            EventKind::WorkflowArgumentsValidated => (
                "WorkflowArgumentsValidated",
                "Workflow Arguments Validated",
                E::Workflow,
            ),
            EventKind::WorkflowArgumentsInvalid => (
                "WorkflowArgumentsInvalid",
                "Workflow Arguments Invalid",
                E::Workflow,
            ),
            EventKind::AppInstanceCreated => {
                ("AppInstanceCreated", "App Instance Created", E::Action)
            }
            EventKind::ActionStarted => ("ActionStarted", "Action Started", E::Action),
            EventKind::ActionExecutionSuccess => {
                ("ActionExecutionSuccess", "Action Execution Success", E::Action)
            }
            EventKind::ActionExecutionError => {
                ("ActionExecutionError", "Action Execution Error", E::Action)
            }
            EventKind::ActionArgumentsInvalid => {
                ("ActionArgumentsInvalid", "Action Arguments Invalid", E::Action)
            }
            EventKind::TriggerActionAwaitingData => (
                "TriggerActionAwaitingData",
                "Trigger Action Awaiting Data",
                E::Action,
            ),
            EventKind::TriggerActionTaken => {
                ("TriggerActionTaken", "Trigger Action Taken", E::Action)
            }
            EventKind::TriggerActionNotTaken => {
                ("TriggerActionNotTaken", "Trigger Action Not Taken", E::Action)
            }
            EventKind::BranchTaken => ("BranchTaken", "Branch Taken", E::Branch),
            EventKind::BranchNotTaken => ("BranchNotTaken", "Branch Not Taken", E::Branch),
            EventKind::ConditionSuccess => ("ConditionSuccess", "Condition Success", E::Condition),
            EventKind::ConditionError => ("ConditionError", "Condition Error", E::Condition),
            EventKind::ConditionalExpressionTrue => (
                "ConditionalExpressionTrue",
                "Conditional Expression True",
                E::ConditionalExpression,
            ),
            EventKind::ConditionalExpressionFalse => (
                "ConditionalExpressionFalse",
                "Conditional Expression False",
                E::ConditionalExpression,
            ),
            EventKind::ConditionalExpressionError => (
                "ConditionalExpressionError",
                "Conditional Expression Error",
                E::ConditionalExpression,
            ),
            EventKind::TransformSuccess => ("TransformSuccess", "Transform Success", E::Transform),
            EventKind::TransformError => ("TransformError", "Transform Error", E::Transform),
            EventKind::CommonWorkflowSignal => {
                ("CommonWorkflowSignal", "Common Workflow Signal", E::Other)
            }
            EventKind::SendMessage => ("SendMessage", "Send Message", E::Other),
        }
    }

    /// Stable identifier, identical to the serialized form.
    pub const fn as_str(self) -> &'static str {
        self.meta().0
    }

    /// Human-readable signal name (e.g. "Action Started").
    pub const fn signal_name(self) -> &'static str {
        self.meta().1
    }

    /// The type of entity that emits this kind of event.
    pub const fn entity_type(self) -> EntityType {
        self.meta().2
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    /// Accepts either the identifier (`ActionStarted`) or the signal name
    /// (`Action Started`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EventKind::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str().eq_ignore_ascii_case(wanted)
                    || kind.signal_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("invalid event kind: '{wanted}'"))
    }
}

/// Tagged payload attached to an `ExecutionEvent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// No additional data.
    Empty,

    /// A scheduler job lifecycle change.
    Job {
        job_id: String,
        /// Decoded task id, absent when the job id is not length-prefixed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workflow_execution_id: Option<String>,
    },

    /// A scheduler job whose callback failed.
    JobError {
        job_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workflow_execution_id: Option<String>,
        error: String,
    },

    /// An event scoped to one workflow execution.
    Execution { workflow_execution_id: String },

    /// Freeform data produced by an action, condition, or transform.
    Data { data: Value },

    /// An error message produced by an execution entity.
    Error { message: String },
}

impl Default for EventPayload {
    fn default() -> Self {
        EventPayload::Empty
    }
}

/// One real occurrence of a lifecycle signal.
///
/// Immutable once built; bus emission order is the total order within a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// Time-sortable event id.
    pub id: Uuid,
    /// Id of the emitting entity (scheduler id, workflow id, action id, ...).
    pub entity_id: String,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl ExecutionEvent {
    /// Create an event stamped with the current time.
    pub fn new(entity_id: impl Into<String>, kind: EventKind, payload: EventPayload) -> Self {
        Self {
            id: Uuid::now_v7(),
            entity_id: entity_id.into(),
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }
}
