use thiserror::Error;

/// Errors raised while turning a trigger descriptor into a concrete trigger.
///
/// Construction-time errors are fatal to the call that supplied the
/// descriptor and are never silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    #[error("invalid trigger spec of type '{trigger_type}' with args {args}: {reason}")]
    InvalidTriggerSpec {
        trigger_type: String,
        args: String,
        reason: String,
    },
}

impl TriggerError {
    /// Build an `InvalidTriggerSpec` from the offending type, its raw args and a reason.
    pub fn invalid(
        trigger_type: impl Into<String>,
        args: &serde_json::Value,
        reason: impl Into<String>,
    ) -> Self {
        TriggerError::InvalidTriggerSpec {
            trigger_type: trigger_type.into(),
            args: args.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors from the timer engine's job store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No job with this id is registered. Bulk operations downgrade this to a warning.
    #[error("no job with id '{0}' was found")]
    JobNotFound(String),
}

/// An engine event code with no lifecycle event mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown engine event code {0:#x}")]
pub struct UnknownEngineEvent(pub u32);

/// A scheduler state transition that is not allowed from the current state.
///
/// The `Display` text is the descriptive rejection message handed back to
/// callers instead of a state value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionRejected {
    #[error("Scheduler already running.")]
    AlreadyRunning,

    #[error("Scheduler already stopped.")]
    AlreadyStopped,

    #[error("Scheduler already paused.")]
    AlreadyPaused,

    #[error("Scheduler is in STOPPED state and cannot be paused.")]
    PauseWhileStopped,

    #[error("Scheduler is not in PAUSED state and cannot be resumed.")]
    NotPaused,

    #[error("Scheduler is shutting down.")]
    ShuttingDown,

    #[error("Scheduler cannot start outside of a tokio runtime.")]
    NoRuntime,
}

/// A scheduler job id that does not follow the length-prefixed layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobIdError {
    #[error("job id '{0}' has no length prefix")]
    MissingPrefix(String),

    #[error("job id '{job_id}' declares a task id of {declared} bytes but is malformed")]
    Malformed { job_id: String, declared: usize },
}

/// A bus listener that returned an error or panicked. Logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),

    #[error("listener panicked: {0}")]
    Panicked(String),
}

/// Errors from repository operations (used by trait definitions in cadence-core).
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_trigger_spec_display_carries_type_and_args() {
        let err = TriggerError::invalid(
            "weekly",
            &serde_json::json!({"hours": 1}),
            "unknown trigger type",
        );
        let msg = err.to_string();
        assert!(msg.contains("weekly"));
        assert!(msg.contains("\"hours\":1"));
        assert!(msg.contains("unknown trigger type"));
    }

    #[test]
    fn test_transition_rejected_messages() {
        assert_eq!(
            TransitionRejected::AlreadyRunning.to_string(),
            "Scheduler already running."
        );
        assert_eq!(
            TransitionRejected::PauseWhileStopped.to_string(),
            "Scheduler is in STOPPED state and cannot be paused."
        );
    }

    #[test]
    fn test_job_not_found_display() {
        let err = EngineError::JobNotFound("3:abc:wf".to_string());
        assert_eq!(err.to_string(), "no job with id '3:abc:wf' was found");
    }

    #[test]
    fn test_unknown_engine_event_display() {
        assert_eq!(
            UnknownEngineEvent(0x400).to_string(),
            "unknown engine event code 0x400"
        );
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
