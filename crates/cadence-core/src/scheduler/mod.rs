//! Workflow scheduling.
//!
//! Provides:
//! - `trigger`: descriptor validation and fire-time computation
//! - `job_id`: collision-free `(task_id, workflow_id)` job ids
//! - `engine`: the timer engine interface and the in-process engine
//! - `listener`: engine event to bus event bridge
//! - `service`: the task-level `Scheduler`

pub mod engine;
pub mod job_id;
pub mod listener;
pub mod service;
pub mod trigger;

pub use engine::{JobSnapshot, LocalTimerEngine, TimerEngine};
pub use service::{Executable, Scheduler};
pub use trigger::{Trigger, construct_trigger};
