//! Scheduler service: task-level job management over a timer engine.
//!
//! Every `(task_id, workflow_id)` pair maps to exactly one engine job whose id
//! is `job_id::encode(task_id, workflow_id)`. Registering the same pair again
//! replaces the job atomically. Bulk operations treat a missing job as a
//! benign race: it is logged and skipped, the rest of the batch proceeds.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_types::config::SchedulerConfig;
use cadence_types::error::{EngineError, TransitionRejected, TriggerError};
use cadence_types::scheduler::{ScheduledTask, SchedulerState};

use super::engine::{JobSnapshot, JobSpec, LocalTimerEngine, TimerEngine};
use super::job_id;
use super::listener::{self, BRIDGED_EVENTS};
use super::trigger::{Trigger, construct_trigger};
use crate::event::EventBus;

/// The executor hand-off invoked with a workflow id each time a job fires.
///
/// Runs on an engine worker thread; it should hand work off rather than block.
pub type Executable = Arc<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

/// Owns one timer engine and republishes its lifecycle events on the bus.
pub struct Scheduler<E: TimerEngine = LocalTimerEngine> {
    id: String,
    engine: E,
    bus: Arc<EventBus>,
}

impl Scheduler<LocalTimerEngine> {
    /// Build a scheduler over a fresh in-process engine.
    pub fn new(config: &SchedulerConfig, bus: Arc<EventBus>) -> Self {
        Self::with_engine(&config.id, LocalTimerEngine::new(config), bus)
    }
}

impl<E: TimerEngine> Scheduler<E> {
    /// Wrap `engine`, bridging its events onto `bus` with `id` as the sender.
    pub fn with_engine(id: &str, engine: E, bus: Arc<EventBus>) -> Self {
        engine.add_listener(listener::bridge(Arc::clone(&bus), id), BRIDGED_EVENTS);
        Self {
            id: id.to_string(),
            engine,
            bus,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn state(&self) -> SchedulerState {
        self.engine.state()
    }

    pub fn start(&self) -> Result<SchedulerState, TransitionRejected> {
        self.engine.start()
    }

    /// Stop firing jobs. Registered jobs are kept for a later `start`.
    pub async fn stop(&self, wait: bool) -> Result<SchedulerState, TransitionRejected> {
        self.engine.stop(wait).await
    }

    pub fn pause(&self) -> Result<SchedulerState, TransitionRejected> {
        self.engine.pause()
    }

    pub fn resume(&self) -> Result<SchedulerState, TransitionRejected> {
        self.engine.resume()
    }

    // -----------------------------------------------------------------------
    // Task and job operations
    // -----------------------------------------------------------------------

    /// Register (or replace) one job per workflow id, each calling
    /// `executable(workflow_id)` when `trigger` fires.
    pub fn schedule_workflows<I, S>(
        &self,
        task_id: &str,
        executable: &Executable,
        workflow_ids: I,
        trigger: &Trigger,
    ) where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut count = 0;
        for workflow_id in workflow_ids {
            let workflow_id = workflow_id.as_ref().to_string();
            let executable = Arc::clone(executable);
            let id = job_id::encode(task_id, &workflow_id);
            self.engine.add_job(JobSpec {
                id,
                trigger: trigger.clone(),
                callback: Arc::new(move || executable(&workflow_id)),
            });
            count += 1;
        }
        tracing::info!(task_id, count, %trigger, "scheduled workflows");
    }

    /// Build the task's trigger and schedule all of its workflows.
    ///
    /// An invalid trigger fails the whole call and registers nothing.
    pub fn schedule_task(
        &self,
        task: &ScheduledTask,
        executable: &Executable,
    ) -> Result<(), TriggerError> {
        let trigger = construct_trigger(&task.trigger)?;
        self.schedule_workflows(&task.task_id, executable, &task.workflow_ids, &trigger);
        Ok(())
    }

    /// Every live job grouped by task id.
    pub fn get_all_scheduled_workflows(&self) -> HashMap<String, Vec<String>> {
        let mut by_task: HashMap<String, Vec<String>> = HashMap::new();
        for job in self.engine.get_jobs() {
            match job_id::decode(&job.id) {
                Ok((task_id, workflow_id)) => by_task.entry(task_id).or_default().push(workflow_id),
                Err(e) => tracing::warn!(job_id = %job.id, error = %e, "skipping foreign job id"),
            }
        }
        by_task
    }

    /// Workflow ids currently scheduled under `task_id`.
    pub fn get_scheduled_workflows(&self, task_id: &str) -> Vec<String> {
        self.engine
            .get_jobs()
            .into_iter()
            .filter_map(|job| job_id::decode(&job.id).ok())
            .filter(|(task, _)| task == task_id)
            .map(|(_, workflow_id)| workflow_id)
            .collect()
    }

    pub fn get_job(&self, task_id: &str, workflow_id: &str) -> Option<JobSnapshot> {
        self.engine.get_job(&job_id::encode(task_id, workflow_id))
    }

    /// Swap the trigger of every job under `task_id`, one job at a time.
    pub fn update_workflows(&self, task_id: &str, trigger: &Trigger) {
        let workflow_ids = self.get_scheduled_workflows(task_id);
        let updated = self.for_each_job(task_id, &workflow_ids, "reschedule", |id| {
            self.engine.reschedule_job(id, trigger.clone())
        });
        tracing::info!(task_id, updated, %trigger, "updated workflow schedules");
    }

    /// Remove the named jobs. Already-removed jobs are skipped.
    pub fn unschedule_workflows<S: AsRef<str>>(&self, task_id: &str, workflow_ids: &[S]) {
        let removed = self.for_each_job(task_id, workflow_ids, "unschedule", |id| {
            self.engine.remove_job(id)
        });
        tracing::info!(task_id, removed, "unscheduled workflows");
    }

    /// Remove every job belonging to `task_id`. Returns how many were removed.
    pub fn delete_task(&self, task_id: &str) -> usize {
        let workflow_ids = self.get_scheduled_workflows(task_id);
        let removed = self.for_each_job(task_id, &workflow_ids, "delete", |id| {
            self.engine.remove_job(id)
        });
        tracing::info!(task_id, removed, "deleted task");
        removed
    }

    pub fn pause_workflows<S: AsRef<str>>(&self, task_id: &str, workflow_ids: &[S]) {
        let paused = self.for_each_job(task_id, workflow_ids, "pause", |id| {
            self.engine.pause_job(id)
        });
        tracing::info!(task_id, paused, "paused workflows");
    }

    pub fn resume_workflows<S: AsRef<str>>(&self, task_id: &str, workflow_ids: &[S]) {
        let resumed = self.for_each_job(task_id, workflow_ids, "resume", |id| {
            self.engine.resume_job(id)
        });
        tracing::info!(task_id, resumed, "resumed workflows");
    }

    /// Apply `op` to each job, logging and skipping missing ones.
    /// Returns the number of jobs the operation succeeded on.
    fn for_each_job<S: AsRef<str>>(
        &self,
        task_id: &str,
        workflow_ids: &[S],
        op_name: &str,
        op: impl Fn(&str) -> Result<(), EngineError>,
    ) -> usize {
        let mut succeeded = 0;
        for workflow_id in workflow_ids {
            let workflow_id = workflow_id.as_ref();
            let id = job_id::encode(task_id, workflow_id);
            match op(&id) {
                Ok(()) => succeeded += 1,
                Err(EngineError::JobNotFound(_)) => tracing::warn!(
                    task_id,
                    workflow_id,
                    operation = op_name,
                    "job not found, skipping"
                ),
            }
        }
        succeeded
    }
}

impl<E: TimerEngine + std::fmt::Debug> std::fmt::Debug for Scheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("id", &self.id)
            .field("engine", &self.engine)
            .finish()
    }
}
