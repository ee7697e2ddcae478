//! Timer engine: the job store and the timer loop that fires jobs.
//!
//! `TimerEngine` is the seam between the `Scheduler` and whatever actually
//! keeps time. `LocalTimerEngine` is the in-process implementation: a job
//! table guarded by one mutex, a timer task that sleeps until the earliest
//! due job, and blocking worker tasks that run job callbacks.
//!
//! Engine lifecycle changes are reported through listeners registered with a
//! bitmask of event codes (see [`codes`]).

use std::collections::HashMap;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use cadence_types::config::SchedulerConfig;
use cadence_types::error::{EngineError, TransitionRejected};
use cadence_types::scheduler::SchedulerState;

use super::trigger::Trigger;
use crate::event::bus::panic_message;

/// Overdue runs examined per job per pass before coalescing gives up.
const MAX_CATCH_UP_RUNS: usize = 1024;

/// Engine event codes. Each is a single bit so listeners can subscribe with a mask.
pub mod codes {
    pub const SCHEDULER_STARTED: u32 = 1 << 0;
    pub const SCHEDULER_SHUTDOWN: u32 = 1 << 1;
    pub const SCHEDULER_PAUSED: u32 = 1 << 2;
    pub const SCHEDULER_RESUMED: u32 = 1 << 3;
    pub const JOB_ADDED: u32 = 1 << 9;
    pub const JOB_REMOVED: u32 = 1 << 10;
    pub const JOB_MODIFIED: u32 = 1 << 11;
    pub const JOB_EXECUTED: u32 = 1 << 12;
    pub const JOB_ERROR: u32 = 1 << 13;
    pub const JOB_MISSED: u32 = 1 << 14;
    pub const JOB_MAX_INSTANCES: u32 = 1 << 16;

    pub const ALL: u32 = SCHEDULER_STARTED
        | SCHEDULER_SHUTDOWN
        | SCHEDULER_PAUSED
        | SCHEDULER_RESUMED
        | JOB_ADDED
        | JOB_REMOVED
        | JOB_MODIFIED
        | JOB_EXECUTED
        | JOB_ERROR
        | JOB_MISSED
        | JOB_MAX_INSTANCES;
}

/// A lifecycle notification from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub code: u32,
    pub job_id: Option<String>,
    pub scheduled_run_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl EngineEvent {
    pub fn scheduler(code: u32) -> Self {
        Self {
            code,
            job_id: None,
            scheduled_run_time: None,
            error: None,
        }
    }

    pub fn job(code: u32, job_id: &str) -> Self {
        Self {
            job_id: Some(job_id.to_string()),
            ..Self::scheduler(code)
        }
    }

    fn run(code: u32, job_id: &str, run_time: DateTime<Utc>) -> Self {
        Self {
            scheduled_run_time: Some(run_time),
            ..Self::job(code, job_id)
        }
    }
}

/// Work performed when a job fires.
pub type JobCallback = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Receives engine events whose code matches the registration mask.
pub type EngineListener = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Everything needed to register a job.
#[derive(Clone)]
pub struct JobSpec {
    pub id: String,
    pub trigger: Trigger,
    pub callback: JobCallback,
}

/// Point-in-time view of a registered job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub id: String,
    pub trigger: Trigger,
    /// `None` while the job is paused.
    pub next_run_time: Option<DateTime<Utc>>,
    pub paused: bool,
}

/// Minimal interface the `Scheduler` needs from a timer engine.
///
/// Implementations must tolerate job mutation concurrently with firing.
pub trait TimerEngine: Send + Sync + 'static {
    /// Register a job, replacing any existing job with the same id.
    fn add_job(&self, spec: JobSpec);

    fn remove_job(&self, job_id: &str) -> Result<(), EngineError>;

    fn pause_job(&self, job_id: &str) -> Result<(), EngineError>;

    fn resume_job(&self, job_id: &str) -> Result<(), EngineError>;

    /// Swap a job's trigger, keeping its id, callback and paused flag.
    fn reschedule_job(&self, job_id: &str, trigger: Trigger) -> Result<(), EngineError>;

    fn get_jobs(&self) -> Vec<JobSnapshot>;

    fn get_job(&self, job_id: &str) -> Option<JobSnapshot>;

    fn state(&self) -> SchedulerState;

    fn start(&self) -> Result<SchedulerState, TransitionRejected>;

    /// Stop firing. With `wait`, resolves only after the timer loop and every
    /// in-flight callback have finished.
    fn stop(
        &self,
        wait: bool,
    ) -> impl Future<Output = Result<SchedulerState, TransitionRejected>> + Send;

    fn pause(&self) -> Result<SchedulerState, TransitionRejected>;

    fn resume(&self) -> Result<SchedulerState, TransitionRejected>;

    fn add_listener(&self, listener: EngineListener, mask: u32);
}

// ---------------------------------------------------------------------------
// LocalTimerEngine
// ---------------------------------------------------------------------------

struct JobEntry {
    trigger: Trigger,
    callback: JobCallback,
    next_run_time: Option<DateTime<Utc>>,
    paused: bool,
    running: Arc<AtomicUsize>,
}

impl JobEntry {
    fn snapshot(&self, id: &str) -> JobSnapshot {
        JobSnapshot {
            id: id.to_string(),
            trigger: self.trigger.clone(),
            next_run_time: self.next_run_time,
            paused: self.paused,
        }
    }
}

struct RunHandle {
    cancel: CancellationToken,
    tracker: TaskTracker,
    timer: JoinHandle<()>,
}

struct Store {
    state: SchedulerState,
    jobs: HashMap<String, JobEntry>,
    run: Option<RunHandle>,
}

struct Shared {
    store: Mutex<Store>,
    listeners: RwLock<Vec<(u32, EngineListener)>>,
    wakeup: Notify,
    misfire_grace: chrono::Duration,
    max_instances: usize,
    idle_poll: std::time::Duration,
}

/// A callback that came due during a timer pass.
struct DueRun {
    job_id: String,
    run_time: DateTime<Utc>,
    callback: JobCallback,
    running: Arc<AtomicUsize>,
}

/// In-process timer engine backed by the tokio runtime it is started on.
pub struct LocalTimerEngine {
    shared: Arc<Shared>,
}

impl LocalTimerEngine {
    pub fn new(config: &SchedulerConfig) -> Self {
        let misfire_grace = i64::try_from(config.misfire_grace_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(Store {
                    state: SchedulerState::Stopped,
                    jobs: HashMap::new(),
                    run: None,
                }),
                listeners: RwLock::new(Vec::new()),
                wakeup: Notify::new(),
                misfire_grace,
                max_instances: config.max_instances.max(1),
                idle_poll: std::time::Duration::from_secs(config.idle_poll_secs.max(1)),
            }),
        }
    }

    /// Apply `f` to an existing job, or report it missing.
    fn with_job<T>(
        &self,
        job_id: &str,
        f: impl FnOnce(&mut JobEntry) -> T,
    ) -> Result<T, EngineError> {
        let mut store = lock(&self.shared.store);
        let job = store
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| EngineError::JobNotFound(job_id.to_string()))?;
        Ok(f(job))
    }

    /// Set `Stopped`, returning the run handle to drain, if any.
    fn begin_stop(
        &self,
        wait: bool,
    ) -> Result<Option<RunHandle>, TransitionRejected> {
        let mut store = lock(&self.shared.store);
        match store.state {
            SchedulerState::Stopped => return Err(TransitionRejected::AlreadyStopped),
            SchedulerState::ShuttingDown => return Err(TransitionRejected::ShuttingDown),
            SchedulerState::Running | SchedulerState::Paused => {}
        }
        store.state = if wait {
            SchedulerState::ShuttingDown
        } else {
            SchedulerState::Stopped
        };
        let run = store.run.take();
        if let Some(run) = &run {
            run.cancel.cancel();
            run.tracker.close();
        }
        Ok(run)
    }
}

impl TimerEngine for LocalTimerEngine {
    fn add_job(&self, spec: JobSpec) {
        let now = Utc::now();
        let next_run_time = spec.trigger.next_fire_time(None, now);
        let replaced = {
            let mut store = lock(&self.shared.store);
            store
                .jobs
                .insert(
                    spec.id.clone(),
                    JobEntry {
                        trigger: spec.trigger,
                        callback: spec.callback,
                        next_run_time,
                        paused: false,
                        running: Arc::new(AtomicUsize::new(0)),
                    },
                )
                .is_some()
        };
        tracing::debug!(job_id = %spec.id, replaced, ?next_run_time, "job added");
        self.shared.wakeup.notify_one();
        self.shared.dispatch(&EngineEvent::job(codes::JOB_ADDED, &spec.id));
    }

    fn remove_job(&self, job_id: &str) -> Result<(), EngineError> {
        let removed = lock(&self.shared.store).jobs.remove(job_id).is_some();
        if !removed {
            return Err(EngineError::JobNotFound(job_id.to_string()));
        }
        tracing::debug!(%job_id, "job removed");
        self.shared.dispatch(&EngineEvent::job(codes::JOB_REMOVED, job_id));
        Ok(())
    }

    fn pause_job(&self, job_id: &str) -> Result<(), EngineError> {
        self.with_job(job_id, |job| {
            job.paused = true;
            job.next_run_time = None;
        })?;
        self.shared.dispatch(&EngineEvent::job(codes::JOB_MODIFIED, job_id));
        Ok(())
    }

    fn resume_job(&self, job_id: &str) -> Result<(), EngineError> {
        let now = Utc::now();
        self.with_job(job_id, |job| {
            job.paused = false;
            job.next_run_time = job.trigger.next_fire_time(None, now);
        })?;
        self.shared.wakeup.notify_one();
        self.shared.dispatch(&EngineEvent::job(codes::JOB_MODIFIED, job_id));
        Ok(())
    }

    fn reschedule_job(&self, job_id: &str, trigger: Trigger) -> Result<(), EngineError> {
        let now = Utc::now();
        self.with_job(job_id, |job| {
            if !job.paused {
                job.next_run_time = trigger.next_fire_time(None, now);
            }
            job.trigger = trigger;
        })?;
        self.shared.wakeup.notify_one();
        self.shared.dispatch(&EngineEvent::job(codes::JOB_MODIFIED, job_id));
        Ok(())
    }

    fn get_jobs(&self) -> Vec<JobSnapshot> {
        let store = lock(&self.shared.store);
        let mut jobs: Vec<JobSnapshot> = store
            .jobs
            .iter()
            .map(|(id, job)| job.snapshot(id))
            .collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        jobs
    }

    fn get_job(&self, job_id: &str) -> Option<JobSnapshot> {
        lock(&self.shared.store)
            .jobs
            .get(job_id)
            .map(|job| job.snapshot(job_id))
    }

    fn state(&self) -> SchedulerState {
        lock(&self.shared.store).state
    }

    fn start(&self) -> Result<SchedulerState, TransitionRejected> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TransitionRejected::NoRuntime)?;
        {
            let mut store = lock(&self.shared.store);
            match store.state {
                SchedulerState::Stopped => {}
                SchedulerState::ShuttingDown => return Err(TransitionRejected::ShuttingDown),
                SchedulerState::Running | SchedulerState::Paused => {
                    return Err(TransitionRejected::AlreadyRunning);
                }
            }
            let cancel = CancellationToken::new();
            let tracker = TaskTracker::new();
            let timer = runtime.spawn(run_timer(
                Arc::clone(&self.shared),
                cancel.clone(),
                tracker.clone(),
            ));
            store.state = SchedulerState::Running;
            store.run = Some(RunHandle {
                cancel,
                tracker,
                timer,
            });
        }
        tracing::info!(jobs = self.get_jobs().len(), "timer engine started");
        self.shared
            .dispatch(&EngineEvent::scheduler(codes::SCHEDULER_STARTED));
        Ok(SchedulerState::Running)
    }

    fn stop(
        &self,
        wait: bool,
    ) -> impl Future<Output = Result<SchedulerState, TransitionRejected>> + Send {
        let begun = self.begin_stop(wait);
        let shared = Arc::clone(&self.shared);
        async move {
            let run = begun?;
            if wait {
                if let Some(run) = run {
                    drain(run).await;
                }
                lock(&shared.store).state = SchedulerState::Stopped;
            } else if let Some(run) = run {
                tokio::spawn(drain(run));
            }
            tracing::info!(wait, "timer engine stopped");
            shared.dispatch(&EngineEvent::scheduler(codes::SCHEDULER_SHUTDOWN));
            Ok(SchedulerState::Stopped)
        }
    }

    fn pause(&self) -> Result<SchedulerState, TransitionRejected> {
        {
            let mut store = lock(&self.shared.store);
            match store.state {
                SchedulerState::Running => store.state = SchedulerState::Paused,
                SchedulerState::Paused => return Err(TransitionRejected::AlreadyPaused),
                SchedulerState::Stopped => return Err(TransitionRejected::PauseWhileStopped),
                SchedulerState::ShuttingDown => return Err(TransitionRejected::ShuttingDown),
            }
        }
        tracing::info!("timer engine paused");
        self.shared
            .dispatch(&EngineEvent::scheduler(codes::SCHEDULER_PAUSED));
        Ok(SchedulerState::Paused)
    }

    fn resume(&self) -> Result<SchedulerState, TransitionRejected> {
        {
            let mut store = lock(&self.shared.store);
            match store.state {
                SchedulerState::Paused => store.state = SchedulerState::Running,
                SchedulerState::ShuttingDown => return Err(TransitionRejected::ShuttingDown),
                SchedulerState::Running | SchedulerState::Stopped => {
                    return Err(TransitionRejected::NotPaused);
                }
            }
        }
        self.shared.wakeup.notify_one();
        tracing::info!("timer engine resumed");
        self.shared
            .dispatch(&EngineEvent::scheduler(codes::SCHEDULER_RESUMED));
        Ok(SchedulerState::Running)
    }

    fn add_listener(&self, listener: EngineListener, mask: u32) {
        self.shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((mask, listener));
    }
}

impl std::fmt::Debug for LocalTimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = lock(&self.shared.store);
        f.debug_struct("LocalTimerEngine")
            .field("state", &store.state)
            .field("jobs", &store.jobs.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Timer loop
// ---------------------------------------------------------------------------

impl Shared {
    /// Invoke every listener whose mask matches. Listener panics are contained.
    fn dispatch(&self, event: &EngineEvent) {
        let listeners: Vec<EngineListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(mask, _)| mask & event.code != 0)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                tracing::error!(
                    code = event.code,
                    error = %panic_message(panic.as_ref()),
                    "engine listener panicked"
                );
            }
        }
    }

    /// Fire every due job and return how long to sleep before the next pass.
    fn process_due_jobs(self: &Arc<Self>, tracker: &TaskTracker) -> std::time::Duration {
        let now = Utc::now();
        let mut events = Vec::new();
        let mut due = Vec::new();
        let mut wait = self.idle_poll;

        {
            let mut store = lock(&self.store);
            if store.state != SchedulerState::Running {
                return wait;
            }

            let mut exhausted = Vec::new();
            for (id, job) in store.jobs.iter_mut() {
                if job.paused {
                    continue;
                }
                let Some(first) = job.next_run_time else {
                    exhausted.push(id.clone());
                    continue;
                };
                if first > now {
                    continue;
                }

                // Coalesce every overdue run into the latest one.
                let mut run_time = first;
                let mut next = job.trigger.next_fire_time(Some(run_time), now);
                let mut examined = 0;
                while let Some(candidate) = next {
                    if candidate > now || examined >= MAX_CATCH_UP_RUNS {
                        break;
                    }
                    run_time = candidate;
                    next = job.trigger.next_fire_time(Some(candidate), now);
                    examined += 1;
                }
                job.next_run_time = next;

                if now - run_time > self.misfire_grace {
                    tracing::warn!(job_id = %id, %run_time, "run time of job was missed");
                    events.push(EngineEvent::run(codes::JOB_MISSED, id, run_time));
                } else if job.running.load(Ordering::SeqCst) >= self.max_instances {
                    tracing::warn!(
                        job_id = %id,
                        max_instances = self.max_instances,
                        "maximum number of running instances reached, skipping run"
                    );
                    events.push(EngineEvent::run(codes::JOB_MAX_INSTANCES, id, run_time));
                } else {
                    job.running.fetch_add(1, Ordering::SeqCst);
                    due.push(DueRun {
                        job_id: id.clone(),
                        run_time,
                        callback: Arc::clone(&job.callback),
                        running: Arc::clone(&job.running),
                    });
                }

                if job.next_run_time.is_none() {
                    exhausted.push(id.clone());
                }
            }

            for id in exhausted {
                store.jobs.remove(&id);
                tracing::debug!(job_id = %id, "job has no further run times, removed");
                events.push(EngineEvent::job(codes::JOB_REMOVED, &id));
            }

            if let Some(earliest) = store.jobs.values().filter_map(|j| j.next_run_time).min() {
                let until = (earliest - now).to_std().unwrap_or_default();
                wait = wait.min(until);
            }
        }

        for run in due {
            tracing::debug!(job_id = %run.job_id, run_time = %run.run_time, "running job");
            let shared = Arc::clone(self);
            tracker.spawn_blocking(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| (run.callback)()));
                run.running.fetch_sub(1, Ordering::SeqCst);
                let mut event = EngineEvent::run(codes::JOB_EXECUTED, &run.job_id, run.run_time);
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        event.code = codes::JOB_ERROR;
                        event.error = Some(format!("{e:#}"));
                    }
                    Err(panic) => {
                        event.code = codes::JOB_ERROR;
                        event.error = Some(panic_message(panic.as_ref()));
                    }
                }
                if let Some(error) = &event.error {
                    tracing::error!(job_id = %run.job_id, %error, "job raised an error");
                }
                shared.dispatch(&event);
            });
        }

        for event in &events {
            self.dispatch(event);
        }
        wait
    }
}

async fn run_timer(shared: Arc<Shared>, cancel: CancellationToken, tracker: TaskTracker) {
    loop {
        let wait = shared.process_due_jobs(&tracker);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = shared.wakeup.notified() => {}
            _ = tokio::time::sleep(wait) => {}
        }
    }
    tracing::debug!("timer loop exited");
}

/// Wait for the timer loop and every in-flight callback to finish.
async fn drain(run: RunHandle) {
    if let Err(e) = run.timer.await {
        tracing::error!(error = %e, "timer loop terminated abnormally");
    }
    run.tracker.wait().await;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration as StdDuration;

    use crate::scheduler::trigger::{DateTrigger, IntervalTrigger};

    fn engine() -> LocalTimerEngine {
        LocalTimerEngine::new(&SchedulerConfig::default())
    }

    fn record_events(engine: &LocalTimerEngine, mask: u32) -> Arc<Mutex<Vec<EngineEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        engine.add_listener(
            Arc::new(move |event: &EngineEvent| sink.lock().unwrap().push(event.clone())),
            mask,
        );
        events
    }

    fn codes_of(events: &Arc<Mutex<Vec<EngineEvent>>>) -> Vec<u32> {
        events.lock().unwrap().iter().map(|e| e.code).collect()
    }

    fn every(millis: i64) -> Trigger {
        Trigger::Interval(IntervalTrigger {
            every: chrono::Duration::milliseconds(millis),
            start_date: Utc::now() + chrono::Duration::milliseconds(millis),
            end_date: None,
        })
    }

    fn once_in(millis: i64) -> Trigger {
        Trigger::OneOff(DateTrigger {
            run_date: Utc::now() + chrono::Duration::milliseconds(millis),
        })
    }

    fn counting_job(id: &str, trigger: Trigger, counter: &Arc<AtomicUsize>) -> JobSpec {
        let counter = Arc::clone(counter);
        JobSpec {
            id: id.to_string(),
            trigger,
            callback: Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        panic!("condition not met within 2s");
    }

    #[test]
    fn start_outside_runtime_is_rejected() {
        let engine = engine();
        assert_eq!(engine.start(), Err(TransitionRejected::NoRuntime));
        assert_eq!(engine.state(), SchedulerState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn state_machine_transitions() {
        let engine = engine();
        let events = record_events(&engine, codes::ALL);

        assert_eq!(engine.pause(), Err(TransitionRejected::PauseWhileStopped));
        assert_eq!(engine.resume(), Err(TransitionRejected::NotPaused));
        assert_eq!(engine.stop(true).await, Err(TransitionRejected::AlreadyStopped));

        assert_eq!(engine.start(), Ok(SchedulerState::Running));
        assert_eq!(engine.start(), Err(TransitionRejected::AlreadyRunning));
        assert_eq!(engine.pause(), Ok(SchedulerState::Paused));
        assert_eq!(engine.pause(), Err(TransitionRejected::AlreadyPaused));
        assert_eq!(engine.resume(), Ok(SchedulerState::Running));
        assert_eq!(engine.stop(true).await, Ok(SchedulerState::Stopped));
        assert_eq!(engine.state(), SchedulerState::Stopped);

        assert_eq!(
            codes_of(&events),
            vec![
                codes::SCHEDULER_STARTED,
                codes::SCHEDULER_PAUSED,
                codes::SCHEDULER_RESUMED,
                codes::SCHEDULER_SHUTDOWN
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn listener_mask_filters_codes() {
        let engine = engine();
        let events = record_events(&engine, codes::JOB_ADDED);
        engine.start().unwrap();
        engine.add_job(counting_job("a", every(60_000), &Arc::new(AtomicUsize::new(0))));
        engine.stop(true).await.unwrap();
        assert_eq!(codes_of(&events), vec![codes::JOB_ADDED]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn interval_job_fires_repeatedly() {
        let engine = engine();
        let counter = Arc::new(AtomicUsize::new(0));
        engine.add_job(counting_job("tick", every(30), &counter));
        engine.start().unwrap();

        wait_until(|| counter.load(Ordering::SeqCst) >= 3).await;
        engine.stop(true).await.unwrap();

        let after_stop = counter.load(Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
        assert!(engine.get_job("tick").is_some(), "jobs survive stop");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn one_off_job_fires_once_and_removes_itself() {
        let engine = engine();
        let events = record_events(&engine, codes::ALL);
        let counter = Arc::new(AtomicUsize::new(0));
        engine.start().unwrap();
        engine.add_job(counting_job("once", once_in(30), &counter));

        wait_until(|| codes_of(&events).contains(&codes::JOB_EXECUTED)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(engine.get_job("once").is_none());
        assert!(codes_of(&events).contains(&codes::JOB_REMOVED));
        engine.stop(true).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overdue_run_beyond_grace_is_missed() {
        let engine = engine();
        let events = record_events(&engine, codes::JOB_MISSED | codes::JOB_EXECUTED);
        let counter = Arc::new(AtomicUsize::new(0));
        engine.add_job(counting_job("late", once_in(-10_000), &counter));
        engine.start().unwrap();

        wait_until(|| codes_of(&events).contains(&codes::JOB_MISSED)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(engine.get_job("late").is_none());
        engine.stop(true).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn busy_job_skips_runs_at_max_instances() {
        let engine = engine();
        let events = record_events(&engine, codes::JOB_MAX_INSTANCES);
        engine.add_job(JobSpec {
            id: "slow".to_string(),
            trigger: every(20),
            callback: Arc::new(|| {
                std::thread::sleep(StdDuration::from_millis(200));
                Ok(())
            }),
        });
        engine.start().unwrap();

        wait_until(|| !events.lock().unwrap().is_empty()).await;
        engine.stop(true).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_callback_reports_job_error() {
        let engine = engine();
        let events = record_events(&engine, codes::JOB_ERROR);
        engine.add_job(JobSpec {
            id: "broken".to_string(),
            trigger: once_in(10),
            callback: Arc::new(|| Err(anyhow::anyhow!("executor unavailable"))),
        });
        engine.start().unwrap();

        wait_until(|| !events.lock().unwrap().is_empty()).await;
        let event = events.lock().unwrap()[0].clone();
        assert_eq!(event.job_id.as_deref(), Some("broken"));
        assert!(event.error.unwrap().contains("executor unavailable"));
        engine.stop(true).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pause_and_resume_job() {
        let engine = engine();
        let counter = Arc::new(AtomicUsize::new(0));
        engine.add_job(counting_job("job", every(60_000), &counter));

        engine.pause_job("job").unwrap();
        let paused = engine.get_job("job").unwrap();
        assert!(paused.paused);
        assert_eq!(paused.next_run_time, None);

        engine.reschedule_job("job", every(30_000)).unwrap();
        assert!(engine.get_job("job").unwrap().paused);

        engine.resume_job("job").unwrap();
        let resumed = engine.get_job("job").unwrap();
        assert!(!resumed.paused);
        assert!(resumed.next_run_time.is_some());

        assert_eq!(
            engine.pause_job("missing"),
            Err(EngineError::JobNotFound("missing".to_string()))
        );
        assert!(engine.resume_job("missing").is_err());
        assert!(engine.reschedule_job("missing", every(10)).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn add_job_replaces_same_id() {
        let engine = engine();
        let counter = Arc::new(AtomicUsize::new(0));
        engine.add_job(counting_job("dup", every(60_000), &counter));
        engine.add_job(counting_job("dup", every(120_000), &counter));
        assert_eq!(engine.get_jobs().len(), 1);

        assert!(engine.remove_job("dup").is_ok());
        assert_eq!(
            engine.remove_job("dup"),
            Err(EngineError::JobNotFound("dup".to_string()))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_with_wait_drains_in_flight_callbacks() {
        let engine = engine();
        let finished = Arc::new(AtomicBool::new(false));
        let started = Arc::new(AtomicBool::new(false));
        let (f, s) = (Arc::clone(&finished), Arc::clone(&started));
        engine.add_job(JobSpec {
            id: "long".to_string(),
            trigger: once_in(10),
            callback: Arc::new(move || {
                s.store(true, Ordering::SeqCst);
                std::thread::sleep(StdDuration::from_millis(200));
                f.store(true, Ordering::SeqCst);
                Ok(())
            }),
        });
        engine.start().unwrap();

        wait_until(|| started.load(Ordering::SeqCst)).await;
        engine.stop(true).await.unwrap();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn paused_engine_does_not_fire() {
        let engine = engine();
        let counter = Arc::new(AtomicUsize::new(0));
        engine.start().unwrap();
        engine.pause().unwrap();
        engine.add_job(counting_job("held", every(20), &counter));

        tokio::time::sleep(StdDuration::from_millis(150)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        engine.resume().unwrap();
        wait_until(|| counter.load(Ordering::SeqCst) >= 1).await;
        engine.stop(true).await.unwrap();
    }
}
