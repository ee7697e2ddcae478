//! Case recorder: matches bus events against the subscription table and
//! persists the matches.
//!
//! Matching happens synchronously on the publisher's thread, against the
//! table snapshot in effect at emission time. Matches are queued on a single
//! ordered channel and written by one writer task, so each case log keeps
//! global emission order without blocking publishers on storage.
//!
//! A failed write is retried with backoff. A batch that still fails stays
//! queued ahead of later events and the error is returned from `flush`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};

use cadence_types::case::{CaseEvent, CaseSummary, SubscriptionTable};
use cadence_types::error::RepositoryError;
use cadence_types::event::{EventKind, ExecutionEvent};

use super::subscription::SubscriptionRegistry;
use crate::event::{EventBus, ListenerId};
use crate::repository::CaseRepository;

/// Most events written in a single repository call.
const MAX_BATCH: usize = 256;

/// Repository calls per batch before the error is reported to flushers.
const WRITE_ATTEMPTS: u32 = 4;
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

enum RecorderCommand {
    Record(CaseEvent),
    Flush(oneshot::Sender<Result<(), RepositoryError>>),
}

/// Bus listener that appends subscribed events to their cases' logs.
pub struct CaseRecorder<R: CaseRepository> {
    subscriptions: Arc<SubscriptionRegistry>,
    repository: Arc<R>,
    commands: mpsc::UnboundedSender<RecorderCommand>,
    listener_id: ListenerId,
}

impl<R: CaseRepository> CaseRecorder<R> {
    /// Spawn the writer task and connect to every event kind on `bus`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        bus: &EventBus,
        subscriptions: Arc<SubscriptionRegistry>,
        repository: Arc<R>,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&repository), rx));

        let sender = commands.clone();
        let registry = Arc::clone(&subscriptions);
        let listener_id = bus.connect_all(
            EventKind::ALL,
            "case-recorder",
            Arc::new(move |event: &ExecutionEvent| {
                // Queue under the read lock so a case removal cannot slip
                // between matching and sending.
                registry.read(|table| -> anyhow::Result<()> {
                    for case_name in table.cases_matching(&event.entity_id, event.kind) {
                        let record = CaseEvent::from_event(case_name, event);
                        sender
                            .send(RecorderCommand::Record(record))
                            .map_err(|_| anyhow!("case writer has shut down"))?;
                    }
                    Ok(())
                })
            }),
        );
        tracing::info!("case recorder started");

        Self {
            subscriptions,
            repository,
            commands,
            listener_id,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.subscriptions
    }

    /// Atomically replace the subscription table.
    pub fn set_subscriptions(&self, table: SubscriptionTable) {
        self.subscriptions.set_subscriptions(table);
    }

    pub fn subscriptions(&self) -> Arc<SubscriptionTable> {
        self.subscriptions.snapshot()
    }

    /// Wait until every match queued so far has been persisted.
    ///
    /// Returns the repository error if queued events could not be written.
    /// Those events are kept and retried on the next write.
    pub async fn flush(&self) -> Result<(), RepositoryError> {
        let (done, wait) = oneshot::channel();
        self.commands
            .send(RecorderCommand::Flush(done))
            .map_err(|_| writer_gone())?;
        wait.await.map_err(|_| writer_gone())?
    }

    /// The case's recorded events in emission order.
    pub async fn get_case_events(
        &self,
        case_name: &str,
    ) -> Result<Vec<CaseEvent>, RepositoryError> {
        self.flush().await?;
        self.repository.list_events(case_name).await
    }

    pub async fn list_cases(&self) -> Result<Vec<CaseSummary>, RepositoryError> {
        self.flush().await?;
        self.repository.list_cases().await
    }

    /// Remove a case's subscriptions and its persisted log.
    ///
    /// Publishers that matched the case before removal have queued their
    /// events by the time `remove_cases` returns, so the flush below covers
    /// them and nothing for the case is written after the delete.
    pub async fn delete_case(&self, case_name: &str) -> Result<u64, RepositoryError> {
        self.subscriptions.remove_cases(&[case_name]);
        self.flush().await?;
        let deleted = self.repository.delete_case(case_name).await?;
        tracing::info!(case_name, deleted, "case deleted");
        Ok(deleted)
    }

    /// Disconnect from `bus`. Already queued matches are still written.
    pub fn detach(&self, bus: &EventBus) -> bool {
        bus.disconnect(self.listener_id)
    }
}

fn writer_gone() -> RepositoryError {
    RepositoryError::Query("case writer is not running".to_string())
}

async fn run_writer<R: CaseRepository>(
    repository: Arc<R>,
    mut rx: mpsc::UnboundedReceiver<RecorderCommand>,
) {
    let mut batch = Vec::new();
    let mut waiters = Vec::new();

    while let Some(command) = rx.recv().await {
        let mut next = Some(command);
        while let Some(command) = next.take() {
            match command {
                RecorderCommand::Record(event) => batch.push(event),
                RecorderCommand::Flush(done) => waiters.push(done),
            }
            if batch.len() < MAX_BATCH {
                next = rx.try_recv().ok();
            }
        }

        let outcome = if batch.is_empty() {
            Ok(())
        } else {
            write_batch(repository.as_ref(), &mut batch).await
        };
        for done in waiters.drain(..) {
            let _ = done.send(outcome.clone());
        }
    }
    if !batch.is_empty() {
        tracing::error!(count = batch.len(), "case writer exited with unwritten events");
    }
    tracing::debug!("case writer exited");
}

/// Append `batch`, retrying with doubling backoff. The batch is cleared once
/// it is written, or when the repository rejects it as a conflict since its
/// rows are already stored. Any other failure leaves it in place.
async fn write_batch<R: CaseRepository>(
    repository: &R,
    batch: &mut Vec<CaseEvent>,
) -> Result<(), RepositoryError> {
    let mut delay = RETRY_BACKOFF;
    let mut attempt = 1;
    loop {
        match repository.append_events(batch).await {
            Ok(()) => {
                tracing::debug!(count = batch.len(), "case events persisted");
                batch.clear();
                return Ok(());
            }
            Err(e @ RepositoryError::Conflict(_)) => {
                tracing::error!(error = %e, count = batch.len(), "case events already stored");
                batch.clear();
                return Err(e);
            }
            Err(e) if attempt < WRITE_ATTEMPTS => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    count = batch.len(),
                    "case write failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(error = %e, count = batch.len(), "failed to persist case events");
                return Err(e);
            }
        }
    }
}
