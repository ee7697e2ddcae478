//! In-memory case repository, for tests and the `memory` backend.

use dashmap::DashMap;

use cadence_types::case::{CaseEvent, CaseSummary};
use cadence_types::error::RepositoryError;

use super::case::CaseRepository;

/// Case logs held in a `DashMap`, lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryCaseRepository {
    logs: DashMap<String, Vec<CaseEvent>>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaseRepository for InMemoryCaseRepository {
    async fn append_events(&self, events: &[CaseEvent]) -> Result<(), RepositoryError> {
        for event in events {
            self.logs
                .entry(event.case_name.clone())
                .or_default()
                .push(event.clone());
        }
        Ok(())
    }

    async fn list_events(&self, case_name: &str) -> Result<Vec<CaseEvent>, RepositoryError> {
        Ok(self
            .logs
            .get(case_name)
            .map(|log| log.clone())
            .unwrap_or_default())
    }

    async fn list_cases(&self) -> Result<Vec<CaseSummary>, RepositoryError> {
        let mut cases: Vec<CaseSummary> = self
            .logs
            .iter()
            .filter(|entry| !entry.is_empty())
            .map(|entry| CaseSummary {
                case_name: entry.key().clone(),
                event_count: entry.len() as u64,
                last_event_at: entry.last().map(|event| event.timestamp),
            })
            .collect();
        cases.sort_by(|a, b| a.case_name.cmp(&b.case_name));
        Ok(cases)
    }

    async fn delete_case(&self, case_name: &str) -> Result<u64, RepositoryError> {
        Ok(self
            .logs
            .remove(case_name)
            .map_or(0, |(_, log)| log.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_types::event::{EventKind, EventPayload, ExecutionEvent};

    fn event(case_name: &str, kind: EventKind) -> CaseEvent {
        let event = ExecutionEvent::new("wf-1", kind, EventPayload::Empty);
        CaseEvent::from_event(case_name, &event)
    }

    #[tokio::test]
    async fn test_append_and_list_preserves_order() {
        let repo = InMemoryCaseRepository::new();
        let batch = vec![
            event("case1", EventKind::WorkflowExecutionStart),
            event("case1", EventKind::ActionStarted),
            event("case2", EventKind::ActionStarted),
            event("case1", EventKind::WorkflowShutdown),
        ];
        repo.append_events(&batch).await.unwrap();

        let kinds: Vec<EventKind> = repo
            .list_events("case1")
            .await
            .unwrap()
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::WorkflowExecutionStart,
                EventKind::ActionStarted,
                EventKind::WorkflowShutdown
            ]
        );
        assert!(repo.list_events("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_delete_cases() {
        let repo = InMemoryCaseRepository::new();
        repo.append_events(&[
            event("b", EventKind::ActionStarted),
            event("a", EventKind::ActionStarted),
            event("a", EventKind::ActionExecutionSuccess),
        ])
        .await
        .unwrap();

        let cases = repo.list_cases().await.unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].case_name, "a");
        assert_eq!(cases[0].event_count, 2);

        assert_eq!(repo.delete_case("a").await.unwrap(), 2);
        assert_eq!(repo.delete_case("a").await.unwrap(), 0);
        assert_eq!(repo.list_cases().await.unwrap().len(), 1);
    }
}
