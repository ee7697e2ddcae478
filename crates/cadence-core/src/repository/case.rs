//! Case event log repository trait definition.
//!
//! Case logs are append-only: events are only ever added in order, read back
//! in that same order, or dropped wholesale when a case is deleted.

use cadence_types::case::{CaseEvent, CaseSummary};
use cadence_types::error::RepositoryError;

/// Repository trait for case event persistence.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait CaseRepository: Send + Sync + 'static {
    /// Append a batch of events, preserving slice order.
    fn append_events(
        &self,
        events: &[CaseEvent],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All events recorded for `case_name`, oldest first.
    fn list_events(
        &self,
        case_name: &str,
    ) -> impl std::future::Future<Output = Result<Vec<CaseEvent>, RepositoryError>> + Send;

    /// Every case with at least one recorded event, ordered by name.
    fn list_cases(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<CaseSummary>, RepositoryError>> + Send;

    /// Drop a case's event log. Returns the number of events removed.
    fn delete_case(
        &self,
        case_name: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
