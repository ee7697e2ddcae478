//! SQLite case repository implementation.
//!
//! Every matched event is one row in `case_events`. The autoincrement `seq`
//! column records insertion order, which is the order logs are read back in.

use cadence_core::repository::CaseRepository;
use cadence_types::case::{CaseEvent, CaseSummary};
use cadence_types::error::RepositoryError;
use cadence_types::event::{EntityType, EventKind, EventPayload};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `CaseRepository`.
pub struct SqliteCaseRepository {
    pool: DatabasePool,
}

impl SqliteCaseRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct CaseEventRow {
    id: String,
    case_name: String,
    event_id: String,
    entity_id: String,
    entity_type: String,
    kind: String,
    timestamp: String,
    payload: String,
}

impl CaseEventRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            case_name: row.try_get("case_name")?,
            event_id: row.try_get("event_id")?,
            entity_id: row.try_get("entity_id")?,
            entity_type: row.try_get("entity_type")?,
            kind: row.try_get("kind")?,
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
        })
    }

    fn into_event(self) -> Result<CaseEvent, RepositoryError> {
        let entity_type: EntityType =
            serde_json::from_value(serde_json::Value::String(self.entity_type))
                .map_err(|e| RepositoryError::Query(format!("invalid entity type: {e}")))?;
        let kind: EventKind = self.kind.parse().map_err(RepositoryError::Query)?;
        let payload: EventPayload = serde_json::from_str(&self.payload)
            .map_err(|e| RepositoryError::Query(format!("invalid payload JSON: {e}")))?;

        Ok(CaseEvent {
            id: parse_uuid(&self.id)?,
            case_name: self.case_name,
            event_id: parse_uuid(&self.event_id)?,
            entity_id: self.entity_id,
            entity_type,
            kind,
            timestamp: parse_datetime(&self.timestamp)?,
            payload,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    s.parse::<Uuid>()
        .map_err(|e| RepositoryError::Query(format!("invalid UUID: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl CaseRepository for SqliteCaseRepository {
    async fn append_events(&self, events: &[CaseEvent]) -> Result<(), RepositoryError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for event in events {
            let payload = serde_json::to_string(&event.payload)
                .map_err(|e| RepositoryError::Query(format!("payload serialization: {e}")))?;

            sqlx::query(
                "INSERT INTO case_events (id, case_name, event_id, entity_id, entity_type, kind, timestamp, payload)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(event.id.to_string())
            .bind(&event.case_name)
            .bind(event.event_id.to_string())
            .bind(&event.entity_id)
            .bind(event.entity_type.to_string())
            .bind(event.kind.as_str())
            .bind(format_datetime(&event.timestamp))
            .bind(payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.message().contains("UNIQUE") {
                        return RepositoryError::Conflict(format!(
                            "case event {} already recorded",
                            event.id
                        ));
                    }
                }
                RepositoryError::Query(e.to_string())
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_events(&self, case_name: &str) -> Result<Vec<CaseEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, case_name, event_id, entity_id, entity_type, kind, timestamp, payload
             FROM case_events WHERE case_name = ? ORDER BY seq ASC",
        )
        .bind(case_name)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let row = CaseEventRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            events.push(row.into_event()?);
        }
        Ok(events)
    }

    async fn list_cases(&self) -> Result<Vec<CaseSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT case_name, COUNT(*) AS event_count,
                    (SELECT timestamp FROM case_events latest
                     WHERE latest.case_name = e.case_name
                     ORDER BY seq DESC LIMIT 1) AS last_event_at
             FROM case_events e GROUP BY case_name ORDER BY case_name ASC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut cases = Vec::with_capacity(rows.len());
        for row in &rows {
            let case_name: String = row
                .try_get("case_name")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let event_count: i64 = row
                .try_get("event_count")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let last_event_at: Option<String> = row
                .try_get("last_event_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

            cases.push(CaseSummary {
                case_name,
                event_count: event_count as u64,
                last_event_at: last_event_at.as_deref().map(parse_datetime).transpose()?,
            });
        }
        Ok(cases)
    }

    async fn delete_case(&self, case_name: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM case_events WHERE case_name = ?")
            .bind(case_name)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
