//! Case subscription and case event log types.
//!
//! A case is an operator-named collection of event subscriptions: for each
//! entity id, the set of event kinds the operator wants recorded. Matches are
//! persisted as append-only `CaseEvent` rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{EntityType, EventKind, EventPayload, ExecutionEvent};

/// Entity id -> subscribed event kinds, for a single case.
pub type CaseSubscriptions = HashMap<String, HashSet<EventKind>>;

/// The full subscription table: case name -> entity subscriptions.
///
/// Treated as an immutable value. Every mutation builds a new table which
/// replaces the published one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionTable {
    cases: BTreeMap<String, CaseSubscriptions>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a plain nested mapping.
    pub fn from_cases<C, E, K>(cases: C) -> Self
    where
        C: IntoIterator<Item = (String, E)>,
        E: IntoIterator<Item = (String, K)>,
        K: IntoIterator<Item = EventKind>,
    {
        let cases = cases
            .into_iter()
            .map(|(case, entities)| {
                let subs = entities
                    .into_iter()
                    .map(|(entity, kinds)| (entity, kinds.into_iter().collect()))
                    .collect();
                (case, subs)
            })
            .collect();
        Self { cases }
    }

    /// Names of every case subscribed to `kind` on `entity_id`.
    pub fn cases_matching<'a>(
        &'a self,
        entity_id: &'a str,
        kind: EventKind,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.cases.iter().filter_map(move |(case, subs)| {
            subs.get(entity_id)
                .filter(|kinds| kinds.contains(&kind))
                .map(|_| case.as_str())
        })
    }

    pub fn get(&self, case_name: &str) -> Option<&CaseSubscriptions> {
        self.cases.get(case_name)
    }

    pub fn contains_case(&self, case_name: &str) -> bool {
        self.cases.contains_key(case_name)
    }

    pub fn case_names(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// A copy of this table with `case_name` set to `subscriptions`.
    pub fn with_case(&self, case_name: &str, subscriptions: CaseSubscriptions) -> Self {
        let mut next = self.clone();
        next.cases.insert(case_name.to_string(), subscriptions);
        next
    }

    /// A copy of this table without the named cases.
    pub fn without_cases<'a>(&self, case_names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut next = self.clone();
        for name in case_names {
            next.cases.remove(name);
        }
        next
    }

    /// A copy of this table with `old` renamed to `new`, or `None` if `old`
    /// does not exist or `new` is already taken.
    pub fn with_renamed(&self, old: &str, new: &str) -> Option<Self> {
        if old == new || self.cases.contains_key(new) {
            return None;
        }
        let mut next = self.clone();
        let subs = next.cases.remove(old)?;
        next.cases.insert(new.to_string(), subs);
        Some(next)
    }
}

/// A matched event persisted in a case's log. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseEvent {
    pub id: Uuid,
    pub case_name: String,
    /// Id of the bus event this record was created from.
    pub event_id: Uuid,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl CaseEvent {
    /// Record `event` under `case_name`.
    pub fn from_event(case_name: &str, event: &ExecutionEvent) -> Self {
        Self {
            id: Uuid::now_v7(),
            case_name: case_name.to_string(),
            event_id: event.id,
            entity_id: event.entity_id.clone(),
            entity_type: event.entity_type(),
            kind: event.kind,
            timestamp: event.timestamp,
            payload: event.payload.clone(),
        }
    }
}

/// Per-case totals reported by a case repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub case_name: String,
    pub event_count: u64,
    pub last_event_at: Option<DateTime<Utc>>,
}
