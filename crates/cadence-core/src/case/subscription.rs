//! Process-wide subscription table with atomic replacement.
//!
//! Readers take an `Arc` snapshot and never see a partially updated table.
//! Writers build a new table from the current one and swap it in under the
//! write lock, so concurrent writers cannot lose each other's changes.

use std::sync::{Arc, PoisonError, RwLock};

use cadence_types::case::{CaseSubscriptions, SubscriptionTable};

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    current: RwLock<Arc<SubscriptionTable>>,
}

impl SubscriptionRegistry {
    pub fn new(table: SubscriptionTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// The table in effect right now.
    pub fn snapshot(&self) -> Arc<SubscriptionTable> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Run `f` against the current table with writers held off until it returns.
    pub fn read<T>(&self, f: impl FnOnce(&SubscriptionTable) -> T) -> T {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&current)
    }

    /// Replace the whole table. Nothing from the previous table survives.
    pub fn set_subscriptions(&self, table: SubscriptionTable) {
        let cases = table.len();
        self.replace(|_| Some(table));
        tracing::info!(cases, "case subscriptions replaced");
    }

    /// Add a case, or overwrite the subscriptions of an existing one.
    pub fn add_case(&self, case_name: &str, subscriptions: CaseSubscriptions) {
        self.replace(|current| Some(current.with_case(case_name, subscriptions)));
        tracing::info!(case_name, "case subscriptions set");
    }

    /// Drop the named cases. Returns how many existed.
    pub fn remove_cases<S: AsRef<str>>(&self, case_names: &[S]) -> usize {
        let mut removed = 0;
        self.replace(|current| {
            let names: Vec<&str> = case_names.iter().map(|name| name.as_ref()).collect();
            removed = names.iter().filter(|name| current.contains_case(name)).count();
            (removed > 0).then(|| current.without_cases(names))
        });
        removed
    }

    /// Rename a case. Returns `false` if `old` is missing or `new` is taken.
    pub fn rename_case(&self, old: &str, new: &str) -> bool {
        let mut renamed = false;
        self.replace(|current| {
            let next = current.with_renamed(old, new);
            renamed = next.is_some();
            next
        });
        if !renamed {
            tracing::warn!(old, new, "case rename rejected");
        }
        renamed
    }

    pub fn clear_subscriptions(&self) {
        self.replace(|_| Some(SubscriptionTable::new()));
    }

    /// Swap in the table built by `next`, or keep the current one on `None`.
    fn replace(&self, next: impl FnOnce(&SubscriptionTable) -> Option<SubscriptionTable>) {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = next(&current) {
            *current = Arc::new(table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use cadence_types::event::EventKind;

    fn subs(entity: &str, kinds: &[EventKind]) -> CaseSubscriptions {
        HashMap::from([(entity.to_string(), kinds.iter().copied().collect::<HashSet<_>>())])
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_replacement() {
        let registry = SubscriptionRegistry::default();
        registry.add_case("case1", subs("wf-1", &[EventKind::WorkflowShutdown]));
        let before = registry.snapshot();

        registry.set_subscriptions(SubscriptionTable::new());

        assert!(before.contains_case("case1"));
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_set_subscriptions_replaces_rather_than_merges() {
        let registry = SubscriptionRegistry::default();
        registry.add_case("first", subs("wf-1", &[EventKind::WorkflowShutdown]));

        let next =
            SubscriptionTable::new().with_case("second", subs("wf-2", &[EventKind::ActionStarted]));
        registry.set_subscriptions(next);

        let table = registry.snapshot();
        assert!(!table.contains_case("first"));
        assert!(table.contains_case("second"));
    }

    #[test]
    fn test_remove_rename_clear() {
        let registry = SubscriptionRegistry::default();
        registry.add_case("a", subs("wf", &[EventKind::ActionStarted]));
        registry.add_case("b", subs("wf", &[EventKind::ActionStarted]));

        assert_eq!(registry.remove_cases(&["a", "zzz"]), 1);
        assert_eq!(registry.remove_cases(&["a"]), 0);

        assert!(registry.rename_case("b", "c"));
        assert!(!registry.rename_case("b", "d"));
        assert_eq!(registry.snapshot().case_names().collect::<Vec<_>>(), vec!["c"]);

        registry.clear_subscriptions();
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_cases() {
        let registry = Arc::new(SubscriptionRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.add_case(&format!("case{i}"), subs("wf", &[EventKind::ActionStarted]));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.snapshot().len(), 8);
    }

    #[test]
    fn test_read_holds_off_writers_until_it_returns() {
        let registry = Arc::new(SubscriptionRegistry::default());
        registry.add_case("case1", subs("wf", &[EventKind::ActionStarted]));
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let reader = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                registry.read(|table| {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    table.contains_case("case1")
                })
            })
        };
        entered_rx.recv().unwrap();

        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.remove_cases(&["case1"]))
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!writer.is_finished());

        release_tx.send(()).unwrap();
        assert!(reader.join().unwrap());
        assert_eq!(writer.join().unwrap(), 1);
        assert!(registry.snapshot().is_empty());
    }
}
