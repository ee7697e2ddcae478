//! Synchronous typed event bus for execution lifecycle events.
//!
//! Listeners connect to one or more `EventKind`s and are invoked on the
//! publisher's thread, in registration order, every time an event of that
//! kind is published. A listener that returns an error or panics is logged
//! and skipped; the remaining listeners still run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use cadence_types::error::ListenerError;
use cadence_types::event::{EventKind, EventPayload, ExecutionEvent};

/// Callback invoked for each published event of a connected kind.
pub type Listener = Arc<dyn Fn(&ExecutionEvent) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by `connect`, used to disconnect the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    name: String,
    listener: Listener,
}

/// Multi-listener event bus keyed by event kind.
pub struct EventBus {
    listeners: DashMap<EventKind, Vec<Registration>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `listener` for `kind`. `name` is used in failure logs.
    pub fn connect(&self, kind: EventKind, name: &str, listener: Listener) -> ListenerId {
        self.connect_all([kind], name, listener)
    }

    /// Register one listener for several kinds under a single id.
    pub fn connect_all(
        &self,
        kinds: impl IntoIterator<Item = EventKind>,
        name: &str,
        listener: Listener,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        for kind in kinds {
            self.listeners.entry(kind).or_default().push(Registration {
                id,
                name: name.to_string(),
                listener: Arc::clone(&listener),
            });
        }
        tracing::debug!(listener = name, id = id.0, "event listener connected");
        id
    }

    /// Remove every registration made under `id`. Returns `true` if any existed.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut removed = false;
        for mut entry in self.listeners.iter_mut() {
            let before = entry.len();
            entry.retain(|reg| reg.id != id);
            removed |= entry.len() != before;
        }
        removed
    }

    /// Number of listeners connected to `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, |regs| regs.len())
    }

    /// Build an event and deliver it to every listener of its kind.
    pub fn publish(
        &self,
        entity_id: &str,
        kind: EventKind,
        payload: EventPayload,
    ) -> ExecutionEvent {
        let event = ExecutionEvent::new(entity_id, kind, payload);
        self.emit(&event);
        event
    }

    /// Deliver an already-built event. Returns how many listeners succeeded.
    pub fn emit(&self, event: &ExecutionEvent) -> usize {
        // Snapshot so listeners may connect or disconnect without deadlocking.
        let registrations = match self.listeners.get(&event.kind) {
            Some(regs) => regs.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for reg in &registrations {
            let outcome = catch_unwind(AssertUnwindSafe(|| (reg.listener)(event)));
            let failure = match outcome {
                Ok(Ok(())) => {
                    delivered += 1;
                    continue;
                }
                Ok(Err(e)) => ListenerError::Failed(format!("{e:#}")),
                Err(panic) => ListenerError::Panicked(panic_message(panic.as_ref())),
            };
            tracing::error!(
                listener = %reg.name,
                kind = %event.kind,
                entity_id = %event.entity_id,
                error = %failure,
                "event listener failed"
            );
        }
        delivered
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registrations: usize = self.listeners.iter().map(|e| e.len()).sum();
        f.debug_struct("EventBus")
            .field("kinds", &self.listeners.len())
            .field("registrations", &registrations)
            .finish()
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
