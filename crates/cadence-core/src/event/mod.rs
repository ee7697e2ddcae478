//! Event bus for execution lifecycle events.
//!
//! Provides an `EventBus` that dispatches `ExecutionEvent`s synchronously to
//! listeners connected per `EventKind`.

pub mod bus;

pub use bus::{EventBus, Listener, ListenerId};
