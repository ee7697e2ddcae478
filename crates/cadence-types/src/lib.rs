//! Shared domain types for Cadence.
//!
//! This crate contains the core domain types used across the Cadence workflow
//! orchestration platform: trigger descriptors, scheduler state, lifecycle
//! events, case subscriptions, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod case;
pub mod config;
pub mod error;
pub mod event;
pub mod scheduler;
pub mod trigger;
