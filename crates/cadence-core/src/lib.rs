//! Scheduling, event distribution, and case recording for Cadence.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements. It depends only on `cadence-types` -- never on
//! `cadence-infra` or any database/IO crate.

pub mod case;
pub mod event;
pub mod repository;
pub mod scheduler;
