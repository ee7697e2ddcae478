//! Infrastructure layer for Cadence.
//!
//! Implements the `CaseRepository` trait from `cadence-core` on SQLite and
//! loads `config.toml` into the shared configuration types.

pub mod config;
pub mod sqlite;
