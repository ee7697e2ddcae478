//! Global configuration types for Cadence.
//!
//! `CadenceConfig` represents the top-level `config.toml` that controls the
//! scheduler, case persistence, startup subscriptions, and startup tasks.

use serde::{Deserialize, Serialize};

use crate::case::SubscriptionTable;
use crate::scheduler::ScheduledTask;

/// Top-level configuration for the Cadence platform.
///
/// Loaded from `~/.cadence/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub cases: CaseStoreConfig,

    /// Case subscriptions applied at startup.
    #[serde(default)]
    pub subscriptions: SubscriptionTable,

    /// Tasks scheduled at startup.
    #[serde(default)]
    pub tasks: Vec<ScheduledTask>,
}

/// Timer engine and scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Entity id used as the sender of scheduler lifecycle events.
    #[serde(default = "default_scheduler_id")]
    pub id: String,

    /// How late a run may start before it is skipped as missed.
    #[serde(default = "default_misfire_grace_secs")]
    pub misfire_grace_secs: u64,

    /// Maximum concurrently running instances of a single job.
    #[serde(default = "default_max_instances")]
    pub max_instances: usize,

    /// Upper bound on how long the timer loop sleeps with no job due.
    #[serde(default = "default_idle_poll_secs")]
    pub idle_poll_secs: u64,
}

fn default_scheduler_id() -> String {
    "controller".to_string()
}

fn default_misfire_grace_secs() -> u64 {
    1
}

fn default_max_instances() -> usize {
    1
}

fn default_idle_poll_secs() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            id: default_scheduler_id(),
            misfire_grace_secs: default_misfire_grace_secs(),
            max_instances: default_max_instances(),
            idle_poll_secs: default_idle_poll_secs(),
        }
    }
}

/// Where matched case events are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseStoreConfig {
    #[serde(default)]
    pub backend: CaseBackend,

    /// SQLite URL; defaults to `sqlite://{data_dir}/cadence.db` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}
