//! Configuration loader for Cadence.
//!
//! Reads `config.toml` and deserializes it into [`CadenceConfig`]. Falls back
//! to defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use cadence_types::config::{CadenceConfig, CaseStoreConfig};

use crate::sqlite::pool::default_database_url;

/// `{data_dir}/config.toml`.
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`CadenceConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns the default.
pub async fn load_config(path: &Path) -> CadenceConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return CadenceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return CadenceConfig::default();
        }
    };

    match toml::from_str::<CadenceConfig>(&content) {
        Ok(config) => {
            tracing::debug!(
                path = %path.display(),
                cases = config.subscriptions.len(),
                tasks = config.tasks.len(),
                "config loaded"
            );
            config
        }
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            CadenceConfig::default()
        }
    }
}

/// The configured database URL, or the data-directory default.
pub fn resolve_database_url(cases: &CaseStoreConfig) -> String {
    cases
        .database_url
        .clone()
        .unwrap_or_else(default_database_url)
}
