//! Application state shared by the commands that need configuration.

use std::path::PathBuf;

use anyhow::Context;

use cadence_infra::config::{default_config_path, load_config, resolve_database_url};
use cadence_infra::sqlite::{DatabasePool, SqliteCaseRepository, resolve_data_dir};
use cadence_types::config::CadenceConfig;

pub struct AppState {
    pub config: CadenceConfig,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory and load `config_path` (or the default
    /// `{data_dir}/config.toml`).
    pub async fn init(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config_path = config_path.unwrap_or_else(|| default_config_path(&data_dir));
        let config = load_config(&config_path).await;

        Ok(Self {
            config,
            config_path,
            data_dir,
        })
    }

    /// Open the SQLite case store, creating the data directory if needed.
    pub async fn open_case_store(&self) -> anyhow::Result<SqliteCaseRepository> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;

        let database_url = resolve_database_url(&self.config.cases);
        let pool = DatabasePool::new(&database_url)
            .await
            .with_context(|| format!("Failed to open case database at {database_url}"))?;
        Ok(SqliteCaseRepository::new(pool))
    }
}
