//! SQLite storage for case event logs.

pub mod case;
pub mod pool;

pub use case::SqliteCaseRepository;
pub use pool::{DatabasePool, default_database_url, resolve_data_dir};
