use std::path::PathBuf;

use async_trait::async_trait;
use quote_core::db::{DbConfig, RepositoryFactory};
use quote_core::{QuoteRepository, RepositoryError};
use tracing::info;

use crate::repository::SqliteRepository;

/// Environment variable naming the directory of seed `.sql` files.
pub const SEEDS_DIR_ENV: &str = "QUOTE_DB_SQLITE_SEEDS_DIR";

/// Seed directory, in order of preference: `$QUOTE_DB_SQLITE_SEEDS_DIR`,
/// `./seeds` when it exists, then this crate's own `seeds` directory.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SEEDS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// Registers the `"sqlite"` backend.
///
/// ```rust,no_run
/// use quote_core::db::RepositoryRegistry;
/// use quote_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens `config.connection_string` (a file path or `:memory:`), applies
    /// migrations, then inserts any default rates and materials that are
    /// missing.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn QuoteRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        repo.run_seeds(&seeds)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        info!(seeds = %seeds.display(), "sqlite store ready");

        Ok(Box::new(repo))
    }
}
