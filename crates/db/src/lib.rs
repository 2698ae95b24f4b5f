//! Database layer for studyhall.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use studyhall_common::{AppError, Config, config::DatabaseConfig};
use tracing::{log::LevelFilter, warn};

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    connect(&config.database).await
}

/// Open a connection pool.
///
/// SQLite pools are capped at one connection: a deferred transaction that
/// upgrades to a write under contention fails with `SQLITE_BUSY` rather
/// than waiting for the lock.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let (max_connections, min_connections) = if is_sqlite(&config.url) {
        if config.max_connections > 1 {
            warn!(
                requested = config.max_connections,
                "SQLite store: limiting the pool to one connection"
            );
        }
        (1, config.min_connections.min(1))
    } else {
        (config.max_connections, config.min_connections)
    };

    let mut opt = ConnectOptions::new(&config.url);
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

fn is_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:")
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_sqlite() {
        assert!(is_sqlite("sqlite::memory:"));
        assert!(is_sqlite("sqlite://studyhall.db?mode=rwc"));
        assert!(!is_sqlite("postgres://studyhall@localhost/studyhall"));
    }
}
