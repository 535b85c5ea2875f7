use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{ProjectRepository, Storage, UserRepository, WorkSessionRepository};

mod mapping;
mod migrate;
mod project_repo;
mod session_repo;
mod user_repo;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
/// Writers wait this long for a lock instead of failing with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Projects, work sessions and users in one `SQLite` database.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Per-connection settings: cascading deletes need `foreign_keys`, and WAL
/// lets the history endpoints read while a session stop is writing.
fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT))
}

impl SqliteRepository {
    /// Open a pool on `database_url`, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` for a malformed URL or an unreachable database.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(connect_options(database_url)?)
            .await?;
        Ok(Self { pool })
    }

    /// Create tables and indexes that are missing.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Connect, migrate, and hand out the three repositories over one pool.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connecting or migrating fails.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let projects: Arc<dyn ProjectRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn WorkSessionRepository> = Arc::new(repo.clone());
        let users: Arc<dyn UserRepository> = Arc::new(repo);
        Ok(Self {
            projects,
            sessions,
            users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[test]
    fn unknown_open_mode_is_rejected() {
        assert!(connect_options("sqlite://blivalley.db?mode=append").is_err());
        let options = connect_options("sqlite://data/blivalley.db").unwrap();
        assert!(options.get_filename().ends_with("blivalley.db"));
    }

    #[tokio::test]
    async fn connections_enforce_foreign_keys() {
        let repo = SqliteRepository::connect("sqlite:file:sqlite_pragmas?mode=memory&cache=shared")
            .await
            .unwrap();
        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        let busy_timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
        assert_eq!(busy_timeout, 5000);
    }
}
