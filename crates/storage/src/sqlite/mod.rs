use std::sync::Arc;
use std::time::Duration;

use sheet_core::model::{NotebookId, UserId};
use sqlx::{SqliteConnection, SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{
    AttemptRepository, ChallengeRepository, GoalRepository, NotebookRepository, Storage,
    StorageError,
};

mod attempt_repo;
mod challenge_repo;
mod goal_repo;
mod mapping;
mod migrate;
mod notebook_repo;

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

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// enforcing foreign key constraints fails during setup.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

pub(crate) fn conn_err<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Rejects notebook references the user does not own.
pub(crate) async fn ensure_notebook(
    conn: &mut SqliteConnection,
    user_id: UserId,
    notebook_id: Option<NotebookId>,
) -> Result<(), StorageError> {
    let Some(notebook_id) = notebook_id else {
        return Ok(());
    };
    let row = sqlx::query("SELECT 1 FROM notebooks WHERE id = ?1 AND user_id = ?2")
        .bind(mapping::id_i64("notebook_id", notebook_id.value())?)
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(conn_err)?;
    if row.is_none() {
        return Err(StorageError::Validation(format!(
            "unknown notebook {notebook_id}"
        )));
    }
    Ok(())
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let notebooks: Arc<dyn NotebookRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo.clone());
        let goals: Arc<dyn GoalRepository> = Arc::new(repo.clone());
        let challenges: Arc<dyn ChallengeRepository> = Arc::new(repo);
        Ok(Self {
            notebooks,
            attempts,
            goals,
            challenges,
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
}
