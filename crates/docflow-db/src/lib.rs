//! # docflow-db
//!
//! PostgreSQL persistence layer for docflow.
//!
//! This crate provides:
//! - Connection pool management
//! - `PgDocumentRepository` with status-guarded writes
//! - `PgDirectoryRepository` for departments, divisions, and user lookup
//! - `PgUserRepository` for accounts and credential checks
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docflow_core::WorkflowEngine;
//! use docflow_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/docflow").await?;
//!     let engine = WorkflowEngine::new(
//!         Arc::new(db.documents.clone()),
//!         Arc::new(db.directory.clone()),
//!     );
//!     let doc = engine.get(1).await?;
//!     println!("{} is {}", doc.id, doc.status);
//!     Ok(())
//! }
//! ```

pub mod directory;
pub mod documents;
pub mod pool;
pub mod users;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

pub use docflow_core::{Error, Result};

pub use directory::PgDirectoryRepository;
pub use documents::PgDocumentRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig, PoolStatus};
pub use users::PgUserRepository;

/// Map a unique-constraint violation to `Conflict`, everything else to
/// `Database`.
pub(crate) fn conflict_on_duplicate(err: sqlx::Error, message: impl FnOnce() -> String) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::Conflict(message())
        }
        _ => Error::Database(err),
    }
}

/// Parse a stored enum column; an unknown spelling means the row was written
/// outside this crate's constraints.
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e: String| Error::Internal(format!("column {}: {}", column, e)))
}

/// Database handle with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Document store.
    pub documents: PgDocumentRepository,
    /// Departments, divisions, and user lookup.
    pub directory: PgDirectoryRepository,
    /// User accounts and credentials.
    pub users: PgUserRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            documents: PgDocumentRepository::new(pool.clone()),
            directory: PgDirectoryRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_core::{DocumentStatus, UserRole};

    #[test]
    fn test_parse_column_accepts_stored_spelling() {
        let status: DocumentStatus = parse_column("status", "Received").unwrap();
        assert_eq!(status, DocumentStatus::Received);
        let role: UserRole = parse_column("role", "OfficerInCharge").unwrap();
        assert_eq!(role, UserRole::OfficerInCharge);
    }

    #[test]
    fn test_parse_column_rejects_unknown_value() {
        let err = parse_column::<DocumentStatus>("status", "Lost").unwrap_err();
        match err {
            Error::Internal(msg) => assert!(msg.contains("status"), "{}", msg),
            other => panic!("expected Internal, got {:?}", other),
        }
    }

    #[test]
    fn test_non_unique_errors_stay_database_errors() {
        let err = conflict_on_duplicate(sqlx::Error::RowNotFound, || "dup".to_string());
        assert!(matches!(err, Error::Database(sqlx::Error::RowNotFound)));
    }
}
