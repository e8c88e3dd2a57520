//! Test helpers backed by an in-memory SQLite database.

use opinionated_common::{AppError, AppResult};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

use crate::migrations::Migrator;

/// A fully migrated in-memory database for integration tests.
///
/// Each instance is independent; dropping it discards all data.
pub struct TestDatabase {
    db: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Connect to a fresh in-memory database and run all migrations.
    pub async fn new() -> AppResult<Self> {
        let db = Database::connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Migrator::up(&db, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Shared handle to the underlying connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.db)
    }
}
