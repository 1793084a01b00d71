//! Test utilities for database operations.
//!
//! Every [`TestDatabase`] is a private in-memory SQLite database with the
//! full schema applied, so tests never share state.

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;

/// A migrated, isolated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a new in-memory database and run all migrations.
    pub async fn new() -> Result<Self, DbErr> {
        // Each pooled connection to `sqlite::memory:` opens its own database,
        // so the pool is pinned to a single connection.
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Shared handle for constructing repositories.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }
}
