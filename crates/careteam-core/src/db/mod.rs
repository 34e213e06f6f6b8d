//! Persistence gateway: transactional CRUD over the five record types.

mod appointments;
mod assignments;
mod gateway;
mod history;
mod patients;
mod schema;
mod users;

pub use assignments::*;
pub use gateway::*;
pub use schema::*;
pub use users::*;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;

use crate::config::{BootstrapAdmin, CoreConfig};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let config = CoreConfig::default().with_database_path(path.as_ref());
        Self::open_with(&config)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_with(&CoreConfig::in_memory())
    }

    /// Open using the configured path, busy timeout and bootstrap admin.
    pub fn open_with(config: &CoreConfig) -> DbResult<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.database_path)?
        };
        let db = Self { conn };
        db.initialize(config.busy_timeout(), &config.bootstrap_admin)?;
        Ok(db)
    }

    /// Initialize schema and make sure the bootstrap admin exists.
    fn initialize(&self, busy_timeout: Duration, admin: &BootstrapAdmin) -> DbResult<()> {
        self.conn.busy_timeout(busy_timeout)?;
        self.conn.execute_batch(SCHEMA)?;
        self.atomically(|db| db.ensure_admin(admin))?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` as one write transaction. Any error rolls everything back.
    /// Called while a transaction is already open, `f` simply joins it.
    ///
    /// Takes the write lock up front (`BEGIN IMMEDIATE`) so that concurrent
    /// writers serialize here instead of failing at commit.
    pub fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<DbError>,
    {
        self.run_in(TransactionBehavior::Immediate, f)
    }

    /// Run `f` as one read transaction, giving it a consistent snapshot.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<DbError>,
    {
        self.run_in(TransactionBehavior::Deferred, f)
    }

    fn run_in<T, E, F>(&self, behavior: TransactionBehavior, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<DbError>,
    {
        // Nested calls join the enclosing transaction
        if !self.conn.is_autocommit() {
            return f(self);
        }
        let tx = Transaction::new_unchecked(&self.conn, behavior).map_err(DbError::from)?;
        let value = f(self)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }

    /// Delete every clinical row and every account except the bootstrap
    /// admin, then make sure that admin exists.
    pub fn reset_to_bootstrap(&self, admin: &BootstrapAdmin) -> DbResult<()> {
        self.conn.execute_batch(
            r#"
            DELETE FROM medical_history;
            DELETE FROM appointments;
            DELETE FROM care_assignments;
            DELETE FROM patient_profiles;
            "#,
        )?;
        self.conn.execute(
            "DELETE FROM users WHERE NOT (username = ?1 AND role = 'admin')",
            [&admin.username],
        )?;
        self.ensure_admin(admin)?;
        Ok(())
    }
}
