//! `ledgerline-store` — SQLite persistence collaborator.
//!
//! One [`Store`] per open database. Reads are set-oriented (one filtered
//! query per operation); bulk writes run as a single batch inside one
//! transaction. The engine crates never talk to SQL directly.

mod adjustments;
mod error;
mod hierarchy;
mod ledger;
mod ordering;
mod reference;
mod schema;

pub use error::StoreError;

use std::path::Path;

use rusqlite::Connection;

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory database, used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Current UTC timestamp in the RFC 3339 form used for audit fields.
    pub(crate) fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}
