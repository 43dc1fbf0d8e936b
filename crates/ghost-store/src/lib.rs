//! Tenant-scoped rusqlite persistence for the pipeline's server-side state:
//! Secure Events, Detected Patterns, Ghost Templates and their version
//! history, Executions, and the append-only governance tables (§6).

pub mod error;
pub mod executions;
pub mod ghosts;
pub mod governance;
pub mod patterns;
pub mod schema;
pub mod secure_events;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

pub use error::{Error, Result};

/// A single-connection store. One `Store` per process is the intended shape —
/// rusqlite connections aren't `Sync` on their own, so access is serialized
/// behind a mutex the way `agtrace-index`'s `Database` does.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_and_initializes_schema_idempotently() {
        let store = Store::open_in_memory().unwrap();
        // init_schema uses IF NOT EXISTS, so re-running it must not error.
        schema::init_schema(&store.conn.lock().unwrap()).unwrap();
    }
}
