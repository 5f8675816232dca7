//! SQLite storage layer for Rolodex
//!
//! Collections live as JSON blobs in a single key-value table, one blob per
//! collection key. Whole-collection writes mean the last writer wins; there
//! is no row-level locking or versioning.

mod clients;
mod leads;
mod migrations;
mod records;
mod users;

use std::path::Path;

use rusqlite::Connection;
use tracing::instrument;

use crate::error::{Error, Result};

pub use clients::ClientStore;
pub use leads::LeadStore;
pub use records::RecordStore;
pub use users::UserDirectory;

/// Collection keys. This layout is the interop contract with existing
/// stored data and must not change.
pub mod keys {
    /// All account records.
    pub const USERS: &str = "crm_users";
    /// The single optional session record.
    pub const SESSION: &str = "crm_user";
    /// All client records.
    pub const CLIENTS: &str = "crm_clients";
    /// All lead records.
    pub const LEADS: &str = "crm_leads";
}

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize the schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get the generic record store
    pub fn records(&self) -> RecordStore<'_> {
        RecordStore::new(&self.conn)
    }

    /// Get the client store
    pub fn clients(&self) -> ClientStore<'_> {
        ClientStore::new(&self.conn)
    }

    /// Get the lead store
    pub fn leads(&self) -> LeadStore<'_> {
        LeadStore::new(&self.conn)
    }

    /// Get the user directory
    pub fn users(&self) -> UserDirectory<'_> {
        UserDirectory::new(&self.conn)
    }
}

/// Reject empty identity fields on create and update.
pub(crate) fn require_field(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(())
}
