//! Generic record store
//!
//! Typed get/set over named JSON collections in the key-value table. Records
//! are validated against their schema at this boundary: a blob that no
//! longer parses is reported and degrades to an empty collection, never an
//! error.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::Result;

pub struct RecordStore<'a> {
    conn: &'a Connection,
}

impl<'a> RecordStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Raw string value stored under a key, if any
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Overwrite the value stored under a key in one statement
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Remove a key and its value
    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Load a named collection in stored (insertion) order.
    ///
    /// An absent key or malformed JSON degrades to an empty collection.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(key, error = %e, "Malformed collection, substituting empty");
                Ok(Vec::new())
            }
        }
    }

    /// Serialize and overwrite a named collection
    pub fn save<T: Serialize>(&self, key: &str, records: &[T]) -> Result<()> {
        self.set_raw(key, &serde_json::to_string(records)?)
    }

    /// Load the single record stored under a key, if any.
    ///
    /// Malformed data is treated as absent.
    pub fn load_one<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(key, error = %e, "Malformed record, treating as absent");
                Ok(None)
            }
        }
    }

    /// Serialize and overwrite the single record stored under a key
    pub fn save_one<T: Serialize>(&self, key: &str, record: &T) -> Result<()> {
        self.set_raw(key, &serde_json::to_string(record)?)
    }
}
