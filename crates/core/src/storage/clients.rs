//! Client collection operations

use chrono::Utc;
use rusqlite::Connection;
use tracing::instrument;

use super::{keys, require_field, RecordStore};
use crate::error::Result;
use crate::models::{mint_id, Client, ClientDraft};

pub struct ClientStore<'a> {
    records: RecordStore<'a>,
}

impl<'a> ClientStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            records: RecordStore::new(conn),
        }
    }

    /// All clients in insertion order
    pub fn list(&self) -> Result<Vec<Client>> {
        self.records.load(keys::CLIENTS)
    }

    /// Create a client from form input
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub fn create(&self, draft: ClientDraft) -> Result<Client> {
        require_field("name", &draft.name)?;
        require_field("email", &draft.email)?;
        require_field("company", &draft.company)?;

        let mut clients = self.list()?;
        let client = Client {
            id: mint_id(),
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            company: draft.company,
            status: draft.status,
            value: draft.value.max(0.0),
            created_at: Utc::now(),
            updated_at: None,
        };
        clients.push(client.clone());
        self.records.save(keys::CLIENTS, &clients)?;
        Ok(client)
    }

    /// Replace all fields of the matching client except `id` and
    /// `createdAt`, stamping `updatedAt`. An unknown id is a silent no-op
    /// and returns `None`.
    #[instrument(skip(self, draft))]
    pub fn update(&self, id: &str, draft: ClientDraft) -> Result<Option<Client>> {
        require_field("name", &draft.name)?;
        require_field("email", &draft.email)?;
        require_field("company", &draft.company)?;

        let mut clients = self.list()?;
        let Some(existing) = clients.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        existing.name = draft.name;
        existing.email = draft.email;
        existing.phone = draft.phone;
        existing.company = draft.company;
        existing.status = draft.status;
        existing.value = draft.value.max(0.0);
        existing.updated_at = Some(Utc::now());

        let updated = existing.clone();
        self.records.save(keys::CLIENTS, &clients)?;
        Ok(Some(updated))
    }

    /// Remove the matching client if present. Idempotent.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut clients = self.list()?;
        clients.retain(|c| c.id != id);
        self.records.save(keys::CLIENTS, &clients)
    }

    /// Case-insensitive substring match on name and company, evaluated
    /// freshly against the stored collection.
    pub fn search(&self, query: &str) -> Result<Vec<Client>> {
        let needle = query.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.company.to_lowercase().contains(&needle)
            })
            .collect())
    }
}
