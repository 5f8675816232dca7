//! Lead collection operations

use chrono::Utc;
use rusqlite::Connection;
use tracing::instrument;

use super::{keys, require_field, RecordStore};
use crate::error::Result;
use crate::models::{mint_id, Lead, LeadDraft};

pub struct LeadStore<'a> {
    records: RecordStore<'a>,
}

impl<'a> LeadStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            records: RecordStore::new(conn),
        }
    }

    /// All leads in insertion order
    pub fn list(&self) -> Result<Vec<Lead>> {
        self.records.load(keys::LEADS)
    }

    /// Create a lead from form input
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub fn create(&self, draft: LeadDraft) -> Result<Lead> {
        require_field("name", &draft.name)?;
        require_field("email", &draft.email)?;
        require_field("company", &draft.company)?;

        let mut leads = self.list()?;
        let lead = Lead {
            id: mint_id(),
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            company: draft.company,
            source: draft.source,
            status: draft.status,
            value: draft.value.max(0.0),
            created_at: Utc::now(),
            updated_at: None,
        };
        leads.push(lead.clone());
        self.records.save(keys::LEADS, &leads)?;
        Ok(lead)
    }

    /// Replace all fields of the matching lead except `id` and `createdAt`,
    /// stamping `updatedAt`. An unknown id is a silent no-op and returns
    /// `None`.
    #[instrument(skip(self, draft))]
    pub fn update(&self, id: &str, draft: LeadDraft) -> Result<Option<Lead>> {
        require_field("name", &draft.name)?;
        require_field("email", &draft.email)?;
        require_field("company", &draft.company)?;

        let mut leads = self.list()?;
        let Some(existing) = leads.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        existing.name = draft.name;
        existing.email = draft.email;
        existing.phone = draft.phone;
        existing.company = draft.company;
        existing.source = draft.source;
        existing.status = draft.status;
        existing.value = draft.value.max(0.0);
        existing.updated_at = Some(Utc::now());

        let updated = existing.clone();
        self.records.save(keys::LEADS, &leads)?;
        Ok(Some(updated))
    }

    /// Remove the matching lead if present. Idempotent.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut leads = self.list()?;
        leads.retain(|l| l.id != id);
        self.records.save(keys::LEADS, &leads)
    }

    /// Case-insensitive substring match on name and company.
    pub fn search(&self, query: &str) -> Result<Vec<Lead>> {
        let needle = query.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|l| {
                l.name.to_lowercase().contains(&needle)
                    || l.company.to_lowercase().contains(&needle)
            })
            .collect())
    }
}
