//! User directory operations
//!
//! The admin-facing view over the `crm_users` collection. Passwords are
//! hashed before anything is persisted; deleting a user does not cascade
//! into an active session that references it.

use chrono::Utc;
use rusqlite::Connection;
use tracing::instrument;

use super::{keys, require_field, RecordStore};
use crate::auth;
use crate::error::{Error, Result};
use crate::models::{mint_id, NewUser, User, UserUpdate};

pub struct UserDirectory<'a> {
    records: RecordStore<'a>,
}

impl<'a> UserDirectory<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            records: RecordStore::new(conn),
        }
    }

    /// All accounts in insertion order
    pub fn list(&self) -> Result<Vec<User>> {
        self.records.load(keys::USERS)
    }

    /// Find an account by exact, case-sensitive email
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.list()?.into_iter().find(|u| u.email == email))
    }

    /// Create an account. Fails if the email is already taken.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub fn create(&self, new_user: NewUser) -> Result<User> {
        require_field("name", &new_user.name)?;
        require_field("email", &new_user.email)?;
        require_field("password", &new_user.password)?;

        let mut users = self.list()?;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(Error::Validation("Email already exists".to_string()));
        }

        let user = User {
            id: mint_id(),
            name: new_user.name,
            email: new_user.email,
            password: auth::hash_password(&new_user.password)?,
            company: new_user.company,
            role: new_user.role,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.records.save(keys::USERS, &users)?;
        Ok(user)
    }

    /// Merge the given fields into the matching account. An unknown id is a
    /// silent no-op and returns `None`.
    pub fn update(&self, id: &str, update: UserUpdate) -> Result<Option<User>> {
        let mut users = self.list()?;
        let Some(existing) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            existing.name = name;
        }
        if let Some(company) = update.company {
            existing.company = company;
        }
        if let Some(role) = update.role {
            existing.role = role;
        }

        let updated = existing.clone();
        self.records.save(keys::USERS, &users)?;
        Ok(Some(updated))
    }

    /// Remove the matching account if present. Idempotent; any session
    /// referencing the account is left alone.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut users = self.list()?;
        users.retain(|u| u.id != id);
        self.records.save(keys::USERS, &users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::storage::Database;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Jo Doe".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            company: "Acme Co".to_string(),
            role: UserRole::User,
        }
    }

    #[test]
    fn test_create_hashes_password() {
        let db = Database::open_in_memory().unwrap();
        let dir = db.users();

        let user = dir.create(new_user("jo@acme.com")).unwrap();
        assert_ne!(user.password, "secret123");
        assert!(auth::verify_password("secret123", &user.password));
    }

    #[test]
    fn test_duplicate_email_rejected_and_collection_unchanged() {
        let db = Database::open_in_memory().unwrap();
        let dir = db.users();

        dir.create(new_user("jo@acme.com")).unwrap();
        let before = dir.list().unwrap();

        let err = dir.create(new_user("jo@acme.com")).unwrap_err();
        assert!(err.to_string().contains("Email already exists"));

        let after = dir.list().unwrap();
        assert_eq!(after.len(), before.len());
    }

    #[test]
    fn test_email_match_is_case_sensitive() {
        let db = Database::open_in_memory().unwrap();
        let dir = db.users();

        dir.create(new_user("jo@acme.com")).unwrap();
        // A different casing is a different email
        dir.create(new_user("Jo@acme.com")).unwrap();
        assert_eq!(dir.list().unwrap().len(), 2);

        assert!(dir.find_by_email("jo@acme.com").unwrap().is_some());
        assert!(dir.find_by_email("JO@ACME.COM").unwrap().is_none());
    }

    #[test]
    fn test_update_merges_fields() {
        let db = Database::open_in_memory().unwrap();
        let dir = db.users();

        let user = dir.create(new_user("jo@acme.com")).unwrap();
        let updated = dir
            .update(
                &user.id,
                UserUpdate {
                    role: Some(UserRole::Admin),
                    ..UserUpdate::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.name, "Jo Doe");
        assert_eq!(updated.email, "jo@acme.com");
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let dir = db.users();

        dir.create(new_user("jo@acme.com")).unwrap();
        assert!(dir
            .update("missing", UserUpdate::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let dir = db.users();

        let user = dir.create(new_user("jo@acme.com")).unwrap();
        dir.delete(&user.id).unwrap();
        dir.delete(&user.id).unwrap();
        assert!(dir.list().unwrap().is_empty());
    }
}
