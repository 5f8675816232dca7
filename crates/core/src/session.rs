//! Session management
//!
//! Owns the currently authenticated identity. The manager is an explicit
//! context object: hydrate with [`SessionManager::attach`], tear down with
//! [`SessionManager::logout`]. The session record persists under the
//! `crm_user` key so a new process resumes where the last one left off.

use tracing::{info, instrument};

use crate::auth;
use crate::error::{Error, Result};
use crate::models::{NewUser, ProfileUpdate, SessionUser, User};
use crate::storage::{keys, Database};

pub struct SessionManager<'a> {
    db: &'a Database,
    current: Option<SessionUser>,
}

impl<'a> SessionManager<'a> {
    /// Attach to a database, entering the authenticated state immediately
    /// if a persisted session exists. The stored session is not
    /// re-validated against the users collection; a user deleted since the
    /// last login stays logged in until logout.
    pub fn attach(db: &'a Database) -> Result<Self> {
        let current = db.records().load_one(keys::SESSION)?;
        Ok(Self { db, current })
    }

    /// The authenticated identity, if any
    pub fn current(&self) -> Option<&SessionUser> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Validate credentials against the users collection.
    ///
    /// Email matching is exact and case-sensitive. The failure is the same
    /// "Invalid credentials" whether the email is unknown or the password
    /// wrong; there is no lockout and no rate limiting.
    #[instrument(skip(self, password))]
    pub fn login(&mut self, email: &str, password: &str) -> Result<SessionUser> {
        let users: Vec<User> = self.db.records().load(keys::USERS)?;
        let matched = users
            .iter()
            .find(|u| u.email == email && auth::verify_password(password, &u.password));
        let Some(user) = matched else {
            return Err(Error::Authentication("Invalid credentials".to_string()));
        };

        let session = SessionUser::from(user);
        self.db.records().save_one(keys::SESSION, &session)?;
        info!(email, "Logged in");
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Create an account and immediately log it in.
    ///
    /// Fails with "Email already exists" if the email is taken, leaving the
    /// users collection untouched.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub fn register(&mut self, new_user: NewUser) -> Result<SessionUser> {
        let user = self.db.users().create(new_user)?;

        let session = SessionUser::from(&user);
        self.db.records().save_one(keys::SESSION, &session)?;
        info!(email = %session.email, "Registered");
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Clear the session record. Domain collections are untouched.
    pub fn logout(&mut self) -> Result<()> {
        self.db.records().remove(keys::SESSION)?;
        self.current = None;
        info!("Logged out");
        Ok(())
    }

    /// Merge profile updates into the session and into the matching user
    /// record. If the user was deleted since login, the users collection is
    /// left unchanged while the session still updates; the divergence is
    /// tolerated, not corrected.
    pub fn update_profile(&mut self, updates: ProfileUpdate) -> Result<SessionUser> {
        let Some(session) = self.current.as_mut() else {
            return Err(Error::Authentication("Not logged in".to_string()));
        };

        if let Some(name) = &updates.name {
            session.name = name.clone();
        }
        if let Some(email) = &updates.email {
            session.email = email.clone();
        }
        if let Some(company) = &updates.company {
            session.company = company.clone();
        }
        self.db.records().save_one(keys::SESSION, &*session)?;

        let mut users: Vec<User> = self.db.records().load(keys::USERS)?;
        if let Some(user) = users.iter_mut().find(|u| u.id == session.id) {
            if let Some(name) = updates.name {
                user.name = name;
            }
            if let Some(email) = updates.email {
                user.email = email;
            }
            if let Some(company) = updates.company {
                user.company = company;
            }
            self.db.records().save(keys::USERS, &users)?;
        }

        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn new_user(email: &str, password: &str) -> NewUser {
        NewUser {
            name: "Jo Doe".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            company: "Acme Co".to_string(),
            role: UserRole::User,
        }
    }

    #[test]
    fn test_register_then_login_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();
        assert!(!session.is_authenticated());

        session.register(new_user("jo@acme.com", "secret123")).unwrap();
        session.logout().unwrap();

        let logged_in = session.login("jo@acme.com", "secret123").unwrap();
        assert_eq!(logged_in.email, "jo@acme.com");
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_register_logs_in_immediately() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        let registered = session.register(new_user("jo@acme.com", "secret123")).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.current().unwrap().id, registered.id);
    }

    #[test]
    fn test_duplicate_register_fails_and_leaves_users_unchanged() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        session.register(new_user("jo@acme.com", "secret123")).unwrap();
        let before = db.users().list().unwrap();

        let err = session
            .register(new_user("jo@acme.com", "other456"))
            .unwrap_err();
        assert!(err.to_string().contains("Email already exists"));
        assert_eq!(db.users().list().unwrap().len(), before.len());
    }

    #[test]
    fn test_wrong_password_stays_anonymous() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        session.register(new_user("jo@acme.com", "secret123")).unwrap();
        session.logout().unwrap();

        let err = session.login("jo@acme.com", "wrong").unwrap_err();
        assert!(err.to_string().contains("Invalid credentials"));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_unknown_email_gives_same_failure() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        let err = session.login("nobody@acme.com", "whatever").unwrap_err();
        assert!(err.to_string().contains("Invalid credentials"));
    }

    #[test]
    fn test_session_survives_reattach_without_revalidation() {
        let db = Database::open_in_memory().unwrap();
        let registered = {
            let mut session = SessionManager::attach(&db).unwrap();
            session.register(new_user("jo@acme.com", "secret123")).unwrap()
        };

        // Delete the backing user; the persisted session must still hydrate
        db.users().delete(&registered.id).unwrap();

        let session = SessionManager::attach(&db).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.current().unwrap().email, "jo@acme.com");
    }

    #[test]
    fn test_logout_clears_persisted_session() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        session.register(new_user("jo@acme.com", "secret123")).unwrap();
        session.logout().unwrap();

        let session = SessionManager::attach(&db).unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_update_profile_touches_session_and_user() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        session.register(new_user("jo@acme.com", "secret123")).unwrap();
        let updated = session
            .update_profile(ProfileUpdate {
                name: Some("Jo Updated".to_string()),
                ..ProfileUpdate::default()
            })
            .unwrap();

        assert_eq!(updated.name, "Jo Updated");
        // Company untouched
        assert_eq!(updated.company, "Acme Co");

        let users = db.users().list().unwrap();
        assert_eq!(users[0].name, "Jo Updated");
    }

    #[test]
    fn test_update_profile_tolerates_deleted_user() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        let registered = session.register(new_user("jo@acme.com", "secret123")).unwrap();
        db.users().delete(&registered.id).unwrap();

        let updated = session
            .update_profile(ProfileUpdate {
                company: Some("Globex".to_string()),
                ..ProfileUpdate::default()
            })
            .unwrap();

        assert_eq!(updated.company, "Globex");
        assert!(db.users().list().unwrap().is_empty());
    }

    #[test]
    fn test_update_profile_requires_authentication() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        assert!(session.update_profile(ProfileUpdate::default()).is_err());
    }

    #[test]
    fn test_logout_leaves_domain_collections_alone() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();

        session.register(new_user("jo@acme.com", "secret123")).unwrap();
        db.clients()
            .create(crate::models::ClientDraft {
                name: "Acme Rep".to_string(),
                email: "a@acme.com".to_string(),
                phone: "555-0100".to_string(),
                company: "Acme Co".to_string(),
                status: crate::models::ClientStatus::Active,
                value: 5000.0,
            })
            .unwrap();

        session.logout().unwrap();
        assert_eq!(db.clients().list().unwrap().len(), 1);
        assert_eq!(db.users().list().unwrap().len(), 1);
    }
}
