//! User and session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Account role. `Admin` gates the user-directory views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::User => "Team Member",
            UserRole::Admin => "Administrator",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(Error::Validation(format!("Unknown role: {other}"))),
        }
    }
}

/// A stored account.
///
/// `password` holds the argon2 PHC hash string, never the clear text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub company: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// The currently authenticated identity: a [`User`] minus the password.
///
/// At most one exists, stored under the `crm_user` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            company: user.company.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Input for registration and the admin user-directory create.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Clear text; hashed before anything is persisted.
    pub password: String,
    pub company: String,
    pub role: UserRole,
}

/// Partial profile update. Absent fields are preserved.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

/// Partial account update for the admin user directory.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<UserRole>,
}
