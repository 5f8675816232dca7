//! Client model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Relationship state of a client account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Inactive,
    Pending,
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientStatus::Active => write!(f, "active"),
            ClientStatus::Inactive => write!(f, "inactive"),
            ClientStatus::Pending => write!(f, "pending"),
        }
    }
}

impl std::str::FromStr for ClientStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            "pending" => Ok(ClientStatus::Pending),
            other => Err(Error::Validation(format!("Unknown client status: {other}"))),
        }
    }
}

/// A client record in the `crm_clients` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub status: ClientStatus,
    /// Contract value, non-negative.
    pub value: f64,
    pub created_at: DateTime<Utc>,
    /// Absent until the record is first updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Form input for creating or replacing a client.
#[derive(Debug, Clone)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub status: ClientStatus,
    pub value: f64,
}
