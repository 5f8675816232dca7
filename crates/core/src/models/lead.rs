//! Sales lead model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Pipeline stage of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            LeadStatus::New => "New Inquiry",
            LeadStatus::Contacted => "Contact Initiated",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Converted => "Closed Won",
            LeadStatus::Lost => "Closed Lost",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::New => write!(f, "new"),
            LeadStatus::Contacted => write!(f, "contacted"),
            LeadStatus::Qualified => write!(f, "qualified"),
            LeadStatus::Converted => write!(f, "converted"),
            LeadStatus::Lost => write!(f, "lost"),
        }
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "qualified" => Ok(LeadStatus::Qualified),
            "converted" => Ok(LeadStatus::Converted),
            "lost" => Ok(LeadStatus::Lost),
            other => Err(Error::Validation(format!("Unknown lead status: {other}"))),
        }
    }
}

/// A lead record in the `crm_leads` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    /// Where the lead came from ("website", "referral", ...). Free-form.
    pub source: String,
    pub status: LeadStatus,
    /// Projected value, non-negative.
    pub value: f64,
    pub created_at: DateTime<Utc>,
    /// Absent until the record is first updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Form input for creating or replacing a lead.
#[derive(Debug, Clone)]
pub struct LeadDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub source: String,
    pub status: LeadStatus,
    pub value: f64,
}
