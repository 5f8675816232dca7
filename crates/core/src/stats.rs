//! Dashboard aggregation
//!
//! Derived fresh from the stored collections on every call; nothing is
//! cached or indexed.

use serde::Serialize;

use crate::error::Result;
use crate::models::LeadStatus;
use crate::storage::Database;

/// Overview numbers for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_clients: usize,
    pub total_leads: usize,
    pub converted_leads: usize,
    /// Percentage of leads with status `converted`; 0 when there are none.
    pub conversion_rate: f64,
    /// Sum of client values.
    pub revenue: f64,
}

/// Compute the overview in one synchronous pass over both collections.
pub fn gather(db: &Database) -> Result<DashboardStats> {
    let clients = db.clients().list()?;
    let leads = db.leads().list()?;

    let converted = leads
        .iter()
        .filter(|l| l.status == LeadStatus::Converted)
        .count();
    let conversion_rate = if leads.is_empty() {
        0.0
    } else {
        converted as f64 / leads.len() as f64 * 100.0
    };

    Ok(DashboardStats {
        total_clients: clients.len(),
        total_leads: leads.len(),
        converted_leads: converted,
        conversion_rate,
        revenue: clients.iter().map(|c| c.value).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientDraft, ClientStatus, LeadDraft};

    fn client(name: &str, value: f64) -> ClientDraft {
        ClientDraft {
            name: name.to_string(),
            email: "c@example.com".to_string(),
            phone: String::new(),
            company: "Acme Co".to_string(),
            status: ClientStatus::Active,
            value,
        }
    }

    fn lead(name: &str, status: LeadStatus) -> LeadDraft {
        LeadDraft {
            name: name.to_string(),
            email: "l@example.com".to_string(),
            phone: String::new(),
            company: "Acme Co".to_string(),
            source: "website".to_string(),
            status,
            value: 100.0,
        }
    }

    #[test]
    fn test_empty_database_yields_zeroes() {
        let db = Database::open_in_memory().unwrap();
        let stats = gather(&db).unwrap();

        assert_eq!(stats.total_clients, 0);
        assert_eq!(stats.total_leads, 0);
        assert_eq!(stats.converted_leads, 0);
        assert_eq!(stats.conversion_rate, 0.0);
        assert_eq!(stats.revenue, 0.0);
    }

    #[test]
    fn test_revenue_and_conversion_rate() {
        let db = Database::open_in_memory().unwrap();
        db.clients().create(client("A", 5000.0)).unwrap();
        db.clients().create(client("B", 2500.0)).unwrap();

        db.leads().create(lead("L1", LeadStatus::Converted)).unwrap();
        db.leads().create(lead("L2", LeadStatus::New)).unwrap();
        db.leads().create(lead("L3", LeadStatus::Converted)).unwrap();
        db.leads().create(lead("L4", LeadStatus::Lost)).unwrap();

        let stats = gather(&db).unwrap();
        assert_eq!(stats.total_clients, 2);
        assert_eq!(stats.total_leads, 4);
        assert_eq!(stats.converted_leads, 2);
        assert_eq!(stats.conversion_rate, 50.0);
        assert_eq!(stats.revenue, 7500.0);
    }
}
