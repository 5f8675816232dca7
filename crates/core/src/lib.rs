//! Rolodex Core Library
//!
//! Record store, session management, domain collections, and dashboard
//! aggregation for the Rolodex CRM.

pub mod auth;
pub mod error;
pub mod models;
pub mod session;
pub mod stats;
pub mod storage;

pub use error::{Error, Result};
pub use models::*;
pub use session::SessionManager;
pub use stats::DashboardStats;
pub use storage::{keys, ClientStore, Database, LeadStore, RecordStore, UserDirectory};
