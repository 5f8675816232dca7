//! Data models for Rolodex
//!
//! All records serialize with camelCase field names so the stored JSON
//! matches the collection format this data set has always used.

mod client;
mod lead;
mod user;

pub use client::*;
pub use lead::*;
pub use user::*;

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Mint a record id from the wall clock (millisecond precision).
///
/// Strictly increasing within a process so back-to-back creations in the
/// same millisecond still get distinct ids. Cross-process collisions are
/// not defended against.
pub(crate) fn mint_id() -> String {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(prev + 1).to_string()
}

/// Coerce free-form monetary input to a non-negative number.
///
/// Anything unparsable or negative silently becomes 0, matching how the
/// entry forms have always treated bad numeric input.
pub fn coerce_value(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}
