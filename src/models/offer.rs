//! Replacement offer rows.
//!
//! A broadcast writes one offer per candidate, all pointing at the same
//! uncovered shift. First accept wins; the rest are cancelled.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a single replacement offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Sent and awaiting a response.
    Offered,
    /// The candidate took the shift.
    Accepted,
    /// Withdrawn because someone else took the shift or a manager assigned it.
    Cancelled,
}

status_strings!(OfferStatus, "offer status", {
    Offered => "offered",
    Accepted => "accepted",
    Cancelled => "cancelled",
});

/// An offer of an uncovered shift to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementOffer {
    /// Unique identifier for the offer.
    pub id: Uuid,
    /// The uncovered shift.
    pub shift_id: Uuid,
    /// The candidate.
    pub employee_id: Uuid,
    /// Current status.
    pub status: OfferStatus,
    /// When the offer was made.
    pub offered_at: NaiveDateTime,
    /// When the offer was accepted or cancelled.
    pub responded_at: Option<NaiveDateTime>,
    /// Minutes the candidate needs to arrive, given on acceptance.
    pub eta_minutes: Option<u32>,
}

impl ReplacementOffer {
    /// Creates an outstanding offer.
    pub fn new(shift_id: Uuid, employee_id: Uuid, offered_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            shift_id,
            employee_id,
            status: OfferStatus::Offered,
            offered_at,
            responded_at: None,
            eta_minutes: None,
        }
    }
}
