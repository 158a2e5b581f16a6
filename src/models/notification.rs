//! Outbound notification intents.
//!
//! The engine never talks to a messenger. It returns intents addressed to an
//! employee; a gateway outside this crate renders and delivers them.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Decision;

/// The kind of message the gateway should send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Ask a manager to rule on a late decline.
    LateDeclineRequest,
    /// Tell the employee how their late decline was ruled.
    LateDeclineResolved,
    /// Ask a manager to review a no-show reason.
    NoShowReasonSubmitted,
    /// Tell the employee how their no-show reason was ruled.
    NoShowReasonResolved,
    /// Offer an uncovered shift to a candidate.
    ReplacementOffer,
    /// Withdraw an offer.
    ReplacementCancelled,
    /// Announce who covers a shift.
    ReplacementAccepted,
}

status_strings!(NotificationKind, "notification kind", {
    LateDeclineRequest => "late_decline_request",
    LateDeclineResolved => "late_decline_resolved",
    NoShowReasonSubmitted => "no_show_reason_submitted",
    NoShowReasonResolved => "no_show_reason_resolved",
    ReplacementOffer => "replacement_offer",
    ReplacementCancelled => "replacement_cancelled",
    ReplacementAccepted => "replacement_accepted",
});

/// Kind-specific content of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// See [`NotificationKind::LateDeclineRequest`].
    LateDeclineRequest {
        /// The declined shift.
        shift_id: Uuid,
        /// The declining employee.
        employee_id: Uuid,
        /// Shift date.
        date: NaiveDate,
        /// Planned start.
        planned_start: NaiveTime,
        /// Decline reason reference.
        reason_id: Option<Uuid>,
        /// Decline comment.
        comment: Option<String>,
    },
    /// See [`NotificationKind::LateDeclineResolved`].
    LateDeclineResolved {
        /// The declined shift.
        shift_id: Uuid,
        /// The ruling.
        decision: Decision,
    },
    /// See [`NotificationKind::NoShowReasonSubmitted`].
    NoShowReasonSubmitted {
        /// The missed shift.
        shift_id: Uuid,
        /// The employee who missed it.
        employee_id: Uuid,
        /// The submitted explanation.
        reason_text: String,
    },
    /// See [`NotificationKind::NoShowReasonResolved`].
    NoShowReasonResolved {
        /// The missed shift.
        shift_id: Uuid,
        /// The ruling.
        decision: Decision,
    },
    /// See [`NotificationKind::ReplacementOffer`].
    ReplacementOffer {
        /// The uncovered shift.
        shift_id: Uuid,
        /// The offer to accept.
        offer_id: Uuid,
        /// Branch of the shift.
        branch_id: Uuid,
        /// Shift date.
        date: NaiveDate,
        /// Planned start.
        planned_start: NaiveTime,
        /// Planned end.
        planned_end: NaiveTime,
    },
    /// See [`NotificationKind::ReplacementCancelled`].
    ReplacementCancelled {
        /// The shift that no longer needs covering.
        shift_id: Uuid,
        /// The withdrawn offer, if one existed.
        offer_id: Option<Uuid>,
    },
    /// See [`NotificationKind::ReplacementAccepted`].
    ReplacementAccepted {
        /// The uncovered shift.
        original_shift_id: Uuid,
        /// The shift now covering it.
        replacement_shift_id: Uuid,
        /// The covering employee.
        employee_id: Uuid,
        /// Announced arrival delay.
        eta_minutes: Option<u32>,
    },
}

impl NotificationPayload {
    /// Returns the kind this payload belongs to.
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::LateDeclineRequest { .. } => NotificationKind::LateDeclineRequest,
            NotificationPayload::LateDeclineResolved { .. } => {
                NotificationKind::LateDeclineResolved
            }
            NotificationPayload::NoShowReasonSubmitted { .. } => {
                NotificationKind::NoShowReasonSubmitted
            }
            NotificationPayload::NoShowReasonResolved { .. } => {
                NotificationKind::NoShowReasonResolved
            }
            NotificationPayload::ReplacementOffer { .. } => NotificationKind::ReplacementOffer,
            NotificationPayload::ReplacementCancelled { .. } => {
                NotificationKind::ReplacementCancelled
            }
            NotificationPayload::ReplacementAccepted { .. } => {
                NotificationKind::ReplacementAccepted
            }
        }
    }
}

/// A message the gateway should deliver to one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    /// The addressee.
    pub recipient_id: Uuid,
    /// What to say; carries the `kind` tag when serialized.
    pub payload: NotificationPayload,
}

impl NotificationIntent {
    /// Returns the kind of the intent.
    pub fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }
}
