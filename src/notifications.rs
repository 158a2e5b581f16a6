//! Notification intents and the outbound channel that carries them.
//!
//! Engine operations return the intents they raise alongside their result.
//! The functions here build those intents so every kind has one shape, and
//! [`NotificationOutbox`] hands them to whichever gateway subscribes.

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    Decision, DeclineRecord, NotificationIntent, NotificationPayload, ReplacementOffer,
    ScheduledShift,
};

/// The result of an engine operation together with the intents it raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    /// What the operation produced.
    pub value: T,
    /// Intents to hand to the outbox once the operation has committed.
    pub notifications: Vec<NotificationIntent>,
}

impl<T> Outcome<T> {
    /// Pairs a value with the intents it raised.
    pub fn new(value: T, notifications: Vec<NotificationIntent>) -> Self {
        Self {
            value,
            notifications,
        }
    }

    /// A value that raised no intents.
    pub fn quiet(value: T) -> Self {
        Self::new(value, Vec::new())
    }
}

/// A request for each manager to rule on a late decline.
pub fn late_decline_request(
    managers: &[Uuid],
    shift: &ScheduledShift,
    decline: &DeclineRecord,
) -> Vec<NotificationIntent> {
    managers
        .iter()
        .map(|&manager_id| NotificationIntent {
            recipient_id: manager_id,
            payload: NotificationPayload::LateDeclineRequest {
                shift_id: shift.id,
                employee_id: decline.declined_by,
                date: shift.date,
                planned_start: shift.planned_start,
                reason_id: decline.reason_id,
                comment: decline.comment.clone(),
            },
        })
        .collect()
}

/// Tells the declining employee how their late decline was ruled.
pub fn late_decline_resolved(
    employee_id: Uuid,
    shift_id: Uuid,
    decision: Decision,
) -> NotificationIntent {
    NotificationIntent {
        recipient_id: employee_id,
        payload: NotificationPayload::LateDeclineResolved { shift_id, decision },
    }
}

/// Asks each manager to review a submitted no-show reason.
pub fn no_show_reason_submitted(
    managers: &[Uuid],
    shift_id: Uuid,
    employee_id: Uuid,
    reason_text: &str,
) -> Vec<NotificationIntent> {
    managers
        .iter()
        .map(|&manager_id| NotificationIntent {
            recipient_id: manager_id,
            payload: NotificationPayload::NoShowReasonSubmitted {
                shift_id,
                employee_id,
                reason_text: reason_text.to_string(),
            },
        })
        .collect()
}

/// Tells the employee how their no-show reason was ruled.
pub fn no_show_reason_resolved(
    employee_id: Uuid,
    shift_id: Uuid,
    decision: Decision,
) -> NotificationIntent {
    NotificationIntent {
        recipient_id: employee_id,
        payload: NotificationPayload::NoShowReasonResolved { shift_id, decision },
    }
}

/// Offers an uncovered shift to a candidate.
pub fn replacement_offer(shift: &ScheduledShift, offer: &ReplacementOffer) -> NotificationIntent {
    NotificationIntent {
        recipient_id: offer.employee_id,
        payload: NotificationPayload::ReplacementOffer {
            shift_id: shift.id,
            offer_id: offer.id,
            branch_id: shift.branch_id,
            date: shift.date,
            planned_start: shift.planned_start,
            planned_end: shift.planned_end,
        },
    }
}

/// Withdraws an offer that can no longer be accepted.
pub fn replacement_cancelled(offer: &ReplacementOffer) -> NotificationIntent {
    NotificationIntent {
        recipient_id: offer.employee_id,
        payload: NotificationPayload::ReplacementCancelled {
            shift_id: offer.shift_id,
            offer_id: Some(offer.id),
        },
    }
}

/// Announces who now covers a shift.
pub fn replacement_accepted(
    recipients: &[Uuid],
    original_shift_id: Uuid,
    replacement_shift_id: Uuid,
    employee_id: Uuid,
    eta_minutes: Option<u32>,
) -> Vec<NotificationIntent> {
    recipients
        .iter()
        .map(|&recipient_id| NotificationIntent {
            recipient_id,
            payload: NotificationPayload::ReplacementAccepted {
                original_shift_id,
                replacement_shift_id,
                employee_id,
                eta_minutes,
            },
        })
        .collect()
}

/// Sending half of the outbound notification channel.
///
/// Cloning is cheap; every clone feeds the same subscriber.
#[derive(Debug, Clone)]
pub struct NotificationOutbox {
    sender: UnboundedSender<NotificationIntent>,
}

impl NotificationOutbox {
    /// Creates an outbox and the receiver a gateway drains.
    pub fn channel() -> (Self, UnboundedReceiver<NotificationIntent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Publishes intents in order. Returns how many were accepted.
    ///
    /// Intents are dropped with a warning once the subscriber has gone away;
    /// the state change that raised them is already committed.
    pub fn publish(&self, intents: Vec<NotificationIntent>) -> usize {
        let mut sent = 0;
        for intent in intents {
            let kind = intent.kind();
            let recipient_id = intent.recipient_id;
            match self.sender.send(intent) {
                Ok(()) => {
                    debug!(kind = %kind, recipient_id = %recipient_id, "Notification queued");
                    sent += 1;
                }
                Err(_) => {
                    warn!(
                        kind = %kind,
                        recipient_id = %recipient_id,
                        "Notification subscriber closed"
                    );
                }
            }
        }
        sent
    }
}
