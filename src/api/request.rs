//! Request types for the shift engine API.
//!
//! Every body accepts an optional `at` timestamp. It is only honoured when
//! the server runs with `api.trust_client_time`; otherwise the handler uses
//! the server's local time.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Decision, LocationCheck};

/// Body of `POST /shifts/:id/confirm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    /// The confirming employee.
    pub employee_id: Uuid,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of `POST /shifts/:id/decline`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineRequest {
    /// The declining employee.
    pub employee_id: Uuid,
    /// Reference into the decline-reason dictionary.
    #[serde(default)]
    pub reason_id: Option<Uuid>,
    /// Free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of the manager decision endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// The deciding manager.
    pub approver_id: Uuid,
    /// The ruling.
    pub decision: Decision,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of `POST /shifts/:id/segments/open`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSegmentRequest {
    /// The employee opening the shift.
    pub employee_id: Uuid,
    /// Location check performed by the caller.
    #[serde(default)]
    pub location: Option<LocationCheck>,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of `POST /shifts/:id/segments/close`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloseSegmentRequest {
    /// Location check performed by the caller.
    #[serde(default)]
    pub location: Option<LocationCheck>,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of endpoints that only carry a timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimestampRequest {
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of `POST /shifts/:id/no-show/reason`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoShowReasonRequest {
    /// The employee who missed the shift.
    pub employee_id: Uuid,
    /// Their explanation.
    pub reason_text: String,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of `POST /shifts/:id/replacements/broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    /// The manager asking for the broadcast.
    pub requested_by: Uuid,
    /// Employees to consider.
    pub candidate_ids: Vec<Uuid>,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of `POST /shifts/:id/replacements/assign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignReplacementRequest {
    /// The assigning manager.
    pub assigned_by: Uuid,
    /// The employee who will cover the shift.
    pub candidate_id: Uuid,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Body of `POST /offers/:id/accept`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptOfferRequest {
    /// The accepting employee.
    pub employee_id: Uuid,
    /// Minutes until they can arrive.
    #[serde(default)]
    pub eta_minutes: Option<u32>,
    /// When the action happened.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Query of `GET /employees/:id/kpi`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiQuery {
    /// The payroll period to score.
    pub period_id: Uuid,
}

/// Picks the time an action is stamped with.
///
/// A client-supplied `at` is used only when `trusted` is set.
pub(crate) fn resolve_time(trusted: bool, at: Option<NaiveDateTime>) -> NaiveDateTime {
    match at {
        Some(at) if trusted => at,
        _ => Local::now().naive_local(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_optional() {
        let request: ConfirmRequest =
            serde_json::from_str(r#"{"employee_id": "0b5a7c5e-8d55-4d0b-9f3a-0f9f3c6f3f01"}"#)
                .unwrap();
        assert!(request.at.is_none());
    }

    fn march_second() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-03-02 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_trusted_timestamp_wins() {
        assert_eq!(resolve_time(true, Some(march_second())), march_second());
    }

    #[test]
    fn test_untrusted_timestamp_is_ignored() {
        let before = Local::now().naive_local();
        let stamped = resolve_time(false, Some(march_second()));
        assert_ne!(stamped, march_second());
        assert!(stamped >= before);
    }

    #[test]
    fn test_location_check_deserializes() {
        let request: OpenSegmentRequest = serde_json::from_str(
            r#"{
                "employee_id": "0b5a7c5e-8d55-4d0b-9f3a-0f9f3c6f3f01",
                "location": {"result": "out_of_range", "distance_meters": 320, "allowed_meters": 150},
                "at": "2026-03-02T09:03:00"
            }"#,
        )
        .unwrap();
        assert_eq!(
            request.location,
            Some(LocationCheck::OutOfRange {
                distance_meters: 320,
                allowed_meters: 150
            })
        );
    }

    #[test]
    fn test_decision_uses_snake_case() {
        let request: DecisionRequest = serde_json::from_str(
            r#"{"approver_id": "0b5a7c5e-8d55-4d0b-9f3a-0f9f3c6f3f01", "decision": "reject"}"#,
        )
        .unwrap();
        assert_eq!(request.decision, Decision::Reject);
    }
}
