//! Per-employee assignment record for a shift.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decision state of one employee's assignment to a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Waiting for the employee.
    PendingConfirm,
    /// The employee confirmed.
    Confirmed,
    /// The employee declined.
    Declined,
}

status_strings!(AssignmentStatus, "assignment status", {
    PendingConfirm => "pending_confirm",
    Confirmed => "confirmed",
    Declined => "declined",
});

/// Links one employee to one shift with their own decision trail.
///
/// A shift has at most one non-declined assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    /// Unique identifier for the assignment.
    pub id: Uuid,
    /// The shift.
    pub shift_id: Uuid,
    /// The assigned employee.
    pub employee_id: Uuid,
    /// Decision state.
    pub status: AssignmentStatus,
    /// When the employee confirmed.
    pub confirmed_at: Option<NaiveDateTime>,
    /// When the employee declined.
    pub declined_at: Option<NaiveDateTime>,
    /// Reference into the decline-reason dictionary.
    pub decline_reason_id: Option<Uuid>,
    /// Free-text decline comment.
    pub decline_comment: Option<String>,
}

impl ShiftAssignment {
    /// Creates a pending assignment.
    pub fn pending(shift_id: Uuid, employee_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            shift_id,
            employee_id,
            status: AssignmentStatus::PendingConfirm,
            confirmed_at: None,
            declined_at: None,
            decline_reason_id: None,
            decline_comment: None,
        }
    }

    /// Returns true unless the assignment was declined.
    pub fn is_active(&self) -> bool {
        self.status != AssignmentStatus::Declined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_assignment_is_active() {
        let assignment = ShiftAssignment::pending(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(assignment.status, AssignmentStatus::PendingConfirm);
        assert!(assignment.is_active());
    }

    #[test]
    fn test_declined_assignment_is_inactive() {
        let mut assignment = ShiftAssignment::pending(Uuid::new_v4(), Uuid::new_v4());
        assignment.status = AssignmentStatus::Declined;
        assert!(!assignment.is_active());
    }

    #[test]
    fn test_assignment_status_serialization() {
        assert_eq!(
            serde_json::to_string(&AssignmentStatus::PendingConfirm).unwrap(),
            "\"pending_confirm\""
        );
    }
}
