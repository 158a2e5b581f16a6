//! Employee model and related types.
//!
//! Employees are owned by the staff directory; this crate only reads them and
//! uses their employment status to gate who may be offered or assigned shifts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the employment status of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    /// Actively working.
    Working,
    /// Temporarily away; cannot pick up shifts.
    OnVacation,
    /// Serving notice; still works scheduled shifts.
    PendingDismissal,
    /// No longer employed.
    Fired,
}

status_strings!(EmploymentStatus, "employment status", {
    Working => "working",
    OnVacation => "on_vacation",
    PendingDismissal => "pending_dismissal",
    Fired => "fired",
});

/// Represents an employee who can be scheduled for shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: Uuid,
    /// The partner (restaurant chain) the employee works for.
    pub partner_id: Uuid,
    /// The employee's home branch.
    pub branch_id: Uuid,
    /// The employee's position (e.g., "courier", "cook").
    pub position: String,
    /// The employee's employment status.
    pub status: EmploymentStatus,
}

impl Employee {
    /// Returns true if the employee may be offered or assigned shifts.
    ///
    /// Employees on vacation or fired are excluded; employees serving notice
    /// still take shifts until they leave.
    ///
    /// # Examples
    ///
    /// ```
    /// use shift_engine::models::{Employee, EmploymentStatus};
    /// use uuid::Uuid;
    ///
    /// let employee = Employee {
    ///     id: Uuid::new_v4(),
    ///     partner_id: Uuid::new_v4(),
    ///     branch_id: Uuid::new_v4(),
    ///     position: "courier".to_string(),
    ///     status: EmploymentStatus::Fired,
    /// };
    /// assert!(!employee.can_take_shifts());
    /// ```
    pub fn can_take_shifts(&self) -> bool {
        matches!(
            self.status,
            EmploymentStatus::Working | EmploymentStatus::PendingDismissal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_employee(status: EmploymentStatus) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            position: "courier".to_string(),
            status,
        }
    }

    #[test]
    fn test_deserialize_employee() {
        let json = r#"{
            "id": "0b5a7c5e-8d55-4d0b-9f3a-0f9f3c6f3f01",
            "partner_id": "0b5a7c5e-8d55-4d0b-9f3a-0f9f3c6f3f02",
            "branch_id": "0b5a7c5e-8d55-4d0b-9f3a-0f9f3c6f3f03",
            "position": "cook",
            "status": "on_vacation"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.position, "cook");
        assert_eq!(employee.status, EmploymentStatus::OnVacation);
    }

    #[test]
    fn test_working_employee_can_take_shifts() {
        assert!(create_test_employee(EmploymentStatus::Working).can_take_shifts());
    }

    #[test]
    fn test_pending_dismissal_employee_can_take_shifts() {
        assert!(create_test_employee(EmploymentStatus::PendingDismissal).can_take_shifts());
    }

    #[test]
    fn test_inactive_employees_cannot_take_shifts() {
        assert!(!create_test_employee(EmploymentStatus::OnVacation).can_take_shifts());
        assert!(!create_test_employee(EmploymentStatus::Fired).can_take_shifts());
    }

    #[test]
    fn test_employment_status_string_forms_agree() {
        for status in [
            EmploymentStatus::Working,
            EmploymentStatus::OnVacation,
            EmploymentStatus::PendingDismissal,
            EmploymentStatus::Fired,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<EmploymentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_employment_status_is_rejected() {
        let err = "retired".parse::<EmploymentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown employment status 'retired'");
    }
}
