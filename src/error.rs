//! Error types for the shift engine.
//!
//! Every operation returns [`EngineResult`]. Variants are grouped into the
//! [`ErrorCategory`] taxonomy so callers can decide what reaches the end user:
//! invariant violations and conflicts are shown verbatim, missing records and
//! permission failures are logged and surfaced generically.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ConfirmationStatus, EmploymentStatus};

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A state-machine rule was broken (double open, expired reopen window, lost race).
    InvariantViolation,
    /// A shift, offer, employee, period or template does not exist.
    NotFound,
    /// The actor is not assigned to the shift or is not a responsible manager.
    PermissionDenied,
    /// The candidate is already scheduled on that day.
    ConflictDetected,
    /// Storage or configuration failure.
    Internal,
}

/// The main error type for the shift engine.
///
/// # Example
///
/// ```
/// use shift_engine::error::{EngineError, ErrorCategory};
/// use uuid::Uuid;
///
/// let error = EngineError::SegmentAlreadyOpen { shift_id: Uuid::nil() };
/// assert_eq!(error.category(), ErrorCategory::InvariantViolation);
/// assert!(error.is_user_facing());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The persistent store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },

    /// No shift with this id exists.
    #[error("Shift not found: {shift_id}")]
    ShiftNotFound {
        /// The missing shift.
        shift_id: Uuid,
    },

    /// No replacement offer with this id exists.
    #[error("Replacement offer not found: {offer_id}")]
    OfferNotFound {
        /// The missing offer.
        offer_id: Uuid,
    },

    /// No employee with this id exists.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The missing employee.
        employee_id: Uuid,
    },

    /// No payroll period with this id exists.
    #[error("Payroll period not found: {period_id}")]
    PayrollPeriodNotFound {
        /// The missing period.
        period_id: Uuid,
    },

    /// The acting employee is not the one assigned to the shift.
    #[error("Employee {employee_id} is not assigned to shift {shift_id}")]
    NotAssigned {
        /// The shift being acted on.
        shift_id: Uuid,
        /// The acting employee.
        employee_id: Uuid,
    },

    /// The acting employee has no responsibility for the shift's branch.
    #[error("Employee {employee_id} is not a responsible manager for branch {branch_id}")]
    NotResponsibleManager {
        /// The acting employee.
        employee_id: Uuid,
        /// The branch of the shift.
        branch_id: Uuid,
    },

    /// The shift has already been confirmed.
    #[error("Shift {shift_id} is already confirmed")]
    AlreadyConfirmed {
        /// The shift.
        shift_id: Uuid,
    },

    /// The shift has already been declined.
    #[error("Shift {shift_id} is already declined")]
    AlreadyDeclined {
        /// The shift.
        shift_id: Uuid,
    },

    /// The requested confirmation change is not allowed from the current state.
    #[error("Shift {shift_id} cannot change confirmation while {status}")]
    ConfirmationLocked {
        /// The shift.
        shift_id: Uuid,
        /// The current confirmation status.
        status: ConfirmationStatus,
    },

    /// There is no late decline waiting for a decision.
    #[error("Shift {shift_id} has no late decline awaiting a decision")]
    NoPendingLateDecline {
        /// The shift.
        shift_id: Uuid,
    },

    /// A work segment is already open for the shift.
    #[error("Shift {shift_id} already has an open work segment")]
    SegmentAlreadyOpen {
        /// The shift.
        shift_id: Uuid,
    },

    /// No work segment is open for the shift.
    #[error("Shift {shift_id} has no open work segment")]
    NoOpenSegment {
        /// The shift.
        shift_id: Uuid,
    },

    /// The shift can no longer be reopened because its planned end has passed.
    #[error("Shift {shift_id} can no longer be reopened: planned end has passed")]
    ReopenWindowExpired {
        /// The shift.
        shift_id: Uuid,
    },

    /// The shift is in a state that does not allow the requested transition.
    #[error("Invalid transition for shift '{shift_id}': {message}")]
    InvalidTransition {
        /// The shift.
        shift_id: Uuid,
        /// What was attempted and why it is not allowed.
        message: String,
    },

    /// Geofencing is required but the caller supplied no location check.
    #[error("A location check is required to open shift {shift_id}")]
    LocationRequired {
        /// The shift.
        shift_id: Uuid,
    },

    /// The caller reported the employee outside of the allowed radius.
    #[error("Employee is {distance_meters} m away from the branch, {allowed_meters} m allowed")]
    OutOfRange {
        /// Reported distance to the branch.
        distance_meters: u32,
        /// Allowed radius.
        allowed_meters: u32,
    },

    /// The shift is not marked as a no-show.
    #[error("Shift {shift_id} is not a no-show")]
    NotNoShow {
        /// The shift.
        shift_id: Uuid,
    },

    /// A no-show reason was already submitted for the shift.
    #[error("A no-show reason was already submitted for shift {shift_id}")]
    NoShowReasonAlreadySubmitted {
        /// The shift.
        shift_id: Uuid,
    },

    /// No no-show reason exists for the shift.
    #[error("No no-show reason was submitted for shift {shift_id}")]
    NoShowReasonMissing {
        /// The shift.
        shift_id: Uuid,
    },

    /// The no-show reason was already decided the other way.
    #[error("The no-show reason for shift {shift_id} was already decided")]
    NoShowReasonAlreadyDecided {
        /// The shift.
        shift_id: Uuid,
    },

    /// Another employee accepted the replacement first.
    #[error("Replacement offer {offer_id} was already taken")]
    AlreadyTaken {
        /// The offer that lost the race.
        offer_id: Uuid,
    },

    /// The offer belongs to a different employee.
    #[error("Replacement offer {offer_id} was not made to employee {employee_id}")]
    OfferNotAddressed {
        /// The offer.
        offer_id: Uuid,
        /// The acting employee.
        employee_id: Uuid,
    },

    /// The shift is not open for replacement.
    #[error("Shift {shift_id} cannot be replaced: {message}")]
    NotReplaceable {
        /// The shift.
        shift_id: Uuid,
        /// Why the shift cannot be replaced.
        message: String,
    },

    /// The candidate cannot take shifts in their current employment status.
    #[error("Employee {employee_id} cannot take shifts while {status}")]
    CandidateInactive {
        /// The candidate.
        employee_id: Uuid,
        /// The candidate's employment status.
        status: EmploymentStatus,
    },

    /// The candidate already has a shift on that day.
    #[error("Employee {employee_id} is already scheduled at branch {branch_id} on {date}")]
    ScheduleConflict {
        /// The candidate.
        employee_id: Uuid,
        /// The branch of the conflicting shift.
        branch_id: Uuid,
        /// The conflicting date.
        date: NaiveDate,
    },
}

impl EngineError {
    /// Returns the taxonomy bucket of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::Storage { .. } => ErrorCategory::Internal,

            EngineError::ShiftNotFound { .. }
            | EngineError::OfferNotFound { .. }
            | EngineError::EmployeeNotFound { .. }
            | EngineError::PayrollPeriodNotFound { .. } => ErrorCategory::NotFound,

            EngineError::NotAssigned { .. }
            | EngineError::NotResponsibleManager { .. }
            | EngineError::OfferNotAddressed { .. } => ErrorCategory::PermissionDenied,

            EngineError::ScheduleConflict { .. } => ErrorCategory::ConflictDetected,

            EngineError::AlreadyConfirmed { .. }
            | EngineError::AlreadyDeclined { .. }
            | EngineError::ConfirmationLocked { .. }
            | EngineError::NoPendingLateDecline { .. }
            | EngineError::SegmentAlreadyOpen { .. }
            | EngineError::NoOpenSegment { .. }
            | EngineError::ReopenWindowExpired { .. }
            | EngineError::InvalidTransition { .. }
            | EngineError::LocationRequired { .. }
            | EngineError::OutOfRange { .. }
            | EngineError::NotNoShow { .. }
            | EngineError::NoShowReasonAlreadySubmitted { .. }
            | EngineError::NoShowReasonMissing { .. }
            | EngineError::NoShowReasonAlreadyDecided { .. }
            | EngineError::AlreadyTaken { .. }
            | EngineError::NotReplaceable { .. }
            | EngineError::CandidateInactive { .. } => ErrorCategory::InvariantViolation,
        }
    }

    /// Returns true if the message may be shown verbatim to the actor.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::InvariantViolation | ErrorCategory::ConflictDetected
        )
    }

    /// Wraps any displayable storage failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        EngineError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::storage(err)
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/engine.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/engine.yaml"
        );
        assert_eq!(error.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_segment_already_open_is_user_facing() {
        let error = EngineError::SegmentAlreadyOpen {
            shift_id: Uuid::nil(),
        };
        assert_eq!(
            error.to_string(),
            "Shift 00000000-0000-0000-0000-000000000000 already has an open work segment"
        );
        assert!(error.is_user_facing());
    }

    #[test]
    fn test_already_taken_is_invariant_violation() {
        let error = EngineError::AlreadyTaken {
            offer_id: Uuid::nil(),
        };
        assert_eq!(error.category(), ErrorCategory::InvariantViolation);
    }

    #[test]
    fn test_schedule_conflict_displays_date() {
        let error = EngineError::ScheduleConflict {
            employee_id: Uuid::nil(),
            branch_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        };
        assert!(error.to_string().ends_with("on 2026-03-02"));
        assert_eq!(error.category(), ErrorCategory::ConflictDetected);
        assert!(error.is_user_facing());
    }

    #[test]
    fn test_not_found_and_permission_errors_are_generic() {
        let not_found = EngineError::ShiftNotFound {
            shift_id: Uuid::nil(),
        };
        let denied = EngineError::NotResponsibleManager {
            employee_id: Uuid::nil(),
            branch_id: Uuid::nil(),
        };
        assert_eq!(not_found.category(), ErrorCategory::NotFound);
        assert_eq!(denied.category(), ErrorCategory::PermissionDenied);
        assert!(!not_found.is_user_facing());
        assert!(!denied.is_user_facing());
    }

    #[test]
    fn test_confirmation_locked_displays_status() {
        let error = EngineError::ConfirmationLocked {
            shift_id: Uuid::nil(),
            status: ConfirmationStatus::LateDeclinePending,
        };
        assert!(error.to_string().contains("late_decline_pending"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_storage_error() -> EngineResult<()> {
            Err(EngineError::storage("disk full"))
        }

        fn propagates_error() -> EngineResult<()> {
            returns_storage_error()?;
            Ok(())
        }

        match propagates_error() {
            Err(EngineError::Storage { message }) => assert_eq!(message, "disk full"),
            other => panic!("Expected Storage error, got {:?}", other),
        }
    }
}
