//! Confirmation, decline and late-decline resolution.

use chrono::NaiveDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AssignmentStatus, AttendanceStatus, ConfirmationStatus, Decision, DeclineRecord,
    LateDeclineDecision, ScheduledShift, ShiftStatus,
};
use crate::notifications::{self, Outcome};
use crate::store::{ShiftStore, require_manager};
use crate::time_rules::is_late_decline;

use super::{AttendanceEngine, assignment_for, decline_assignment, require_assigned};

impl<S: ShiftStore> AttendanceEngine<S> {
    /// Confirms the shift on behalf of its assigned employee.
    ///
    /// # Errors
    ///
    /// `NotAssigned` if `employee_id` does not hold the shift,
    /// `AlreadyConfirmed` / `AlreadyDeclined` if the employee already decided,
    /// and `ConfirmationLocked` while a late decline awaits a manager.
    pub fn confirm(
        &self,
        shift_id: Uuid,
        employee_id: Uuid,
        now: NaiveDateTime,
    ) -> EngineResult<ScheduledShift> {
        let shift = self
            .store
            .transaction(|tx| {
                let mut shift = tx.shift_for_update(shift_id)?;
                require_assigned(&shift, employee_id)?;
                if shift.attendance_status == AttendanceStatus::NoShow {
                    return Err(EngineError::InvalidTransition {
                        shift_id,
                        message: "shift was marked as a no-show".to_string(),
                    });
                }
                match shift.confirmation_status {
                    ConfirmationStatus::NotRequired
                    | ConfirmationStatus::Pending
                    | ConfirmationStatus::PartiallyConfirmed => {}
                    ConfirmationStatus::Confirmed => {
                        return Err(EngineError::AlreadyConfirmed { shift_id });
                    }
                    ConfirmationStatus::Declined => {
                        return Err(EngineError::AlreadyDeclined { shift_id });
                    }
                    status @ ConfirmationStatus::LateDeclinePending => {
                        return Err(EngineError::ConfirmationLocked { shift_id, status });
                    }
                }

                shift.confirmation_status = ConfirmationStatus::Confirmed;
                shift.confirmed_at = Some(now);
                tx.update_shift(&shift)?;

                let mut assignment = assignment_for(tx, shift_id, employee_id)?;
                assignment.status = AssignmentStatus::Confirmed;
                assignment.confirmed_at = Some(now);
                tx.save_assignment(&assignment)?;
                Ok(shift)
            })
            .inspect_err(|err| {
                warn!(
                    shift_id = %shift_id,
                    employee_id = %employee_id,
                    error = %err,
                    "Confirmation rejected"
                );
            })?;

        info!(shift_id = %shift_id, employee_id = %employee_id, "Shift confirmed");
        Ok(shift)
    }

    /// Declines the shift on behalf of its assigned employee.
    ///
    /// A decline inside the late-decline deadline keeps the employee attached,
    /// moves the shift to `LateDeclinePending` and asks every responsible
    /// manager to rule on it. Any earlier decline releases the shift at once.
    pub fn decline(
        &self,
        shift_id: Uuid,
        employee_id: Uuid,
        reason_id: Option<Uuid>,
        comment: Option<String>,
        now: NaiveDateTime,
    ) -> EngineResult<Outcome<ScheduledShift>> {
        let deadline_hours = self.config.late_decline_deadline_hours;
        let outcome = self
            .store
            .transaction(|tx| {
                let mut shift = tx.shift_for_update(shift_id)?;
                require_assigned(&shift, employee_id)?;
                if shift.status != ShiftStatus::Scheduled
                    || shift.attendance_status == AttendanceStatus::NoShow
                {
                    return Err(EngineError::InvalidTransition {
                        shift_id,
                        message: format!("cannot decline a shift that is {}", shift.status),
                    });
                }
                match shift.confirmation_status {
                    ConfirmationStatus::Declined => {
                        return Err(EngineError::AlreadyDeclined { shift_id });
                    }
                    status @ ConfirmationStatus::LateDeclinePending => {
                        return Err(EngineError::ConfirmationLocked { shift_id, status });
                    }
                    _ => {}
                }

                let late = is_late_decline(shift.planned_start_at(), now, deadline_hours);
                let record = DeclineRecord {
                    declined_by: employee_id,
                    declined_at: now,
                    reason_id,
                    comment,
                    late,
                    previous_status: shift.confirmation_status,
                    decision: None,
                };

                let mut intents = Vec::new();
                if late {
                    shift.confirmation_status = ConfirmationStatus::LateDeclinePending;
                    let managers = tx.responsible_managers(shift.branch_id)?;
                    if managers.is_empty() {
                        warn!(
                            shift_id = %shift_id,
                            branch_id = %shift.branch_id,
                            "Late decline has no responsible manager to decide it"
                        );
                    }
                    intents = notifications::late_decline_request(&managers, &shift, &record);
                } else {
                    shift.employee_id = None;
                    shift.confirmation_status = ConfirmationStatus::Declined;
                    decline_assignment(
                        tx,
                        shift_id,
                        employee_id,
                        now,
                        record.reason_id,
                        record.comment.clone(),
                    )?;
                }
                shift.decline = Some(record);
                tx.update_shift(&shift)?;
                Ok(Outcome::new(shift, intents))
            })
            .inspect_err(|err| {
                warn!(
                    shift_id = %shift_id,
                    employee_id = %employee_id,
                    error = %err,
                    "Decline rejected"
                );
            })?;

        info!(
            shift_id = %shift_id,
            employee_id = %employee_id,
            status = %outcome.value.confirmation_status,
            "Shift declined"
        );
        Ok(outcome)
    }

    /// Rules on a pending late decline.
    ///
    /// Approval releases the shift. Rejection restores the confirmation
    /// status the shift had before the decline. The declining employee is
    /// told either way.
    pub fn resolve_late_decline(
        &self,
        shift_id: Uuid,
        approver_id: Uuid,
        decision: Decision,
        now: NaiveDateTime,
    ) -> EngineResult<Outcome<ScheduledShift>> {
        let outcome = self
            .store
            .transaction(|tx| {
                let mut shift = tx.shift_for_update(shift_id)?;
                require_manager(tx, shift.branch_id, approver_id)?;
                if shift.confirmation_status != ConfirmationStatus::LateDeclinePending {
                    return Err(EngineError::NoPendingLateDecline { shift_id });
                }
                let mut record = shift
                    .decline
                    .take()
                    .ok_or(EngineError::NoPendingLateDecline { shift_id })?;

                record.decision = Some(LateDeclineDecision {
                    approver_id,
                    decided_at: now,
                    decision,
                });
                match decision {
                    Decision::Approve => {
                        shift.employee_id = None;
                        shift.confirmation_status = ConfirmationStatus::Declined;
                        decline_assignment(
                            tx,
                            shift_id,
                            record.declined_by,
                            record.declined_at,
                            record.reason_id,
                            record.comment.clone(),
                        )?;
                    }
                    Decision::Reject => {
                        shift.confirmation_status = record.previous_status;
                    }
                }

                let intent =
                    notifications::late_decline_resolved(record.declined_by, shift_id, decision);
                shift.decline = Some(record);
                tx.update_shift(&shift)?;
                Ok(Outcome::new(shift, vec![intent]))
            })
            .inspect_err(|err| {
                warn!(
                    shift_id = %shift_id,
                    approver_id = %approver_id,
                    error = %err,
                    "Late decline decision rejected"
                );
            })?;

        info!(
            shift_id = %shift_id,
            approver_id = %approver_id,
            decision = %decision,
            status = %outcome.value.confirmation_status,
            "Late decline resolved"
        );
        Ok(outcome)
    }
}
