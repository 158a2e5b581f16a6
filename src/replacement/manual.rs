//! Manual replacement assignment by a manager.
//!
//! Two policies apply and they differ on purpose. When the no-show came with
//! a reason that has not been approved, the original shift is kept and
//! marked replaced, and the new shift points back at it. A plain no-show
//! loses its original row: it is deleted and the new shift carries no link.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceStatus, ReasonStatus, ReplacementStatus, ScheduledShift, ShiftAssignment,
    ShiftStatus,
};
use crate::notifications::{self, Outcome};
use crate::store::{ShiftStore, require_manager};

use super::{ReplacementCoordinator, cancel_outstanding_offers};

/// How a manual replacement treats the original shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementPolicy {
    /// Keep the original, mark it replaced and link the new shift to it.
    WithReason,
    /// Delete the original and create an unlinked shift.
    WithoutReason,
}

impl ReplacementPolicy {
    /// Picks the policy for a no-show shift.
    pub fn for_shift(shift: &ScheduledShift) -> Self {
        match shift.no_show_reason_status() {
            Some(ReasonStatus::Pending) | Some(ReasonStatus::Rejected) => {
                ReplacementPolicy::WithReason
            }
            Some(ReasonStatus::Approved) | None => ReplacementPolicy::WithoutReason,
        }
    }
}

/// Result of a manual replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualAssignment {
    /// The policy that was applied.
    pub policy: ReplacementPolicy,
    /// The no-show shift, which no longer exists under `WithoutReason`.
    pub original_shift_id: Uuid,
    /// The candidate's new shift.
    pub replacement: ScheduledShift,
}

impl<S: ShiftStore> ReplacementCoordinator<S> {
    /// Assigns `candidate_id` to cover a no-show shift.
    ///
    /// The conflict check and every write happen in one transaction, so two
    /// managers cannot double-book the same candidate. Outstanding broadcast
    /// offers for the shift are cancelled.
    ///
    /// # Errors
    ///
    /// `NotResponsibleManager`, `NotReplaceable` if the shift is not a no-show
    /// or is already covered, `CandidateInactive`, and `ScheduleConflict` if
    /// the candidate already works that day.
    pub fn assign_replacement(
        &self,
        shift_id: Uuid,
        assigned_by: Uuid,
        candidate_id: Uuid,
        now: NaiveDateTime,
    ) -> EngineResult<Outcome<ManualAssignment>> {
        let outcome = self
            .store
            .transaction(|tx| {
                let mut original = tx.shift_for_update(shift_id)?;
                require_manager(tx, original.branch_id, assigned_by)?;
                if original.no_show_at.is_none() {
                    return Err(EngineError::NotReplaceable {
                        shift_id,
                        message: "only a no-show shift can be replaced manually".to_string(),
                    });
                }
                if original.status == ShiftStatus::Replaced
                    || original.replacement_status == ReplacementStatus::Accepted
                    || !tx.shifts_referencing(shift_id)?.is_empty()
                {
                    return Err(EngineError::NotReplaceable {
                        shift_id,
                        message: "a replacement was already accepted".to_string(),
                    });
                }

                let candidate = tx
                    .employee(candidate_id)?
                    .ok_or(EngineError::EmployeeNotFound {
                        employee_id: candidate_id,
                    })?;
                if !candidate.can_take_shifts() {
                    return Err(EngineError::CandidateInactive {
                        employee_id: candidate_id,
                        status: candidate.status,
                    });
                }
                if original.no_show_employee_id == Some(candidate_id) {
                    return Err(EngineError::NotReplaceable {
                        shift_id,
                        message: "the candidate is the employee who did not show up".to_string(),
                    });
                }
                if let Some(conflict) = tx
                    .shifts_for_employee_on(candidate_id, original.date)?
                    .first()
                {
                    return Err(EngineError::ScheduleConflict {
                        employee_id: candidate_id,
                        branch_id: conflict.branch_id,
                        date: original.date,
                    });
                }

                let mut intents: Vec<_> = cancel_outstanding_offers(tx, shift_id, None, now)?
                    .iter()
                    .map(notifications::replacement_cancelled)
                    .collect();

                let policy = ReplacementPolicy::for_shift(&original);
                let mut replacement = ScheduledShift::new(
                    original.branch_id,
                    original.position.clone(),
                    original.date,
                    original.planned_start,
                    original.planned_end,
                )
                .assigned_to(candidate_id);

                match policy {
                    ReplacementPolicy::WithReason => {
                        replacement.is_replacement = true;
                        replacement.original_shift_id = Some(original.id);
                        original.replacement_status = ReplacementStatus::Accepted;
                        original.status = ShiftStatus::Replaced;
                        original.attendance_status = AttendanceStatus::Replaced;
                        tx.update_shift(&original)?;
                    }
                    ReplacementPolicy::WithoutReason => {
                        tx.delete_shift(original.id)?;
                    }
                }
                tx.insert_shift(&replacement)?;
                tx.save_assignment(&ShiftAssignment::pending(replacement.id, candidate_id))?;

                intents.extend(notifications::replacement_accepted(
                    &[candidate_id],
                    original.id,
                    replacement.id,
                    candidate_id,
                    None,
                ));
                Ok(Outcome::new(
                    ManualAssignment {
                        policy,
                        original_shift_id: original.id,
                        replacement,
                    },
                    intents,
                ))
            })
            .inspect_err(|err| {
                warn!(
                    shift_id = %shift_id,
                    candidate_id = %candidate_id,
                    error = %err,
                    "Manual replacement rejected"
                );
            })?;

        info!(
            shift_id = %shift_id,
            candidate_id = %candidate_id,
            assigned_by = %assigned_by,
            policy = ?outcome.value.policy,
            replacement_shift_id = %outcome.value.replacement.id,
            "Replacement assigned"
        );
        Ok(outcome)
    }
}
