//! No-show facts and the no-show reason flow.

use chrono::NaiveDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceStatus, Decision, NoShowReason, ReasonStatus, ScheduledShift};
use crate::notifications::{self, Outcome};
use crate::store::{ShiftStore, require_manager};

use super::AttendanceEngine;

impl<S: ShiftStore> AttendanceEngine<S> {
    /// Records that the assigned employee did not show up.
    ///
    /// This is the inbound fact raised by the scheduling job. Recording an
    /// already recorded no-show changes nothing.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if a segment was ever opened or nobody is assigned.
    pub fn record_no_show(
        &self,
        shift_id: Uuid,
        at: NaiveDateTime,
    ) -> EngineResult<ScheduledShift> {
        let shift = self
            .store
            .transaction(|tx| {
                let mut shift = tx.shift_for_update(shift_id)?;
                if shift.no_show_at.is_some() {
                    return Ok(shift);
                }
                let worked = shift.actual_start_at.is_some()
                    || !tx.segments_for_shift(shift_id)?.is_empty();
                if worked {
                    return Err(EngineError::InvalidTransition {
                        shift_id,
                        message: "a work segment was already opened".to_string(),
                    });
                }
                let employee_id = shift.employee_id.ok_or_else(|| EngineError::InvalidTransition {
                    shift_id,
                    message: "shift has no assigned employee".to_string(),
                })?;

                shift.no_show_at = Some(at);
                shift.no_show_employee_id = Some(employee_id);
                shift.attendance_status = AttendanceStatus::NoShow;
                tx.update_shift(&shift)?;
                Ok(shift)
            })
            .inspect_err(|err| {
                warn!(shift_id = %shift_id, error = %err, "No-show rejected");
            })?;

        info!(shift_id = %shift_id, no_show_at = ?shift.no_show_at, "No-show recorded");
        Ok(shift)
    }

    /// Submits the no-show employee's explanation for review.
    pub fn submit_no_show_reason(
        &self,
        shift_id: Uuid,
        employee_id: Uuid,
        reason_text: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Outcome<ScheduledShift>> {
        let outcome = self
            .store
            .transaction(|tx| {
                let mut shift = tx.shift_for_update(shift_id)?;
                if shift.no_show_at.is_none() {
                    return Err(EngineError::NotNoShow { shift_id });
                }
                if shift.no_show_employee_id != Some(employee_id) {
                    return Err(EngineError::NotAssigned {
                        shift_id,
                        employee_id,
                    });
                }
                if shift.no_show_reason.is_some() {
                    return Err(EngineError::NoShowReasonAlreadySubmitted { shift_id });
                }

                shift.no_show_reason = Some(NoShowReason {
                    text: reason_text.to_string(),
                    submitted_at: now,
                    status: ReasonStatus::Pending,
                    decided_by: None,
                    decided_at: None,
                });
                tx.update_shift(&shift)?;

                let managers = tx.responsible_managers(shift.branch_id)?;
                let intents = notifications::no_show_reason_submitted(
                    &managers,
                    shift_id,
                    employee_id,
                    reason_text,
                );
                Ok(Outcome::new(shift, intents))
            })
            .inspect_err(|err| {
                warn!(
                    shift_id = %shift_id,
                    employee_id = %employee_id,
                    error = %err,
                    "No-show reason rejected"
                );
            })?;

        info!(shift_id = %shift_id, employee_id = %employee_id, "No-show reason submitted");
        Ok(outcome)
    }

    /// Rules on a submitted no-show reason.
    ///
    /// Repeating the decision already taken is a no-op that raises no
    /// intents; reversing it fails with `NoShowReasonAlreadyDecided`.
    pub fn decide_no_show_reason(
        &self,
        shift_id: Uuid,
        approver_id: Uuid,
        decision: Decision,
        now: NaiveDateTime,
    ) -> EngineResult<Outcome<ScheduledShift>> {
        let target = match decision {
            Decision::Approve => ReasonStatus::Approved,
            Decision::Reject => ReasonStatus::Rejected,
        };
        let outcome = self
            .store
            .transaction(|tx| {
                let mut shift = tx.shift_for_update(shift_id)?;
                require_manager(tx, shift.branch_id, approver_id)?;
                if shift.no_show_at.is_none() {
                    return Err(EngineError::NotNoShow { shift_id });
                }
                let employee_id = shift.no_show_employee_id;
                let reason = shift
                    .no_show_reason
                    .as_mut()
                    .ok_or(EngineError::NoShowReasonMissing { shift_id })?;
                if reason.status == target {
                    return Ok(Outcome::quiet(shift));
                }
                if reason.status != ReasonStatus::Pending {
                    return Err(EngineError::NoShowReasonAlreadyDecided { shift_id });
                }

                reason.status = target;
                reason.decided_by = Some(approver_id);
                reason.decided_at = Some(now);
                tx.update_shift(&shift)?;

                let intents = employee_id
                    .map(|id| notifications::no_show_reason_resolved(id, shift_id, decision))
                    .into_iter()
                    .collect();
                Ok(Outcome::new(shift, intents))
            })
            .inspect_err(|err| {
                warn!(
                    shift_id = %shift_id,
                    approver_id = %approver_id,
                    error = %err,
                    "No-show decision rejected"
                );
            })?;

        info!(
            shift_id = %shift_id,
            approver_id = %approver_id,
            decision = %decision,
            "No-show reason decided"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Fixture, fixture, make_datetime};
    use super::*;
    use crate::models::NotificationKind;

    fn no_show_fixture() -> Fixture {
        let fx = fixture();
        fx.engine
            .record_no_show(fx.shift.id, make_datetime("2026-03-02", "10:00"))
            .unwrap();
        fx
    }

    #[test]
    fn test_record_no_show_remembers_employee() {
        let fx = no_show_fixture();
        let shift = fx.reload();
        assert_eq!(shift.attendance_status, AttendanceStatus::NoShow);
        assert_eq!(shift.no_show_employee_id, Some(fx.employee_id));
        assert!(shift.counts_as_no_show());
    }

    #[test]
    fn test_record_no_show_is_idempotent() {
        let fx = no_show_fixture();
        let again = fx
            .engine
            .record_no_show(fx.shift.id, make_datetime("2026-03-02", "11:00"))
            .unwrap();
        assert_eq!(again.no_show_at, Some(make_datetime("2026-03-02", "10:00")));
    }

    #[test]
    fn test_no_show_after_open_is_rejected() {
        let fx = fixture();
        fx.engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:00"),
                None,
            )
            .unwrap();
        let result = fx
            .engine
            .record_no_show(fx.shift.id, make_datetime("2026-03-02", "10:00"));
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));
    }

    #[test]
    fn test_no_show_blocks_opening() {
        let fx = no_show_fixture();
        let result = fx.engine.open_segment(
            fx.shift.id,
            fx.employee_id,
            make_datetime("2026-03-02", "10:30"),
            None,
        );
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));
    }

    #[test]
    fn test_submit_reason_notifies_managers() {
        let fx = no_show_fixture();
        let outcome = fx
            .engine
            .submit_no_show_reason(
                fx.shift.id,
                fx.employee_id,
                "flat tyre",
                make_datetime("2026-03-02", "12:00"),
            )
            .unwrap();

        assert_eq!(
            outcome.value.no_show_reason_status(),
            Some(ReasonStatus::Pending)
        );
        assert_eq!(outcome.notifications.len(), 1);
        assert_eq!(outcome.notifications[0].recipient_id, fx.manager_id);
        assert_eq!(
            outcome.notifications[0].kind(),
            NotificationKind::NoShowReasonSubmitted
        );
    }

    #[test]
    fn test_submit_reason_twice_is_rejected() {
        let fx = no_show_fixture();
        let now = make_datetime("2026-03-02", "12:00");
        fx.engine
            .submit_no_show_reason(fx.shift.id, fx.employee_id, "flat tyre", now)
            .unwrap();
        let result = fx
            .engine
            .submit_no_show_reason(fx.shift.id, fx.employee_id, "again", now);
        assert!(matches!(
            result,
            Err(EngineError::NoShowReasonAlreadySubmitted { .. })
        ));
    }

    #[test]
    fn test_submit_reason_requires_no_show() {
        let fx = fixture();
        let result = fx.engine.submit_no_show_reason(
            fx.shift.id,
            fx.employee_id,
            "flat tyre",
            make_datetime("2026-03-02", "12:00"),
        );
        assert!(matches!(result, Err(EngineError::NotNoShow { .. })));
    }

    #[test]
    fn test_approve_reason_excuses_no_show_idempotently() {
        let fx = no_show_fixture();
        let now = make_datetime("2026-03-02", "12:00");
        fx.engine
            .submit_no_show_reason(fx.shift.id, fx.employee_id, "flat tyre", now)
            .unwrap();

        let first = fx
            .engine
            .decide_no_show_reason(fx.shift.id, fx.manager_id, Decision::Approve, now)
            .unwrap();
        assert!(!first.value.counts_as_no_show());
        assert_eq!(first.notifications[0].recipient_id, fx.employee_id);

        let second = fx
            .engine
            .decide_no_show_reason(fx.shift.id, fx.manager_id, Decision::Approve, now)
            .unwrap();
        assert!(second.notifications.is_empty());
        assert_eq!(second.value, first.value);

        let reversed =
            fx.engine
                .decide_no_show_reason(fx.shift.id, fx.manager_id, Decision::Reject, now);
        assert!(matches!(
            reversed,
            Err(EngineError::NoShowReasonAlreadyDecided { .. })
        ));
    }

    #[test]
    fn test_decide_without_reason_is_missing() {
        let fx = no_show_fixture();
        let result = fx.engine.decide_no_show_reason(
            fx.shift.id,
            fx.manager_id,
            Decision::Reject,
            make_datetime("2026-03-02", "12:00"),
        );
        assert!(matches!(result, Err(EngineError::NoShowReasonMissing { .. })));
    }
}
