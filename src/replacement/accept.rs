//! Accepting a replacement offer.

use chrono::{Duration, NaiveDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AssignmentStatus, ConfirmationStatus, OfferStatus, ReplacementStatus, ScheduledShift,
    ShiftAssignment, ShiftStatus,
};
use crate::notifications::{self, Outcome};
use crate::store::{ShiftStore, StoreTx};

use super::{ReplacementCoordinator, cancel_outstanding_offers};

impl<S: ShiftStore> ReplacementCoordinator<S> {
    /// Accepts an offer on behalf of the employee it was made to.
    ///
    /// The winner is decided by two conditional updates in one transaction:
    /// the shift's replacement status `offered -> accepted`, then the offer's
    /// own status `offered -> accepted`. If either changes no row another
    /// employee got there first and the call fails with `AlreadyTaken`
    /// without writing anything.
    ///
    /// On success the accepting employee gets a confirmed replacement shift
    /// starting `eta_minutes` after the planned start, the original shift is
    /// unassigned, and every other outstanding offer is cancelled. An ETA
    /// that lands at or after the planned end fails with `NotReplaceable`.
    pub fn accept(
        &self,
        offer_id: Uuid,
        employee_id: Uuid,
        eta_minutes: Option<u32>,
        now: NaiveDateTime,
    ) -> EngineResult<Outcome<ScheduledShift>> {
        let eta = eta_minutes.unwrap_or(self.config.default_eta_minutes);
        let outcome = self
            .store
            .transaction(|tx| {
                let offer = tx
                    .offer(offer_id)?
                    .ok_or(EngineError::OfferNotFound { offer_id })?;
                if offer.employee_id != employee_id {
                    return Err(EngineError::OfferNotAddressed {
                        offer_id,
                        employee_id,
                    });
                }

                let claimed = tx.transition_replacement(
                    offer.shift_id,
                    ReplacementStatus::Offered,
                    ReplacementStatus::Accepted,
                )?;
                if claimed == 0 {
                    return Err(EngineError::AlreadyTaken { offer_id });
                }
                let taken = tx.transition_offer(
                    offer_id,
                    OfferStatus::Offered,
                    OfferStatus::Accepted,
                    now,
                    Some(eta),
                )?;
                if taken == 0 {
                    return Err(EngineError::AlreadyTaken { offer_id });
                }

                let mut original = tx.shift_for_update(offer.shift_id)?;
                let replacement = place_replacement(tx, &original, employee_id, eta, now)?;
                original.employee_id = None;
                tx.update_shift(&original)?;

                let mut intents: Vec<_> =
                    cancel_outstanding_offers(tx, original.id, Some(offer_id), now)?
                        .iter()
                        .map(notifications::replacement_cancelled)
                        .collect();
                let managers = tx.responsible_managers(original.branch_id)?;
                intents.extend(notifications::replacement_accepted(
                    &managers,
                    original.id,
                    replacement.id,
                    employee_id,
                    Some(eta),
                ));
                Ok(Outcome::new(replacement, intents))
            })
            .inspect_err(|err| {
                warn!(
                    offer_id = %offer_id,
                    employee_id = %employee_id,
                    error = %err,
                    "Offer acceptance rejected"
                );
            })?;

        info!(
            offer_id = %offer_id,
            employee_id = %employee_id,
            replacement_shift_id = %outcome.value.id,
            eta_minutes = eta,
            "Replacement offer accepted"
        );
        Ok(outcome)
    }
}

/// Creates the accepting employee's shift, or converts their untouched
/// placeholder shift at the same branch that day.
fn place_replacement(
    tx: &mut dyn StoreTx,
    original: &ScheduledShift,
    employee_id: Uuid,
    eta_minutes: u32,
    now: NaiveDateTime,
) -> EngineResult<ScheduledShift> {
    let existing = tx.shifts_for_employee_on(employee_id, original.date)?;
    let mut placeholder = None;
    for shift in existing {
        let untouched = shift.branch_id == original.branch_id
            && shift.status == ShiftStatus::Scheduled
            && shift.actual_start_at.is_none()
            && shift.no_show_at.is_none();
        if untouched && placeholder.is_none() {
            placeholder = Some(shift);
        } else {
            return Err(EngineError::ScheduleConflict {
                employee_id,
                branch_id: shift.branch_id,
                date: original.date,
            });
        }
    }

    let start_at = original.planned_start_at() + Duration::minutes(i64::from(eta_minutes));
    if start_at >= original.planned_end_at() {
        return Err(EngineError::NotReplaceable {
            shift_id: original.id,
            message: format!("an arrival {eta_minutes} minutes late is past the shift end"),
        });
    }
    let start = start_at.time();
    let (mut replacement, reused) = match placeholder {
        Some(mut shift) => {
            shift.date = start_at.date();
            shift.planned_start = start;
            shift.planned_end = original.planned_end;
            shift.position = original.position.clone();
            (shift, true)
        }
        None => (
            ScheduledShift::new(
                original.branch_id,
                original.position.clone(),
                start_at.date(),
                start,
                original.planned_end,
            )
            .assigned_to(employee_id),
            false,
        ),
    };
    replacement.is_replacement = true;
    replacement.original_shift_id = Some(original.id);
    replacement.confirmation_status = ConfirmationStatus::Confirmed;
    replacement.confirmed_at = Some(now);

    if reused {
        tx.update_shift(&replacement)?;
    } else {
        tx.insert_shift(&replacement)?;
    }

    let mut assignment = tx
        .active_assignment(replacement.id)?
        .unwrap_or_else(|| ShiftAssignment::pending(replacement.id, employee_id));
    assignment.status = AssignmentStatus::Confirmed;
    assignment.confirmed_at = Some(now);
    tx.save_assignment(&assignment)?;
    Ok(replacement)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{at, no_show_fixture};
    use super::*;
    use crate::models::NotificationKind;
    use chrono::NaiveTime;

    #[test]
    fn test_accept_creates_replacement_shift() {
        let fx = no_show_fixture();
        let candidate = fx.colleague();
        let other = fx.colleague();
        let broadcast = fx
            .coordinator
            .broadcast(
                fx.shift.id,
                fx.manager_id,
                &[candidate.id, other.id],
                at("09:40"),
            )
            .unwrap();
        let offer = &broadcast.value.offers[0];

        let outcome = fx
            .coordinator
            .accept(offer.id, candidate.id, Some(45), at("09:45"))
            .unwrap();

        let replacement = outcome.value;
        assert_eq!(replacement.employee_id, Some(candidate.id));
        assert_eq!(replacement.planned_start, NaiveTime::from_hms_opt(9, 45, 0).unwrap());
        assert!(replacement.is_replacement);
        assert_eq!(replacement.original_shift_id, Some(fx.shift.id));
        assert_eq!(replacement.confirmation_status, ConfirmationStatus::Confirmed);

        let original = fx.reload(fx.shift.id).unwrap();
        assert_eq!(original.employee_id, None);
        assert_eq!(original.replacement_status, ReplacementStatus::Accepted);
        assert_eq!(original.no_show_employee_id, Some(fx.absent.id));

        let kinds: Vec<NotificationKind> = outcome.notifications.iter().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::ReplacementCancelled,
                NotificationKind::ReplacementAccepted
            ]
        );
        assert_eq!(outcome.notifications[0].recipient_id, other.id);
        assert_eq!(outcome.notifications[1].recipient_id, fx.manager_id);
    }

    #[test]
    fn test_second_acceptance_loses() {
        let fx = no_show_fixture();
        let first = fx.colleague();
        let second = fx.colleague();
        let broadcast = fx
            .coordinator
            .broadcast(
                fx.shift.id,
                fx.manager_id,
                &[first.id, second.id],
                at("09:40"),
            )
            .unwrap();
        let offers = broadcast.value.offers;

        fx.coordinator
            .accept(offers[0].id, first.id, None, at("09:45"))
            .unwrap();
        let lost = fx
            .coordinator
            .accept(offers[1].id, second.id, None, at("09:46"));
        assert!(matches!(lost, Err(EngineError::AlreadyTaken { .. })));

        let on_day = fx
            .store
            .transaction(|tx| tx.shifts_for_employee_on(second.id, fx.shift.date))
            .unwrap();
        assert!(on_day.is_empty());
    }

    #[test]
    fn test_default_eta_applies() {
        let fx = no_show_fixture();
        let candidate = fx.colleague();
        let broadcast = fx
            .coordinator
            .broadcast(fx.shift.id, fx.manager_id, &[candidate.id], at("09:40"))
            .unwrap();

        let replacement = fx
            .coordinator
            .accept(
                broadcast.value.offers[0].id,
                candidate.id,
                None,
                at("09:45"),
            )
            .unwrap()
            .value;
        assert_eq!(replacement.planned_start, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_eta_past_shift_end_is_not_replaceable() {
        let fx = no_show_fixture();
        let candidate = fx.colleague();
        let broadcast = fx
            .coordinator
            .broadcast(fx.shift.id, fx.manager_id, &[candidate.id], at("09:40"))
            .unwrap();
        let offer_id = broadcast.value.offers[0].id;

        for eta in [480, 900] {
            let result = fx
                .coordinator
                .accept(offer_id, candidate.id, Some(eta), at("09:45"));
            assert!(matches!(result, Err(EngineError::NotReplaceable { .. })));
        }

        let offers = fx
            .store
            .transaction(|tx| tx.offers_for_shift(fx.shift.id))
            .unwrap();
        assert_eq!(offers[0].status, OfferStatus::Offered);
        let original = fx.reload(fx.shift.id).unwrap();
        assert_eq!(original.replacement_status, ReplacementStatus::Offered);
        let on_day = fx
            .store
            .transaction(|tx| tx.shifts_for_employee_on(candidate.id, fx.shift.date))
            .unwrap();
        assert!(on_day.is_empty());

        let accepted = fx
            .coordinator
            .accept(offer_id, candidate.id, Some(479), at("09:46"))
            .unwrap()
            .value;
        assert_eq!(accepted.planned_start, NaiveTime::from_hms_opt(16, 59, 0).unwrap());
    }

    #[test]
    fn test_accept_reuses_placeholder_shift() {
        let fx = no_show_fixture();
        let candidate = fx.colleague();
        let broadcast = fx
            .coordinator
            .broadcast(fx.shift.id, fx.manager_id, &[candidate.id], at("09:40"))
            .unwrap();
        let placeholder = ScheduledShift::new(
            fx.shift.branch_id,
            "courier",
            fx.shift.date,
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        )
        .assigned_to(candidate.id);
        fx.store
            .transaction(|tx| tx.insert_shift(&placeholder))
            .unwrap();

        let replacement = fx
            .coordinator
            .accept(
                broadcast.value.offers[0].id,
                candidate.id,
                Some(10),
                at("09:45"),
            )
            .unwrap()
            .value;
        assert_eq!(replacement.id, placeholder.id);
        assert_eq!(replacement.planned_end, fx.shift.planned_end);
        assert!(replacement.is_replacement);
    }

    #[test]
    fn test_accept_by_wrong_employee() {
        let fx = no_show_fixture();
        let candidate = fx.colleague();
        let broadcast = fx
            .coordinator
            .broadcast(fx.shift.id, fx.manager_id, &[candidate.id], at("09:40"))
            .unwrap();

        let result = fx.coordinator.accept(
            broadcast.value.offers[0].id,
            Uuid::new_v4(),
            None,
            at("09:45"),
        );
        assert!(matches!(result, Err(EngineError::OfferNotAddressed { .. })));
    }

    #[test]
    fn test_accept_unknown_offer() {
        let fx = no_show_fixture();
        let result = fx
            .coordinator
            .accept(Uuid::new_v4(), Uuid::new_v4(), None, at("09:45"));
        assert!(matches!(result, Err(EngineError::OfferNotFound { .. })));
    }
}
