//! Offering an uncovered shift to candidates.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{OfferStatus, ReplacementOffer, ReplacementStatus};
use crate::notifications::{self, Outcome};
use crate::store::{ShiftStore, require_manager};

use super::{ReplacementCoordinator, ensure_replaceable};

/// Why a candidate did not receive an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No employee record exists.
    UnknownEmployee,
    /// On vacation or fired.
    Inactive,
    /// Works for another partner.
    OtherPartner,
    /// Holds a different position.
    OtherPosition,
    /// Is the employee who left the shift uncovered.
    AbsentEmployee,
    /// Already has a shift that day.
    ScheduleConflict,
    /// Already holds an outstanding offer for the shift.
    AlreadyOffered,
}

/// A candidate left out of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCandidate {
    /// The candidate.
    pub employee_id: Uuid,
    /// Why they were left out.
    pub reason: SkipReason,
}

/// What a broadcast did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// The uncovered shift.
    pub shift_id: Uuid,
    /// Offers created by this broadcast.
    pub offers: Vec<ReplacementOffer>,
    /// Candidates that received no offer.
    pub skipped: Vec<SkippedCandidate>,
}

impl<S: ShiftStore> ReplacementCoordinator<S> {
    /// Offers an uncovered shift to every eligible candidate.
    ///
    /// Eligible candidates can take shifts, work for the same partner in the
    /// same position, are not the absent employee, have no shift on that date
    /// and hold no outstanding offer for this shift.
    pub fn broadcast(
        &self,
        shift_id: Uuid,
        requested_by: Uuid,
        candidate_ids: &[Uuid],
        now: NaiveDateTime,
    ) -> EngineResult<Outcome<BroadcastReport>> {
        let outcome = self
            .store
            .transaction(|tx| {
                let shift = tx.shift_for_update(shift_id)?;
                require_manager(tx, shift.branch_id, requested_by)?;
                let absent_id = ensure_replaceable(&shift)?;
                let absent = tx
                    .employee(absent_id)?
                    .ok_or(EngineError::EmployeeNotFound {
                        employee_id: absent_id,
                    })?;

                let already_offered: BTreeSet<Uuid> = tx
                    .offers_for_shift(shift_id)?
                    .into_iter()
                    .filter(|o| o.status == OfferStatus::Offered)
                    .map(|o| o.employee_id)
                    .collect();

                let mut seen = BTreeSet::new();
                let mut offers = Vec::new();
                let mut skipped = Vec::new();
                for &candidate_id in candidate_ids {
                    if !seen.insert(candidate_id) {
                        continue;
                    }
                    let reason = match tx.employee(candidate_id)? {
                        None => Some(SkipReason::UnknownEmployee),
                        Some(_) if candidate_id == absent_id => Some(SkipReason::AbsentEmployee),
                        Some(c) if !c.can_take_shifts() => Some(SkipReason::Inactive),
                        Some(c) if c.partner_id != absent.partner_id => {
                            Some(SkipReason::OtherPartner)
                        }
                        Some(c) if c.position != shift.position => Some(SkipReason::OtherPosition),
                        Some(_) if already_offered.contains(&candidate_id) => {
                            Some(SkipReason::AlreadyOffered)
                        }
                        Some(_) => {
                            if tx.shifts_for_employee_on(candidate_id, shift.date)?.is_empty() {
                                None
                            } else {
                                Some(SkipReason::ScheduleConflict)
                            }
                        }
                    };
                    match reason {
                        Some(reason) => {
                            debug!(
                                shift_id = %shift_id,
                                employee_id = %candidate_id,
                                reason = ?reason,
                                "Candidate skipped"
                            );
                            skipped.push(SkippedCandidate {
                                employee_id: candidate_id,
                                reason,
                            });
                        }
                        None => {
                            let offer = ReplacementOffer::new(shift_id, candidate_id, now);
                            tx.insert_offer(&offer)?;
                            offers.push(offer);
                        }
                    }
                }

                if !offers.is_empty() && shift.replacement_status == ReplacementStatus::None {
                    tx.transition_replacement(
                        shift_id,
                        ReplacementStatus::None,
                        ReplacementStatus::Offered,
                    )?;
                }

                let intents = offers
                    .iter()
                    .map(|offer| notifications::replacement_offer(&shift, offer))
                    .collect();
                Ok(Outcome::new(
                    BroadcastReport {
                        shift_id,
                        offers,
                        skipped,
                    },
                    intents,
                ))
            })
            .inspect_err(|err| {
                warn!(
                    shift_id = %shift_id,
                    requested_by = %requested_by,
                    error = %err,
                    "Broadcast rejected"
                );
            })?;

        info!(
            shift_id = %shift_id,
            offered = outcome.value.offers.len(),
            skipped = outcome.value.skipped.len(),
            "Replacement broadcast"
        );
        Ok(outcome)
    }
}
