//! Replacement of uncovered shifts.
//!
//! A shift is uncovered once its employee no-showed, or declined and was
//! released. [`ReplacementCoordinator`] offers such a shift to candidates and
//! settles the race between them: the first acceptance flips the shift's
//! `replacement_status` from `offered` to `accepted` with a conditional
//! update, and every later acceptance finds zero rows changed and loses.
//!
//! Managers can also assign a replacement directly; see [`ReplacementPolicy`].

mod accept;
mod broadcast;
mod manual;

use std::sync::Arc;

use uuid::Uuid;

use crate::config::ReplacementConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ConfirmationStatus, OfferStatus, ReplacementOffer, ReplacementStatus, ScheduledShift,
    ShiftStatus,
};
use crate::store::{ShiftStore, StoreTx};

pub use broadcast::{BroadcastReport, SkipReason, SkippedCandidate};
pub use manual::{ManualAssignment, ReplacementPolicy};

/// Coordinates broadcasts, acceptances and manual replacements.
#[derive(Debug)]
pub struct ReplacementCoordinator<S> {
    store: Arc<S>,
    config: ReplacementConfig,
}

impl<S: ShiftStore> ReplacementCoordinator<S> {
    /// Creates a coordinator over `store`.
    pub fn new(store: Arc<S>, config: ReplacementConfig) -> Self {
        Self { store, config }
    }

    /// Returns the settings the coordinator runs with.
    pub fn config(&self) -> &ReplacementConfig {
        &self.config
    }
}

/// Returns the employee who left the shift uncovered, or `None` if it is covered.
fn uncovered_by(shift: &ScheduledShift) -> Option<Uuid> {
    if shift.no_show_at.is_some() {
        return shift.no_show_employee_id;
    }
    if shift.employee_id.is_none() && shift.confirmation_status == ConfirmationStatus::Declined {
        return shift.decline.as_ref().map(|d| d.declined_by);
    }
    None
}

/// Fails unless the shift is uncovered and nobody has taken it yet.
fn ensure_replaceable(shift: &ScheduledShift) -> EngineResult<Uuid> {
    let not_replaceable = |message: &str| EngineError::NotReplaceable {
        shift_id: shift.id,
        message: message.to_string(),
    };
    if shift.status == ShiftStatus::Replaced
        || shift.replacement_status == ReplacementStatus::Accepted
    {
        return Err(not_replaceable("a replacement was already accepted"));
    }
    uncovered_by(shift).ok_or_else(|| not_replaceable("the shift is still covered"))
}

/// Cancels every outstanding offer for the shift except `keep`.
///
/// Returns the offers actually cancelled by this call.
fn cancel_outstanding_offers(
    tx: &mut dyn StoreTx,
    shift_id: Uuid,
    keep: Option<Uuid>,
    now: chrono::NaiveDateTime,
) -> EngineResult<Vec<ReplacementOffer>> {
    let mut cancelled = Vec::new();
    for offer in tx.offers_for_shift(shift_id)? {
        if Some(offer.id) == keep || offer.status != OfferStatus::Offered {
            continue;
        }
        let changed = tx.transition_offer(
            offer.id,
            OfferStatus::Offered,
            OfferStatus::Cancelled,
            now,
            None,
        )?;
        if changed == 1 {
            cancelled.push(offer);
        }
    }
    Ok(cancelled)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{Employee, EmploymentStatus};
    use crate::store::MemoryShiftStore;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    pub struct Fixture {
        pub coordinator: ReplacementCoordinator<MemoryShiftStore>,
        pub store: Arc<MemoryShiftStore>,
        pub shift: ScheduledShift,
        pub absent: Employee,
        pub manager_id: Uuid,
    }

    pub fn at(time: &str) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    /// A 09:00-17:00 courier shift on 2026-03-02 whose employee no-showed.
    pub fn no_show_fixture() -> Fixture {
        let store = Arc::new(MemoryShiftStore::new());
        let absent = Employee {
            id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            position: "courier".to_string(),
            status: EmploymentStatus::Working,
        };
        let manager_id = Uuid::new_v4();
        let mut shift = ScheduledShift::new(
            absent.branch_id,
            "courier",
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .assigned_to(absent.id);
        shift.no_show_at = Some(at("09:30"));
        shift.no_show_employee_id = Some(absent.id);
        shift.attendance_status = crate::models::AttendanceStatus::NoShow;

        store
            .transaction(|tx| {
                tx.save_employee(&absent)?;
                tx.add_responsible_manager(absent.branch_id, manager_id)?;
                tx.insert_shift(&shift)
            })
            .unwrap();

        Fixture {
            coordinator: ReplacementCoordinator::new(
                Arc::clone(&store),
                ReplacementConfig::default(),
            ),
            store,
            shift,
            absent,
            manager_id,
        }
    }

    impl Fixture {
        /// Adds a working colleague of the absent employee.
        pub fn colleague(&self) -> Employee {
            self.hire(EmploymentStatus::Working, "courier")
        }

        pub fn hire(&self, status: EmploymentStatus, position: &str) -> Employee {
            let employee = Employee {
                id: Uuid::new_v4(),
                partner_id: self.absent.partner_id,
                branch_id: self.absent.branch_id,
                position: position.to_string(),
                status,
            };
            self.store
                .transaction(|tx| tx.save_employee(&employee))
                .unwrap();
            employee
        }

        pub fn reload(&self, shift_id: Uuid) -> EngineResult<ScheduledShift> {
            self.store.transaction(|tx| tx.shift_for_update(shift_id))
        }
    }
}
