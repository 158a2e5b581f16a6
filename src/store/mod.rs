//! Persistence for shifts, work segments, assignments and replacement offers.
//!
//! All mutating engine operations run inside [`ShiftStore::transaction`]. The
//! closure receives a [`StoreTx`]; returning `Ok` commits every write made
//! through it, returning `Err` discards them. Compare-and-swap methods report
//! the number of rows they changed so callers can tell a lost race from a
//! successful transition without a separate read.

mod memory;
mod sqlite;

pub use memory::MemoryShiftStore;
pub use sqlite::SqliteShiftStore;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, KpiTemplate, OfferStatus, PayrollPeriod, ReplacementOffer, ReplacementStatus,
    ScheduledShift, ShiftAssignment, WorkSegment,
};

/// Operations available inside one store transaction.
pub trait StoreTx {
    /// Reads a shift and holds it for the rest of the transaction.
    ///
    /// Fails with `ShiftNotFound` if the shift does not exist.
    fn shift_for_update(&mut self, shift_id: Uuid) -> EngineResult<ScheduledShift>;

    /// Inserts a new shift.
    fn insert_shift(&mut self, shift: &ScheduledShift) -> EngineResult<()>;

    /// Overwrites an existing shift; fails with `ShiftNotFound` if it is gone.
    fn update_shift(&mut self, shift: &ScheduledShift) -> EngineResult<()>;

    /// Deletes a shift together with its segments, assignments and offers.
    fn delete_shift(&mut self, shift_id: Uuid) -> EngineResult<()>;

    /// Returns every shift assigned to an employee on a date.
    fn shifts_for_employee_on(
        &mut self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Vec<ScheduledShift>>;

    /// Returns every shift dated within `[from, to]`, ordered by date and start.
    fn shifts_between(&mut self, from: NaiveDate, to: NaiveDate)
    -> EngineResult<Vec<ScheduledShift>>;

    /// Returns every replacement shift that points at `original_shift_id`.
    fn shifts_referencing(&mut self, original_shift_id: Uuid) -> EngineResult<Vec<ScheduledShift>>;

    /// Returns the segments of a shift ordered by start.
    fn segments_for_shift(&mut self, shift_id: Uuid) -> EngineResult<Vec<WorkSegment>>;

    /// Inserts an open segment; fails with `SegmentAlreadyOpen` if one exists.
    fn insert_open_segment(&mut self, segment: &WorkSegment) -> EngineResult<()>;

    /// Closes the open segment of a shift if it started at or before `end_at`.
    ///
    /// Returns the number of segments closed (0 or 1).
    fn close_open_segment(
        &mut self,
        shift_id: Uuid,
        end_at: NaiveDateTime,
        end_location_valid: Option<bool>,
    ) -> EngineResult<usize>;

    /// Returns the non-declined assignment of a shift.
    fn active_assignment(&mut self, shift_id: Uuid) -> EngineResult<Option<ShiftAssignment>>;

    /// Inserts or replaces an assignment.
    fn save_assignment(&mut self, assignment: &ShiftAssignment) -> EngineResult<()>;

    /// Inserts a replacement offer.
    fn insert_offer(&mut self, offer: &ReplacementOffer) -> EngineResult<()>;

    /// Reads an offer.
    fn offer(&mut self, offer_id: Uuid) -> EngineResult<Option<ReplacementOffer>>;

    /// Returns every offer made for a shift, in the order they were made.
    fn offers_for_shift(&mut self, shift_id: Uuid) -> EngineResult<Vec<ReplacementOffer>>;

    /// Moves an offer from `from` to `to` if it is still in `from`.
    ///
    /// Returns the number of rows changed. `eta_minutes` is recorded only when
    /// the transition happens.
    fn transition_offer(
        &mut self,
        offer_id: Uuid,
        from: OfferStatus,
        to: OfferStatus,
        at: NaiveDateTime,
        eta_minutes: Option<u32>,
    ) -> EngineResult<usize>;

    /// Moves a shift's replacement status from `from` to `to` if it is still in `from`.
    ///
    /// Returns the number of rows changed.
    fn transition_replacement(
        &mut self,
        shift_id: Uuid,
        from: ReplacementStatus,
        to: ReplacementStatus,
    ) -> EngineResult<usize>;

    /// Reads an employee.
    fn employee(&mut self, employee_id: Uuid) -> EngineResult<Option<Employee>>;

    /// Inserts or replaces an employee record.
    fn save_employee(&mut self, employee: &Employee) -> EngineResult<()>;

    /// Returns the managers responsible for a branch.
    fn responsible_managers(&mut self, branch_id: Uuid) -> EngineResult<Vec<Uuid>>;

    /// Grants a manager responsibility for a branch.
    fn add_responsible_manager(&mut self, branch_id: Uuid, manager_id: Uuid) -> EngineResult<()>;

    /// Reads a payroll period.
    fn payroll_period(&mut self, period_id: Uuid) -> EngineResult<Option<PayrollPeriod>>;

    /// Inserts or replaces a payroll period.
    fn save_payroll_period(&mut self, period: &PayrollPeriod) -> EngineResult<()>;

    /// Returns the KPI templates owned by a partner.
    fn kpi_templates(&mut self, partner_id: Uuid) -> EngineResult<Vec<KpiTemplate>>;

    /// Inserts or replaces a KPI template.
    fn save_kpi_template(&mut self, template: &KpiTemplate) -> EngineResult<()>;
}

/// A transactional store for the shift engine.
pub trait ShiftStore: Send + Sync {
    /// Runs `f` in a transaction, committing on `Ok` and rolling back on `Err`.
    fn transaction<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> EngineResult<T>;
}

/// Returns the managers of `branch_id`, failing unless `actor_id` is one of them.
pub(crate) fn require_manager(
    tx: &mut dyn StoreTx,
    branch_id: Uuid,
    actor_id: Uuid,
) -> EngineResult<Vec<Uuid>> {
    let managers = tx.responsible_managers(branch_id)?;
    if !managers.contains(&actor_id) {
        return Err(EngineError::NotResponsibleManager {
            employee_id: actor_id,
            branch_id,
        });
    }
    Ok(managers)
}
