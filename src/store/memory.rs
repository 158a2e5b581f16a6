//! In-memory store.
//!
//! The committed state sits behind one mutex. A transaction holds the lock,
//! works on a copy, and swaps the copy in only when the closure succeeds, so
//! concurrent callers are serialized and a failed operation leaves no trace.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, KpiTemplate, OfferStatus, PayrollPeriod, ReplacementOffer, ReplacementStatus,
    ScheduledShift, ShiftAssignment, WorkSegment,
};

use super::{ShiftStore, StoreTx};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    shifts: HashMap<Uuid, ScheduledShift>,
    segments: Vec<WorkSegment>,
    assignments: Vec<ShiftAssignment>,
    offers: Vec<ReplacementOffer>,
    employees: HashMap<Uuid, Employee>,
    managers: HashMap<Uuid, BTreeSet<Uuid>>,
    periods: HashMap<Uuid, PayrollPeriod>,
    templates: Vec<KpiTemplate>,
}

/// A [`ShiftStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryShiftStore {
    state: Mutex<MemoryState>,
}

impl MemoryShiftStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShiftStore for MemoryShiftStore {
    fn transaction<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> EngineResult<T>,
    {
        let mut committed = self
            .state
            .lock()
            .map_err(|_| EngineError::storage("memory store lock poisoned"))?;
        let mut tx = MemoryTx {
            state: committed.clone(),
        };
        let value = f(&mut tx)?;
        *committed = tx.state;
        Ok(value)
    }
}

struct MemoryTx {
    state: MemoryState,
}

fn sort_shifts(shifts: &mut [ScheduledShift]) {
    shifts.sort_by(|a, b| {
        (a.date, a.planned_start, a.id).cmp(&(b.date, b.planned_start, b.id))
    });
}

impl StoreTx for MemoryTx {
    fn shift_for_update(&mut self, shift_id: Uuid) -> EngineResult<ScheduledShift> {
        self.state
            .shifts
            .get(&shift_id)
            .cloned()
            .ok_or(EngineError::ShiftNotFound { shift_id })
    }

    fn insert_shift(&mut self, shift: &ScheduledShift) -> EngineResult<()> {
        if self.state.shifts.contains_key(&shift.id) {
            return Err(EngineError::storage(format!(
                "shift {} already exists",
                shift.id
            )));
        }
        self.state.shifts.insert(shift.id, shift.clone());
        Ok(())
    }

    fn update_shift(&mut self, shift: &ScheduledShift) -> EngineResult<()> {
        match self.state.shifts.get_mut(&shift.id) {
            Some(existing) => {
                *existing = shift.clone();
                Ok(())
            }
            None => Err(EngineError::ShiftNotFound { shift_id: shift.id }),
        }
    }

    fn delete_shift(&mut self, shift_id: Uuid) -> EngineResult<()> {
        if self.state.shifts.remove(&shift_id).is_none() {
            return Err(EngineError::ShiftNotFound { shift_id });
        }
        self.state.segments.retain(|s| s.shift_id != shift_id);
        self.state.assignments.retain(|a| a.shift_id != shift_id);
        self.state.offers.retain(|o| o.shift_id != shift_id);
        Ok(())
    }

    fn shifts_for_employee_on(
        &mut self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Vec<ScheduledShift>> {
        let mut shifts: Vec<ScheduledShift> = self
            .state
            .shifts
            .values()
            .filter(|s| s.employee_id == Some(employee_id) && s.date == date)
            .cloned()
            .collect();
        sort_shifts(&mut shifts);
        Ok(shifts)
    }

    fn shifts_between(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ScheduledShift>> {
        let mut shifts: Vec<ScheduledShift> = self
            .state
            .shifts
            .values()
            .filter(|s| s.date >= from && s.date <= to)
            .cloned()
            .collect();
        sort_shifts(&mut shifts);
        Ok(shifts)
    }

    fn shifts_referencing(&mut self, original_shift_id: Uuid) -> EngineResult<Vec<ScheduledShift>> {
        let mut shifts: Vec<ScheduledShift> = self
            .state
            .shifts
            .values()
            .filter(|s| s.original_shift_id == Some(original_shift_id))
            .cloned()
            .collect();
        sort_shifts(&mut shifts);
        Ok(shifts)
    }

    fn segments_for_shift(&mut self, shift_id: Uuid) -> EngineResult<Vec<WorkSegment>> {
        let mut segments: Vec<WorkSegment> = self
            .state
            .segments
            .iter()
            .filter(|s| s.shift_id == shift_id)
            .cloned()
            .collect();
        segments.sort_by_key(|s| s.segment_start_at);
        Ok(segments)
    }

    fn insert_open_segment(&mut self, segment: &WorkSegment) -> EngineResult<()> {
        let already_open = self
            .state
            .segments
            .iter()
            .any(|s| s.shift_id == segment.shift_id && s.is_open());
        if already_open {
            return Err(EngineError::SegmentAlreadyOpen {
                shift_id: segment.shift_id,
            });
        }
        self.state.segments.push(segment.clone());
        Ok(())
    }

    fn close_open_segment(
        &mut self,
        shift_id: Uuid,
        end_at: NaiveDateTime,
        end_location_valid: Option<bool>,
    ) -> EngineResult<usize> {
        let mut closed = 0;
        for segment in self
            .state
            .segments
            .iter_mut()
            .filter(|s| s.shift_id == shift_id && s.is_open() && s.segment_start_at <= end_at)
        {
            segment.segment_end_at = Some(end_at);
            segment.end_location_valid = end_location_valid;
            closed += 1;
        }
        Ok(closed)
    }

    fn active_assignment(&mut self, shift_id: Uuid) -> EngineResult<Option<ShiftAssignment>> {
        Ok(self
            .state
            .assignments
            .iter()
            .find(|a| a.shift_id == shift_id && a.is_active())
            .cloned())
    }

    fn save_assignment(&mut self, assignment: &ShiftAssignment) -> EngineResult<()> {
        match self
            .state
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment.id)
        {
            Some(existing) => *existing = assignment.clone(),
            None => self.state.assignments.push(assignment.clone()),
        }
        Ok(())
    }

    fn insert_offer(&mut self, offer: &ReplacementOffer) -> EngineResult<()> {
        self.state.offers.push(offer.clone());
        Ok(())
    }

    fn offer(&mut self, offer_id: Uuid) -> EngineResult<Option<ReplacementOffer>> {
        Ok(self.state.offers.iter().find(|o| o.id == offer_id).cloned())
    }

    fn offers_for_shift(&mut self, shift_id: Uuid) -> EngineResult<Vec<ReplacementOffer>> {
        Ok(self
            .state
            .offers
            .iter()
            .filter(|o| o.shift_id == shift_id)
            .cloned()
            .collect())
    }

    fn transition_offer(
        &mut self,
        offer_id: Uuid,
        from: OfferStatus,
        to: OfferStatus,
        at: NaiveDateTime,
        eta_minutes: Option<u32>,
    ) -> EngineResult<usize> {
        match self
            .state
            .offers
            .iter_mut()
            .find(|o| o.id == offer_id && o.status == from)
        {
            Some(offer) => {
                offer.status = to;
                offer.responded_at = Some(at);
                if eta_minutes.is_some() {
                    offer.eta_minutes = eta_minutes;
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn transition_replacement(
        &mut self,
        shift_id: Uuid,
        from: ReplacementStatus,
        to: ReplacementStatus,
    ) -> EngineResult<usize> {
        match self.state.shifts.get_mut(&shift_id) {
            Some(shift) if shift.replacement_status == from => {
                shift.replacement_status = to;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    fn employee(&mut self, employee_id: Uuid) -> EngineResult<Option<Employee>> {
        Ok(self.state.employees.get(&employee_id).cloned())
    }

    fn save_employee(&mut self, employee: &Employee) -> EngineResult<()> {
        self.state.employees.insert(employee.id, employee.clone());
        Ok(())
    }

    fn responsible_managers(&mut self, branch_id: Uuid) -> EngineResult<Vec<Uuid>> {
        Ok(self
            .state
            .managers
            .get(&branch_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default())
    }

    fn add_responsible_manager(&mut self, branch_id: Uuid, manager_id: Uuid) -> EngineResult<()> {
        self.state
            .managers
            .entry(branch_id)
            .or_default()
            .insert(manager_id);
        Ok(())
    }

    fn payroll_period(&mut self, period_id: Uuid) -> EngineResult<Option<PayrollPeriod>> {
        Ok(self.state.periods.get(&period_id).cloned())
    }

    fn save_payroll_period(&mut self, period: &PayrollPeriod) -> EngineResult<()> {
        self.state.periods.insert(period.id, period.clone());
        Ok(())
    }

    fn kpi_templates(&mut self, partner_id: Uuid) -> EngineResult<Vec<KpiTemplate>> {
        Ok(self
            .state
            .templates
            .iter()
            .filter(|t| t.partner_id == partner_id)
            .cloned()
            .collect())
    }

    fn save_kpi_template(&mut self, template: &KpiTemplate) -> EngineResult<()> {
        self.state.templates.retain(|t| t.id != template.id);
        self.state.templates.push(template.clone());
        Ok(())
    }
}
