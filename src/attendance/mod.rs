//! Shift attendance state machine.
//!
//! [`AttendanceEngine`] owns every transition of a single shift: confirmation
//! and decline, work segments, and the no-show reason flow. Each operation
//! runs in one store transaction that starts by reading the shift for update,
//! so concurrent calls on the same shift are serialized by the store.
//!
//! Operations take the current time as an argument; the engine never reads
//! the clock.

mod confirmation;
mod no_show;
mod segments;

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::AttendanceConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AssignmentStatus, AttendanceStatus, ScheduledShift, ShiftAssignment, ShiftStatus, WorkSegment,
};
use crate::store::{ShiftStore, StoreTx};
use crate::time_rules::worked_minutes;

/// Runs the attendance state machine against a [`ShiftStore`].
#[derive(Debug)]
pub struct AttendanceEngine<S> {
    store: Arc<S>,
    config: AttendanceConfig,
}

impl<S: ShiftStore> AttendanceEngine<S> {
    /// Creates an engine over `store`.
    pub fn new(store: Arc<S>, config: AttendanceConfig) -> Self {
        Self { store, config }
    }

    /// Returns the settings the engine runs with.
    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }
}

/// Worked-time summary of one shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timesheet {
    /// The shift.
    pub shift_id: Uuid,
    /// The assigned employee, if any.
    pub employee_id: Option<Uuid>,
    /// Lifecycle status.
    pub status: ShiftStatus,
    /// Attendance outcome.
    pub attendance_status: AttendanceStatus,
    /// Minutes late at the first open.
    pub late_minutes: u32,
    /// Minutes worked over closed segments.
    pub worked_minutes: i64,
    /// Whether a segment is currently open.
    pub has_open_segment: bool,
    /// Every segment, ordered by start.
    pub segments: Vec<WorkSegment>,
}

impl Timesheet {
    fn new(shift: &ScheduledShift, segments: Vec<WorkSegment>) -> Self {
        Self {
            shift_id: shift.id,
            employee_id: shift.employee_id,
            status: shift.status,
            attendance_status: shift.attendance_status,
            late_minutes: shift.late_minutes,
            worked_minutes: worked_minutes(&segments),
            has_open_segment: segments.iter().any(WorkSegment::is_open),
            segments,
        }
    }
}

fn require_assigned(shift: &ScheduledShift, employee_id: Uuid) -> EngineResult<()> {
    if shift.employee_id != Some(employee_id) {
        return Err(EngineError::NotAssigned {
            shift_id: shift.id,
            employee_id,
        });
    }
    Ok(())
}

/// Returns the assignment linking `employee_id` to the shift, creating one if none exists.
fn assignment_for(
    tx: &mut dyn StoreTx,
    shift_id: Uuid,
    employee_id: Uuid,
) -> EngineResult<ShiftAssignment> {
    Ok(tx
        .active_assignment(shift_id)?
        .filter(|a| a.employee_id == employee_id)
        .unwrap_or_else(|| ShiftAssignment::pending(shift_id, employee_id)))
}

/// Marks the employee's assignment declined with the decline details.
fn decline_assignment(
    tx: &mut dyn StoreTx,
    shift_id: Uuid,
    employee_id: Uuid,
    declined_at: chrono::NaiveDateTime,
    reason_id: Option<Uuid>,
    comment: Option<String>,
) -> EngineResult<()> {
    let mut assignment = assignment_for(tx, shift_id, employee_id)?;
    assignment.status = AssignmentStatus::Declined;
    assignment.declined_at = Some(declined_at);
    assignment.decline_reason_id = reason_id;
    assignment.decline_comment = comment;
    tx.save_assignment(&assignment)
}
