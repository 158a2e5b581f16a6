//! Trigger collection from shift history.

use crate::models::{ScheduledShift, ShiftStatus, TriggerEvent, TriggerType};
use uuid::Uuid;

/// Derives the trigger events an employee earned from a set of shifts.
///
/// A no-show is attributed to the employee who missed the shift, even after
/// a replacement unassigned them, and is dropped entirely once its reason is
/// approved. A no-show on a never-confirmed shift also counts as an
/// unconfirmed open shift. Worked shifts yield `Late` when lateness was
/// recorded and `UnconfirmedClosedShift` when closed without confirmation.
///
/// # Example
///
/// ```
/// use shift_engine::kpi::collect_trigger_events;
/// use shift_engine::models::{ScheduledShift, TriggerType};
/// use chrono::{NaiveDate, NaiveTime};
/// use uuid::Uuid;
///
/// let employee_id = Uuid::new_v4();
/// let mut shift = ScheduledShift::new(
///     Uuid::new_v4(),
///     "courier",
///     NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
/// )
/// .assigned_to(employee_id);
/// shift.no_show_at = Some(shift.planned_start_at());
/// shift.no_show_employee_id = Some(employee_id);
///
/// let events = collect_trigger_events(employee_id, &[shift]);
/// let types: Vec<TriggerType> = events.iter().map(|e| e.trigger_type).collect();
/// assert_eq!(types, vec![TriggerType::NoShow, TriggerType::UnconfirmedOpenShift]);
/// ```
pub fn collect_trigger_events(employee_id: Uuid, shifts: &[ScheduledShift]) -> Vec<TriggerEvent> {
    let mut events = Vec::new();
    for shift in shifts {
        let event = |trigger_type, occurred_at| TriggerEvent {
            trigger_type,
            occurred_at,
            branch_id: shift.branch_id,
            shift_id: shift.id,
        };

        if let Some(no_show_at) = shift.no_show_at {
            if shift.no_show_employee_id == Some(employee_id) && shift.counts_as_no_show() {
                events.push(event(TriggerType::NoShow, no_show_at));
                if shift.is_unconfirmed() {
                    events.push(event(TriggerType::UnconfirmedOpenShift, no_show_at));
                }
            }
            continue;
        }

        if shift.employee_id != Some(employee_id) {
            continue;
        }
        if let Some(started) = shift.actual_start_at {
            if shift.late_minutes > 0 {
                events.push(event(TriggerType::Late, started));
            }
        }
        if shift.status == ShiftStatus::Closed && shift.is_unconfirmed() {
            let closed = shift
                .actual_end_at
                .or(shift.actual_start_at)
                .unwrap_or_else(|| shift.planned_end_at());
            events.push(event(TriggerType::UnconfirmedClosedShift, closed));
        }
    }
    events
}
