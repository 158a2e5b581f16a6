//! Reopen window check.

use chrono::NaiveDateTime;

use crate::models::{ScheduledShift, ShiftStatus, WorkSegment};

/// Returns true if a closed shift may get a new work segment.
///
/// The shift must be closed, have no open segment, and `now` must be before
/// the planned end.
pub fn can_reopen(shift: &ScheduledShift, segments: &[WorkSegment], now: NaiveDateTime) -> bool {
    shift.status == ShiftStatus::Closed
        && !segments.iter().any(WorkSegment::is_open)
        && now < shift.planned_end_at()
}
