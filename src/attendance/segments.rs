//! Work segments: open, close, reopen and the timesheet read.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceStatus, ConfirmationStatus, LocationCheck, ScheduledShift, ShiftStatus, WorkSegment,
};
use crate::store::{ShiftStore, StoreTx};
use crate::time_rules::{can_reopen, late_minutes};

use super::{AttendanceEngine, Timesheet, require_assigned};

impl<S: ShiftStore> AttendanceEngine<S> {
    /// Opens a work segment for the assigned employee.
    ///
    /// The first open of a shift stamps `actual_start_at` and computes
    /// `late_minutes`; later opens leave both untouched. Opening a closed
    /// shift is a reopen and is only allowed before the planned end.
    ///
    /// # Errors
    ///
    /// `SegmentAlreadyOpen` if a segment is open, `ReopenWindowExpired` for a
    /// closed shift past its planned end, `InvalidTransition` if `now` is
    /// before the end of the previous segment, and `LocationRequired` /
    /// `OutOfRange` when geofencing is on and the caller's check does not pass.
    pub fn open_segment(
        &self,
        shift_id: Uuid,
        employee_id: Uuid,
        now: NaiveDateTime,
        location: Option<LocationCheck>,
    ) -> EngineResult<Timesheet> {
        let timesheet = self
            .store
            .transaction(|tx| {
                let mut shift = tx.shift_for_update(shift_id)?;
                require_assigned(&shift, employee_id)?;
                self.check_location(shift_id, location.as_ref())?;
                ensure_workable(&shift)?;

                let segments = tx.segments_for_shift(shift_id)?;
                if segments.iter().any(WorkSegment::is_open) {
                    return Err(EngineError::SegmentAlreadyOpen { shift_id });
                }
                if shift.status == ShiftStatus::Closed && !can_reopen(&shift, &segments, now) {
                    return Err(EngineError::ReopenWindowExpired { shift_id });
                }

                if shift.actual_start_at.is_none() {
                    let late =
                        late_minutes(shift.planned_start_at(), now, self.config.grace_minutes);
                    shift.actual_start_at = Some(now);
                    shift.late_minutes = late;
                    shift.attendance_status = if late > 0 {
                        AttendanceStatus::Late
                    } else {
                        AttendanceStatus::OnTime
                    };
                    debug!(shift_id = %shift_id, late_minutes = late, "First segment of shift");
                }

                start_segment(tx, shift, segments, now, location.as_ref())
            })
            .inspect_err(|err| {
                warn!(
                    shift_id = %shift_id,
                    employee_id = %employee_id,
                    error = %err,
                    "Segment open rejected"
                );
            })?;

        info!(
            shift_id = %shift_id,
            employee_id = %employee_id,
            late_minutes = timesheet.late_minutes,
            "Work segment opened"
        );
        Ok(timesheet)
    }

    /// Closes the open work segment and marks the shift closed.
    ///
    /// # Errors
    ///
    /// `NoOpenSegment` if no segment is open, including a second close in a row,
    /// and `InvalidTransition` if `now` is before the open segment's start.
    pub fn close_segment(
        &self,
        shift_id: Uuid,
        now: NaiveDateTime,
        location: Option<LocationCheck>,
    ) -> EngineResult<Timesheet> {
        let timesheet = self
            .store
            .transaction(|tx| {
                let mut shift = tx.shift_for_update(shift_id)?;
                self.check_location(shift_id, location.as_ref())?;

                let open = tx
                    .segments_for_shift(shift_id)?
                    .into_iter()
                    .find(WorkSegment::is_open)
                    .ok_or(EngineError::NoOpenSegment { shift_id })?;
                if now < open.segment_start_at {
                    return Err(out_of_order(shift_id, "close is earlier than the segment start"));
                }

                let closed = tx.close_open_segment(
                    shift_id,
                    now,
                    location.as_ref().map(LocationCheck::is_within),
                )?;
                if closed == 0 {
                    return Err(out_of_order(shift_id, "segment changed before it could be closed"));
                }

                shift.status = ShiftStatus::Closed;
                shift.actual_end_at = Some(now);
                tx.update_shift(&shift)?;
                let segments = tx.segments_for_shift(shift_id)?;
                Ok(Timesheet::new(&shift, segments))
            })
            .inspect_err(|err| {
                warn!(shift_id = %shift_id, error = %err, "Segment close rejected");
            })?;

        info!(
            shift_id = %shift_id,
            worked_minutes = timesheet.worked_minutes,
            "Work segment closed"
        );
        Ok(timesheet)
    }

    /// Reopens a closed shift before its planned end.
    ///
    /// Lateness is never recomputed on reopen.
    pub fn reopen_segment(&self, shift_id: Uuid, now: NaiveDateTime) -> EngineResult<Timesheet> {
        let timesheet = self
            .store
            .transaction(|tx| {
                let shift = tx.shift_for_update(shift_id)?;
                let segments = tx.segments_for_shift(shift_id)?;
                if segments.iter().any(WorkSegment::is_open) {
                    return Err(EngineError::SegmentAlreadyOpen { shift_id });
                }
                if shift.status != ShiftStatus::Closed {
                    return Err(EngineError::InvalidTransition {
                        shift_id,
                        message: format!(
                            "only a closed shift can be reopened, shift is {}",
                            shift.status
                        ),
                    });
                }
                if !can_reopen(&shift, &segments, now) {
                    return Err(EngineError::ReopenWindowExpired { shift_id });
                }
                start_segment(tx, shift, segments, now, None)
            })
            .inspect_err(|err| {
                warn!(shift_id = %shift_id, error = %err, "Segment reopen rejected");
            })?;

        info!(shift_id = %shift_id, "Work segment reopened");
        Ok(timesheet)
    }

    /// Returns the segments and worked time of a shift.
    pub fn timesheet(&self, shift_id: Uuid) -> EngineResult<Timesheet> {
        self.store.transaction(|tx| {
            let shift = tx.shift_for_update(shift_id)?;
            let segments = tx.segments_for_shift(shift_id)?;
            Ok(Timesheet::new(&shift, segments))
        })
    }

    fn check_location(&self, shift_id: Uuid, location: Option<&LocationCheck>) -> EngineResult<()> {
        if !self.config.require_geolocation {
            return Ok(());
        }
        match location {
            None => Err(EngineError::LocationRequired { shift_id }),
            Some(LocationCheck::OutOfRange {
                distance_meters,
                allowed_meters,
            }) => Err(EngineError::OutOfRange {
                distance_meters: *distance_meters,
                allowed_meters: *allowed_meters,
            }),
            Some(LocationCheck::Within { .. }) => Ok(()),
        }
    }
}

fn ensure_workable(shift: &ScheduledShift) -> EngineResult<()> {
    let blocked = if shift.no_show_at.is_some() {
        Some("shift was marked as a no-show".to_string())
    } else if shift.status == ShiftStatus::Replaced {
        Some("shift was replaced".to_string())
    } else if shift.confirmation_status == ConfirmationStatus::LateDeclinePending {
        Some("a late decline is awaiting a decision".to_string())
    } else {
        None
    };
    match blocked {
        Some(message) => Err(EngineError::InvalidTransition {
            shift_id: shift.id,
            message,
        }),
        None => Ok(()),
    }
}

fn start_segment(
    tx: &mut dyn StoreTx,
    mut shift: ScheduledShift,
    mut segments: Vec<WorkSegment>,
    now: NaiveDateTime,
    location: Option<&LocationCheck>,
) -> EngineResult<Timesheet> {
    let last_end = segments.iter().filter_map(|s| s.segment_end_at).max();
    if last_end.is_some_and(|end| now < end) {
        return Err(out_of_order(shift.id, "open is earlier than the previous segment end"));
    }

    let segment = WorkSegment::open(shift.id, now, location);
    tx.insert_open_segment(&segment)?;
    segments.push(segment);

    shift.status = ShiftStatus::Opened;
    shift.actual_end_at = None;
    tx.update_shift(&shift)?;
    Ok(Timesheet::new(&shift, segments))
}

fn out_of_order(shift_id: Uuid, message: &str) -> EngineError {
    EngineError::InvalidTransition {
        shift_id,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fixture, fixture_with, make_datetime};
    use super::*;
    use crate::config::AttendanceConfig;

    #[test]
    fn test_open_on_time_within_grace() {
        let fx = fixture();
        let sheet = fx
            .engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:04"),
                None,
            )
            .unwrap();
        assert_eq!(sheet.status, ShiftStatus::Opened);
        assert_eq!(sheet.late_minutes, 0);
        assert_eq!(sheet.attendance_status, AttendanceStatus::OnTime);
        assert!(sheet.has_open_segment);
    }

    #[test]
    fn test_open_late_records_minutes() {
        let fx = fixture();
        let sheet = fx
            .engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:12"),
                None,
            )
            .unwrap();
        assert_eq!(sheet.late_minutes, 7);
        assert_eq!(sheet.attendance_status, AttendanceStatus::Late);
    }

    #[test]
    fn test_second_open_is_rejected() {
        let fx = fixture();
        let now = make_datetime("2026-03-02", "09:00");
        fx.engine
            .open_segment(fx.shift.id, fx.employee_id, now, None)
            .unwrap();
        let result = fx.engine.open_segment(fx.shift.id, fx.employee_id, now, None);
        assert!(matches!(result, Err(EngineError::SegmentAlreadyOpen { .. })));
    }

    #[test]
    fn test_close_without_open_segment() {
        let fx = fixture();
        let result = fx
            .engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "12:00"), None);
        assert!(matches!(result, Err(EngineError::NoOpenSegment { .. })));
    }

    #[test]
    fn test_close_twice_is_rejected() {
        let fx = fixture();
        fx.engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:00"),
                None,
            )
            .unwrap();
        fx.engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "12:00"), None)
            .unwrap();
        let result = fx
            .engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "12:01"), None);
        assert!(matches!(result, Err(EngineError::NoOpenSegment { .. })));
    }

    #[test]
    fn test_reopen_keeps_lateness_and_sums_segments() {
        let fx = fixture();
        fx.engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:20"),
                None,
            )
            .unwrap();
        fx.engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "12:00"), None)
            .unwrap();

        let reopened = fx
            .engine
            .reopen_segment(fx.shift.id, make_datetime("2026-03-02", "13:00"))
            .unwrap();
        assert_eq!(reopened.late_minutes, 15);
        assert_eq!(reopened.status, ShiftStatus::Opened);

        let closed = fx
            .engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "17:00"), None)
            .unwrap();
        assert_eq!(closed.worked_minutes, 160 + 240);
        assert_eq!(closed.segments.len(), 2);
        assert_eq!(closed.late_minutes, 15);
    }

    #[test]
    fn test_open_after_close_counts_as_reopen() {
        let fx = fixture();
        fx.engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:00"),
                None,
            )
            .unwrap();
        fx.engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "12:00"), None)
            .unwrap();

        let sheet = fx
            .engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "12:30"),
                None,
            )
            .unwrap();
        assert_eq!(sheet.late_minutes, 0);
        assert_eq!(sheet.segments.len(), 2);
    }

    #[test]
    fn test_close_before_segment_start_is_rejected() {
        let fx = fixture();
        fx.engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "12:00"),
                None,
            )
            .unwrap();

        let result = fx
            .engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "09:00"), None);
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));

        let sheet = fx.engine.timesheet(fx.shift.id).unwrap();
        assert!(sheet.has_open_segment);
        assert_eq!(sheet.worked_minutes, 0);
    }

    #[test]
    fn test_reopen_inside_previous_segment_is_rejected() {
        let fx = fixture();
        fx.engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:00"),
                None,
            )
            .unwrap();
        fx.engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "12:00"), None)
            .unwrap();

        let reopen = fx
            .engine
            .reopen_segment(fx.shift.id, make_datetime("2026-03-02", "10:00"));
        assert!(matches!(reopen, Err(EngineError::InvalidTransition { .. })));
        let open = fx.engine.open_segment(
            fx.shift.id,
            fx.employee_id,
            make_datetime("2026-03-02", "11:59"),
            None,
        );
        assert!(matches!(open, Err(EngineError::InvalidTransition { .. })));

        let sheet = fx.engine.timesheet(fx.shift.id).unwrap();
        assert_eq!(sheet.segments.len(), 1);
        assert_eq!(sheet.worked_minutes, 180);
    }

    #[test]
    fn test_reopen_at_previous_end_is_allowed() {
        let fx = fixture();
        fx.engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:00"),
                None,
            )
            .unwrap();
        fx.engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "12:00"), None)
            .unwrap();

        let sheet = fx
            .engine
            .reopen_segment(fx.shift.id, make_datetime("2026-03-02", "12:00"))
            .unwrap();
        assert_eq!(sheet.segments.len(), 2);
    }

    #[test]
    fn test_reopen_after_planned_end_expires() {
        let fx = fixture();
        fx.engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:00"),
                None,
            )
            .unwrap();
        fx.engine
            .close_segment(fx.shift.id, make_datetime("2026-03-02", "16:00"), None)
            .unwrap();

        let result = fx
            .engine
            .reopen_segment(fx.shift.id, make_datetime("2026-03-02", "17:00"));
        assert!(matches!(result, Err(EngineError::ReopenWindowExpired { .. })));
    }

    #[test]
    fn test_reopen_of_open_shift_is_rejected() {
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
            .reopen_segment(fx.shift.id, make_datetime("2026-03-02", "10:00"));
        assert!(matches!(result, Err(EngineError::SegmentAlreadyOpen { .. })));
    }

    #[test]
    fn test_geofence_requires_location() {
        let fx = fixture_with(AttendanceConfig {
            require_geolocation: true,
            ..AttendanceConfig::default()
        });
        let now = make_datetime("2026-03-02", "09:00");

        let missing = fx.engine.open_segment(fx.shift.id, fx.employee_id, now, None);
        assert!(matches!(missing, Err(EngineError::LocationRequired { .. })));

        let far = fx.engine.open_segment(
            fx.shift.id,
            fx.employee_id,
            now,
            Some(LocationCheck::OutOfRange {
                distance_meters: 900,
                allowed_meters: 150,
            }),
        );
        assert!(matches!(
            far,
            Err(EngineError::OutOfRange {
                distance_meters: 900,
                allowed_meters: 150
            })
        ));

        let sheet = fx
            .engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                now,
                Some(LocationCheck::Within { distance_meters: 40 }),
            )
            .unwrap();
        assert_eq!(sheet.segments[0].start_location_valid, Some(true));
    }

    #[test]
    fn test_out_of_range_is_only_recorded_without_geofence() {
        let fx = fixture();
        let sheet = fx
            .engine
            .open_segment(
                fx.shift.id,
                fx.employee_id,
                make_datetime("2026-03-02", "09:00"),
                Some(LocationCheck::OutOfRange {
                    distance_meters: 900,
                    allowed_meters: 150,
                }),
            )
            .unwrap();
        assert_eq!(sheet.segments[0].start_location_valid, Some(false));
    }

    #[test]
    fn test_timesheet_reads_without_changes() {
        let fx = fixture();
        let sheet = fx.engine.timesheet(fx.shift.id).unwrap();
        assert_eq!(sheet.status, ShiftStatus::Scheduled);
        assert_eq!(sheet.worked_minutes, 0);
        assert!(!sheet.has_open_segment);
    }
}
