//! Scheduled shift model and its state axes.
//!
//! A shift carries three orthogonal axes: the work [`ShiftStatus`], the
//! [`ConfirmationStatus`] of the assigned employee, and the
//! [`AttendanceStatus`] outcome. Nested records ([`DeclineRecord`],
//! [`NoShowReason`]) replace what would otherwise be clusters of nullable
//! columns.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Work status of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Planned; no work segment opened yet.
    Scheduled,
    /// A work segment has been opened at least once and the shift is not closed.
    Opened,
    /// The last work segment was closed.
    Closed,
    /// Covered by a replacement shift; kept for audit.
    Replaced,
}

status_strings!(ShiftStatus, "shift status", {
    Scheduled => "scheduled",
    Opened => "opened",
    Closed => "closed",
    Replaced => "replaced",
});

/// Confirmation state of the employee assigned to a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    /// The shift does not need to be confirmed.
    NotRequired,
    /// Waiting for the employee to confirm.
    Pending,
    /// The employee confirmed.
    Confirmed,
    /// The employee declined and was unassigned.
    Declined,
    /// The employee declined too close to the start; a manager must decide.
    LateDeclinePending,
    /// Some, but not all, linked assignments are confirmed.
    PartiallyConfirmed,
}

status_strings!(ConfirmationStatus, "confirmation status", {
    NotRequired => "not_required",
    Pending => "pending",
    Confirmed => "confirmed",
    Declined => "declined",
    LateDeclinePending => "late_decline_pending",
    PartiallyConfirmed => "partially_confirmed",
});

/// Attendance outcome of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Nothing recorded yet.
    Unmarked,
    /// Opened within the grace window.
    OnTime,
    /// Opened after the grace window.
    Late,
    /// No work segment was opened during the planned window.
    NoShow,
    /// Covered by another employee.
    Replaced,
}

status_strings!(AttendanceStatus, "attendance status", {
    Unmarked => "unmarked",
    OnTime => "on_time",
    Late => "late",
    NoShow => "no_show",
    Replaced => "replaced",
});

/// Replacement progress of an uncovered shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementStatus {
    /// No replacement requested.
    None,
    /// Offers are out to candidates.
    Offered,
    /// A candidate took the shift.
    Accepted,
}

status_strings!(ReplacementStatus, "replacement status", {
    None => "none",
    Offered => "offered",
    Accepted => "accepted",
});

/// Review status of a submitted no-show reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonStatus {
    /// Waiting for a manager.
    Pending,
    /// Accepted; the no-show no longer counts against the employee.
    Approved,
    /// Not accepted.
    Rejected,
}

status_strings!(ReasonStatus, "reason status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// A manager's decision on a late decline or a no-show reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Accept the request.
    Approve,
    /// Refuse the request.
    Reject,
}

status_strings!(Decision, "decision", {
    Approve => "approve",
    Reject => "reject",
});

/// The reason an employee gave for not showing up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoShowReason {
    /// Free-text explanation.
    pub text: String,
    /// When the reason was submitted.
    pub submitted_at: NaiveDateTime,
    /// Review status.
    pub status: ReasonStatus,
    /// The manager who decided, once decided.
    pub decided_by: Option<Uuid>,
    /// When the decision was made.
    pub decided_at: Option<NaiveDateTime>,
}

/// A manager's ruling on a late decline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateDeclineDecision {
    /// The deciding manager.
    pub approver_id: Uuid,
    /// When the decision was made.
    pub decided_at: NaiveDateTime,
    /// The ruling.
    pub decision: Decision,
}

/// Record of an employee declining a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineRecord {
    /// The employee who declined.
    pub declined_by: Uuid,
    /// When the decline was submitted.
    pub declined_at: NaiveDateTime,
    /// Reference into the decline-reason dictionary.
    pub reason_id: Option<Uuid>,
    /// Free-text comment.
    pub comment: Option<String>,
    /// True if the decline arrived inside the deadline and needed approval.
    pub late: bool,
    /// Confirmation status before the decline, restored if a late decline is rejected.
    pub previous_status: ConfirmationStatus,
    /// The manager ruling for a late decline.
    pub decision: Option<LateDeclineDecision>,
}

/// A planned work interval for one employee at one branch on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledShift {
    /// Unique identifier for the shift.
    pub id: Uuid,
    /// Assigned employee; `None` while the shift is unfilled.
    pub employee_id: Option<Uuid>,
    /// Branch the shift belongs to.
    pub branch_id: Uuid,
    /// Position worked during the shift.
    pub position: String,
    /// Calendar date of the shift.
    pub date: NaiveDate,
    /// Planned start, local time of day.
    pub planned_start: NaiveTime,
    /// Planned end, local time of day. An end at or before the start means the next day.
    pub planned_end: NaiveTime,
    /// Work status.
    pub status: ShiftStatus,
    /// Attendance outcome.
    pub attendance_status: AttendanceStatus,
    /// Opening time of the first work segment.
    pub actual_start_at: Option<NaiveDateTime>,
    /// Closing time of the last work segment.
    pub actual_end_at: Option<NaiveDateTime>,
    /// Lateness of the first opening, fixed once set.
    pub late_minutes: u32,
    /// When the shift was reported as a no-show.
    pub no_show_at: Option<NaiveDateTime>,
    /// The employee who missed the shift; survives reassignment of `employee_id`.
    pub no_show_employee_id: Option<Uuid>,
    /// Explanation submitted for a no-show.
    pub no_show_reason: Option<NoShowReason>,
    /// Confirmation state.
    pub confirmation_status: ConfirmationStatus,
    /// When the assigned employee confirmed.
    pub confirmed_at: Option<NaiveDateTime>,
    /// The most recent decline.
    pub decline: Option<DeclineRecord>,
    /// True if this shift covers another one.
    pub is_replacement: bool,
    /// The shift being covered, for replacements.
    pub original_shift_id: Option<Uuid>,
    /// Replacement progress when this shift is uncovered.
    pub replacement_status: ReplacementStatus,
}

impl ScheduledShift {
    /// Creates an unfilled shift in the `scheduled` state.
    ///
    /// # Examples
    ///
    /// ```
    /// use shift_engine::models::{ConfirmationStatus, ScheduledShift, ShiftStatus};
    /// use chrono::{NaiveDate, NaiveTime};
    /// use uuid::Uuid;
    ///
    /// let employee_id = Uuid::new_v4();
    /// let shift = ScheduledShift::new(
    ///     Uuid::new_v4(),
    ///     "courier",
    ///     NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
    ///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    ///     NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
    /// )
    /// .assigned_to(employee_id);
    ///
    /// assert_eq!(shift.status, ShiftStatus::Scheduled);
    /// assert_eq!(shift.confirmation_status, ConfirmationStatus::Pending);
    /// assert_eq!(shift.employee_id, Some(employee_id));
    /// ```
    pub fn new(
        branch_id: Uuid,
        position: impl Into<String>,
        date: NaiveDate,
        planned_start: NaiveTime,
        planned_end: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: None,
            branch_id,
            position: position.into(),
            date,
            planned_start,
            planned_end,
            status: ShiftStatus::Scheduled,
            attendance_status: AttendanceStatus::Unmarked,
            actual_start_at: None,
            actual_end_at: None,
            late_minutes: 0,
            no_show_at: None,
            no_show_employee_id: None,
            no_show_reason: None,
            confirmation_status: ConfirmationStatus::NotRequired,
            confirmed_at: None,
            decline: None,
            is_replacement: false,
            original_shift_id: None,
            replacement_status: ReplacementStatus::None,
        }
    }

    /// Assigns an employee and puts the shift up for confirmation.
    pub fn assigned_to(mut self, employee_id: Uuid) -> Self {
        self.employee_id = Some(employee_id);
        self.confirmation_status = ConfirmationStatus::Pending;
        self
    }

    /// Returns the planned start as a date-time.
    pub fn planned_start_at(&self) -> NaiveDateTime {
        self.date.and_time(self.planned_start)
    }

    /// Returns the planned end as a date-time, rolling over midnight for overnight shifts.
    pub fn planned_end_at(&self) -> NaiveDateTime {
        let end = self.date.and_time(self.planned_end);
        if self.planned_end <= self.planned_start {
            end + Duration::days(1)
        } else {
            end
        }
    }

    /// Returns true if the assigned employee has confirmed at some point.
    pub fn was_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Returns true if the shift asks for confirmation and never received it.
    pub fn is_unconfirmed(&self) -> bool {
        self.confirmation_status != ConfirmationStatus::NotRequired && !self.was_confirmed()
    }

    /// Returns the review status of the no-show reason, if one was submitted.
    pub fn no_show_reason_status(&self) -> Option<ReasonStatus> {
        self.no_show_reason.as_ref().map(|r| r.status)
    }

    /// Returns true if the shift is a no-show whose reason has not been approved.
    pub fn counts_as_no_show(&self) -> bool {
        self.no_show_at.is_some() && self.no_show_reason_status() != Some(ReasonStatus::Approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn make_time(time_str: &str) -> NaiveTime {
        NaiveTime::parse_from_str(time_str, "%H:%M").unwrap()
    }

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        make_date(date_str).and_time(make_time(time_str))
    }

    fn create_test_shift(start: &str, end: &str) -> ScheduledShift {
        ScheduledShift::new(
            Uuid::new_v4(),
            "courier",
            make_date("2026-03-02"),
            make_time(start),
            make_time(end),
        )
    }

    #[test]
    fn test_new_shift_is_unfilled() {
        let shift = create_test_shift("09:00", "17:00");
        assert!(shift.employee_id.is_none());
        assert_eq!(shift.status, ShiftStatus::Scheduled);
        assert_eq!(shift.attendance_status, AttendanceStatus::Unmarked);
        assert_eq!(shift.confirmation_status, ConfirmationStatus::NotRequired);
        assert_eq!(shift.replacement_status, ReplacementStatus::None);
        assert!(!shift.is_replacement);
    }

    #[test]
    fn test_planned_window_same_day() {
        let shift = create_test_shift("09:00", "17:00");
        assert_eq!(shift.planned_start_at(), make_datetime("2026-03-02", "09:00"));
        assert_eq!(shift.planned_end_at(), make_datetime("2026-03-02", "17:00"));
    }

    #[test]
    fn test_planned_window_overnight() {
        let shift = create_test_shift("22:00", "06:00");
        assert_eq!(shift.planned_end_at(), make_datetime("2026-03-03", "06:00"));
    }

    #[test]
    fn test_assigned_shift_is_unconfirmed_until_confirmed() {
        let mut shift = create_test_shift("09:00", "17:00").assigned_to(Uuid::new_v4());
        assert!(shift.is_unconfirmed());

        shift.confirmation_status = ConfirmationStatus::Confirmed;
        shift.confirmed_at = Some(make_datetime("2026-03-01", "12:00"));
        assert!(!shift.is_unconfirmed());
    }

    #[test]
    fn test_not_required_confirmation_is_never_unconfirmed() {
        let shift = create_test_shift("09:00", "17:00");
        assert!(!shift.is_unconfirmed());
    }

    #[test]
    fn test_approved_reason_excuses_no_show() {
        let mut shift = create_test_shift("09:00", "17:00");
        shift.no_show_at = Some(make_datetime("2026-03-02", "10:00"));
        assert!(shift.counts_as_no_show());

        shift.no_show_reason = Some(NoShowReason {
            text: "flat tyre".to_string(),
            submitted_at: make_datetime("2026-03-02", "11:00"),
            status: ReasonStatus::Pending,
            decided_by: None,
            decided_at: None,
        });
        assert!(shift.counts_as_no_show());

        if let Some(reason) = shift.no_show_reason.as_mut() {
            reason.status = ReasonStatus::Approved;
        }
        assert!(!shift.counts_as_no_show());
    }

    #[test]
    fn test_status_names_match_serde() {
        assert_eq!(
            serde_json::to_string(&ConfirmationStatus::LateDeclinePending).unwrap(),
            "\"late_decline_pending\""
        );
        assert_eq!(
            "partially_confirmed".parse::<ConfirmationStatus>().unwrap(),
            ConfirmationStatus::PartiallyConfirmed
        );
        assert_eq!(AttendanceStatus::NoShow.to_string(), "no_show");
        assert!("paused".parse::<ShiftStatus>().is_err());
    }

    #[test]
    fn test_shift_serialization() {
        let shift = create_test_shift("09:00", "17:00").assigned_to(Uuid::new_v4());
        let json = serde_json::to_string(&shift).unwrap();
        let deserialized: ScheduledShift = serde_json::from_str(&json).unwrap();
        assert_eq!(shift, deserialized);
        assert!(json.contains("\"planned_start\":\"09:00:00\""));
    }
}
