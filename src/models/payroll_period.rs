//! Payroll period model.
//!
//! A payroll period is the window over which KPI triggers are counted.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a payroll period is still accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// The period is open.
    Active,
    /// The period has been closed for payroll.
    Closed,
}

status_strings!(PeriodStatus, "period status", {
    Active => "active",
    Closed => "closed",
});

/// Represents a payroll period with its date range.
///
/// # Example
///
/// ```
/// use shift_engine::models::{PayrollPeriod, PeriodStatus};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let period = PayrollPeriod {
///     id: Uuid::new_v4(),
///     partner_id: Uuid::new_v4(),
///     period_start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
///     period_end: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
///     status: PeriodStatus::Active,
///     closed_at: None,
/// };
///
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()));
/// assert!(!period.contains_date(NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollPeriod {
    /// Unique identifier for the period.
    pub id: Uuid,
    /// Owning partner.
    pub partner_id: Uuid,
    /// First day of the period (inclusive).
    pub period_start: NaiveDate,
    /// Last day of the period (inclusive).
    pub period_end: NaiveDate,
    /// Whether the period is open.
    pub status: PeriodStatus,
    /// When the period was closed.
    pub closed_at: Option<NaiveDateTime>,
}

impl PayrollPeriod {
    /// Checks if a given date falls within this period, inclusive of both ends.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.period_start && date <= self.period_end
    }

    /// Returns true once the period has been closed.
    pub fn is_closed(&self) -> bool {
        self.status == PeriodStatus::Closed
    }
}
