//! Late-decline deadline check.

use chrono::{Duration, NaiveDateTime};

/// Returns true if a decline at `now` falls inside the deadline before the planned start.
///
/// A decline after the planned start is always late.
///
/// # Examples
///
/// ```
/// use shift_engine::time_rules::is_late_decline;
/// use chrono::NaiveDateTime;
///
/// let start = NaiveDateTime::parse_from_str("2026-03-02 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let now = NaiveDateTime::parse_from_str("2026-03-02 01:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// assert!(is_late_decline(start, now, 12));
/// assert!(!is_late_decline(start, now, 8));
/// ```
pub fn is_late_decline(
    planned_start: NaiveDateTime,
    now: NaiveDateTime,
    deadline_hours: u32,
) -> bool {
    planned_start - now < Duration::hours(i64::from(deadline_hours))
}
