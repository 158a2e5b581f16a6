//! Lateness calculation.

use chrono::NaiveDateTime;

/// Calculates how many minutes late an opening is, after the grace window.
///
/// The difference is truncated to whole minutes before the grace window is
/// subtracted. Openings before the planned start are never late.
///
/// # Examples
///
/// ```
/// use shift_engine::time_rules::late_minutes;
/// use chrono::NaiveDateTime;
///
/// let planned = NaiveDateTime::parse_from_str("2026-03-02 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let actual = NaiveDateTime::parse_from_str("2026-03-02 09:12:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// assert_eq!(late_minutes(planned, actual, 10), 2);
/// ```
pub fn late_minutes(
    planned_start: NaiveDateTime,
    actual_start: NaiveDateTime,
    grace_minutes: u32,
) -> u32 {
    let over = (actual_start - planned_start).num_minutes() - i64::from(grace_minutes);
    u32::try_from(over.max(0)).unwrap_or(u32::MAX)
}
