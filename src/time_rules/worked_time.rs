//! Worked time aggregation over work segments.

use crate::models::WorkSegment;

/// Sums the closed segments of a shift in whole minutes.
///
/// Each closed segment contributes its own truncated duration; an open
/// segment contributes nothing until it is closed. The result does not depend
/// on segment order.
pub fn worked_minutes(segments: &[WorkSegment]) -> i64 {
    segments
        .iter()
        .filter_map(|s| {
            s.segment_end_at
                .map(|end| (end - s.segment_start_at).num_minutes())
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use uuid::Uuid;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn segment(start: NaiveDateTime, end: Option<NaiveDateTime>) -> WorkSegment {
        WorkSegment {
            id: Uuid::new_v4(),
            shift_id: Uuid::nil(),
            segment_start_at: start,
            segment_end_at: end,
            start_location_valid: None,
            end_location_valid: None,
        }
    }

    #[test]
    fn test_two_segments_with_lunch_break() {
        let segments = vec![
            segment(at(9, 0), Some(at(12, 0))),
            segment(at(13, 0), Some(at(17, 0))),
        ];
        assert_eq!(worked_minutes(&segments), 420);
    }

    #[test]
    fn test_order_does_not_matter() {
        let segments = vec![
            segment(at(13, 0), Some(at(17, 0))),
            segment(at(9, 0), Some(at(12, 0))),
        ];
        assert_eq!(worked_minutes(&segments), 420);
    }

    #[test]
    fn test_open_segment_contributes_nothing() {
        let segments = vec![
            segment(at(9, 0), Some(at(12, 0))),
            segment(at(13, 0), None),
        ];
        assert_eq!(worked_minutes(&segments), 180);
    }

    #[test]
    fn test_no_segments() {
        assert_eq!(worked_minutes(&[]), 0);
    }
}
