//! Work segment model.
//!
//! A shift may hold several segments to model pauses and reopen-after-close.
//! At most one segment per shift is open at any time.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contiguous interval of actual presence within a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSegment {
    /// Unique identifier for the segment.
    pub id: Uuid,
    /// The shift this segment belongs to.
    pub shift_id: Uuid,
    /// When the segment was opened.
    pub segment_start_at: NaiveDateTime,
    /// When the segment was closed; `None` while it is open.
    pub segment_end_at: Option<NaiveDateTime>,
    /// Whether the opening location passed the caller's check, if one was made.
    pub start_location_valid: Option<bool>,
    /// Whether the closing location passed the caller's check, if one was made.
    pub end_location_valid: Option<bool>,
}

impl WorkSegment {
    /// Creates an open segment starting at `start`.
    pub fn open(shift_id: Uuid, start: NaiveDateTime, location: Option<&LocationCheck>) -> Self {
        Self {
            id: Uuid::new_v4(),
            shift_id,
            segment_start_at: start,
            segment_end_at: None,
            start_location_valid: location.map(LocationCheck::is_within),
            end_location_valid: None,
        }
    }

    /// Returns true while the segment has no closing time.
    pub fn is_open(&self) -> bool {
        self.segment_end_at.is_none()
    }
}

/// Result of a distance check performed by the caller.
///
/// The engine never computes distances; it only acts on what the caller reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LocationCheck {
    /// The employee is within the allowed radius.
    Within {
        /// Reported distance to the branch in meters.
        distance_meters: u32,
    },
    /// The employee is outside the allowed radius.
    OutOfRange {
        /// Reported distance to the branch in meters.
        distance_meters: u32,
        /// Allowed radius in meters.
        allowed_meters: u32,
    },
}

impl LocationCheck {
    /// Returns true if the check passed.
    pub fn is_within(&self) -> bool {
        matches!(self, LocationCheck::Within { .. })
    }
}
