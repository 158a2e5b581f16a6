//! Pure time rules used by the attendance engine.
//!
//! This module contains stateless functions for lateness, worked time,
//! late-decline deadlines and the reopen window.

mod late_decline;
mod lateness;
mod reopen_window;
mod worked_time;

pub use late_decline::is_late_decline;
pub use lateness::late_minutes;
pub use reopen_window::can_reopen;
pub use worked_time::worked_minutes;
