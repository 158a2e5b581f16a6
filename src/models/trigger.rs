//! KPI trigger events.
//!
//! Triggers are derived by re-scanning shifts over a payroll period; they are
//! never persisted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A countable behaviour that lowers KPI indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// The employee did not show up.
    NoShow,
    /// The employee opened the shift after the grace window.
    Late,
    /// No-show on a shift that was never confirmed.
    UnconfirmedOpenShift,
    /// Shift worked but never confirmed.
    UnconfirmedClosedShift,
}

status_strings!(TriggerType, "trigger type", {
    NoShow => "no_show",
    Late => "late",
    UnconfirmedOpenShift => "unconfirmed_open_shift",
    UnconfirmedClosedShift => "unconfirmed_closed_shift",
});

/// One occurrence of a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// What happened.
    pub trigger_type: TriggerType,
    /// When it happened.
    pub occurred_at: NaiveDateTime,
    /// Branch of the source shift.
    pub branch_id: Uuid,
    /// The source shift.
    pub shift_id: Uuid,
}
