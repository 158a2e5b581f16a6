//! Core data models for the shift engine.
//!
//! This module contains the persisted entities the engine reads and writes,
//! plus the derived trigger events and outbound notification intents.

/// Implements `as_str`, `Display` and `FromStr` for a fieldless status enum
/// from one table of variant names.
macro_rules! status_strings {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the stored string form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::models::UnknownVariant {
                        kind: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

mod assignment;
mod employee;
mod kpi_template;
mod notification;
mod offer;
mod payroll_period;
mod shift;
mod trigger;
mod work_segment;

pub use assignment::{AssignmentStatus, ShiftAssignment};
pub use employee::{Employee, EmploymentStatus};
pub use kpi_template::{KpiIndicator, KpiSection, KpiTemplate};
pub use notification::{NotificationIntent, NotificationKind, NotificationPayload};
pub use offer::{OfferStatus, ReplacementOffer};
pub use payroll_period::{PayrollPeriod, PeriodStatus};
pub use shift::{
    AttendanceStatus, ConfirmationStatus, Decision, DeclineRecord, LateDeclineDecision,
    NoShowReason, ReasonStatus, ReplacementStatus, ScheduledShift, ShiftStatus,
};
pub use trigger::{TriggerEvent, TriggerType};
pub use work_segment::{LocationCheck, WorkSegment};

/// Error returned when a stored status string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// The enum being parsed.
    pub kind: &'static str,
    /// The rejected value.
    pub value: String,
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}
