//! KPI template configuration.
//!
//! Templates are partner-scoped and matched by position and (optionally)
//! branch. A template holds sections, each holding indicators; every level
//! has its own minimum percentage below which the level scores zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::TriggerType;

/// A single scored indicator.
///
/// # Example
///
/// ```
/// use shift_engine::models::{KpiIndicator, TriggerType};
/// use rust_decimal::Decimal;
///
/// let indicator = KpiIndicator {
///     indicator_key: "attendance".to_string(),
///     is_enabled: true,
///     trigger_types: [TriggerType::NoShow].into_iter().collect(),
///     trigger_limit: 5,
///     minimum_indicator_percent: Decimal::from(50),
/// };
/// assert!(indicator.matches(TriggerType::NoShow));
/// assert!(!indicator.matches(TriggerType::Late));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiIndicator {
    /// Stable key for the indicator (e.g., "punctuality").
    pub indicator_key: String,
    /// Disabled indicators are skipped entirely.
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    /// Trigger types counted against this indicator.
    pub trigger_types: BTreeSet<TriggerType>,
    /// Number of triggers that takes the indicator to zero; 0 means any trigger does.
    pub trigger_limit: u32,
    /// Minimum percentage; anything below scores zero.
    #[serde(default)]
    pub minimum_indicator_percent: Decimal,
}

fn default_enabled() -> bool {
    true
}

impl KpiIndicator {
    /// Returns true if events of this type count against the indicator.
    pub fn matches(&self, trigger_type: TriggerType) -> bool {
        self.trigger_types.contains(&trigger_type)
    }
}

/// A group of indicators averaged together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSection {
    /// Display name of the section.
    pub name: String,
    /// Minimum percentage; anything below scores zero.
    #[serde(default)]
    pub minimum_section_percent: Decimal,
    /// Ordered indicators.
    pub indicators: Vec<KpiIndicator>,
}

impl KpiSection {
    /// Returns the indicators that take part in scoring.
    pub fn enabled_indicators(&self) -> impl Iterator<Item = &KpiIndicator> {
        self.indicators.iter().filter(|i| i.is_enabled)
    }
}

/// Scoring configuration for one position, optionally narrowed to a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiTemplate {
    /// Unique identifier for the template.
    pub id: Uuid,
    /// Owning partner.
    pub partner_id: Uuid,
    /// Position the template applies to.
    pub position: String,
    /// Branch the template applies to; `None` matches every branch.
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    /// Minimum overall percentage; anything below scores zero.
    #[serde(default)]
    pub minimum_total_kpi_percent: Decimal,
    /// Ordered sections.
    pub sections: Vec<KpiSection>,
}
