//! Threshold-cascading KPI scoring.
//!
//! Indicators score `100 - count * 100 / limit`, clamped to `[0, 100]`.
//! Sections average their enabled indicators and the overall score averages
//! the sections. At every level a value below the level's minimum becomes
//! zero. Comparisons use exact decimals; rounding is for display only.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::models::{KpiIndicator, KpiSection, KpiTemplate, TriggerEvent};

const DISPLAY_DECIMALS: u32 = 2;

/// Score of one indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorScore {
    /// Key of the indicator.
    pub indicator_key: String,
    /// Matching trigger events.
    pub trigger_count: usize,
    /// Percentage before the minimum is applied.
    pub raw_percent: Decimal,
    /// Percentage after the minimum is applied.
    pub final_percent: Decimal,
}

/// Score of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionScore {
    /// Name of the section.
    pub name: String,
    /// Mean of the indicators' final percentages.
    pub raw_percent: Decimal,
    /// Percentage after the minimum is applied.
    pub final_percent: Decimal,
    /// Scores of the enabled indicators.
    pub indicators: Vec<IndicatorScore>,
}

/// Score of a template against a set of trigger events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiResult {
    /// The template used.
    pub template_id: Uuid,
    /// Mean of the sections' final percentages.
    pub raw_percent: Decimal,
    /// Percentage after the minimum is applied.
    pub final_percent: Decimal,
    /// Scores of the sections with at least one enabled indicator.
    pub sections: Vec<SectionScore>,
}

impl KpiResult {
    /// Final percentage rounded for display.
    pub fn display_percent(&self) -> Decimal {
        self.final_percent.round_dp(DISPLAY_DECIMALS)
    }
}

/// Scores `events` against `template`.
///
/// A template without any enabled indicator scores 100: there is nothing
/// the employee could have failed.
///
/// # Example
///
/// ```
/// use shift_engine::kpi::score;
/// use shift_engine::models::{KpiIndicator, KpiSection, KpiTemplate};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let template = KpiTemplate {
///     id: Uuid::new_v4(),
///     partner_id: Uuid::new_v4(),
///     position: "courier".to_string(),
///     branch_id: None,
///     minimum_total_kpi_percent: Decimal::ZERO,
///     sections: vec![KpiSection {
///         name: "Discipline".to_string(),
///         minimum_section_percent: Decimal::ZERO,
///         indicators: vec![KpiIndicator {
///             indicator_key: "attendance".to_string(),
///             is_enabled: true,
///             trigger_types: Default::default(),
///             trigger_limit: 5,
///             minimum_indicator_percent: Decimal::ZERO,
///         }],
///     }],
/// };
///
/// assert_eq!(score(&template, &[]).final_percent, Decimal::ONE_HUNDRED);
/// ```
pub fn score(template: &KpiTemplate, events: &[TriggerEvent]) -> KpiResult {
    let sections: Vec<SectionScore> = template
        .sections
        .iter()
        .filter_map(|section| score_section(section, events))
        .collect();

    let raw_percent = mean(sections.iter().map(|s| s.final_percent))
        .unwrap_or(Decimal::ONE_HUNDRED);
    let final_percent = apply_minimum(raw_percent, template.minimum_total_kpi_percent);
    debug!(
        template_id = %template.id,
        raw_percent = %raw_percent,
        final_percent = %final_percent,
        "KPI scored"
    );

    KpiResult {
        template_id: template.id,
        raw_percent,
        final_percent,
        sections,
    }
}

fn score_section(section: &KpiSection, events: &[TriggerEvent]) -> Option<SectionScore> {
    let indicators: Vec<IndicatorScore> = section
        .enabled_indicators()
        .map(|indicator| score_indicator(indicator, events))
        .collect();
    let raw_percent = mean(indicators.iter().map(|i| i.final_percent))?;
    Some(SectionScore {
        name: section.name.clone(),
        raw_percent,
        final_percent: apply_minimum(raw_percent, section.minimum_section_percent),
        indicators,
    })
}

fn score_indicator(indicator: &KpiIndicator, events: &[TriggerEvent]) -> IndicatorScore {
    let trigger_count = events
        .iter()
        .filter(|e| indicator.matches(e.trigger_type))
        .count();
    let raw_percent = indicator_percent(trigger_count, indicator.trigger_limit);
    IndicatorScore {
        indicator_key: indicator.indicator_key.clone(),
        trigger_count,
        raw_percent,
        final_percent: apply_minimum(raw_percent, indicator.minimum_indicator_percent),
    }
}

/// Raw indicator percentage for `count` triggers against `limit`.
pub fn indicator_percent(count: usize, limit: u32) -> Decimal {
    let count = Decimal::from(count);
    if limit == 0 {
        return if count > Decimal::ZERO {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        };
    }
    let penalty = count * Decimal::ONE_HUNDRED / Decimal::from(limit);
    (Decimal::ONE_HUNDRED - penalty).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

fn apply_minimum(value: Decimal, minimum: Decimal) -> Decimal {
    if value < minimum { Decimal::ZERO } else { value }
}

fn mean(values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    let (sum, n) = values.fold((Decimal::ZERO, 0u32), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / Decimal::from(n))
}
