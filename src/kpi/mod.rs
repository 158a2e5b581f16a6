//! KPI scoring over a payroll period.
//!
//! Scoring is a read path: triggers are recomputed from the shifts of the
//! period on every evaluation and nothing is written back.

mod matching;
mod scoring;
mod triggers;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::KpiTemplate;
use crate::store::ShiftStore;

pub use matching::match_template;
pub use scoring::{IndicatorScore, KpiResult, SectionScore, indicator_percent, score};
pub use triggers::collect_trigger_events;

/// Result of evaluating one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KpiOutcome {
    /// A template matched and the employee was scored.
    Scored(KpiResult),
    /// No template covers the employee's partner, position and branch.
    NotApplicable {
        /// The employee.
        employee_id: Uuid,
        /// The employee's position.
        position: String,
        /// The employee's branch.
        branch_id: Uuid,
    },
}

/// Evaluates employees against stored and configured KPI templates.
#[derive(Debug)]
pub struct KpiEngine<S> {
    store: Arc<S>,
    templates: Vec<KpiTemplate>,
}

impl<S: ShiftStore> KpiEngine<S> {
    /// Creates an engine. `templates` come from configuration and are
    /// consulted after the partner's stored templates.
    pub fn new(store: Arc<S>, templates: Vec<KpiTemplate>) -> Self {
        Self { store, templates }
    }

    /// Scores an employee over a payroll period.
    ///
    /// Closed periods can be evaluated like active ones.
    ///
    /// # Errors
    ///
    /// `EmployeeNotFound` or `PayrollPeriodNotFound` if either is unknown.
    pub fn evaluate(&self, employee_id: Uuid, period_id: Uuid) -> EngineResult<KpiOutcome> {
        let (employee, period, shifts, mut templates) = self.store.transaction(|tx| {
            let employee = tx
                .employee(employee_id)?
                .ok_or(EngineError::EmployeeNotFound { employee_id })?;
            let period = tx
                .payroll_period(period_id)?
                .ok_or(EngineError::PayrollPeriodNotFound { period_id })?;
            let shifts = tx.shifts_between(period.period_start, period.period_end)?;
            let templates = tx.kpi_templates(employee.partner_id)?;
            Ok((employee, period, shifts, templates))
        })?;

        templates.extend(
            self.templates
                .iter()
                .filter(|t| !templates.iter().any(|stored| stored.id == t.id))
                .cloned()
                .collect::<Vec<_>>(),
        );

        let Some(template) = match_template(&templates, &employee) else {
            info!(
                employee_id = %employee_id,
                position = %employee.position,
                "No KPI template applies"
            );
            return Ok(KpiOutcome::NotApplicable {
                employee_id,
                position: employee.position,
                branch_id: employee.branch_id,
            });
        };

        let events = collect_trigger_events(employee_id, &shifts);
        debug!(
            employee_id = %employee_id,
            period_id = %period_id,
            shifts = shifts.len(),
            triggers = events.len(),
            "Collected KPI triggers"
        );
        let result = score(template, &events);
        info!(
            employee_id = %employee_id,
            period_id = %period_id,
            period_closed = period.is_closed(),
            template_id = %template.id,
            final_percent = %result.display_percent(),
            "KPI evaluated"
        );
        Ok(KpiOutcome::Scored(result))
    }
}
