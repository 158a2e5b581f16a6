//! KPI template selection.

use crate::models::{Employee, KpiTemplate};

/// Picks the template that scores an employee.
///
/// Only templates of the employee's partner and position qualify. A template
/// pinned to the employee's branch wins over a branch-wide one; among equals
/// the first listed wins. Returns `None` when nothing qualifies.
pub fn match_template<'a>(
    templates: &'a [KpiTemplate],
    employee: &Employee,
) -> Option<&'a KpiTemplate> {
    let mut wildcard = None;
    for template in templates
        .iter()
        .filter(|t| t.partner_id == employee.partner_id && t.position == employee.position)
    {
        match template.branch_id {
            Some(branch_id) if branch_id == employee.branch_id => return Some(template),
            None if wildcard.is_none() => wildcard = Some(template),
            _ => {}
        }
    }
    wildcard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmploymentStatus;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn create_test_employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            position: "courier".to_string(),
            status: EmploymentStatus::Working,
        }
    }

    fn template(employee: &Employee, position: &str, branch_id: Option<Uuid>) -> KpiTemplate {
        KpiTemplate {
            id: Uuid::new_v4(),
            partner_id: employee.partner_id,
            position: position.to_string(),
            branch_id,
            minimum_total_kpi_percent: Decimal::ZERO,
            sections: Vec::new(),
        }
    }

    #[test]
    fn test_exact_branch_beats_wildcard() {
        let employee = create_test_employee();
        let wildcard = template(&employee, "courier", None);
        let exact = template(&employee, "courier", Some(employee.branch_id));
        let templates = vec![wildcard, exact.clone()];

        assert_eq!(match_template(&templates, &employee).map(|t| t.id), Some(exact.id));
    }

    #[test]
    fn test_wildcard_used_without_exact_branch() {
        let employee = create_test_employee();
        let other_branch = template(&employee, "courier", Some(Uuid::new_v4()));
        let wildcard = template(&employee, "courier", None);
        let templates = vec![other_branch, wildcard.clone()];

        assert_eq!(
            match_template(&templates, &employee).map(|t| t.id),
            Some(wildcard.id)
        );
    }

    #[test]
    fn test_no_template_for_position() {
        let employee = create_test_employee();
        let templates = vec![template(&employee, "cook", None)];
        assert!(match_template(&templates, &employee).is_none());
    }

    #[test]
    fn test_other_partner_is_ignored() {
        let employee = create_test_employee();
        let mut foreign = template(&employee, "courier", None);
        foreign.partner_id = Uuid::new_v4();
        assert!(match_template(&[foreign], &employee).is_none());
    }
}
