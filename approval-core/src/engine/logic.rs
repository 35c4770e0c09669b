use std::collections::BTreeMap;

use datalogic_rs::JsonLogic;
use serde_json::Value;
use tracing::warn;

use crate::models::route::ApprovalRoute;

/// Evaluates a route's condition against the application's form data.
/// Null conditions always apply; errors and non-boolean results do not.
pub fn route_applies(route: &ApprovalRoute, form_data: &Value) -> bool {
    if route.condition.is_null() {
        return true;
    }

    let logic = JsonLogic::new();
    match logic.apply(&route.condition, form_data) {
        Ok(result) => result.as_bool().unwrap_or(false),
        Err(e) => {
            warn!(route_id = route.id, error = ?e, "Route condition evaluation failed");
            false
        }
    }
}

/// Active routes whose condition applies, grouped by step order.
pub fn applicable_steps(routes: Vec<ApprovalRoute>, form_data: &Value) -> BTreeMap<u32, Vec<ApprovalRoute>> {
    let mut steps: BTreeMap<u32, Vec<ApprovalRoute>> = BTreeMap::new();
    for route in routes {
        if route.active && route_applies(&route, form_data) {
            steps.entry(route.step_order).or_default().push(route);
        }
    }
    steps
}

/// The smallest applicable step strictly after `current`, with its routes.
pub fn next_step(
    steps: &BTreeMap<u32, Vec<ApprovalRoute>>,
    current: Option<u32>,
) -> Option<(u32, &Vec<ApprovalRoute>)> {
    let mut candidates = match current {
        Some(step) => steps.range(step.checked_add(1)?..),
        None => steps.range(..),
    };
    candidates.next().map(|(step, routes)| (*step, routes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::route::ApproverStrategy;
    use serde_json::json;

    fn route(id: i64, step_order: u32, condition: Value) -> ApprovalRoute {
        ApprovalRoute {
            id,
            application_type_id: 1,
            step_order,
            approver: ApproverStrategy::SpecificUser { user_id: 1 },
            confirm_only: false,
            required: true,
            parallel: false,
            active: true,
            condition,
        }
    }

    #[test]
    fn null_condition_always_applies() {
        assert!(route_applies(&route(1, 1, Value::Null), &json!({})));
    }

    #[test]
    fn condition_is_evaluated_against_form_data() {
        let high_amount = route(1, 3, json!({">": [{"var": "amount"}, 100000]}));
        assert!(route_applies(&high_amount, &json!({"amount": 250000})));
        assert!(!route_applies(&high_amount, &json!({"amount": 5000})));
    }

    #[test]
    fn non_boolean_result_does_not_apply() {
        let odd = route(1, 1, json!({"var": "title"}));
        assert!(!route_applies(&odd, &json!({"title": "Taxi"})));
    }

    #[test]
    fn next_step_skips_inactive_and_inapplicable_routes() {
        let mut inactive = route(2, 2, Value::Null);
        inactive.active = false;
        let routes = vec![
            route(1, 1, Value::Null),
            inactive,
            route(3, 3, json!({">": [{"var": "amount"}, 100]})),
            route(4, 4, Value::Null),
        ];
        let steps = applicable_steps(routes, &json!({"amount": 5}));

        assert_eq!(next_step(&steps, None).map(|(s, _)| s), Some(1));
        assert_eq!(next_step(&steps, Some(1)).map(|(s, _)| s), Some(4));
        assert_eq!(next_step(&steps, Some(4)).map(|(s, _)| s), None);
    }

    #[test]
    fn highest_step_order_is_last() {
        let steps = applicable_steps(vec![route(1, u32::MAX, Value::Null)], &json!({}));
        assert_eq!(next_step(&steps, None).map(|(s, _)| s), Some(u32::MAX));
        assert!(next_step(&steps, Some(u32::MAX)).is_none());
    }
}
