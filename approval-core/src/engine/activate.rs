use tracing::debug;

use crate::models::application::Application;
use crate::models::auditlog::ChangeLog;
use crate::models::errors::WorkflowResult;
use crate::models::route::ApprovalRoute;
use crate::models::step::StepRecord;

use super::core::WorkflowEngine;

impl WorkflowEngine {
    /// Creates one pending tracker row per route of the step being
    /// activated and points the application at it. Fails without side
    /// effects if any route cannot be resolved to an approver.
    pub(crate) fn activate_step(
        &self,
        application: &mut Application,
        step_order: u32,
        routes: &[ApprovalRoute],
    ) -> WorkflowResult<(Vec<StepRecord>, ChangeLog)> {
        let resolver = self.resolver();
        let mut rows = Vec::with_capacity(routes.len());
        for route in routes {
            let approver = resolver.resolve(route)?;
            rows.push(StepRecord::pending(application.id(), route, approver.id));
        }

        let first_approver = rows
            .iter()
            .find(|r| r.blocks_progress())
            .or_else(|| rows.first())
            .map(|r| r.approver_id());
        let change = application.move_to_step(step_order, first_approver);

        debug!(
            application_id = application.id(),
            step_order,
            rows = rows.len(),
            "Approval step activated"
        );
        Ok((rows, change))
    }
}
