use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::models::application::{Application, ApplicationStatus};
use crate::models::auditlog::ChangeLog;
use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::step::{ApprovalAction, StepRecord, StepStatus};
use crate::models::{ApplicationId, UserId};
use crate::store::WorkflowChange;

use super::core::WorkflowEngine;
use super::logic::{applicable_steps, next_step};
use super::notify::{approved_message, rejected_message, submitted_message};

/// One approver's verdict on one step of an application.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Decision {
    pub application_id: ApplicationId,
    pub step_order: u32,
    pub actor_id: UserId,
    pub action: ApprovalAction,
    #[serde(default)]
    pub comment: Option<String>,
}

enum Outcome {
    Waiting,
    Advanced(u32, Vec<UserId>),
    Approved,
    Rejected,
}

impl WorkflowEngine {
    #[instrument(skip(self, decision), fields(
        application_id = decision.application_id,
        step_order = decision.step_order,
        actor_id = decision.actor_id,
        action = ?decision.action
    ))]
    pub fn decide(&self, decision: Decision) -> WorkflowResult<Application> {
        let Decision {
            application_id,
            step_order,
            actor_id,
            action,
            comment,
        } = decision;

        let mut application = self.load(application_id)?;
        let steps = self.applications.steps(application_id)?;
        let mut at_step: Vec<StepRecord> = steps.into_iter().filter(|s| s.step_order() == step_order).collect();
        if at_step.is_empty() {
            return Err(WorkflowError::NotFound(format!(
                "approval step {} of application {}",
                step_order, application_id
            )));
        }

        let index = self.select_row(&at_step, actor_id)?.ok_or_else(|| {
            WorkflowError::Forbidden(format!(
                "user {} is not an approver of step {} of application {}",
                actor_id, step_order, application_id
            ))
        })?;

        if application.status() != ApplicationStatus::InProgress {
            return Err(WorkflowError::Conflict(format!(
                "application {} is {}",
                application_id,
                application.status()
            )));
        }
        if !at_step[index].is_pending() {
            return Err(WorkflowError::Conflict(format!(
                "approval step {} of application {} was already {}",
                step_order,
                application_id,
                at_step[index].status()
            )));
        }
        if action == ApprovalAction::Reject && at_step[index].is_confirm_only() {
            return Err(WorkflowError::Validation(format!(
                "step {} only records a confirmation and cannot be rejected",
                step_order
            )));
        }

        let expected_version = application.version();
        at_step[index].decide(actor_id, action, comment.clone());
        let step_change = ChangeLog::new(
            format!("step[{}].status", at_step[index].id()),
            format!("{:?} by user {}", action, actor_id),
            Some(json!("PENDING")),
            Some(json!(at_step[index].status().to_string())),
        );

        let mut new_rows = Vec::new();
        let outcome = match action {
            ApprovalAction::Reject => {
                skip_pending(&mut at_step);
                application.transition(
                    ApplicationStatus::Rejected,
                    "decide",
                    Some(actor_id),
                    format!("Rejected at step {}", step_order),
                    vec![step_change],
                )?;
                Outcome::Rejected
            }
            ApprovalAction::Approve if !step_satisfied(&at_step) => {
                let waiting_on = at_step
                    .iter()
                    .find(|r| r.is_pending() && r.blocks_progress())
                    .map(|r| r.approver_id());
                application.approver_id = waiting_on;
                application.record(
                    "decide",
                    Some(actor_id),
                    format!("Step {} approved by user {}, waiting for parallel approvers", step_order, actor_id),
                    vec![step_change],
                );
                Outcome::Waiting
            }
            ApprovalAction::Approve => {
                skip_pending(&mut at_step);
                let application_type = self.load_type(&application)?;
                let steps = applicable_steps(
                    self.routes.routes_for_type(application_type.id)?,
                    application.form_data(),
                );
                match next_step(&steps, Some(step_order)) {
                    Some((next, routes)) => {
                        let (rows, move_change) = self.activate_step(&mut application, next, routes)?;
                        application.transition(
                            ApplicationStatus::InProgress,
                            "decide",
                            Some(actor_id),
                            format!("Step {} approved, advancing to step {}", step_order, next),
                            vec![step_change, move_change],
                        )?;
                        let approvers = rows.iter().map(|r| r.approver_id()).collect();
                        new_rows = rows;
                        Outcome::Advanced(next, approvers)
                    }
                    None => {
                        application.transition(
                            ApplicationStatus::Approved,
                            "decide",
                            Some(actor_id),
                            format!("Final step {} approved", step_order),
                            vec![step_change],
                        )?;
                        Outcome::Approved
                    }
                }
            }
        };

        let mut change = WorkflowChange::new(application, expected_version);
        change.updated_steps = at_step;
        change.new_steps = new_rows;
        let application = self.applications.commit(change)?;

        match outcome {
            Outcome::Waiting => {
                debug!("Parallel step still has pending approvals");
            }
            Outcome::Advanced(next, approvers) => {
                info!(next_step = next, "Application advanced");
                self.notify_users(&approvers, &submitted_message(&application), application.is_urgent());
            }
            Outcome::Approved => {
                info!("Application approved");
                self.notify_users(&[application.applicant_id()], &approved_message(&application), false);
            }
            Outcome::Rejected => {
                info!("Application rejected");
                self.notify_users(
                    &[application.applicant_id()],
                    &rejected_message(&application, comment.as_deref()),
                    false,
                );
            }
        }
        Ok(application)
    }

    /// Row of the step the actor may decide on: their own row (pending
    /// first), otherwise a row whose approver belongs to a department the
    /// actor heads.
    fn select_row(&self, rows: &[StepRecord], actor_id: UserId) -> WorkflowResult<Option<usize>> {
        let own: Vec<usize> = (0..rows.len()).filter(|i| rows[*i].approver_id() == actor_id).collect();
        if let Some(index) = first_pending(rows, &own) {
            return Ok(Some(index));
        }

        let resolver = self.resolver();
        let mut headed = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if row.approver_id() != actor_id && resolver.is_department_head_of(actor_id, row.approver_id())? {
                headed.push(i);
            }
        }
        if let Some(index) = first_pending(rows, &headed) {
            return Ok(Some(index));
        }
        Ok(own.first().or_else(|| headed.first()).copied())
    }
}

fn first_pending(rows: &[StepRecord], candidates: &[usize]) -> Option<usize> {
    candidates.iter().copied().find(|i| rows[*i].is_pending())
}

/// A step closes once every blocking row is approved.
fn step_satisfied(rows: &[StepRecord]) -> bool {
    rows.iter()
        .filter(|r| r.blocks_progress())
        .all(|r| r.status() == StepStatus::Approved)
}

fn skip_pending(rows: &mut [StepRecord]) {
    for row in rows.iter_mut().filter(|r| r.is_pending()) {
        row.skip();
    }
}
