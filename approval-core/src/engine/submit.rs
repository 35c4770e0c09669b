use tracing::{info, instrument};

use crate::models::application::{Application, ApplicationStatus};
use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::UserId;
use crate::models::ApplicationId;
use crate::store::WorkflowChange;

use super::core::WorkflowEngine;
use super::logic::{applicable_steps, next_step};
use super::notify::{submitted_message, urgent_message};

impl WorkflowEngine {
    /// DRAFT -> SUBMITTED -> IN_PROGRESS at the first applicable step.
    #[instrument(skip(self))]
    pub fn submit(&self, application_id: ApplicationId, requester_id: UserId) -> WorkflowResult<Application> {
        let mut application = self.load(application_id)?;
        if application.applicant_id() != requester_id {
            return Err(WorkflowError::Forbidden(format!(
                "user {} is not the applicant of application {}",
                requester_id, application_id
            )));
        }
        if application.status() != ApplicationStatus::Draft {
            return Err(WorkflowError::Conflict(format!(
                "application {} is {} and cannot be submitted",
                application_id,
                application.status()
            )));
        }

        let application_type = self.load_type(&application)?;
        if !application_type.active {
            return Err(WorkflowError::Validation(format!(
                "application type {} is not active",
                application_type.code
            )));
        }
        let steps = applicable_steps(
            self.routes.routes_for_type(application_type.id)?,
            application.form_data(),
        );
        let (first_step, routes) = next_step(&steps, None).ok_or_else(|| {
            WorkflowError::Validation(format!(
                "no active approval route is configured for application type {}",
                application_type.code
            ))
        })?;

        let expected_version = application.version();
        application.transition(
            ApplicationStatus::Submitted,
            "submit",
            Some(requester_id),
            "Application submitted".to_string(),
            Vec::new(),
        )?;
        let (rows, step_change) = self.activate_step(&mut application, first_step, routes)?;
        application.transition(
            ApplicationStatus::InProgress,
            "submit",
            Some(requester_id),
            format!("Approval started at step {}", first_step),
            vec![step_change],
        )?;

        let approvers: Vec<UserId> = rows.iter().map(|r| r.approver_id()).collect();
        let mut change = WorkflowChange::new(application, expected_version);
        change.new_steps = rows;
        let application = self.applications.commit(change)?;

        info!(
            application_id,
            current_step = first_step,
            approvers = ?approvers,
            "Application submitted"
        );

        let urgent = application.is_urgent();
        self.notify_users(&approvers, &submitted_message(&application), urgent);
        if urgent {
            if let Some(head) = self.applicant_department_head(&application) {
                self.notify_users(&[head], &urgent_message(&application), true);
            }
        }
        Ok(application)
    }
}
