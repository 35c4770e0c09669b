use tracing::{info, instrument};

use crate::models::application::{Application, ApplicationStatus};
use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::{ApplicationId, UserId};
use crate::store::WorkflowChange;

use super::core::WorkflowEngine;
use super::notify::withdrawn_message;

impl WorkflowEngine {
    /// Cancels a non-terminal application on behalf of its applicant.
    /// Pending tracker rows are left as they are.
    #[instrument(skip(self))]
    pub fn withdraw(&self, application_id: ApplicationId, requester_id: UserId) -> WorkflowResult<Application> {
        let mut application = self.load(application_id)?;
        if application.applicant_id() != requester_id {
            return Err(WorkflowError::Forbidden(format!(
                "only the applicant can withdraw application {}",
                application_id
            )));
        }
        if !application.status().can_withdraw() {
            return Err(WorkflowError::Conflict(format!(
                "application {} is already {}",
                application_id,
                application.status()
            )));
        }

        let pending_approvers: Vec<UserId> = self
            .applications
            .steps(application_id)?
            .iter()
            .filter(|s| s.is_pending())
            .map(|s| s.approver_id())
            .collect();

        let expected_version = application.version();
        let from = application.status();
        application.transition(
            ApplicationStatus::Cancelled,
            "withdraw",
            Some(requester_id),
            format!("Withdrawn by applicant while {}", from),
            Vec::new(),
        )?;
        let application = self
            .applications
            .commit(WorkflowChange::new(application, expected_version))?;

        info!(from = %from, "Application withdrawn");
        self.notify_users(&pending_approvers, &withdrawn_message(&application), false);
        Ok(application)
    }

    pub fn can_withdraw(&self, application_id: ApplicationId, user_id: UserId) -> WorkflowResult<bool> {
        let application = self.load(application_id)?;
        Ok(application.applicant_id() == user_id && application.status().can_withdraw())
    }
}
