use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::application::{Application, ApplicationStatus};
use crate::models::directory::User;
use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::route::ApplicationType;
use crate::models::step::StepRecord;
use crate::models::{ApplicationId, UserId};
use crate::store::ApplicationFilter;

use super::core::WorkflowEngine;

/// An application with its type and tracker rows, for display.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ApplicationView {
    pub application: Application,
    pub application_type: ApplicationType,
    pub steps: Vec<StepRecord>,
}

impl WorkflowEngine {
    pub fn user(&self, user_id: UserId) -> WorkflowResult<User> {
        self.directory
            .user(user_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("user {}", user_id)))
    }

    pub fn application(&self, application_id: ApplicationId) -> WorkflowResult<Application> {
        self.load(application_id)
    }

    pub fn application_view(&self, application_id: ApplicationId) -> WorkflowResult<ApplicationView> {
        let application = self.load(application_id)?;
        let application_type = self.load_type(&application)?;
        let steps = self.applications.steps(application_id)?;
        Ok(ApplicationView {
            application,
            application_type,
            steps,
        })
    }

    pub fn applications_by_applicant(&self, applicant_id: UserId) -> WorkflowResult<Vec<Application>> {
        Ok(self.applications.find(&ApplicationFilter {
            applicant_id: Some(applicant_id),
            statuses: Vec::new(),
        })?)
    }

    pub fn applications_by_statuses(&self, statuses: &[ApplicationStatus]) -> WorkflowResult<Vec<Application>> {
        Ok(self.applications.find(&ApplicationFilter {
            applicant_id: None,
            statuses: statuses.to_vec(),
        })?)
    }

    /// In-progress applications waiting on `approver_id` at their current step.
    pub fn pending_approvals(&self, approver_id: UserId) -> WorkflowResult<Vec<Application>> {
        let ids: BTreeSet<ApplicationId> = self
            .applications
            .pending_steps_for(approver_id)?
            .into_iter()
            .map(|s| s.application_id())
            .collect();

        let mut waiting = Vec::new();
        for id in ids {
            if let Some(application) = self.applications.application(id)? {
                if application.status() == ApplicationStatus::InProgress {
                    waiting.push(application);
                }
            }
        }
        Ok(waiting)
    }
}
