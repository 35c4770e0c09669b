use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::models::application::{Application, NewApplication};
use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::number::ApplicationNumber;

use super::core::WorkflowEngine;

const MAX_TITLE_LENGTH: usize = 200;

impl WorkflowEngine {
    /// Records a new application in DRAFT with a freshly assigned number.
    #[instrument(skip(self, command), fields(
        applicant_id = command.applicant_id,
        application_type_id = command.application_type_id
    ))]
    pub fn create_draft(&self, command: NewApplication) -> WorkflowResult<Application> {
        let applicant = self
            .directory
            .user(command.applicant_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("applicant {}", command.applicant_id)))?;
        if !applicant.active {
            return Err(WorkflowError::Validation(format!("applicant {} is inactive", applicant.id)));
        }

        let application_type = self
            .routes
            .application_type(command.application_type_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("application type {}", command.application_type_id)))?;
        if !application_type.active {
            return Err(WorkflowError::Validation(format!(
                "application type {} is not active",
                application_type.code
            )));
        }

        let title = command.title.trim();
        if title.is_empty() {
            return Err(WorkflowError::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(WorkflowError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        if command.is_urgent && command.content.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "urgent applications must state a reason in their content".to_string(),
            ));
        }

        let prefix = ApplicationNumber::prefix_for(&application_type.code)
            .map_err(|e| WorkflowError::Validation(e.to_string()))?;
        let year = OffsetDateTime::now_utc().year();
        let sequence = self.applications.next_sequence(&prefix, year)?;
        let number = ApplicationNumber::new(&prefix, year, sequence)
            .map_err(|e| WorkflowError::Validation(e.to_string()))?;

        let application = self.applications.insert(Application::draft(command, number))?;
        info!(
            application_id = application.id(),
            application_number = %application.application_number(),
            "Draft application created"
        );
        Ok(application)
    }
}
