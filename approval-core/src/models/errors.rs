use thiserror::Error;

use crate::models::application::ApplicationStatus;
use crate::store::StoreError;

/// Errors raised by the workflow engine and the approver resolver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unresolvable approver for route {route_id}: {reason}")]
    UnresolvableApprover { route_id: i64, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "VALIDATION_ERROR",
            WorkflowError::NotFound(_) => "NOT_FOUND",
            WorkflowError::Conflict(_) => "CONFLICT",
            WorkflowError::Forbidden(_) => "FORBIDDEN",
            WorkflowError::UnresolvableApprover { .. } => "UNRESOLVABLE_APPROVER",
            WorkflowError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub(crate) fn illegal_transition(from: ApplicationStatus, to: ApplicationStatus) -> Self {
        WorkflowError::Conflict(format!("application cannot move from {} to {}", from, to))
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { .. } => WorkflowError::Conflict(err.to_string()),
            StoreError::NotFound(what) => WorkflowError::NotFound(what),
            other => WorkflowError::Storage(other.to_string()),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
