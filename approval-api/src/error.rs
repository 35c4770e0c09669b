use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use approval_core::WorkflowError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Workflow(e) => e.code(),
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Workflow(WorkflowError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Workflow(WorkflowError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Workflow(WorkflowError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Workflow(WorkflowError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Workflow(WorkflowError::UnresolvableApprover { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Workflow(WorkflowError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_errors_map_to_statuses() {
        let cases = [
            (WorkflowError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (WorkflowError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (WorkflowError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (WorkflowError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                WorkflowError::UnresolvableApprover {
                    route_id: 1,
                    reason: "x".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (WorkflowError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status_code(), status);
        }
        assert_eq!(
            ApiError::Unauthorized("missing".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
