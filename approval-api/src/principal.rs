use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use approval_core::models::UserId;
use approval_core::WorkflowError;
use futures::future::{ready, Ready};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

pub const USER_HEADER: &str = "X-User-Id";

/// The user a request acts for, taken from the `X-User-Id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
}

impl FromRequest for Principal {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Principal, ApiError> {
    let header = req
        .headers()
        .get(USER_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_HEADER)))?;
    let user_id: UserId = header
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("{} must be a numeric user id", USER_HEADER)))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state is not configured".to_string()))?;
    match state.engine.user(user_id) {
        Ok(_) => {
            debug!(user_id, "Request authenticated");
            Ok(Principal { user_id })
        }
        Err(WorkflowError::NotFound(_)) => Err(ApiError::Unauthorized(format!("unknown user {}", user_id))),
        Err(e) => Err(e.into()),
    }
}
