use actix_web::{web, HttpResponse};
use approval_core::models::ApplicationId;
use approval_core::{ApplicationView, Decision, WorkflowEngine, WorkflowError, WorkflowResult};
use serde::Deserialize;

use crate::error::ApiError;
use crate::principal::Principal;
use crate::state::AppState;

use super::applications::parse_action;

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub action: String,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn pending(state: web::Data<AppState>, principal: Principal) -> Result<HttpResponse, ApiError> {
    let applications = web::block(move || state.engine.pending_approvals(principal.user_id)).await??;
    Ok(HttpResponse::Ok().json(applications))
}

/// Application view restricted to one application type (`expense`, `travel`).
pub async fn review(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<(String, ApplicationId)>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let view = web::block(move || typed_view(&state.engine, &kind, id)).await??;
    Ok(HttpResponse::Ok().json(view))
}

/// Decides the current step of a typed application.
pub async fn act(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(String, ApplicationId)>,
    query: web::Query<ActionQuery>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let ActionQuery { action, comment } = query.into_inner();
    let action = parse_action(&action)?;

    let application = web::block(move || {
        let view = typed_view(&state.engine, &kind, id)?;
        let step_order = view.application.current_step().ok_or_else(|| {
            WorkflowError::Conflict(format!(
                "application {} is {} and has no active step",
                id,
                view.application.status()
            ))
        })?;
        state.engine.decide(Decision {
            application_id: id,
            step_order,
            actor_id: principal.user_id,
            action,
            comment,
        })
    })
    .await??;
    Ok(HttpResponse::Ok().json(application))
}

fn typed_view(engine: &WorkflowEngine, kind: &str, id: ApplicationId) -> WorkflowResult<ApplicationView> {
    let view = engine.application_view(id)?;
    if !view.application_type.code.eq_ignore_ascii_case(kind) {
        return Err(WorkflowError::NotFound(format!("{} application {}", kind, id)));
    }
    Ok(view)
}
