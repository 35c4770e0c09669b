use actix_web::{web, HttpResponse};
use approval_core::models::{ApplicationId, ApplicationTypeId, UserId};
use approval_core::{ApplicationStatus, ApprovalAction, Decision, NewApplication, Priority};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::principal::Principal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub application_type_id: ApplicationTypeId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub form_data: Value,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub applicant: Option<UserId>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub action: String,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn create(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<CreateApplicationRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let command = NewApplication {
        application_type_id: request.application_type_id,
        applicant_id: principal.user_id,
        title: request.title,
        content: request.content,
        priority: request.priority,
        is_urgent: request.is_urgent,
        form_data: request.form_data,
    };
    let application = web::block(move || state.engine.create_draft(command)).await??;
    Ok(HttpResponse::Created().json(application))
}

pub async fn list(
    state: web::Data<AppState>,
    principal: Principal,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let applications = match query.status {
        Some(raw) => {
            let statuses = parse_statuses(&raw)?;
            web::block(move || state.engine.applications_by_statuses(&statuses)).await??
        }
        None => {
            let applicant = query.applicant.unwrap_or(principal.user_id);
            web::block(move || state.engine.applications_by_applicant(applicant)).await??
        }
    };
    Ok(HttpResponse::Ok().json(applications))
}

pub async fn view(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<ApplicationId>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let view = web::block(move || state.engine.application_view(id)).await??;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn submit(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<ApplicationId>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let application = web::block(move || state.engine.submit(id, principal.user_id)).await??;
    Ok(HttpResponse::Ok().json(application))
}

pub async fn withdraw(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<ApplicationId>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let application = web::block(move || state.engine.withdraw(id, principal.user_id)).await??;
    Ok(HttpResponse::Ok().json(application))
}

pub async fn decide(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(ApplicationId, u32)>,
    body: web::Json<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    let (application_id, step_order) = path.into_inner();
    let request = body.into_inner();
    let decision = Decision {
        application_id,
        step_order,
        actor_id: principal.user_id,
        action: parse_action(&request.action)?,
        comment: request.comment,
    };
    let application = web::block(move || state.engine.decide(decision)).await??;
    Ok(HttpResponse::Ok().json(application))
}

pub(crate) fn parse_action(raw: &str) -> Result<ApprovalAction, ApiError> {
    ApprovalAction::parse(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown action '{}', expected approve or reject", raw)))
}

fn parse_statuses(raw: &str) -> Result<Vec<ApplicationStatus>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| ApplicationStatus::parse(s).ok_or_else(|| ApiError::BadRequest(format!("unknown status '{}'", s))))
        .collect()
}
