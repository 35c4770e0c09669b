mod applications;
mod approvals;

#[cfg(test)]
mod tests;

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::scope("/applications")
                .route("", web::post().to(applications::create))
                .route("", web::get().to(applications::list))
                .route("/{id}", web::get().to(applications::view))
                .route("/{id}/submit", web::post().to(applications::submit))
                .route("/{id}/withdraw", web::post().to(applications::withdraw))
                .route("/{id}/steps/{step}/decision", web::post().to(applications::decide)),
        )
        .route("/approvals/pending", web::get().to(approvals::pending))
        .route("/{kind:expense|travel}/approve/{id}", web::get().to(approvals::review))
        .route("/{kind:expense|travel}/approve/{id}/action", web::post().to(approvals::act));
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "UP" }))
}
