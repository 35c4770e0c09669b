use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use approval_core::catalog::Catalog;
use approval_core::store::InMemoryStore;
use approval_core::{NoopNotifier, WorkflowEngine};
use serde_json::{json, Value};

use crate::principal::USER_HEADER;
use crate::state::AppState;

const ALICE: &str = "1";
const BOB: &str = "2";
const MALLORY: &str = "3";

fn state() -> web::Data<AppState> {
    let store = Arc::new(InMemoryStore::new());
    Catalog::from_json_str(
        &json!({
            "users": [
                {"id": 1, "username": "alice", "name": "Alice"},
                {"id": 2, "username": "bob", "name": "Bob", "roles": ["MANAGER"]},
                {"id": 3, "username": "mallory", "name": "Mallory"}
            ],
            "application_types": [
                {"id": 1, "name": "Expense", "code": "EXPENSE"},
                {"id": 2, "name": "Travel", "code": "TRAVEL"},
                {"id": 3, "name": "Board request", "code": "BOARD"}
            ],
            "approval_routes": [
                {"id": 1, "application_type_id": 1, "step_order": 1, "approver_role": "MANAGER"},
                {"id": 2, "application_type_id": 2, "step_order": 1, "approver_role": "MANAGER"},
                {"id": 3, "application_type_id": 3, "step_order": 1, "approver_role": "CEO"}
            ]
        })
        .to_string(),
    )
    .unwrap()
    .install(&store)
    .unwrap();
    AppState::new(WorkflowEngine::with_store(store, Arc::new(NoopNotifier)))
}

macro_rules! service {
    () => {
        test::init_service(App::new().app_data(state()).configure(super::configure)).await
    };
}

fn post(uri: &str, user: &str) -> test::TestRequest {
    test::TestRequest::post().uri(uri).insert_header((USER_HEADER, user))
}

fn get(uri: &str, user: &str) -> test::TestRequest {
    test::TestRequest::get().uri(uri).insert_header((USER_HEADER, user))
}

fn draft_body(application_type_id: i64) -> Value {
    json!({
        "application_type_id": application_type_id,
        "title": "Team offsite",
        "content": "Venue deposit",
        "form_data": {"amount": 4200}
    })
}

#[actix_web::test]
async fn health_is_public() {
    let app = service!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "UP");
}

#[actix_web::test]
async fn requests_without_known_user_are_unauthorized() {
    let app = service!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/applications").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");

    let resp = test::call_service(&app, get("/applications", "abc").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = test::call_service(&app, get("/applications", "99").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn application_is_approved_through_the_api() {
    let app = service!();

    let resp = test::call_service(&app, post("/applications", ALICE).set_json(draft_body(1)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "DRAFT");
    let id = created["id"].as_i64().unwrap();

    let resp = test::call_service(&app, post(&format!("/applications/{}/submit", id), ALICE).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let submitted: Value = test::read_body_json(resp).await;
    assert_eq!(submitted["status"], "IN_PROGRESS");
    assert_eq!(submitted["current_step"], 1);

    let resp = test::call_service(&app, get("/approvals/pending", BOB).to_request()).await;
    let pending: Value = test::read_body_json(resp).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let resp = test::call_service(
        &app,
        post(&format!("/applications/{}/steps/1/decision", id), MALLORY)
            .set_json(json!({"action": "approve"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "FORBIDDEN");

    let resp = test::call_service(
        &app,
        post(&format!("/applications/{}/steps/1/decision", id), BOB)
            .set_json(json!({"action": "APPROVE", "comment": "fine"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let approved: Value = test::read_body_json(resp).await;
    assert_eq!(approved["status"], "APPROVED");

    let resp = test::call_service(
        &app,
        post(&format!("/applications/{}/steps/1/decision", id), BOB)
            .set_json(json!({"action": "APPROVE"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(&app, get(&format!("/applications/{}", id), ALICE).to_request()).await;
    let view: Value = test::read_body_json(resp).await;
    assert_eq!(view["application_type"]["code"], "EXPENSE");
    assert_eq!(view["steps"][0]["status"], "APPROVED");
}

#[actix_web::test]
async fn typed_routes_check_the_application_type() {
    let app = service!();
    let resp = test::call_service(&app, post("/applications", ALICE).set_json(draft_body(1)).to_request()).await;
    let id = test::read_body_json::<Value, _>(resp).await["id"].as_i64().unwrap();
    test::call_service(&app, post(&format!("/applications/{}/submit", id), ALICE).to_request()).await;

    let resp = test::call_service(&app, get(&format!("/travel/approve/{}", id), BOB).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, get(&format!("/expense/approve/{}", id), BOB).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        post(&format!("/expense/approve/{}/action?action=maybe", id), BOB).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        post(&format!("/expense/approve/{}/action?action=reject&comment=over%20budget", id), BOB).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rejected: Value = test::read_body_json(resp).await;
    assert_eq!(rejected["status"], "REJECTED");

    let resp = test::call_service(
        &app,
        post(&format!("/expense/approve/{}/action?action=approve", id), BOB).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn withdraw_and_listing() {
    let app = service!();
    let resp = test::call_service(&app, post("/applications", ALICE).set_json(draft_body(2)).to_request()).await;
    let id = test::read_body_json::<Value, _>(resp).await["id"].as_i64().unwrap();

    let resp = test::call_service(&app, post(&format!("/applications/{}/withdraw", id), BOB).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, post(&format!("/applications/{}/withdraw", id), ALICE).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let withdrawn: Value = test::read_body_json(resp).await;
    assert_eq!(withdrawn["status"], "CANCELLED");

    let resp = test::call_service(&app, post(&format!("/applications/{}/withdraw", id), ALICE).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(&app, get("/applications?status=cancelled,draft", BOB).to_request()).await;
    let listed: Value = test::read_body_json(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let resp = test::call_service(&app, get("/applications", ALICE).to_request()).await;
    let mine: Value = test::read_body_json(resp).await;
    assert_eq!(mine[0]["id"].as_i64(), Some(id));

    let resp = test::call_service(&app, get("/applications?status=LOST", ALICE).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn submit_errors_map_to_statuses() {
    let app = service!();

    let resp = test::call_service(
        &app,
        post("/applications", ALICE)
            .set_json(json!({"application_type_id": 1, "title": "  "}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let resp = test::call_service(&app, post("/applications", ALICE).set_json(draft_body(3)).to_request()).await;
    let id = test::read_body_json::<Value, _>(resp).await["id"].as_i64().unwrap();
    let resp = test::call_service(&app, post(&format!("/applications/{}/submit", id), ALICE).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNRESOLVABLE_APPROVER");

    let resp = test::call_service(&app, post("/applications/404/submit", ALICE).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
