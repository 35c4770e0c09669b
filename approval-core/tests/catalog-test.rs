use approval_core::catalog::{Catalog, CatalogError};
use approval_core::models::route::ApproverStrategy;
use approval_core::store::{InMemoryStore, RouteRepository, UserDirectory};

#[test]
fn legacy_route_columns_are_mapped_to_strategies() {
    let catalog = Catalog::from_json_str(
        r#"{
            "departments": [{"id": 1, "name": "Academics", "head_id": 2}],
            "users": [
                {"id": 1, "username": "sam", "name": "Sam", "roles": ["REGISTRAR"], "department_id": 1},
                {"id": 2, "username": "hana", "name": "Hana", "department_id": 1}
            ],
            "application_types": [{"id": 5, "name": "Leave", "code": "LEAVE"}],
            "approval_routes": [
                {"id": 1, "application_type_id": 5, "step_order": 2, "approver_role": "REGISTRAR", "approver_department_id": 1},
                {"id": 2, "application_type_id": 5, "step_order": 1, "department_head": true, "approver_department_id": 1},
                {"id": 3, "application_type_id": 5, "step_order": 3, "specific_approver_id": 1, "approver_role": "REGISTRAR"}
            ]
        }"#,
    )
    .unwrap();

    let store = InMemoryStore::new();
    catalog.install(&store).unwrap();

    let routes = store.routes_for_type(5).unwrap();
    let strategies: Vec<(u32, ApproverStrategy)> = routes.iter().map(|r| (r.step_order, r.approver.clone())).collect();
    assert_eq!(
        strategies,
        vec![
            (1, ApproverStrategy::DepartmentHead { department_id: 1 }),
            (
                2,
                ApproverStrategy::Role {
                    role: "REGISTRAR".to_string(),
                    department_id: Some(1)
                }
            ),
            (3, ApproverStrategy::SpecificUser { user_id: 1 }),
        ]
    );
    assert!(routes.iter().all(|r| r.required && r.active && !r.parallel));

    assert_eq!(store.application_type_by_code("LEAVE").unwrap().map(|t| t.id), Some(5));
    assert_eq!(store.users_with_role("registrar").unwrap().len(), 1);
    assert_eq!(store.department(1).unwrap().and_then(|d| d.head_id), Some(2));
}

#[test]
fn parse_errors_name_the_offending_path() {
    let error = Catalog::from_json_str(r#"{"users": [{"id": 1, "username": "sam", "name": 7}]}"#).unwrap_err();
    match error {
        CatalogError::Parse { path, .. } => assert_eq!(path, "users[0].name"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn route_without_approver_is_rejected() {
    let catalog = Catalog::from_json_str(
        r#"{
            "application_types": [{"id": 1, "name": "Leave", "code": "LEAVE"}],
            "approval_routes": [{"id": 1, "application_type_id": 1, "step_order": 1}]
        }"#,
    )
    .unwrap();
    let result = catalog.install(&InMemoryStore::new());
    assert!(matches!(result, Err(CatalogError::InvalidRoute(_))));
}

#[test]
fn shared_step_must_be_parallel() {
    let catalog = Catalog::from_json_str(
        r#"{
            "application_types": [{"id": 1, "name": "Leave", "code": "LEAVE"}],
            "approval_routes": [
                {"id": 1, "application_type_id": 1, "step_order": 1, "approver_role": "A", "parallel": true},
                {"id": 2, "application_type_id": 1, "step_order": 1, "approver_role": "B"}
            ]
        }"#,
    )
    .unwrap();
    let store = InMemoryStore::new();
    assert!(matches!(catalog.install(&store), Err(CatalogError::InvalidRoute(_))));
    assert!(store.routes_for_type(1).unwrap().is_empty());
}

#[test]
fn duplicate_type_code_is_refused() {
    let catalog = Catalog::from_json_str(
        r#"{
            "application_types": [
                {"id": 1, "name": "Leave", "code": "LEAVE"},
                {"id": 2, "name": "Leave again", "code": "LEAVE"}
            ]
        }"#,
    )
    .unwrap();
    assert!(matches!(
        catalog.install(&InMemoryStore::new()),
        Err(CatalogError::Store(_))
    ));
}
