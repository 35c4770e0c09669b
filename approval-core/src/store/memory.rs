use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use tracing::debug;

use super::{ApplicationFilter, ApplicationStore, RouteRepository, StoreError, StoreResult, UserDirectory, WorkflowChange};
use crate::models::application::Application;
use crate::models::directory::{Department, User};
use crate::models::errors::WorkflowResult;
use crate::models::route::{ApplicationType, ApprovalRoute};
use crate::models::step::StepRecord;
use crate::models::{ApplicationId, ApplicationTypeId, DepartmentId, StepRecordId, UserId};

#[derive(Default)]
struct Tables {
    applications: BTreeMap<ApplicationId, Application>,
    steps: BTreeMap<StepRecordId, StepRecord>,
    sequences: HashMap<(String, i32), u32>,
    next_application_id: ApplicationId,
    next_step_id: StepRecordId,
}

#[derive(Default)]
struct Catalog {
    application_types: BTreeMap<ApplicationTypeId, ApplicationType>,
    routes: BTreeMap<ApplicationTypeId, Vec<ApprovalRoute>>,
    users: BTreeMap<UserId, User>,
    departments: BTreeMap<DepartmentId, Department>,
}

/// Process-local store implementing every persistence port. Writes take one
/// lock for the whole commit, so a commit is atomic with respect to readers.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    catalog: RwLock<Catalog>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_department(&self, department: Department) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        if catalog.departments.contains_key(&department.id) {
            return Err(StoreError::Duplicate(format!("department {}", department.id)));
        }
        catalog.departments.insert(department.id, department);
        Ok(())
    }

    pub fn add_user(&self, user: User) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        if catalog.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate(format!("user {}", user.id)));
        }
        catalog.users.insert(user.id, user);
        Ok(())
    }

    pub fn add_application_type(&self, application_type: ApplicationType) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        if catalog.application_types.contains_key(&application_type.id) {
            return Err(StoreError::Duplicate(format!("application type {}", application_type.id)));
        }
        if catalog
            .application_types
            .values()
            .any(|t| t.code.eq_ignore_ascii_case(&application_type.code))
        {
            return Err(StoreError::Duplicate(format!("application type code {}", application_type.code)));
        }
        catalog.application_types.insert(application_type.id, application_type);
        Ok(())
    }

    /// Replaces the route set of one application type after validating it.
    pub fn set_routes(&self, application_type_id: ApplicationTypeId, mut routes: Vec<ApprovalRoute>) -> WorkflowResult<()> {
        ApprovalRoute::validate_set(&routes)?;
        let mut catalog = self.catalog.write();
        if !catalog.application_types.contains_key(&application_type_id) {
            return Err(StoreError::NotFound(format!("application type {}", application_type_id)).into());
        }
        for route in routes.iter_mut() {
            route.application_type_id = application_type_id;
        }
        routes.sort_by_key(|r| (r.step_order, r.id));
        debug!(application_type_id, route_count = routes.len(), "Approval routes registered");
        catalog.routes.insert(application_type_id, routes);
        Ok(())
    }
}

impl ApplicationStore for InMemoryStore {
    fn next_sequence(&self, prefix: &str, year: i32) -> StoreResult<u32> {
        let mut tables = self.tables.write();
        let counter = tables.sequences.entry((prefix.to_string(), year)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn insert(&self, mut application: Application) -> StoreResult<Application> {
        let mut tables = self.tables.write();
        if tables
            .applications
            .values()
            .any(|a| a.application_number == application.application_number)
        {
            return Err(StoreError::Duplicate(format!(
                "application number {}",
                application.application_number
            )));
        }
        tables.next_application_id += 1;
        application.id = tables.next_application_id;
        application.version = 1;
        tables.applications.insert(application.id, application.clone());
        Ok(application)
    }

    fn application(&self, id: ApplicationId) -> StoreResult<Option<Application>> {
        Ok(self.tables.read().applications.get(&id).cloned())
    }

    fn find(&self, filter: &ApplicationFilter) -> StoreResult<Vec<Application>> {
        let tables = self.tables.read();
        let mut found: Vec<Application> = tables
            .applications
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    fn steps(&self, application_id: ApplicationId) -> StoreResult<Vec<StepRecord>> {
        let tables = self.tables.read();
        let mut steps: Vec<StepRecord> = tables
            .steps
            .values()
            .filter(|s| s.application_id == application_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| (s.step_order, s.id));
        Ok(steps)
    }

    fn pending_steps_for(&self, approver_id: UserId) -> StoreResult<Vec<StepRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .steps
            .values()
            .filter(|s| s.approver_id == approver_id && s.is_pending())
            .cloned()
            .collect())
    }

    fn commit(&self, change: WorkflowChange) -> StoreResult<Application> {
        let mut tables = self.tables.write();
        let WorkflowChange {
            mut application,
            expected_version,
            new_steps,
            updated_steps,
        } = change;

        let stored = tables
            .applications
            .get(&application.id)
            .ok_or_else(|| StoreError::NotFound(format!("application {}", application.id)))?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                application_id: application.id,
                expected: expected_version,
                found: stored.version,
            });
        }
        for step in &updated_steps {
            match tables.steps.get(&step.id) {
                Some(existing) if existing.application_id == application.id => {}
                _ => return Err(StoreError::NotFound(format!("approval step {}", step.id))),
            }
        }

        for step in updated_steps {
            tables.steps.insert(step.id, step);
        }
        for mut step in new_steps {
            tables.next_step_id += 1;
            step.id = tables.next_step_id;
            step.application_id = application.id;
            tables.steps.insert(step.id, step);
        }
        application.version = expected_version + 1;
        tables.applications.insert(application.id, application.clone());
        Ok(application)
    }
}

impl RouteRepository for InMemoryStore {
    fn application_type(&self, id: ApplicationTypeId) -> StoreResult<Option<ApplicationType>> {
        Ok(self.catalog.read().application_types.get(&id).cloned())
    }

    fn application_type_by_code(&self, code: &str) -> StoreResult<Option<ApplicationType>> {
        Ok(self
            .catalog
            .read()
            .application_types
            .values()
            .find(|t| t.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    fn routes_for_type(&self, application_type_id: ApplicationTypeId) -> StoreResult<Vec<ApprovalRoute>> {
        Ok(self
            .catalog
            .read()
            .routes
            .get(&application_type_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl UserDirectory for InMemoryStore {
    fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.catalog.read().users.get(&id).cloned())
    }

    fn users_with_role(&self, role: &str) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self
            .catalog
            .read()
            .users
            .values()
            .filter(|u| u.has_role(role))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    fn department(&self, id: DepartmentId) -> StoreResult<Option<Department>> {
        Ok(self.catalog.read().departments.get(&id).cloned())
    }
}
