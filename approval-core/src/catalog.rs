//! Seed catalog: departments, users, application types and approval routes
//! loaded from a JSON document into the in-memory store.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::models::directory::{Department, User};
use crate::models::route::{ApplicationType, ApprovalRoute, ApproverStrategy};
use crate::models::{ApplicationTypeId, DepartmentId, RouteId, UserId};
use crate::store::{InMemoryStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid approval route: {0}")]
    InvalidRoute(String),

    #[error("catalog store error: {0}")]
    Store(#[from] StoreError),
}

/// A route as written in the catalog: either a tagged `approver` object or
/// the flat column layout.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RouteSeed {
    pub id: RouteId,

    pub application_type_id: ApplicationTypeId,

    pub step_order: u32,

    #[serde(default)]
    pub approver: Option<ApproverStrategy>,

    #[serde(default)]
    pub specific_approver_id: Option<UserId>,

    #[serde(default)]
    pub department_head: bool,

    #[serde(default)]
    pub approver_department_id: Option<DepartmentId>,

    #[serde(default)]
    pub approver_role: Option<String>,

    #[serde(default)]
    pub confirm_only: bool,

    #[serde(default = "default_true")]
    pub required: bool,

    #[serde(default)]
    pub parallel: bool,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub condition: Value,
}

impl RouteSeed {
    pub fn into_route(self) -> Result<ApprovalRoute, CatalogError> {
        let approver = match self.approver {
            Some(strategy) => strategy,
            None => ApproverStrategy::from_columns(
                self.specific_approver_id,
                self.department_head,
                self.approver_department_id,
                self.approver_role,
            )
            .ok_or_else(|| CatalogError::InvalidRoute(format!("route {} names no approver", self.id)))?,
        };
        Ok(ApprovalRoute {
            id: self.id,
            application_type_id: self.application_type_id,
            step_order: self.step_order,
            approver,
            confirm_only: self.confirm_only,
            required: self.required,
            parallel: self.parallel,
            active: self.active,
            condition: self.condition,
        })
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Catalog {
    #[serde(default)]
    pub departments: Vec<Department>,

    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub application_types: Vec<ApplicationType>,

    #[serde(default)]
    pub approval_routes: Vec<RouteSeed>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(deserializer).map_err(|e| CatalogError::Parse {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Writes the catalog into `store`. Route sets are validated per type.
    pub fn install(self, store: &InMemoryStore) -> Result<(), CatalogError> {
        let department_count = self.departments.len();
        let user_count = self.users.len();
        let type_count = self.application_types.len();

        for department in self.departments {
            store.add_department(department)?;
        }
        for user in self.users {
            store.add_user(user)?;
        }
        for application_type in self.application_types {
            store.add_application_type(application_type)?;
        }

        let mut by_type: BTreeMap<ApplicationTypeId, Vec<ApprovalRoute>> = BTreeMap::new();
        for seed in self.approval_routes {
            let route = seed.into_route()?;
            by_type.entry(route.application_type_id).or_default().push(route);
        }
        let route_count: usize = by_type.values().map(Vec::len).sum();
        for (type_id, routes) in by_type {
            store
                .set_routes(type_id, routes)
                .map_err(|e| CatalogError::InvalidRoute(format!("application type {}: {}", type_id, e)))?;
        }

        info!(
            departments = department_count,
            users = user_count,
            application_types = type_count,
            routes = route_count,
            "Catalog installed"
        );
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
