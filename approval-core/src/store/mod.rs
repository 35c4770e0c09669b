//! Persistence ports used by the workflow engine.
//!
//! The engine reads through these traits and writes every mutation of one
//! operation through a single [`ApplicationStore::commit`], which must apply
//! it atomically and reject a stale application version.

mod memory;

pub use self::memory::InMemoryStore;

use thiserror::Error;

use crate::models::application::{Application, ApplicationStatus};
use crate::models::directory::{Department, User};
use crate::models::route::{ApplicationType, ApprovalRoute};
use crate::models::step::StepRecord;
use crate::models::{ApplicationId, ApplicationTypeId, DepartmentId, UserId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("application {application_id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        application_id: ApplicationId,
        expected: u64,
        found: u64,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything one engine operation writes.
#[derive(Debug, Clone)]
pub struct WorkflowChange {
    pub application: Application,
    pub expected_version: u64,
    pub new_steps: Vec<StepRecord>,
    pub updated_steps: Vec<StepRecord>,
}

impl WorkflowChange {
    pub fn new(application: Application, expected_version: u64) -> Self {
        Self {
            application,
            expected_version,
            new_steps: Vec::new(),
            updated_steps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationFilter {
    pub applicant_id: Option<UserId>,
    pub statuses: Vec<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application) -> bool {
        if let Some(applicant) = self.applicant_id {
            if application.applicant_id() != applicant {
                return false;
            }
        }
        self.statuses.is_empty() || self.statuses.contains(&application.status())
    }
}

pub trait ApplicationStore: Send + Sync {
    /// Next free application-number sequence for `(prefix, year)`, starting at 1.
    fn next_sequence(&self, prefix: &str, year: i32) -> StoreResult<u32>;

    /// Persists a new application, assigning its id and version 1.
    fn insert(&self, application: Application) -> StoreResult<Application>;

    fn application(&self, id: ApplicationId) -> StoreResult<Option<Application>>;

    /// Newest first.
    fn find(&self, filter: &ApplicationFilter) -> StoreResult<Vec<Application>>;

    /// Tracker rows of one application ordered by step order, then id.
    fn steps(&self, application_id: ApplicationId) -> StoreResult<Vec<StepRecord>>;

    fn pending_steps_for(&self, approver_id: UserId) -> StoreResult<Vec<StepRecord>>;

    fn commit(&self, change: WorkflowChange) -> StoreResult<Application>;
}

pub trait RouteRepository: Send + Sync {
    fn application_type(&self, id: ApplicationTypeId) -> StoreResult<Option<ApplicationType>>;

    fn application_type_by_code(&self, code: &str) -> StoreResult<Option<ApplicationType>>;

    /// All routes of a type, active or not, ordered by step order then id.
    fn routes_for_type(&self, application_type_id: ApplicationTypeId) -> StoreResult<Vec<ApprovalRoute>>;
}

pub trait UserDirectory: Send + Sync {
    fn user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Users holding `role`, ordered by username.
    fn users_with_role(&self, role: &str) -> StoreResult<Vec<User>>;

    fn department(&self, id: DepartmentId) -> StoreResult<Option<Department>>;
}
