//! Approval workflow core: the application/route data model, approver
//! resolution, the step-advancing workflow engine and its persistence ports.

pub mod catalog;
pub mod engine;
pub mod models;
pub mod store;

pub use crate::engine::{ApplicationView, Decision, NoopNotifier, NotificationPort, WorkflowEngine};
pub use crate::models::application::{Application, ApplicationStatus, NewApplication, Priority};
pub use crate::models::errors::{WorkflowError, WorkflowResult};
pub use crate::models::step::{ApprovalAction, StepRecord, StepStatus};
