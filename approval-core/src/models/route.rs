use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::{ApplicationTypeId, DepartmentId, RouteId, UserId};

const MAX_ROLE_LENGTH: usize = 20;

/// Category of request (expense, travel, ...) that selects its approval routes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApplicationType {
    pub id: ApplicationTypeId,

    pub name: String,

    pub code: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Form schema owned by the UI layer.
    #[serde(default)]
    pub form_config: Value,

    #[serde(default = "default_true")]
    pub active: bool,
}

/// How a route step maps to a concrete approver.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApproverStrategy {
    SpecificUser {
        user_id: UserId,
    },
    DepartmentHead {
        department_id: DepartmentId,
    },
    Role {
        role: String,
        #[serde(default)]
        department_id: Option<DepartmentId>,
    },
}

impl ApproverStrategy {
    /// Builds a strategy from the flat column layout, first match wins:
    /// specific user, then department head, then role.
    pub fn from_columns(
        specific_approver_id: Option<UserId>,
        department_head: bool,
        approver_department_id: Option<DepartmentId>,
        approver_role: Option<String>,
    ) -> Option<Self> {
        if let Some(user_id) = specific_approver_id {
            return Some(ApproverStrategy::SpecificUser { user_id });
        }
        if department_head {
            if let Some(department_id) = approver_department_id {
                return Some(ApproverStrategy::DepartmentHead { department_id });
            }
        }
        approver_role
            .filter(|role| !role.trim().is_empty())
            .map(|role| ApproverStrategy::Role {
                role,
                department_id: approver_department_id,
            })
    }
}

/// Static step template of an application type. Never mutated by the engine.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApprovalRoute {
    pub id: RouteId,

    pub application_type_id: ApplicationTypeId,

    pub step_order: u32,

    pub approver: ApproverStrategy,

    #[serde(default)]
    pub confirm_only: bool,

    #[serde(default = "default_true")]
    pub required: bool,

    #[serde(default)]
    pub parallel: bool,

    #[serde(default = "default_true")]
    pub active: bool,

    /// JSON-Logic rule over the application's form data; null always applies.
    #[serde(default)]
    pub condition: Value,
}

impl ApprovalRoute {
    /// Whether an approval of this route is needed before its step can close.
    pub fn blocks_progress(&self) -> bool {
        self.required && !self.confirm_only
    }

    /// Checks one application type's route set.
    pub fn validate_set(routes: &[ApprovalRoute]) -> WorkflowResult<()> {
        let mut ids = HashSet::new();
        let mut by_step: BTreeMap<u32, Vec<&ApprovalRoute>> = BTreeMap::new();

        for route in routes {
            if !ids.insert(route.id) {
                return Err(WorkflowError::Validation(format!("duplicate route id {}", route.id)));
            }
            if route.step_order == 0 {
                return Err(WorkflowError::Validation(format!(
                    "route {} has step order 0, steps start at 1",
                    route.id
                )));
            }
            if let ApproverStrategy::Role { role, .. } = &route.approver {
                if role.trim().is_empty() || role.len() > MAX_ROLE_LENGTH {
                    return Err(WorkflowError::Validation(format!(
                        "route {} role must be 1..={} characters",
                        route.id, MAX_ROLE_LENGTH
                    )));
                }
            }
            by_step.entry(route.step_order).or_default().push(route);
        }

        for (step, siblings) in by_step {
            if siblings.len() > 1 && siblings.iter().any(|r| !r.parallel) {
                return Err(WorkflowError::Validation(format!(
                    "step {} has {} routes but not all are marked parallel",
                    step,
                    siblings.len()
                )));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
