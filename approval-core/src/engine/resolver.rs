use tracing::debug;

use crate::models::directory::User;
use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::route::{ApprovalRoute, ApproverStrategy};
use crate::models::UserId;
use crate::store::UserDirectory;

/// Maps a route's approver strategy to the user who must act on it.
pub struct ApproverResolver<'a> {
    directory: &'a dyn UserDirectory,
}

impl<'a> ApproverResolver<'a> {
    pub fn new(directory: &'a dyn UserDirectory) -> Self {
        Self { directory }
    }

    pub fn resolve(&self, route: &ApprovalRoute) -> WorkflowResult<User> {
        let unresolvable = |reason: String| WorkflowError::UnresolvableApprover {
            route_id: route.id,
            reason,
        };

        let user = match &route.approver {
            ApproverStrategy::SpecificUser { user_id } => self
                .directory
                .user(*user_id)?
                .filter(|u| u.active)
                .ok_or_else(|| unresolvable(format!("user {} does not exist or is inactive", user_id)))?,
            ApproverStrategy::DepartmentHead { department_id } => {
                let department = self
                    .directory
                    .department(*department_id)?
                    .ok_or_else(|| unresolvable(format!("department {} does not exist", department_id)))?;
                let head_id = department
                    .head_id
                    .ok_or_else(|| unresolvable(format!("department {} has no head", department_id)))?;
                self.directory
                    .user(head_id)?
                    .filter(|u| u.active)
                    .ok_or_else(|| unresolvable(format!("head {} of department {} is not an active user", head_id, department_id)))?
            }
            ApproverStrategy::Role { role, department_id } => self
                .directory
                .users_with_role(role)?
                .into_iter()
                .filter(|u| u.active)
                .find(|u| department_id.is_none() || u.department_id == *department_id)
                .ok_or_else(|| match department_id {
                    Some(dept) => unresolvable(format!("no active user with role {} in department {}", role, dept)),
                    None => unresolvable(format!("no active user with role {}", role)),
                })?,
        };

        debug!(route_id = route.id, approver_id = user.id, "Approver resolved");
        Ok(user)
    }

    /// True when `actor` heads the department of `approver`.
    pub fn is_department_head_of(&self, actor: UserId, approver: UserId) -> WorkflowResult<bool> {
        let department_id = match self.directory.user(approver)?.and_then(|u| u.department_id) {
            Some(id) => id,
            None => return Ok(false),
        };
        Ok(self
            .directory
            .department(department_id)?
            .and_then(|d| d.head_id)
            .map_or(false, |head| head == actor))
    }
}
