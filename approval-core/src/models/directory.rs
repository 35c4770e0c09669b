use serde::{Deserialize, Serialize};

use crate::models::{DepartmentId, UserId};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: UserId,

    pub username: String,

    pub name: String,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub department_id: Option<DepartmentId>,

    #[serde(default)]
    pub slack_user_id: Option<String>,

    #[serde(default = "default_true")]
    pub active: bool,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Identity handed to the notification side channel.
    pub fn notification_address(&self) -> String {
        self.slack_user_id
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Department {
    pub id: DepartmentId,

    pub name: String,

    #[serde(default)]
    pub head_id: Option<UserId>,
}

fn default_true() -> bool {
    true
}
