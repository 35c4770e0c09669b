use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::UserId;

/// One entry of an application's audit trail, appended per status transition
/// or recorded change. `submit` appends two (SUBMITTED, then IN_PROGRESS).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuditLog {
    id: Uuid,

    #[serde(with = "time::serde::iso8601")]
    pub start_time: OffsetDateTime,

    #[serde(with = "time::serde::iso8601")]
    pub finish_time: OffsetDateTime,

    operation: Box<str>,

    actor: Option<UserId>,

    step_order: Option<u32>,

    description: Box<str>,

    changes: Box<[ChangeLog]>,
}

impl AuditLog {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn actor(&self) -> Option<UserId> {
        self.actor
    }

    pub fn step_order(&self) -> Option<u32> {
        self.step_order
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn changes(&self) -> &[ChangeLog] {
        &self.changes
    }

    pub fn start_time(&self) -> &OffsetDateTime {
        &self.start_time
    }

    pub fn finish_time(&self) -> &OffsetDateTime {
        &self.finish_time
    }

    pub fn new(
        operation: String,
        actor: Option<UserId>,
        step_order: Option<u32>,
        start_time: OffsetDateTime,
        description: String,
        changes: Vec<ChangeLog>,
    ) -> Self {
        AuditLog {
            id: Uuid::new_v4(),
            start_time,
            finish_time: OffsetDateTime::now_utc(),
            operation: operation.into_boxed_str(),
            actor,
            step_order,
            description: description.into_boxed_str(),
            changes: changes.into_boxed_slice(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChangeLog {
    field: Box<str>,

    old_value: Option<serde_json::Value>,

    new_value: Option<serde_json::Value>,

    reason: Box<str>,
}

impl ChangeLog {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn old_value(&self) -> Option<&serde_json::Value> {
        self.old_value.as_ref()
    }

    pub fn new_value(&self) -> Option<&serde_json::Value> {
        self.new_value.as_ref()
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn new(field: String, reason: String, old_value: Option<serde_json::Value>, new_value: Option<serde_json::Value>) -> Self {
        ChangeLog {
            field: field.into_boxed_str(),
            old_value,
            new_value,
            reason: reason.into_boxed_str(),
        }
    }
}
