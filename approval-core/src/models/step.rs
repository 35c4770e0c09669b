use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::route::ApprovalRoute;
use crate::models::{ApplicationId, RouteId, StepRecordId, UserId};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Approved,
    Rejected,
    /// Closed without a decision because its step no longer needed it.
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "PENDING",
            StepStatus::Approved => "APPROVED",
            StepStatus::Rejected => "REJECTED",
            StepStatus::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

impl ApprovalAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(ApprovalAction::Approve),
            "reject" => Some(ApprovalAction::Reject),
            _ => None,
        }
    }
}

/// Per-application realization of one approval route
/// (one row per route exercised by the application).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StepRecord {
    pub(crate) id: StepRecordId,

    pub(crate) application_id: ApplicationId,

    pub(crate) route_id: RouteId,

    pub(crate) step_order: u32,

    pub(crate) approver_id: UserId,

    pub(crate) required: bool,

    pub(crate) confirm_only: bool,

    pub(crate) status: StepStatus,

    pub(crate) action: Option<ApprovalAction>,

    pub(crate) acted_by: Option<UserId>,

    pub(crate) comment: Option<String>,

    #[serde(with = "time::serde::iso8601")]
    pub(crate) created_at: OffsetDateTime,

    #[serde(with = "time::serde::iso8601::option")]
    pub(crate) processed_at: Option<OffsetDateTime>,
}

impl StepRecord {
    pub(crate) fn pending(application_id: ApplicationId, route: &ApprovalRoute, approver_id: UserId) -> Self {
        Self {
            id: 0,
            application_id,
            route_id: route.id,
            step_order: route.step_order,
            approver_id,
            required: route.required,
            confirm_only: route.confirm_only,
            status: StepStatus::Pending,
            action: None,
            acted_by: None,
            comment: None,
            created_at: OffsetDateTime::now_utc(),
            processed_at: None,
        }
    }

    pub fn id(&self) -> StepRecordId {
        self.id
    }

    pub fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    pub fn route_id(&self) -> RouteId {
        self.route_id
    }

    pub fn step_order(&self) -> u32 {
        self.step_order
    }

    pub fn approver_id(&self) -> UserId {
        self.approver_id
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn action(&self) -> Option<ApprovalAction> {
        self.action
    }

    pub fn acted_by(&self) -> Option<UserId> {
        self.acted_by
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn processed_at(&self) -> Option<OffsetDateTime> {
        self.processed_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == StepStatus::Pending
    }

    pub fn is_confirm_only(&self) -> bool {
        self.confirm_only
    }

    pub fn blocks_progress(&self) -> bool {
        self.required && !self.confirm_only
    }

    pub(crate) fn decide(&mut self, actor: UserId, action: ApprovalAction, comment: Option<String>) {
        self.status = match action {
            ApprovalAction::Approve => StepStatus::Approved,
            ApprovalAction::Reject => StepStatus::Rejected,
        };
        self.action = Some(action);
        self.acted_by = Some(actor);
        self.comment = comment;
        self.processed_at = Some(OffsetDateTime::now_utc());
    }

    pub(crate) fn skip(&mut self) {
        self.status = StepStatus::Skipped;
        self.processed_at = Some(OffsetDateTime::now_utc());
    }
}
