use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use time::OffsetDateTime;

use crate::models::auditlog::{AuditLog, ChangeLog};
use crate::models::errors::{WorkflowError, WorkflowResult};
use crate::models::number::ApplicationNumber;
use crate::models::{ApplicationId, ApplicationTypeId, UserId};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    InProgress,
    Approved,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::InProgress,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "DRAFT",
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::InProgress => "IN_PROGRESS",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected | ApplicationStatus::Cancelled
        )
    }

    pub fn can_withdraw(&self) -> bool {
        !self.is_terminal()
    }

    /// Edges of the application state machine. `InProgress -> InProgress`
    /// is the step advance.
    pub fn can_transition_to(&self, target: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, target) {
            (Draft, Submitted) => true,
            (Submitted, InProgress) => true,
            (InProgress, InProgress) => true,
            (InProgress, Approved) | (InProgress, Rejected) => true,
            (Draft, Cancelled) | (Submitted, Cancelled) | (InProgress, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn level(&self) -> u8 {
        match self {
            Priority::VeryLow => 1,
            Priority::Low => 2,
            Priority::Medium => 3,
            Priority::High => 4,
            Priority::Urgent => 5,
        }
    }
}

/// Command accepted by `WorkflowEngine::create_draft`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewApplication {
    pub application_type_id: ApplicationTypeId,

    pub applicant_id: UserId,

    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub is_urgent: bool,

    #[serde(default)]
    pub form_data: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Application {
    pub(crate) id: ApplicationId,

    pub(crate) application_type_id: ApplicationTypeId,

    pub(crate) applicant_id: UserId,

    pub(crate) application_number: ApplicationNumber,

    pub(crate) title: String,

    pub(crate) content: String,

    pub(crate) priority: Priority,

    pub(crate) is_urgent: bool,

    pub(crate) status: ApplicationStatus,

    pub(crate) current_step: Option<u32>,

    pub(crate) form_data: Value,

    pub(crate) approver_id: Option<UserId>,

    #[serde(with = "time::serde::iso8601")]
    pub(crate) created_at: OffsetDateTime,

    #[serde(with = "time::serde::iso8601::option")]
    pub(crate) application_date: Option<OffsetDateTime>,

    #[serde(with = "time::serde::iso8601::option")]
    pub(crate) approved_at: Option<OffsetDateTime>,

    #[serde(with = "time::serde::iso8601::option")]
    pub(crate) rejected_at: Option<OffsetDateTime>,

    #[serde(with = "time::serde::iso8601::option")]
    pub(crate) cancelled_at: Option<OffsetDateTime>,

    pub(crate) version: u64,

    pub(crate) audit: Vec<AuditLog>,
}

impl Application {
    pub fn id(&self) -> ApplicationId {
        self.id
    }

    pub fn application_type_id(&self) -> ApplicationTypeId {
        self.application_type_id
    }

    pub fn applicant_id(&self) -> UserId {
        self.applicant_id
    }

    pub fn application_number(&self) -> &ApplicationNumber {
        &self.application_number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn current_step(&self) -> Option<u32> {
        self.current_step
    }

    pub fn form_data(&self) -> &Value {
        &self.form_data
    }

    pub fn approver_id(&self) -> Option<UserId> {
        self.approver_id
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn application_date(&self) -> Option<OffsetDateTime> {
        self.application_date
    }

    pub fn approved_at(&self) -> Option<OffsetDateTime> {
        self.approved_at
    }

    pub fn rejected_at(&self) -> Option<OffsetDateTime> {
        self.rejected_at
    }

    pub fn cancelled_at(&self) -> Option<OffsetDateTime> {
        self.cancelled_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn audit(&self) -> &Vec<AuditLog> {
        &self.audit
    }

    /// Urgent flag or URGENT priority.
    pub fn is_urgent(&self) -> bool {
        self.is_urgent || self.priority == Priority::Urgent
    }

    /// Statuses in the order they were entered, reconstructed from the audit trail.
    pub fn status_history(&self) -> Vec<ApplicationStatus> {
        let mut history = Vec::new();
        for entry in &self.audit {
            for change in entry.changes() {
                if change.field() != "status" {
                    continue;
                }
                if let Some(status) = change
                    .new_value()
                    .and_then(|v| v.as_str())
                    .and_then(ApplicationStatus::parse)
                {
                    if history.last() != Some(&status) {
                        history.push(status);
                    }
                }
            }
        }
        history
    }

    pub(crate) fn draft(command: NewApplication, application_number: ApplicationNumber) -> Self {
        let now = OffsetDateTime::now_utc();
        let description = format!("Application {} created", application_number);
        let audit = AuditLog::new(
            "create".to_string(),
            Some(command.applicant_id),
            None,
            now,
            description,
            vec![ChangeLog::new(
                "status".to_string(),
                "Initial draft".to_string(),
                None,
                Some(json!(ApplicationStatus::Draft.as_str())),
            )],
        );

        Self {
            id: 0,
            application_type_id: command.application_type_id,
            applicant_id: command.applicant_id,
            application_number,
            title: command.title.trim().to_string(),
            content: command.content,
            priority: command.priority,
            is_urgent: command.is_urgent,
            status: ApplicationStatus::Draft,
            current_step: None,
            form_data: command.form_data,
            approver_id: None,
            created_at: now,
            application_date: None,
            approved_at: None,
            rejected_at: None,
            cancelled_at: None,
            version: 0,
            audit: vec![audit],
        }
    }

    /// Moves the application along one state-machine edge and records the
    /// change. Terminal states always refuse.
    pub(crate) fn transition(
        &mut self,
        to: ApplicationStatus,
        operation: &str,
        actor: Option<UserId>,
        reason: String,
        extra_changes: Vec<ChangeLog>,
    ) -> WorkflowResult<()> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err(WorkflowError::illegal_transition(from, to));
        }
        let now = OffsetDateTime::now_utc();

        match to {
            ApplicationStatus::Submitted => self.application_date = Some(now),
            ApplicationStatus::Approved => self.approved_at = Some(now),
            ApplicationStatus::Rejected => self.rejected_at = Some(now),
            ApplicationStatus::Cancelled => self.cancelled_at = Some(now),
            ApplicationStatus::Draft | ApplicationStatus::InProgress => {}
        }
        if to.is_terminal() {
            self.current_step = None;
            self.approver_id = None;
        }
        self.status = to;

        let mut changes = Vec::new();
        if from != to {
            changes.push(ChangeLog::new(
                "status".to_string(),
                reason.clone(),
                Some(json!(from.as_str())),
                Some(json!(to.as_str())),
            ));
        }
        changes.extend(extra_changes);
        self.audit.push(AuditLog::new(
            operation.to_string(),
            actor,
            self.current_step,
            now,
            reason,
            changes,
        ));
        Ok(())
    }

    /// Points the application at a newly activated step.
    pub(crate) fn move_to_step(&mut self, step_order: u32, approver_id: Option<UserId>) -> ChangeLog {
        let old = self.current_step;
        self.current_step = Some(step_order);
        self.approver_id = approver_id;
        ChangeLog::new(
            "current_step".to_string(),
            format!("Step {} activated", step_order),
            old.map(|s| json!(s)),
            Some(json!(step_order)),
        )
    }

    pub(crate) fn record(&mut self, operation: &str, actor: Option<UserId>, description: String, changes: Vec<ChangeLog>) {
        let start_time = OffsetDateTime::now_utc();
        self.audit.push(AuditLog::new(
            operation.to_string(),
            actor,
            self.current_step,
            start_time,
            description,
            changes,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in [ApplicationStatus::Approved, ApplicationStatus::Rejected, ApplicationStatus::Cancelled] {
            for to in ApplicationStatus::ALL {
                assert!(!from.can_transition_to(to), "{} -> {} must be refused", from, to);
            }
        }
    }

    #[test]
    fn draft_can_only_submit_or_cancel() {
        let allowed: Vec<_> = ApplicationStatus::ALL
            .into_iter()
            .filter(|to| ApplicationStatus::Draft.can_transition_to(*to))
            .collect();
        assert_eq!(allowed, vec![ApplicationStatus::Submitted, ApplicationStatus::Cancelled]);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(ApplicationStatus::parse("in_progress"), Some(ApplicationStatus::InProgress));
        assert_eq!(ApplicationStatus::parse(" APPROVED "), Some(ApplicationStatus::Approved));
        assert_eq!(ApplicationStatus::parse("WITHDRAWN"), None);
    }

    #[test]
    fn priority_levels_follow_ordering() {
        let all = [Priority::VeryLow, Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];
        assert_eq!(all.map(|p| p.level()), [1, 2, 3, 4, 5]);
        assert!(all.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
