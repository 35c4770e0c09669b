use tracing::{debug, warn};

use crate::models::application::Application;
use crate::models::UserId;

use super::core::WorkflowEngine;

/// Best-effort outbound notifications. Implementations must not block;
/// `false` means the message was not accepted and is only logged.
pub trait NotificationPort: Send + Sync {
    fn send_notification(&self, recipient: &str, message: &str, is_urgent: bool) -> bool;
}

/// Port that accepts and drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationPort for NoopNotifier {
    fn send_notification(&self, _recipient: &str, _message: &str, _is_urgent: bool) -> bool {
        true
    }
}

impl WorkflowEngine {
    pub(crate) fn notify_users(&self, users: &[UserId], message: &str, is_urgent: bool) {
        for user_id in users {
            let recipient = match self.directory.user(*user_id) {
                Ok(Some(user)) => user.notification_address(),
                Ok(None) => {
                    warn!(user_id, "Notification recipient not found");
                    continue;
                }
                Err(e) => {
                    warn!(user_id, error = %e, "Notification recipient lookup failed");
                    continue;
                }
            };
            if self.notifier.send_notification(&recipient, message, is_urgent) {
                debug!(user_id, "Notification queued");
            } else {
                warn!(user_id, "Notification was not accepted");
            }
        }
    }

    /// Head of the applicant's department, if any.
    pub(crate) fn applicant_department_head(&self, application: &Application) -> Option<UserId> {
        let applicant = self.directory.user(application.applicant_id()).ok().flatten()?;
        let department = self.directory.department(applicant.department_id?).ok().flatten()?;
        department.head_id.filter(|head| *head != application.applicant_id())
    }
}

pub(crate) fn submitted_message(application: &Application) -> String {
    let mut message = format!(
        "New application {} \"{}\" is waiting for your approval (priority {:?}, {}/5).",
        application.application_number(),
        application.title(),
        application.priority(),
        application.priority().level()
    );
    if application.is_urgent() {
        message.push_str(" This application is urgent.");
    }
    message
}

pub(crate) fn urgent_message(application: &Application) -> String {
    format!(
        "Urgent application {} \"{}\" was submitted in your department.",
        application.application_number(),
        application.title()
    )
}

pub(crate) fn approved_message(application: &Application) -> String {
    format!(
        "Your application {} \"{}\" has been approved.",
        application.application_number(),
        application.title()
    )
}

pub(crate) fn rejected_message(application: &Application, comment: Option<&str>) -> String {
    let mut message = format!(
        "Your application {} \"{}\" has been rejected.",
        application.application_number(),
        application.title()
    );
    if let Some(comment) = comment.filter(|c| !c.trim().is_empty()) {
        message.push_str(&format!(" Comment: {}", comment));
    }
    message
}

pub(crate) fn withdrawn_message(application: &Application) -> String {
    format!(
        "Application {} \"{}\" was withdrawn by the applicant.",
        application.application_number(),
        application.title()
    )
}
