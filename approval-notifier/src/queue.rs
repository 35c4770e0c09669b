use approval_core::NotificationPort;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub recipient: String,
    pub message: String,
    pub is_urgent: bool,
}

/// Sending half of the notification channel. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    /// Creates a queue holding at most `capacity` undelivered notifications
    /// and returns the receiver for the dispatcher.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl NotificationPort for NotificationQueue {
    fn send_notification(&self, recipient: &str, message: &str, is_urgent: bool) -> bool {
        let notification = Notification {
            recipient: recipient.to_string(),
            message: message.to_string(),
            is_urgent,
        };
        match self.sender.try_send(notification) {
            Ok(()) => {
                debug!(recipient, is_urgent, "Notification enqueued");
                true
            }
            Err(TrySendError::Full(dropped)) => {
                warn!(recipient = %dropped.recipient, "Notification queue is full, dropping notification");
                false
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!(recipient = %dropped.recipient, "Notification queue is closed, dropping notification");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_queue_refuses_without_blocking() {
        let (queue, mut receiver) = NotificationQueue::bounded(1);
        assert!(queue.send_notification("U1", "first", false));
        assert!(!queue.send_notification("U2", "second", true));

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.recipient, "U1");
        assert!(queue.send_notification("U3", "third", true));
    }

    #[test]
    fn closed_queue_refuses() {
        let (queue, receiver) = NotificationQueue::bounded(4);
        drop(receiver);
        assert!(!queue.send_notification("U1", "hello", false));
    }
}
