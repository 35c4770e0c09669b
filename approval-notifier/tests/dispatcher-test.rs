use std::sync::{Arc, Mutex};
use std::time::Duration;

use approval_core::NotificationPort;
use approval_notifier::*;
use async_trait::async_trait;

#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<Notification>>,
    failing_recipient: Option<String>,
}

impl RecordingSink {
    fn recipients(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.recipient.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifierError> {
        if self.failing_recipient.as_deref() == Some(notification.recipient.as_str()) {
            return Err(NotifierError::Delivery("mailbox unavailable".to_string()));
        }
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[tokio::test]
async fn remaining_notifications_are_flushed_on_close() {
    let sink = Arc::new(RecordingSink::default());
    let (queue, receiver) = NotificationQueue::bounded(8);
    let config = DispatcherConfig {
        batch_size: 5,
        batch_timeout_ms: 60_000,
    };

    assert!(queue.send_notification("U1", "one", false));
    assert!(queue.send_notification("U2", "two", true));
    assert!(queue.send_notification("U3", "three", false));
    drop(queue);

    let stats = NotificationDispatcher::new(receiver, sink.clone(), config).run().await;
    assert_eq!(stats, DispatchStats { delivered: 3, failed: 0 });
    assert_eq!(sink.recipients(), vec!["U1", "U2", "U3"]);
    assert!(sink.delivered.lock().unwrap()[1].is_urgent);
}

#[tokio::test]
async fn partial_batch_is_flushed_after_timeout() {
    let sink = Arc::new(RecordingSink::default());
    let (queue, receiver) = NotificationQueue::bounded(8);
    let config = DispatcherConfig {
        batch_size: 10,
        batch_timeout_ms: 20,
    };
    let handle = NotificationDispatcher::new(receiver, sink.clone(), config).spawn();

    assert!(queue.send_notification("U1", "waiting", false));
    let flushed = tokio::time::timeout(Duration::from_secs(5), async {
        while sink.recipients().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(flushed.is_ok(), "partial batch was never delivered");

    drop(queue);
    let stats = handle.await.unwrap();
    assert_eq!(stats.delivered, 1);
}

#[tokio::test]
async fn failed_delivery_does_not_stop_the_batch() {
    let sink = Arc::new(RecordingSink {
        delivered: Mutex::new(Vec::new()),
        failing_recipient: Some("U2".to_string()),
    });
    let (queue, receiver) = NotificationQueue::bounded(8);
    let config = DispatcherConfig {
        batch_size: 2,
        batch_timeout_ms: 60_000,
    };

    for recipient in ["U1", "U2", "U3"] {
        assert!(queue.send_notification(recipient, "message", false));
    }
    drop(queue);

    let stats = NotificationDispatcher::new(receiver, sink.clone(), config).run().await;
    assert_eq!(stats, DispatchStats { delivered: 2, failed: 1 });
    assert_eq!(sink.recipients(), vec!["U1", "U3"]);
}

#[tokio::test]
async fn engine_notifications_reach_the_sink() {
    use approval_core::catalog::Catalog;
    use approval_core::store::InMemoryStore;
    use approval_core::{NewApplication, Priority, WorkflowEngine};

    let store = Arc::new(InMemoryStore::new());
    Catalog::from_json_str(
        r#"{
            "users": [
                {"id": 1, "username": "alice", "name": "Alice"},
                {"id": 2, "username": "bob", "name": "Bob", "roles": ["MANAGER"], "slack_user_id": "U_BOB"}
            ],
            "application_types": [{"id": 1, "name": "Expense", "code": "EXPENSE"}],
            "approval_routes": [
                {"id": 1, "application_type_id": 1, "step_order": 1, "approver": {"kind": "ROLE", "role": "MANAGER"}}
            ]
        }"#,
    )
    .unwrap()
    .install(&store)
    .unwrap();

    let sink = Arc::new(RecordingSink::default());
    let (queue, receiver) = NotificationQueue::bounded(4);
    let handle = NotificationDispatcher::new(receiver, sink.clone(), DispatcherConfig::default()).spawn();

    let engine = WorkflowEngine::with_store(store, Arc::new(queue));
    let draft = engine
        .create_draft(NewApplication {
            application_type_id: 1,
            applicant_id: 1,
            title: "Conference ticket".to_string(),
            content: String::new(),
            priority: Priority::Medium,
            is_urgent: false,
            form_data: serde_json::Value::Null,
        })
        .unwrap();
    engine.submit(draft.id(), 1).unwrap();
    drop(engine);

    let stats = handle.await.unwrap();
    assert_eq!(stats.delivered, 1);
    assert_eq!(sink.recipients(), vec!["U_BOB"]);
}
