use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::queue::Notification;
use crate::sink::NotificationSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            batch_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub failed: usize,
}

/// Drains the notification queue in batches until every sender is gone.
pub struct NotificationDispatcher {
    receiver: mpsc::Receiver<Notification>,
    sink: Arc<dyn NotificationSink>,
    config: DispatcherConfig,
}

impl NotificationDispatcher {
    pub fn new(
        receiver: mpsc::Receiver<Notification>,
        sink: Arc<dyn NotificationSink>,
        config: DispatcherConfig,
    ) -> Self {
        Self { receiver, sink, config }
    }

    pub fn spawn(self) -> JoinHandle<DispatchStats> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> DispatchStats {
        info!(
            batch_size = self.config.batch_size,
            batch_timeout_ms = self.config.batch_timeout_ms,
            "Starting notification dispatcher"
        );
        let timeout = Duration::from_millis(self.config.batch_timeout_ms.max(1));
        let mut batch = BatchBuffer::new(self.config.batch_size.max(1));
        let mut stats = DispatchStats::default();
        let mut ticker = interval(timeout);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = self.receiver.recv() => {
                    match received {
                        Some(notification) => {
                            batch.add(notification);
                            if batch.is_full() {
                                self.deliver_batch(&mut batch, &mut stats).await;
                            }
                        }
                        None => {
                            if !batch.is_empty() {
                                self.deliver_batch(&mut batch, &mut stats).await;
                            }
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    if batch.should_process(timeout) {
                        self.deliver_batch(&mut batch, &mut stats).await;
                    }
                }
            }
        }

        info!(delivered = stats.delivered, failed = stats.failed, "Notification queue closed");
        stats
    }

    async fn deliver_batch(&self, batch: &mut BatchBuffer, stats: &mut DispatchStats) {
        debug!("Delivering batch of {} notifications", batch.len());
        let notifications = batch.take();

        let deliveries: Vec<_> = notifications
            .iter()
            .map(|notification| self.sink.deliver(notification))
            .collect();
        let results = futures::future::join_all(deliveries).await;

        for (notification, result) in notifications.iter().zip(results) {
            match result {
                Ok(()) => stats.delivered += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!(recipient = %notification.recipient, error = %e, "Failed to deliver notification");
                }
            }
        }
    }
}

struct BatchBuffer {
    notifications: Vec<Notification>,
    capacity: usize,
    started: Option<Instant>,
}

impl BatchBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            notifications: Vec::with_capacity(capacity),
            capacity,
            started: None,
        }
    }

    fn add(&mut self, notification: Notification) {
        if self.notifications.is_empty() {
            self.started = Some(Instant::now());
        }
        self.notifications.push(notification);
    }

    fn is_full(&self) -> bool {
        self.notifications.len() >= self.capacity
    }

    fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// A partial batch is flushed once its oldest entry has waited `timeout`.
    fn should_process(&self, timeout: Duration) -> bool {
        self.started.map_or(false, |started| started.elapsed() >= timeout)
    }

    fn len(&self) -> usize {
        self.notifications.len()
    }

    fn take(&mut self) -> Vec<Notification> {
        self.started = None;
        std::mem::replace(&mut self.notifications, Vec::with_capacity(self.capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(recipient: &str) -> Notification {
        Notification {
            recipient: recipient.to_string(),
            message: "hello".to_string(),
            is_urgent: false,
        }
    }

    #[test]
    fn buffer_tracks_oldest_entry() {
        let mut batch = BatchBuffer::new(2);
        assert!(!batch.should_process(Duration::ZERO));
        batch.add(notification("a"));
        assert!(batch.should_process(Duration::ZERO));
        assert!(!batch.should_process(Duration::from_secs(60)));
        batch.add(notification("b"));
        assert!(batch.is_full());

        let taken = batch.take();
        assert_eq!(taken.len(), 2);
        assert!(batch.is_empty());
        assert!(!batch.should_process(Duration::ZERO));
    }
}
