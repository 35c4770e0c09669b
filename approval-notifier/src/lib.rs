//! Fire-and-forget notification side channel for the approval workflow.
//!
//! The engine talks to a [`NotificationQueue`] through the synchronous
//! `NotificationPort`; a [`NotificationDispatcher`] task drains the queue
//! in batches and hands each notification to a [`NotificationSink`].

pub mod dispatcher;
pub mod queue;
pub mod sink;

pub use crate::dispatcher::{DispatchStats, DispatcherConfig, NotificationDispatcher};
pub use crate::queue::{Notification, NotificationQueue};
pub use crate::sink::{LogNotifier, NotificationSink, NotifierError, SlackConfig, SlackMessage, SlackNotifier};
