use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::queue::Notification;

const URGENT_PREFIX: &str = ":rotating_light: *Urgent*\n";
const DEFAULT_ICON: &str = ":robot_face:";

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Webhook rejected notification with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Delivery error: {0}")]
    Delivery(String),
}

/// Final destination of a notification.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifierError>;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifierError> {
        info!(
            recipient = %notification.recipient,
            urgent = notification.is_urgent,
            message = %notification.message,
            "Notification"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    pub webhook_url: String,
    pub default_channel: String,
    pub urgent_channel: String,
    pub bot_username: String,
    pub icon_emoji: String,
}

impl SlackConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            default_channel: "#general".to_string(),
            urgent_channel: "#general".to_string(),
            bot_username: "Approvals".to_string(),
            icon_emoji: DEFAULT_ICON.to_string(),
        }
    }
}

/// Body of a Slack incoming-webhook post.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SlackMessage {
    pub channel: String,
    pub username: String,
    pub icon_emoji: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: Client,
    config: SlackConfig,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Result<Self, NotifierError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, config })
    }

    pub fn payload(&self, notification: &Notification) -> SlackMessage {
        let channel = if notification.is_urgent {
            &self.config.urgent_channel
        } else {
            &self.config.default_channel
        };
        let prefix = if notification.is_urgent { URGENT_PREFIX } else { "" };
        SlackMessage {
            channel: channel.clone(),
            username: self.config.bot_username.clone(),
            icon_emoji: self.config.icon_emoji.clone(),
            text: format!("{}<@{}> {}", prefix, notification.recipient, notification.message),
        }
    }
}

#[async_trait]
impl NotificationSink for SlackNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifierError> {
        let payload = self.payload(notification);
        let response = self.client.post(&self.config.webhook_url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, channel = %payload.channel, "Slack webhook rejected notification");
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(channel = %payload.channel, recipient = %notification.recipient, "Slack notification posted");
        Ok(())
    }
}
