use ::config::{Config, Environment};
use approval_notifier::{DispatcherConfig, SlackConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct AppConfig {
    pub serverhostname: String,
    pub serverport: u16,

    #[serde(default)]
    pub seedfile: Option<String>,

    #[serde(default)]
    pub slackwebhookurl: Option<String>,
    pub slackdefaultchannel: String,
    pub slackurgentchannel: String,
    pub slackbotusername: String,

    pub notificationqueuecapacity: usize,
    pub notificationbatchsize: usize,
    pub notificationbatchtimeoutms: u64,
}

impl AppConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.serverhostname, self.serverport)
    }

    /// Slack delivery settings, `None` when no webhook is configured.
    pub fn slack(&self) -> Option<SlackConfig> {
        let webhook = self.slackwebhookurl.as_deref().map(str::trim).filter(|url| !url.is_empty())?;
        let mut slack = SlackConfig::new(webhook);
        slack.default_channel = self.slackdefaultchannel.clone();
        slack.urgent_channel = self.slackurgentchannel.clone();
        slack.bot_username = self.slackbotusername.clone();
        Some(slack)
    }

    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            batch_size: self.notificationbatchsize,
            batch_timeout_ms: self.notificationbatchtimeoutms,
        }
    }
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(Environment::default())
}

pub fn load_config_from(environment: Environment) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = Config::builder()
        .set_default("serverhostname", "127.0.0.1")?
        .set_default("serverport", 8080)?
        .set_default("slackdefaultchannel", "#general")?
        .set_default("slackurgentchannel", "#general")?
        .set_default("slackbotusername", "Approvals")?
        .set_default("notificationqueuecapacity", 256)?
        .set_default("notificationbatchsize", 16)?
        .set_default("notificationbatchtimeoutms", 500)?
        .add_source(environment)
        .build()?
        .try_deserialize()?;

    if config.notificationqueuecapacity == 0 {
        return Err(ConfigError::Invalid("NOTIFICATIONQUEUECAPACITY must be at least 1".to_string()));
    }
    if config.notificationbatchsize == 0 {
        return Err(ConfigError::Invalid("NOTIFICATIONBATCHSIZE must be at least 1".to_string()));
    }
    Ok(config)
}
