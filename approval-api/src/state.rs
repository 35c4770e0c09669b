use std::sync::Arc;

use actix_web::web;
use approval_core::catalog::{Catalog, CatalogError};
use approval_core::store::InMemoryStore;
use approval_core::WorkflowEngine;
use approval_notifier::{
    DispatchStats, LogNotifier, NotificationDispatcher, NotificationQueue, NotificationSink, NotifierError,
    SlackNotifier,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::config::AppConfig;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Seed catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Notifier error: {0}")]
    Notifier(#[from] NotifierError),
}

pub struct AppState {
    pub engine: WorkflowEngine,
}

impl AppState {
    pub fn new(engine: WorkflowEngine) -> web::Data<Self> {
        web::Data::new(Self { engine })
    }
}

/// Builds the store, installs the seed catalog and starts the notification
/// dispatcher. The dispatcher stops once the returned state is dropped.
pub fn bootstrap(config: &AppConfig) -> Result<(web::Data<AppState>, JoinHandle<DispatchStats>), StartupError> {
    let store = Arc::new(InMemoryStore::new());
    match &config.seedfile {
        Some(path) => {
            info!(path = %path, "Loading seed catalog");
            Catalog::from_file(path)?.install(&store)?;
        }
        None => info!("No seed catalog configured, starting with an empty directory"),
    }

    let sink: Arc<dyn NotificationSink> = match config.slack() {
        Some(slack) => {
            info!(channel = %slack.default_channel, "Delivering notifications to Slack");
            Arc::new(SlackNotifier::new(slack)?)
        }
        None => {
            info!("No Slack webhook configured, notifications are logged only");
            Arc::new(LogNotifier)
        }
    };
    let (queue, receiver) = NotificationQueue::bounded(config.notificationqueuecapacity);
    let dispatcher = NotificationDispatcher::new(receiver, sink, config.dispatcher()).spawn();

    let engine = WorkflowEngine::with_store(store, Arc::new(queue));
    Ok((AppState::new(engine), dispatcher))
}
