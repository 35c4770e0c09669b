mod config;
mod error;
mod handlers;
mod principal;
mod state;

use std::time::Duration;

use actix_web::{App, HttpServer};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::load_config;
use crate::state::bootstrap;

const DISPATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[instrument(name = "startup")]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let startup_span = tracing::info_span!("application_startup");
    let _guard = startup_span.entered();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| {
                std::env::var("RUST_LOG")
                    .unwrap_or_else(|_| "info,actix_web=info".to_string()).into()
            }))
        .with(tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_level(true))
        .init();

    let config = match load_config() {
        Ok(cfg) => {
            info!(
                host = %cfg.serverhostname,
                port = %cfg.serverport,
                seed_file = ?cfg.seedfile,
                slack = cfg.slack().is_some(),
                "Configuration loaded successfully"
            );
            cfg
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration. Exiting application");
            std::process::exit(1);
        }
    };

    let (state, dispatcher) = match bootstrap(&config) {
        Ok(started) => started,
        Err(e) => {
            error!(error = %e, "Failed to initialise the workflow engine. Exiting application");
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address();
    info!(address = %bind_address, "Starting HTTP server");

    let app_state = state.clone();
    let served = HttpServer::new(move || {
        debug!("Initializing new worker");
        App::new()
            .app_data(app_state.clone())
            .configure(handlers::configure)
            .wrap(actix_web::middleware::Logger::default())
            .wrap(actix_web::middleware::DefaultHeaders::new()
                .add(("Access-Control-Allow-Origin", "*"))
                .add(("Access-Control-Allow-Methods", "GET, POST"))
                .add(("Access-Control-Allow-Headers", "Content-Type, X-User-Id")))
    })
    .bind(&bind_address)
    .map_err(|e| {
        error!(error = %e, address = %bind_address, "Failed to bind server");
        e
    })?
    .run()
    .await;

    // Dropping the last engine handle closes the notification queue.
    drop(state);
    match tokio::time::timeout(DISPATCHER_DRAIN_TIMEOUT, dispatcher).await {
        Ok(Ok(stats)) => info!(delivered = stats.delivered, failed = stats.failed, "Notification dispatcher stopped"),
        Ok(Err(e)) => error!(error = %e, "Notification dispatcher task failed"),
        Err(_) => warn!("Notification dispatcher did not drain in time"),
    }
    served
}
