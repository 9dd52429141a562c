//! RepoWatch entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration** — read `.env` and the environment into a
//!    [`config::ServiceConfig`]; refuse to start on any invalid value.
//! 2. **Wire observability** — install `tracing-subscriber` with a pretty or
//!    JSON formatter and, if `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an
//!    OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure** — open the configured event store and
//!    inject it, the secret and a [`pipeline::SystemClock`] into the
//!    [`pipeline::IngestionOrchestrator`].
//! 4. **Serve** — run the listener until Ctrl-C, then flush spans.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use listener::AppState;
use pipeline::{IngestionOrchestrator, SystemClock};
use tracing::{error, info};

use crate::config::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("invalid configuration")?;
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    info!(
        bind = %config.bind,
        store = ?config.store,
        events_mode = ?config.events.mode,
        "starting RepoWatch"
    );

    let store = store::open(&config.store).context("failed to open event store")?;
    let orchestrator = Arc::new(IngestionOrchestrator::new(
        config.secret.clone(),
        store,
        Arc::new(SystemClock::new()),
    ));
    let state = AppState::new(orchestrator, config.events).with_max_body_bytes(config.max_body_bytes);

    let served = listener::serve(config.bind, state, shutdown_signal()).await;
    telemetry.shutdown();
    served.context("listener failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
