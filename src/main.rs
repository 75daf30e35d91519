//! Civic Intake Service — Binary Entrypoint
//! Loads configuration and reference data, wires the pipeline ports, and
//! boots the Axum HTTP server with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use civic_intake::api::{self, AppState};
use civic_intake::config::IntakeConfig;
use civic_intake::intake::IntakePipeline;
use civic_intake::metrics::Metrics;
use civic_intake::moderation::vision;
use civic_intake::notify::email;
use civic_intake::routing::geocode::NominatimGeocoder;
use civic_intake::routing::{OfficerDirectory, ZoneTable};
use civic_intake::store::MemoryStore;

fn init_tracing(config: &IntakeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.is_production() {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    let config = IntakeConfig::load()?;
    init_tracing(&config);

    let metrics = Metrics::init();

    let zones = ZoneTable::load_default()?;
    let officers = OfficerDirectory::load_default()?;
    info!(
        zones = zones.zones.len(),
        officers = officers.officers.len(),
        "reference data loaded"
    );

    let store = Arc::new(MemoryStore::new());
    let pipeline = IntakePipeline::new(
        store,
        vision::build_from_config(&config.vision),
        Arc::new(NominatimGeocoder::new(&config.geocoder)),
        zones,
        officers,
        email::build_from_config(&config.smtp)?,
        &config.geocoder,
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    let app = api::create_router(state).merge(metrics.router());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting intake service");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "server exited");
            err
        })?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
