//! Resonanz Server — application entry point.

mod api;
mod config;

use std::sync::Arc;

use resonanz_db::repository::{SurrealAddressRepository, SurrealTenantRepository};
use resonanz_db::{DbManager, run_migrations};
use resonanz_geo::AnyGeocoder;
use resonanz_registry::RegistryService;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::builder()
        .with_default_directive(config.level_filter()?.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!(
        port = config.port,
        geocoder = config.geocoder.backend.name(),
        "Starting resonanz server..."
    );

    let db = DbManager::connect(&config.database).await?;
    run_migrations(db.client()).await?;

    let geocoder = AnyGeocoder::from_config(&config.geocoder)?;
    let service = RegistryService::new(
        geocoder,
        SurrealAddressRepository::new(db.client().clone(), config.address_identity),
        SurrealTenantRepository::new(db.client().clone()),
    );

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, api::router(Arc::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Resonanz server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Could not listen for shutdown signal");
    }
}
