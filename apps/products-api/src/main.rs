//! Products API - REST server

use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::mongodb::connect_from_config_with_retry;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::{AppState, MongoBackend};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let mongo = match &config.mongodb {
        Some(mongo_config) => {
            info!("Connecting to MongoDB at {}", mongo_config.redacted_url());
            let client = connect_from_config_with_retry(mongo_config, None).await?;
            let db = client.database(mongo_config.database());
            info!(
                database = mongo_config.database(),
                collection = %config.table_name,
                "Successfully connected to MongoDB"
            );
            Some(MongoBackend { client, db })
        }
        None => {
            tracing::warn!("Using the in-memory store; products are lost on restart");
            None
        }
    };

    let state = AppState {
        config: config.clone(),
        mongo,
    };

    // Build REST router
    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::health::router(state.clone()));

    info!(
        store = %state.config.store,
        "Starting Products API on port {}",
        state.config.server.port
    );

    let mongo_client = state.mongo.as_ref().map(|m| m.client.clone());
    create_production_app(app, &state.config.server, Duration::from_secs(30), async move {
        if let Some(client) = mongo_client {
            info!("Shutting down: closing MongoDB connections");
            client.shutdown().await;
            info!("MongoDB connection closed");
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
