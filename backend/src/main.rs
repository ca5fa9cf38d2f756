use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use freight_dispatch::{
    config::Config,
    dispatch::Dispatcher,
    fulfillment::{FulfillmentUpdater, ShopifyClient},
    server::{AppState, app},
    submitter::PalletforceSubmitter,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freight_dispatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    let submitter = Arc::new(PalletforceSubmitter::from_config(&config)?);

    let fulfillment: Option<Arc<dyn FulfillmentUpdater>> = match &config.shopify {
        Some(shopify) => Some(Arc::new(ShopifyClient::new(shopify.clone())?)),
        None => {
            tracing::info!(
                "Shopify credentials not set, tracking numbers will not be written back"
            );
            None
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(config.clone(), submitter, fulfillment));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Carrier endpoint: {}", config.carrier_url);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app(AppState { dispatcher }))
        .await
        .context("Server error")?;

    Ok(())
}
