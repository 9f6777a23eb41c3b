use std::env;
use std::sync::Arc;
use tracing::{info, warn};

use acquire::{server, AcquisitionClient, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env();
    let bind_addr = env::var("ACQUIRE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());

    info!("Starting acquisition server");
    info!("Extraction service URL: {}", config.base_url);
    if !config.has_credential() {
        warn!("FIRECRAWL_API_KEY is not set; every operation will fail fast");
    }

    let client = Arc::new(AcquisitionClient::new(config)?);
    let app = server::router(client);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Acquisition server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
