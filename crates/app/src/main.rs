//! Apix - Main Entry Point
//!
//! Loads configuration, opens the record store (reconciling auth profiles
//! left in an inconsistent state) and reports what it holds.

use apix::Apix;
use apix_infrastructure::ApixConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting apix v{}", env!("CARGO_PKG_VERSION"));

    let config = ApixConfig::load()?;
    tracing::debug!(?config, "configuration loaded");

    let apix = Apix::open(config).await?;
    let status = apix.status().await?;

    println!("Store: {}", apix.config().root_dir.display());
    print!("{status}");

    Ok(())
}
