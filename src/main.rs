mod analysis;
mod batching;
mod coach;
mod config;
mod logger;
mod server;
mod types;
mod utils;

use log::{error, info};

use config::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            logger::init_logger(&LoggingConfig::default());
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    logger::init_logger(&config.logging);
    info!("Application starting");

    if let Err(e) = server::run(config).await {
        error!("Server failed: {}", e);
        return Err(e.into());
    }

    info!("Server shut down gracefully");
    Ok(())
}
