// src/main.rs
use std::env;

use env_logger::Env;
use log::{error, info};
use server_listing::{Config, ServerListingClient, ServerRecord};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    dotenv::dotenv().ok();

    // Describe this game server from the environment or use defaults
    let config = Config::from_env();
    let record = ServerRecord {
        id: String::new(),
        address: env::var("SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),
        port: env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7777),
        title: env::var("SERVER_TITLE").unwrap_or_else(|_| "Unnamed server".to_string()),
        description: env::var("SERVER_DESCRIPTION").unwrap_or_default(),
        map: env::var("SERVER_MAP").unwrap_or_default(),
        current_players: 0,
        max_players: env::var("MAX_PLAYERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16),
    };

    info!(
        "Advertising {}:{} on {}",
        record.address, record.port, config.service_address
    );
    let client = ServerListingClient::new(config).map_err(|e| {
        error!("Failed to build listing client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    client.connect(record);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    client.shutdown().await;
    Ok(())
}
