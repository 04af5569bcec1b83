// src/config.rs
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base address of the listing service, e.g. "http://localhost:8000".
    pub service_address: String,

    // Loop intervals
    pub health_interval_secs: u64,
    pub reconnect_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_address: "http://localhost:8000".to_string(),
            health_interval_secs: 1,
            reconnect_interval_secs: 1,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            service_address: env::var("SERVICE_ADDRESS")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),

            health_interval_secs: env::var("HEALTH_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),

            reconnect_interval_secs: env::var("RECONNECT_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        }
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs)
    }
}
