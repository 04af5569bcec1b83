// src/lib.rs
pub mod client;
pub mod config;
pub mod error;
pub mod models;
mod monitor;
pub mod transport;

pub use client::{RegistrationState, ServerListingClient};
pub use config::Config;
pub use error::RequestError;
pub use models::server::ServerRecord;
pub use transport::{RequestOutcome, Transport};
