// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request rejected with status {0}")]
    Rejected(u16),
    #[error("Registration no longer known to the listing service")]
    NotFound,
    #[error("Client is shutting down")]
    Cancelled,
    #[error("Malformed response body: {0}")]
    Malformed(String),
}
