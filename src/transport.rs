// src/transport.rs
use std::time::Duration;

use log::{error, warn};
use reqwest::Method;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::RequestError;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Raw result of one request. Any HTTP response lands here, whatever the
/// status; only cancellation and transport-level failures are errors.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub success: bool,
    pub status_code: u16,
    pub body: String,
}

impl RequestOutcome {
    /// Classify the outcome, handing the body back on a 200.
    pub fn into_body(self) -> Result<String, RequestError> {
        match self.status_code {
            200 => Ok(self.body),
            404 => Err(RequestError::NotFound),
            status => Err(RequestError::Rejected(status)),
        }
    }
}

/// JSON-over-HTTP channel to the listing service.
pub struct Transport {
    http: reqwest::Client,
    service_address: String,
    shutdown: watch::Receiver<bool>,
}

impl Transport {
    pub fn new(
        service_address: String,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            service_address,
            shutdown,
        })
    }

    /// Send one JSON request. In-flight requests abort when the shutdown
    /// signal fires; requests issued afterwards fail without touching the
    /// network.
    pub async fn send<B>(
        &self,
        path: &str,
        method: Method,
        body: &B,
    ) -> Result<RequestOutcome, RequestError>
    where
        B: Serialize + ?Sized,
    {
        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow() {
            return Err(RequestError::Cancelled);
        }
        let url = format!("{}{}", self.service_address, path);
        let request = self.http.request(method, url).json(body).send();
        let response = tokio::select! {
            _ = shutdown.changed() => return Err(RequestError::Cancelled),
            response = request => response,
        };
        match response {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let body = response.text().await?;
                if status_code != 200 {
                    warn!("Request to [{}] returned status {}", path, status_code);
                }
                Ok(RequestOutcome {
                    success: status_code == 200,
                    status_code,
                    body,
                })
            }
            Err(err) => {
                error!("Request to [{}] failed: {}", path, err);
                Err(RequestError::Network(err))
            }
        }
    }
}
