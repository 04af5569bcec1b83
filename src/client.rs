// src/client.rs
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::RequestError;
use crate::models::server::{ConnectResponse, ServerListResponse, ServerRecord};
use crate::monitor;
use crate::transport::{RequestOutcome, Transport};

/// Lifecycle of one registration with the listing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    Disconnected,
    Connecting,
    /// Carries the backend-assigned id, never empty.
    Connected(String),
}

impl RegistrationState {
    pub fn id(&self) -> Option<&str> {
        match self {
            RegistrationState::Connected(id) => Some(id),
            _ => None,
        }
    }
}

struct Registration {
    state: RegistrationState,
    /// Last record handed to `connect` (or accepted by `update_info`),
    /// without an id; reused for automatic re-registration.
    record: Option<ServerRecord>,
    /// Bumped whenever a new connect cycle starts, so a superseded retry
    /// loop that wakes up later cannot act on the guard.
    epoch: u64,
}

/// Client for the game server listing service.
///
/// Registers one server record, keeps the registration alive through a
/// background health monitor and re-registers automatically when the service
/// expires it. Cheap to clone; all clones drive the same registration.
/// Construct inside a tokio runtime and tear down with [`shutdown`].
///
/// [`shutdown`]: ServerListingClient::shutdown
#[derive(Clone)]
pub struct ServerListingClient {
    inner: Arc<Inner>,
}

impl ServerListingClient {
    pub fn new(config: Config) -> Result<Self, RequestError> {
        let (shutdown_signal, shutdown_rx) = watch::channel(false);
        let transport = Transport::new(config.service_address.clone(), shutdown_rx.clone())?;
        let inner = Arc::new_cyclic(|weak_self| Inner {
            weak_self: weak_self.clone(),
            transport,
            reconnect_interval: config.reconnect_interval(),
            registration: Mutex::new(Registration {
                state: RegistrationState::Disconnected,
                record: None,
                epoch: 0,
            }),
            shutdown_signal,
            monitor: Mutex::new(None),
        });
        let handle = monitor::spawn(&inner, config.health_interval(), shutdown_rx);
        *inner.monitor.lock() = Some(handle);
        Ok(Self { inner })
    }

    /// Begin registering `record` with the listing service.
    ///
    /// Returns `false` without doing anything when a registration attempt is
    /// already running. Otherwise the retry loop keeps calling the service
    /// every `reconnect_interval` until it accepts the record or the client
    /// shuts down.
    pub fn connect(&self, record: ServerRecord) -> bool {
        self.inner.connect(record)
    }

    /// Ping the listing service for the active registration.
    ///
    /// Returns `true` while the service still tracks it. When the service
    /// answers 404 the registration has expired: the id is dropped and a new
    /// connect cycle starts with the last known record. Transient failures
    /// return `false` and change nothing.
    pub async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }

    /// Push refreshed server details (player counts, map, ...) for the
    /// active registration. No-op unless connected.
    pub async fn update_info(&self, record: ServerRecord) -> bool {
        self.inner.update_info(record).await
    }

    /// Fetch the currently advertised servers.
    ///
    /// Any failure collapses to an empty list; callers cannot tell a dead
    /// service from an empty one.
    pub async fn list(&self) -> Vec<ServerRecord> {
        self.inner.list().await
    }

    /// Tear the client down: deregister best-effort, cancel any in-flight
    /// request and stop both background loops. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.inner.shutdown().await
    }

    pub fn state(&self) -> RegistrationState {
        self.inner.registration.lock().state.clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            self.inner.registration.lock().state,
            RegistrationState::Connected(_)
        )
    }

    pub fn server_id(&self) -> Option<String> {
        self.inner.server_id()
    }
}

pub(crate) struct Inner {
    /// Self-handle for the background loops, which must not keep the client
    /// alive on their own.
    weak_self: Weak<Inner>,
    transport: Transport,
    reconnect_interval: Duration,
    registration: Mutex<Registration>,
    shutdown_signal: watch::Sender<bool>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn connect(&self, mut record: ServerRecord) -> bool {
        record.id.clear();
        let epoch = {
            let mut registration = self.registration.lock();
            if registration.state == RegistrationState::Connecting {
                return false;
            }
            registration.state = RegistrationState::Connecting;
            registration.record = Some(record);
            registration.epoch = registration.epoch.wrapping_add(1);
            registration.epoch
        };
        self.spawn_connect_loop(epoch);
        true
    }

    pub(crate) async fn health_check(&self) -> bool {
        let Some(id) = self.server_id() else {
            return false;
        };
        let result = self
            .transport
            .send("/health", Method::POST, &json!({ "id": id }))
            .await
            .and_then(RequestOutcome::into_body);
        match result {
            Ok(_) => true,
            Err(RequestError::NotFound) => {
                warn!(
                    "Registration {} expired on the listing service, re-registering",
                    id
                );
                self.reconnect_expired(&id);
                false
            }
            Err(RequestError::Cancelled) => false,
            Err(err) => {
                debug!("Health check failed: {}", err);
                false
            }
        }
    }

    async fn update_info(&self, mut record: ServerRecord) -> bool {
        let Some(id) = self.server_id() else {
            return false;
        };
        record.id = id;
        let result = self
            .transport
            .send("/update", Method::PUT, &record)
            .await
            .and_then(RequestOutcome::into_body);
        match result {
            Ok(_) => {
                // Remember the accepted data so a later auto re-registration
                // does not advertise stale counts.
                record.id.clear();
                self.registration.lock().record = Some(record);
                true
            }
            Err(err) => {
                debug!("Update rejected: {}", err);
                false
            }
        }
    }

    async fn list(&self) -> Vec<ServerRecord> {
        let result = self
            .transport
            .send("/", Method::GET, &json!({}))
            .await
            .and_then(RequestOutcome::into_body);
        match result {
            Ok(body) => match serde_json::from_str::<ServerListResponse>(&body) {
                Ok(response) => response.game_servers,
                Err(err) => {
                    warn!("Could not parse server list: {}", err);
                    Vec::new()
                }
            },
            Err(err) => {
                debug!("Server list request failed: {}", err);
                Vec::new()
            }
        }
    }

    async fn shutdown(&self) {
        let active_id = {
            let mut registration = self.registration.lock();
            let id = registration.state.id().map(str::to_string);
            registration.state = RegistrationState::Disconnected;
            id
        };
        if let Some(id) = active_id {
            // Best effort; the service expires the registration anyway.
            match self
                .transport
                .send("/shutdown", Method::POST, &json!({ "id": id }))
                .await
                .and_then(RequestOutcome::into_body)
            {
                Ok(_) => info!("Deregistered {} from the listing service", id),
                Err(err) => warn!("Deregistration failed: {}", err),
            }
        }
        let _ = self.shutdown_signal.send(true);
        let monitor = self.monitor.lock().take();
        if let Some(handle) = monitor {
            let _ = handle.await;
        }
    }

    fn server_id(&self) -> Option<String> {
        self.registration.lock().state.id().map(str::to_string)
    }

    /// A health check saw a 404: drop the expired id and start a fresh
    /// connect cycle, unless the state already moved while the request was
    /// in flight.
    fn reconnect_expired(&self, expired_id: &str) {
        let epoch = {
            let mut registration = self.registration.lock();
            match &registration.state {
                RegistrationState::Connected(id) if id == expired_id => {
                    registration.state = RegistrationState::Connecting;
                    registration.epoch = registration.epoch.wrapping_add(1);
                    registration.epoch
                }
                _ => return,
            }
        };
        self.spawn_connect_loop(epoch);
    }

    fn spawn_connect_loop(&self, epoch: u64) {
        // The loop holds only a weak handle between attempts, so dropping
        // the last client handle stops it.
        let weak = self.weak_self.clone();
        tokio::spawn(async move {
            loop {
                let Some(inner) = weak.upgrade() else { break };
                if !inner.connect_attempt(epoch).await {
                    break;
                }
                let interval = inner.reconnect_interval;
                let mut shutdown = inner.shutdown_signal.subscribe();
                if *shutdown.borrow() {
                    break;
                }
                drop(inner);
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    /// One pass of the reconnect loop. Returns `true` when another attempt
    /// should follow after the interval.
    async fn connect_attempt(&self, epoch: u64) -> bool {
        let record = {
            let registration = self.registration.lock();
            if registration.state != RegistrationState::Connecting
                || registration.epoch != epoch
            {
                return false;
            }
            match registration.record.clone() {
                Some(record) => record,
                None => return false,
            }
        };
        match self.register(&record).await {
            Ok(id) => {
                let mut registration = self.registration.lock();
                // The state may have moved while the request was in flight
                // (shutdown, or a newer connect cycle).
                if registration.state == RegistrationState::Connecting
                    && registration.epoch == epoch
                {
                    info!("Registered with listing service as {}", id);
                    registration.state = RegistrationState::Connected(id);
                }
                false
            }
            Err(RequestError::Cancelled) => false,
            Err(err) => {
                debug!("Registration attempt failed, retrying: {}", err);
                true
            }
        }
    }

    async fn register(&self, record: &ServerRecord) -> Result<String, RequestError> {
        let body = self
            .transport
            .send("/connect", Method::POST, record)
            .await
            .and_then(RequestOutcome::into_body)?;
        let response: ConnectResponse =
            serde_json::from_str(&body).map_err(|err| RequestError::Malformed(err.to_string()))?;
        if response.game_server.id.is_empty() {
            return Err(RequestError::Malformed(
                "registration response carried no id".to_string(),
            ));
        }
        Ok(response.game_server.id)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let _ = self.shutdown_signal.send(true);
    }
}
