// tests/support/mod.rs
//! In-process stand-in for the listing service, close enough to the real
//! contract for the client to run against unmodified.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use dashmap::DashMap;
use serde_json::{json, Value};
use uuid::Uuid;

use server_listing::ServerRecord;

#[derive(Default)]
pub struct BackendState {
    servers: DashMap<String, ServerRecord>,
    reject_connects: AtomicBool,
    fail_health: AtomicBool,
    connect_hits: AtomicUsize,
    health_hits: AtomicUsize,
    update_hits: AtomicUsize,
    shutdown_hits: AtomicUsize,
    list_hits: AtomicUsize,
}

pub struct ListingBackend {
    state: Arc<BackendState>,
    addr: SocketAddr,
}

impl ListingBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .route("/", get(list_servers))
            .route("/connect", post(connect_server))
            .route("/health", post(health_server))
            .route("/update", put(update_server))
            .route("/shutdown", post(shutdown_server))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { state, addr }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Simulate the service expiring every registration.
    pub fn expire_all(&self) {
        self.state.servers.clear();
    }

    pub fn reject_connects(&self, reject: bool) {
        self.state.reject_connects.store(reject, Ordering::SeqCst);
    }

    pub fn fail_health(&self, fail: bool) {
        self.state.fail_health.store(fail, Ordering::SeqCst);
    }

    pub fn registered_ids(&self) -> Vec<String> {
        self.state.servers.iter().map(|r| r.key().clone()).collect()
    }

    pub fn registered_record(&self, id: &str) -> Option<ServerRecord> {
        self.state.servers.get(id).map(|r| r.value().clone())
    }

    pub fn connect_hits(&self) -> usize {
        self.state.connect_hits.load(Ordering::SeqCst)
    }

    pub fn health_hits(&self) -> usize {
        self.state.health_hits.load(Ordering::SeqCst)
    }

    pub fn update_hits(&self) -> usize {
        self.state.update_hits.load(Ordering::SeqCst)
    }

    pub fn shutdown_hits(&self) -> usize {
        self.state.shutdown_hits.load(Ordering::SeqCst)
    }

    pub fn list_hits(&self) -> usize {
        self.state.list_hits.load(Ordering::SeqCst)
    }
}

async fn list_servers(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    let mut servers: Vec<ServerRecord> = state.servers.iter().map(|r| r.value().clone()).collect();
    // Deterministic order so tests can assert the client preserves it.
    servers.sort_by_key(|s| s.port);
    Json(json!({ "gameServers": servers }))
}

async fn connect_server(
    State(state): State<Arc<BackendState>>,
    Json(mut record): Json<ServerRecord>,
) -> Result<Json<Value>, StatusCode> {
    state.connect_hits.fetch_add(1, Ordering::SeqCst);
    if state.reject_connects.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    record.id = Uuid::new_v4().to_string();
    state.servers.insert(record.id.clone(), record.clone());
    Ok(Json(json!({ "gameServer": record })))
}

async fn health_server(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.health_hits.fetch_add(1, Ordering::SeqCst);
    if state.fail_health.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    let id = body["id"].as_str().unwrap_or_default();
    if state.servers.contains_key(id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn update_server(
    State(state): State<Arc<BackendState>>,
    Json(record): Json<ServerRecord>,
) -> StatusCode {
    state.update_hits.fetch_add(1, Ordering::SeqCst);
    if !state.servers.contains_key(&record.id) {
        return StatusCode::NOT_FOUND;
    }
    state.servers.insert(record.id.clone(), record);
    StatusCode::OK
}

async fn shutdown_server(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.shutdown_hits.fetch_add(1, Ordering::SeqCst);
    let id = body["id"].as_str().unwrap_or_default();
    if state.servers.remove(id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    StatusCode::OK
}
