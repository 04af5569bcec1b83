// src/models/server.rs
use serde::{Deserialize, Serialize};

/// One advertised game server. The `id` is assigned by the listing service
/// and stays empty until the registration is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub address: String,
    pub port: i32,
    pub title: String,
    pub description: String,
    pub map: String,
    #[serde(rename = "currentPlayer")]
    pub current_players: i32,
    #[serde(rename = "maxPlayer")]
    pub max_players: i32,
}

/// Body of a 200 response from `GET /`.
#[derive(Debug, Deserialize)]
pub struct ServerListResponse {
    #[serde(rename = "gameServers", default)]
    pub game_servers: Vec<ServerRecord>,
}

/// Body of a 200 response from `POST /connect`.
#[derive(Debug, Deserialize)]
pub struct ConnectResponse {
    #[serde(rename = "gameServer")]
    pub game_server: ServerRecord,
}
