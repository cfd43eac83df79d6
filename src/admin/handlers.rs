use axum::{extract::State, Json};
use serde::Serialize;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub backends: usize,
    pub alive_backends: usize,
    pub cursor: usize,
}

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub index: usize,
    pub address: String,
    pub alive: bool,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let dispatcher = &state.dispatcher;
    let alive_backends = dispatcher.backends().iter().filter(|b| b.is_alive()).count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if alive_backends > 0 { "operational" } else { "degraded" },
        backends: dispatcher.len(),
        alive_backends,
        cursor: dispatcher.cursor(),
    })
}

pub async fn get_backends(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    let statuses = state
        .dispatcher
        .backends()
        .iter()
        .enumerate()
        .map(|(index, b)| BackendStatus {
            index,
            address: b.address().to_string(),
            alive: b.is_alive(),
        })
        .collect();

    Json(statuses)
}
