// WebSocket session endpoint and read-only HTTP queries

mod connection;
pub mod query;
pub mod websocket;

pub use connection::ConnectionHandler;
pub use query::{create_query_router, QueryAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};

use crate::config::ServerConfig;
use crate::state::SwarmState;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the full application router
pub fn create_app(swarm: Arc<SwarmState>, server: &ServerConfig) -> Router {
    let ws_state = Arc::new(WsAppState {
        swarm: Arc::clone(&swarm),
        outbox_capacity: server.outbox_capacity,
    });
    let query_state = Arc::new(QueryAppState { swarm });

    create_ws_router(ws_state, &server.ws_path)
        .merge(create_query_router(query_state))
        .layer(CorsLayer::permissive())
}
