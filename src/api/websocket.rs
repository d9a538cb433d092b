use crate::api::connection::ConnectionHandler;
use crate::state::SwarmState;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Shared application state for WebSocket handler
#[derive(Clone)]
pub struct WsAppState {
    pub swarm: Arc<SwarmState>,
    /// Capacity of each connection's outbound queue
    pub outbox_capacity: usize,
}

/// GET {ws_path} - WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsAppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(move |socket| {
        let (handler, outbound_rx) =
            ConnectionHandler::new(Arc::clone(&state.swarm), state.outbox_capacity);
        handler.handle(socket, outbound_rx)
    })
}

/// Create WebSocket router serving the session protocol at `path`
pub fn create_ws_router(state: Arc<WsAppState>, path: &str) -> Router {
    Router::new()
        .route(path, get(ws_handler))
        .with_state(state)
}
