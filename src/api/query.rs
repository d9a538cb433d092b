use crate::protocol::WorldState;
use crate::state::{ActivityStats, SwarmState};
use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;

/// Shared state for the read-only query API
pub struct QueryAppState {
    pub swarm: Arc<SwarmState>,
}

/// Create query API router
pub fn create_query_router(state: Arc<QueryAppState>) -> Router {
    Router::new()
        .route("/api/world", get(get_world))
        .route("/api/stats", get(get_stats))
        .with_state(state)
}

/// GET /api/world - Same snapshot observers receive over the WebSocket
async fn get_world(State(state): State<Arc<QueryAppState>>) -> Json<WorldState> {
    Json(state.swarm.snapshot())
}

/// GET /api/stats - Connection counts and activity counters
async fn get_stats(State(state): State<Arc<QueryAppState>>) -> Json<ActivityStats> {
    Json(state.swarm.stats())
}
