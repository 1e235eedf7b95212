//! HTTP routes for reading the chain, submitting blocks and managing peers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chain_sync::{Block, ChainSyncApi};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::adapters::PeerTransport;

/// Shared application state passed to handlers.
#[derive(Clone)]
pub struct ApiState {
    pub sync: Arc<dyn ChainSyncApi>,
    pub transport: PeerTransport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineBlockRequest {
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddPeerRequest {
    pub peer: String,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/blocks", get(list_blocks))
        .route("/mineBlock", post(mine_block))
        .route("/peers", get(list_peers))
        .route("/addPeer", post(add_peer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /blocks
async fn list_blocks(State(state): State<ApiState>) -> Json<Vec<Block>> {
    Json(state.sync.blocks())
}

/// POST /mineBlock
async fn mine_block(
    State(state): State<ApiState>,
    Json(payload): Json<MineBlockRequest>,
) -> Result<Json<Block>, (StatusCode, String)> {
    let block = state
        .sync
        .submit_block(payload.data)
        .map_err(|e| (StatusCode::CONFLICT, e.to_string()))?;
    info!(index = block.index, "Block mined via control surface");
    Ok(Json(block))
}

/// GET /peers
async fn list_peers(State(state): State<ApiState>) -> Json<Vec<String>> {
    Json(state.sync.peers())
}

/// POST /addPeer
async fn add_peer(
    State(state): State<ApiState>,
    Json(payload): Json<AddPeerRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let peer = payload.peer.trim();
    if !(peer.starts_with("ws://") || peer.starts_with("wss://")) {
        return Err((
            StatusCode::BAD_REQUEST,
            "peer must be a ws:// or wss:// URL".into(),
        ));
    }

    info!(%peer, "Dialing peer via control surface");
    state.transport.dial(peer.to_string());
    Ok(StatusCode::ACCEPTED)
}
