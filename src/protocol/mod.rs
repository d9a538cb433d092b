// Wire protocol: JSON text frames exchanged over the WebSocket

use crate::error::SessionError;
use crate::session::Frame;
use crate::world::{Position, Region, Target};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;


/// Role declared in the handshake.
///
/// `drone` and `admin` are accepted for older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[serde(alias = "drone")]
    Agent,
    #[serde(alias = "admin")]
    Observer,
}

/// Client → Server message types
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "register")]
    Register {
        #[serde(default, alias = "client_type")]
        role: Role,
        #[serde(default, rename = "agentId", alias = "drone_id")]
        agent_id: Option<String>,
    },
    #[serde(rename = "pos")]
    Pos { pos: Position },
    #[serde(rename = "requestUpdate", alias = "request_update")]
    RequestUpdate,
    /// Any other `type`; ignored so newer clients keep working
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse one text frame
    pub fn parse(text: &str) -> Result<Self, SessionError> {
        serde_json::from_str(text).map_err(|e| SessionError::MalformedMessage(e.to_string()))
    }
}

/// Full world view served to observers and `GET /api/world`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    pub agents: BTreeMap<String, Position>,
    pub targets: Vec<Target>,
    pub regions: Vec<Region>,
    pub world_size: f64,
    pub timestamp: DateTime<Utc>,
}

/// Server → Client message types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init", rename_all = "camelCase")]
    Init {
        agent_id: String,
        region: Option<Region>,
        targets: Vec<Target>,
        world_size: f64,
    },
    #[serde(rename = "targetsDetected")]
    TargetsDetected { targets: Vec<Target> },
    #[serde(rename = "positions")]
    Positions {
        agents: BTreeMap<String, Position>,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "worldState")]
    WorldState(WorldState),
}

impl ServerMessage {
    /// Serialize once into a frame that can be queued on many connections
    pub fn to_frame(&self) -> Result<Frame, SessionError> {
        encode_frame(self)
    }
}

/// Serialize any outbound payload into a text frame
pub fn encode_frame<T: Serialize + ?Sized>(message: &T) -> Result<Frame, SessionError> {
    serde_json::to_string(message)
        .map(Frame::from)
        .map_err(|e| SessionError::MalformedMessage(format!("failed to encode frame: {}", e)))
}
