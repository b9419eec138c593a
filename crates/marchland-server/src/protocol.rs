//! Network protocol messages for multiplayer.
//!
//! Extends marchland-protocol with lobby and session messages.

use serde::{Deserialize, Serialize};

use marchland_protocol::{ActionError, Command, GameResult, PlayerId, Snapshot};

/// Client-to-server messages
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Request to join the game
    JoinRequest {
        player_name: String,
        /// Optional reconnection token
        reconnect_token: Option<String>,
    },
    /// Change name or color while in the lobby
    Customize {
        name: Option<String>,
        color: Option<String>,
    },
    /// Set ready state in lobby
    SetReady { ready: bool },
    /// Request to start the game (host only)
    StartGame,
    /// Submit one game action
    Action { command: Command },
    /// Chat message
    Chat { message: String },
    /// Query the room directory entry
    QueryRoom,
    /// Request current game state (for reconnection)
    RequestState,
}

/// Server-to-client messages
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Connection accepted
    JoinAccepted {
        player_id: PlayerId,
        reconnect_token: String,
    },
    /// Connection rejected
    JoinRejected { reason: JoinRejectReason },
    /// Current lobby state (sent on join and when the lobby changes)
    LobbyState {
        players: Vec<LobbyPlayer>,
        host: PlayerId,
        room: RoomInfo,
    },
    /// The game has started; full initial state follows
    GameStarted {
        your_id: PlayerId,
        snapshot: Snapshot,
        checksum: u64,
    },
    /// Full state after a committed action. Clients adopt it wholesale.
    SyncState { snapshot: Snapshot, checksum: u64 },
    /// The submitted action was rejected; state is unchanged
    ActionRejected { error: ActionError },
    /// Chat message from another player
    Chat { from: PlayerId, message: String },
    /// Room directory entry
    RoomInfo { room: RoomInfo },
    /// Player disconnected
    PlayerDisconnected { player_id: PlayerId },
    /// Player reconnected
    PlayerReconnected { player_id: PlayerId },
    /// Game ended
    GameEnded { result: GameResult },
}

/// Reasons for rejecting a join request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinRejectReason {
    GameFull,
    GameInProgress,
    InvalidReconnectToken,
}

/// Player info for lobby state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub color: String,
    pub ready: bool,
    pub is_host: bool,
}

/// Minimal room directory entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: String,
    pub name: String,
    pub player_count: u8,
    pub max_players: u8,
    pub host_name: Option<String>,
}

/// Serialize a client message for network transmission
pub fn serialize_client_message(msg: &ClientMessage) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::encode::to_vec(msg)
}

/// Deserialize a client message from network data
pub fn deserialize_client_message(data: &[u8]) -> Result<ClientMessage, rmp_serde::decode::Error> {
    rmp_serde::decode::from_slice(data)
}

/// Serialize a server message for network transmission
pub fn serialize_server_message(msg: &ServerMessage) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::encode::to_vec(msg)
}

/// Deserialize a server message from network data
pub fn deserialize_server_message(data: &[u8]) -> Result<ServerMessage, rmp_serde::decode::Error> {
    rmp_serde::decode::from_slice(data)
}
