//! Marchland Multiplayer Server
//!
//! Authoritative server using Renet for networking.
//! Supports 2-4 players taking turns over a shared grid.

pub mod channels;
pub mod config;
pub mod player_manager;
pub mod protocol;
pub mod session;
pub mod transport;

pub use channels::*;
pub use config::{ConfigError, ServerConfig};
pub use player_manager::{AddPlayerError, LobbyError, Player, PlayerManager, PlayerState, ReconnectError};
pub use protocol::*;
pub use session::{ApplyOutcome, Session};
pub use transport::{ServerRunner, TransportConfig, TransportError, PROTOCOL_ID};
