//! Unified player management combining lobby and connection state.
//!
//! Prevents race conditions by managing player lifecycle atomically.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use marchland_core::DEFAULT_COLORS;
use marchland_protocol::PlayerId;
use rand::Rng;

use crate::protocol::LobbyPlayer;

/// Player lifecycle state
#[derive(Clone, Debug)]
pub enum PlayerState {
    /// In lobby, waiting for game to start
    InLobby { ready: bool },
    /// Connected and playing
    Playing {
        connected_at: Instant,
        last_activity: Instant,
    },
    /// Disconnected during game, in grace period
    Disconnected { disconnected_at: Instant },
}

/// Unified player info
#[derive(Clone, Debug)]
pub struct Player {
    pub player_id: PlayerId,
    pub name: String,
    pub color: String,
    pub client_id: Option<u64>,
    pub reconnect_token: String,
    pub state: PlayerState,
}

/// Unified player manager handling lobby, connections, and game lifecycle
pub struct PlayerManager {
    /// All players
    players: HashMap<PlayerId, Player>,
    /// Client ID to player mapping
    client_to_player: HashMap<u64, PlayerId>,
    /// Reconnection tokens
    tokens: HashMap<String, PlayerId>,
    /// Host player ID
    host: Option<PlayerId>,
    /// Whether game has started
    game_started: bool,
    /// Configuration
    min_players: u8,
    max_players: u8,
    disconnect_grace: Duration,
}

/// Errors when adding a player
#[derive(Clone, Debug, thiserror::Error)]
pub enum AddPlayerError {
    #[error("Game is full")]
    GameFull,
    #[error("Game already started")]
    GameInProgress,
    #[error("Player already exists")]
    AlreadyExists,
}

/// Errors when reconnecting
#[derive(Clone, Debug, thiserror::Error)]
pub enum ReconnectError {
    #[error("Invalid reconnect token")]
    InvalidToken,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("Player already connected")]
    AlreadyConnected,
    #[error("Cannot reconnect during lobby")]
    NotInGame,
}

/// Errors for lobby operations
#[derive(Clone, Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("Game already started")]
    GameAlreadyStarted,
    #[error("Player not in lobby")]
    PlayerNotFound,
    #[error("Cannot start: not enough players or not all ready")]
    CannotStart,
    #[error("Only host can perform this action")]
    NotHost,
}

impl PlayerManager {
    pub fn new(min_players: u8, max_players: u8, disconnect_grace: Duration) -> Self {
        Self {
            players: HashMap::new(),
            client_to_player: HashMap::new(),
            tokens: HashMap::new(),
            host: None,
            game_started: false,
            min_players,
            max_players,
            disconnect_grace,
        }
    }

    /// Add a new player (handles both lobby and connection state atomically)
    pub fn add_player(
        &mut self,
        client_id: u64,
        name: String,
    ) -> Result<(PlayerId, String), AddPlayerError> {
        if self.game_started {
            return Err(AddPlayerError::GameInProgress);
        }
        if self.client_to_player.contains_key(&client_id) {
            return Err(AddPlayerError::AlreadyExists);
        }
        if self.player_count() >= self.max_players as usize {
            return Err(AddPlayerError::GameFull);
        }

        let player_id = self.next_player_id()?;
        let token = generate_token();

        let player = Player {
            player_id,
            name,
            color: DEFAULT_COLORS[player_id.0 as usize % DEFAULT_COLORS.len()].to_string(),
            client_id: Some(client_id),
            reconnect_token: token.clone(),
            state: PlayerState::InLobby { ready: false },
        };

        self.players.insert(player_id, player);
        self.client_to_player.insert(client_id, player_id);
        self.tokens.insert(token.clone(), player_id);

        // First player becomes host
        if self.host.is_none() {
            self.host = Some(player_id);
        }

        Ok((player_id, token))
    }

    /// Reconnect a player using their token
    pub fn reconnect(&mut self, client_id: u64, token: &str) -> Result<PlayerId, ReconnectError> {
        let player_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(ReconnectError::InvalidToken)?;

        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(ReconnectError::PlayerNotFound)?;

        match &player.state {
            PlayerState::InLobby { .. } => Err(ReconnectError::NotInGame),
            PlayerState::Playing { .. } => Err(ReconnectError::AlreadyConnected),
            PlayerState::Disconnected { .. } => {
                let now = Instant::now();
                player.state = PlayerState::Playing {
                    connected_at: now,
                    last_activity: now,
                };
                player.client_id = Some(client_id);
                self.client_to_player.insert(client_id, player_id);
                Ok(player_id)
            }
        }
    }

    /// Handle client disconnect
    pub fn disconnect(&mut self, client_id: u64) -> Option<PlayerId> {
        let player_id = self.client_to_player.remove(&client_id)?;
        let player = self.players.get_mut(&player_id)?;

        match &player.state {
            PlayerState::InLobby { .. } => {
                // Remove from lobby entirely
                self.players.remove(&player_id);
                self.tokens.retain(|_, id| *id != player_id);

                // Reassign host if needed
                if self.host == Some(player_id) {
                    let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
                    ids.sort();
                    self.host = ids.first().copied();
                }
            }
            PlayerState::Playing { .. } => {
                // Transition to disconnected (grace period)
                player.state = PlayerState::Disconnected {
                    disconnected_at: Instant::now(),
                };
                player.client_id = None;
            }
            PlayerState::Disconnected { .. } => {}
        }

        Some(player_id)
    }

    /// Change name or color while in the lobby
    pub fn customize(
        &mut self,
        player_id: PlayerId,
        name: Option<String>,
        color: Option<String>,
    ) -> Result<(), LobbyError> {
        if self.game_started {
            return Err(LobbyError::GameAlreadyStarted);
        }
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(LobbyError::PlayerNotFound)?;
        if let Some(name) = name {
            player.name = name;
        }
        if let Some(color) = color {
            player.color = color;
        }
        Ok(())
    }

    /// Set ready state for a player in lobby
    pub fn set_ready(&mut self, player_id: PlayerId, ready: bool) -> Result<(), LobbyError> {
        if self.game_started {
            return Err(LobbyError::GameAlreadyStarted);
        }

        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(LobbyError::PlayerNotFound)?;

        if let PlayerState::InLobby { ready: r } = &mut player.state {
            *r = ready;
            Ok(())
        } else {
            Err(LobbyError::PlayerNotFound)
        }
    }

    /// Check if game can start (enough ready players)
    pub fn can_start(&self) -> bool {
        if self.game_started {
            return false;
        }

        let ready_count = self
            .players
            .values()
            .filter(|p| matches!(p.state, PlayerState::InLobby { ready: true }))
            .count();
        let player_count = self.player_count();

        player_count >= self.min_players as usize && ready_count == player_count
    }

    /// Start the game - transitions all lobby players to playing state
    pub fn start_game(&mut self) -> Result<Vec<PlayerId>, LobbyError> {
        if self.game_started {
            return Err(LobbyError::GameAlreadyStarted);
        }
        if !self.can_start() {
            return Err(LobbyError::CannotStart);
        }

        self.game_started = true;
        let now = Instant::now();

        let mut player_ids = Vec::new();
        for player in self.players.values_mut() {
            if let PlayerState::InLobby { .. } = player.state {
                player.state = PlayerState::Playing {
                    connected_at: now,
                    last_activity: now,
                };
                player_ids.push(player.player_id);
            }
        }

        player_ids.sort_by_key(|p| p.0);
        Ok(player_ids)
    }

    /// True when the player has been disconnected longer than the grace
    /// period. Used to pass over a stalled turn holder.
    pub fn grace_expired(&self, player_id: PlayerId) -> bool {
        self.players
            .get(&player_id)
            .map(|p| match p.state {
                PlayerState::Disconnected { disconnected_at } => {
                    disconnected_at.elapsed() >= self.disconnect_grace
                }
                _ => false,
            })
            .unwrap_or(false)
    }

    /// Update activity timestamp for a connected player
    pub fn update_activity(&mut self, client_id: u64) {
        if let Some(player_id) = self.client_to_player.get(&client_id) {
            if let Some(player) = self.players.get_mut(player_id) {
                if let PlayerState::Playing { last_activity, .. } = &mut player.state {
                    *last_activity = Instant::now();
                }
            }
        }
    }

    // --- Query methods ---

    pub fn get_player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn get_player_name(&self, player_id: PlayerId) -> Option<String> {
        self.players.get(&player_id).map(|p| p.name.clone())
    }

    pub fn get_player_by_client(&self, client_id: u64) -> Option<PlayerId> {
        self.client_to_player.get(&client_id).copied()
    }

    pub fn is_host(&self, player_id: PlayerId) -> bool {
        self.host == Some(player_id)
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn has_started(&self) -> bool {
        self.game_started
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_connected(&self, player_id: PlayerId) -> bool {
        self.players
            .get(&player_id)
            .map(|p| matches!(p.state, PlayerState::Playing { .. }))
            .unwrap_or(false)
    }

    pub fn connected_clients(&self) -> Vec<u64> {
        self.players.values().filter_map(|p| p.client_id).collect()
    }

    /// Name/color pairs in player-id order, for game construction
    pub fn roster(&self) -> Vec<(PlayerId, String, String)> {
        let mut roster: Vec<(PlayerId, String, String)> = self
            .players
            .values()
            .map(|p| (p.player_id, p.name.clone(), p.color.clone()))
            .collect();
        roster.sort_by_key(|(id, _, _)| id.0);
        roster
    }

    pub fn get_lobby_state(&self) -> Vec<LobbyPlayer> {
        let mut players: Vec<LobbyPlayer> = self
            .players
            .values()
            .filter(|p| matches!(p.state, PlayerState::InLobby { .. }))
            .map(|p| {
                let ready = matches!(p.state, PlayerState::InLobby { ready: true });
                LobbyPlayer {
                    player_id: p.player_id,
                    name: p.name.clone(),
                    color: p.color.clone(),
                    ready,
                    is_host: self.host == Some(p.player_id),
                }
            })
            .collect();
        players.sort_by_key(|p| p.player_id.0);
        players
    }

    pub fn min_players(&self) -> u8 {
        self.min_players
    }

    pub fn max_players(&self) -> u8 {
        self.max_players
    }

    fn next_player_id(&self) -> Result<PlayerId, AddPlayerError> {
        for i in 0..self.max_players {
            let id = PlayerId(i);
            if !self.players.contains_key(&id) {
                return Ok(id);
            }
        }
        Err(AddPlayerError::GameFull)
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}
