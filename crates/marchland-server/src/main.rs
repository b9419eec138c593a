//! Marchland Multiplayer Server
//!
//! Authoritative game server for 2-4 players. Clients submit commands; the
//! server applies them to the engine and broadcasts the full state after
//! every committed action.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use marchland_core::PlayerSetup;
use marchland_protocol::PlayerId;
use rand::Rng;
use renet::{ConnectionConfig, RenetServer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use marchland_server::{
    channel_id,
    config::ServerConfig as AppConfig,
    create_channel_configs,
    player_manager::{AddPlayerError, PlayerManager},
    protocol::{
        deserialize_client_message, serialize_server_message, ClientMessage, JoinRejectReason,
        RoomInfo, ServerMessage,
    },
    session::{ApplyOutcome, Session},
};

/// Server state
struct Server {
    /// Renet server
    renet: RenetServer,
    /// Application config
    config: AppConfig,
    /// Unified player manager (handles lobby and connections)
    players: PlayerManager,
    /// Game session (None until the host starts)
    session: Option<Session>,
    /// Random room identifier for the directory entry
    room_id: String,
}

impl Server {
    fn new(config: AppConfig) -> Self {
        let connection_config = ConnectionConfig {
            available_bytes_per_tick: 60_000,
            server_channels_config: create_channel_configs(),
            client_channels_config: create_channel_configs(),
        };

        let renet = RenetServer::new(connection_config);

        let players = PlayerManager::new(
            config.min_players,
            config.max_players,
            config.disconnect_grace(),
        );

        Self {
            renet,
            config,
            players,
            session: None,
            room_id: generate_room_id(),
        }
    }

    /// Main server loop tick
    fn update(&mut self, _delta: Duration) {
        // Process server events
        while let Some(event) = self.renet.get_event() {
            self.handle_server_event(event);
        }

        // Process client messages
        for client_id in self.renet.clients_id() {
            while let Some(message) = self.renet.receive_message(client_id, channel_id::COMMANDS) {
                self.handle_client_message(client_id, &message);
            }
        }

        // Pass over a turn holder whose disconnect grace expired
        self.release_stalled_turn();
    }

    fn release_stalled_turn(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        if session.is_over() {
            return;
        }
        let holder = session.current_player();
        if !self.players.grace_expired(holder) {
            return;
        }

        info!("Releasing stalled turn for {}", holder);
        if let Some((snapshot, checksum)) = session.force_pass(holder) {
            self.broadcast_message(ServerMessage::SyncState { snapshot, checksum });
            self.broadcast_game_end_if_over();
        }
    }

    fn handle_server_event(&mut self, event: renet::ServerEvent) {
        match event {
            renet::ServerEvent::ClientConnected { client_id } => {
                info!("Client {:?} connected", client_id);
            }
            renet::ServerEvent::ClientDisconnected { client_id, reason } => {
                info!("Client {:?} disconnected: {:?}", client_id, reason);
                if let Some(player_id) = self.players.disconnect(client_id) {
                    self.broadcast_message(ServerMessage::PlayerDisconnected { player_id });
                    if !self.players.has_started() {
                        self.broadcast_lobby_state();
                    }
                }
            }
        }
    }

    fn handle_client_message(&mut self, client_id: u64, data: &[u8]) {
        let message = match deserialize_client_message(data) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Failed to deserialize message from {:?}: {}", client_id, e);
                return;
            }
        };

        self.players.update_activity(client_id);

        match message {
            ClientMessage::JoinRequest {
                player_name,
                reconnect_token,
            } => {
                self.handle_join_request(client_id, player_name, reconnect_token);
            }
            ClientMessage::Customize { name, color } => {
                self.handle_customize(client_id, name, color);
            }
            ClientMessage::SetReady { ready } => {
                self.handle_set_ready(client_id, ready);
            }
            ClientMessage::StartGame => {
                self.handle_start_game(client_id);
            }
            ClientMessage::Action { command } => {
                self.handle_action(client_id, command);
            }
            ClientMessage::Chat { message } => {
                self.handle_chat(client_id, message);
            }
            ClientMessage::QueryRoom => {
                let room = self.room_info();
                self.send_message(client_id, ServerMessage::RoomInfo { room });
            }
            ClientMessage::RequestState => {
                self.handle_state_request(client_id);
            }
        }
    }

    fn handle_join_request(
        &mut self,
        client_id: u64,
        player_name: String,
        reconnect_token: Option<String>,
    ) {
        // Try reconnection first
        if let Some(token) = reconnect_token {
            match self.players.reconnect(client_id, &token) {
                Ok(player_id) => {
                    info!("Player {} reconnected as {}", player_name, player_id);
                    self.broadcast_message(ServerMessage::PlayerReconnected { player_id });
                    self.send_current_state(client_id);
                    return;
                }
                Err(e) => {
                    warn!("Reconnection failed for {}: {:?}", player_name, e);
                    self.send_message(
                        client_id,
                        ServerMessage::JoinRejected {
                            reason: JoinRejectReason::InvalidReconnectToken,
                        },
                    );
                    return;
                }
            }
        }

        match self.players.add_player(client_id, player_name.clone()) {
            Ok((player_id, token)) => {
                info!("Player {} joined as {}", player_name, player_id);
                self.send_message(
                    client_id,
                    ServerMessage::JoinAccepted {
                        player_id,
                        reconnect_token: token,
                    },
                );
                self.broadcast_lobby_state();
            }
            Err(AddPlayerError::GameFull) => {
                self.send_message(
                    client_id,
                    ServerMessage::JoinRejected {
                        reason: JoinRejectReason::GameFull,
                    },
                );
            }
            Err(AddPlayerError::GameInProgress) => {
                self.send_message(
                    client_id,
                    ServerMessage::JoinRejected {
                        reason: JoinRejectReason::GameInProgress,
                    },
                );
            }
            Err(AddPlayerError::AlreadyExists) => {
                warn!("Player already exists for client {:?}", client_id);
            }
        }
    }

    fn handle_customize(&mut self, client_id: u64, name: Option<String>, color: Option<String>) {
        let Some(player_id) = self.players.get_player_by_client(client_id) else {
            return;
        };
        if self.players.customize(player_id, name, color).is_ok() {
            self.broadcast_lobby_state();
        }
    }

    fn handle_set_ready(&mut self, client_id: u64, ready: bool) {
        let Some(player_id) = self.players.get_player_by_client(client_id) else {
            return;
        };
        if self.players.set_ready(player_id, ready).is_ok() {
            self.broadcast_lobby_state();
        }
    }

    fn handle_start_game(&mut self, client_id: u64) {
        let Some(player_id) = self.players.get_player_by_client(client_id) else {
            return;
        };
        if !self.players.is_host(player_id) {
            warn!("Non-host {} tried to start game", player_id);
            return;
        }
        if !self.players.can_start() {
            warn!("Cannot start: not enough players or not all ready");
            return;
        }
        let Ok(player_ids) = self.players.start_game() else {
            return;
        };

        info!("Starting game with {} players", player_ids.len());

        let setups: Vec<PlayerSetup> = self
            .players
            .roster()
            .into_iter()
            .map(|(_, name, color)| PlayerSetup { name, color })
            .collect();

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        let session = Session::new(setups, seed);
        let snapshot = session.snapshot().clone();
        let checksum = session.checksum();
        self.session = Some(session);

        for &player_id in &player_ids {
            let Some(client) = self
                .players
                .get_player(player_id)
                .and_then(|p| p.client_id)
            else {
                continue;
            };
            self.send_message(
                client,
                ServerMessage::GameStarted {
                    your_id: player_id,
                    snapshot: snapshot.clone(),
                    checksum,
                },
            );
        }
    }

    fn handle_action(&mut self, client_id: u64, command: marchland_protocol::Command) {
        let Some(player_id) = self.players.get_player_by_client(client_id) else {
            warn!("Action from unknown client {:?}", client_id);
            return;
        };
        let Some(session) = &mut self.session else {
            warn!("Action before game started");
            return;
        };

        match session.apply(player_id, command) {
            ApplyOutcome::Applied { snapshot, checksum } => {
                self.broadcast_message(ServerMessage::SyncState { snapshot, checksum });
                self.broadcast_game_end_if_over();
            }
            ApplyOutcome::Rejected(error) => {
                self.send_message(client_id, ServerMessage::ActionRejected { error });
            }
            ApplyOutcome::Ignored => {
                // Out-of-turn submission, dropped without a reply.
            }
        }
    }

    fn broadcast_game_end_if_over(&mut self) {
        let Some(result) = self.session.as_ref().and_then(|s| s.result()) else {
            return;
        };
        info!("Game over: {:?} wins by {:?}", result.winner, result.kind);
        self.broadcast_message(ServerMessage::GameEnded { result });
    }

    fn handle_chat(&mut self, client_id: u64, message: String) {
        if let Some(player_id) = self.players.get_player_by_client(client_id) {
            self.broadcast_message(ServerMessage::Chat {
                from: player_id,
                message,
            });
        }
    }

    fn handle_state_request(&mut self, client_id: u64) {
        self.send_current_state(client_id);
    }

    fn send_current_state(&mut self, client_id: u64) {
        let Some(session) = &self.session else {
            return;
        };
        let snapshot = session.snapshot().clone();
        let checksum = session.checksum();
        self.send_message(client_id, ServerMessage::SyncState { snapshot, checksum });
    }

    fn room_info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            name: self.config.room_name.clone(),
            player_count: self.players.player_count() as u8,
            max_players: self.players.max_players(),
            host_name: self
                .players
                .host()
                .and_then(|id| self.players.get_player_name(id)),
        }
    }

    fn broadcast_lobby_state(&mut self) {
        let players = self.players.get_lobby_state();
        let host = self.players.host().unwrap_or(PlayerId(0));
        let room = self.room_info();
        self.broadcast_message(ServerMessage::LobbyState {
            players,
            host,
            room,
        });
    }

    fn send_message(&mut self, client_id: u64, message: ServerMessage) {
        if let Ok(data) = serialize_server_message(&message) {
            let channel = match &message {
                ServerMessage::Chat { .. } => channel_id::CHAT,
                _ => channel_id::COMMANDS,
            };
            self.renet.send_message(client_id, channel, data);
        }
    }

    fn broadcast_message(&mut self, message: ServerMessage) {
        if let Ok(data) = serialize_server_message(&message) {
            let channel = match &message {
                ServerMessage::Chat { .. } => channel_id::CHAT,
                _ => channel_id::COMMANDS,
            };
            self.renet.broadcast_message(channel, data);
        }
    }

    /// Access to Renet server for transport integration
    pub fn renet_server(&mut self) -> &mut RenetServer {
        &mut self.renet
    }
}

fn generate_room_id() -> String {
    let mut rng = rand::thread_rng();
    (0..6)
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

fn main() {
    // RUST_LOG wins; fall back to info-level server logs.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marchland_server=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match AppConfig::from_yaml_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    let mut server = Server::new(config.clone());

    // Create transport layer
    let transport_config = marchland_server::TransportConfig {
        bind_address: config.bind_address,
        max_clients: config.max_players as usize,
    };

    let mut transport = match marchland_server::ServerRunner::bind(transport_config) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to create transport: {}", e);
            std::process::exit(1);
        }
    };

    info!("Marchland Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}", config.bind_address);
    info!("Protocol ID: {:016x}", marchland_server::PROTOCOL_ID);

    // Main server loop
    let tick_duration = Duration::from_millis(16); // ~60 Hz
    loop {
        let start = Instant::now();

        // Update transport (receive/send packets)
        transport.update(server.renet_server());

        // Update game logic
        server.update(tick_duration);

        let elapsed = start.elapsed();
        if let Some(sleep_time) = tick_duration.checked_sub(elapsed) {
            std::thread::sleep(sleep_time);
        }
    }
}
