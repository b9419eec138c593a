//! UDP transport over renet_netcode.
//!
//! The server binds one nonblocking socket and lets netcode handle client
//! handshakes and packet framing. Rooms are small (2-4 players) and
//! short-lived, so the transport runs in netcode's unsecure mode; there is
//! no token service in front of a room.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use renet::RenetServer;
use renet_netcode::{NetcodeServerTransport, ServerAuthentication, ServerConfig};
use tracing::{error, info};

/// Shared client/server protocol id, "MARCHLND" in ASCII.
pub const PROTOCOL_ID: u64 = 0x4D41_5243_484C_4E44;

/// The two knobs the server config feeds the transport.
pub struct TransportConfig {
    pub bind_address: SocketAddr,
    pub max_clients: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:7777".parse().expect("valid default address"),
            max_clients: 4,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("failed to read the bound address for {0}: {1}")]
    LocalAddrFailed(SocketAddr, std::io::Error),

    #[error("failed to configure socket: {0}")]
    SocketConfig(std::io::Error),

    #[error("failed to create transport: {0}")]
    TransportCreation(String),
}

/// Owns the netcode transport and pumps it once per server tick.
pub struct ServerRunner {
    transport: NetcodeServerTransport,
}

impl ServerRunner {
    pub fn bind(config: TransportConfig) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(config.bind_address)
            .map_err(|e| TransportError::BindFailed(config.bind_address, e))?;
        // Port 0 binds resolve to a real port; report the resolved one.
        let bound = socket
            .local_addr()
            .map_err(|e| TransportError::LocalAddrFailed(config.bind_address, e))?;
        socket
            .set_nonblocking(true)
            .map_err(TransportError::SocketConfig)?;

        let server_config = ServerConfig {
            current_time: unix_now(),
            max_clients: config.max_clients,
            protocol_id: PROTOCOL_ID,
            public_addresses: vec![bound],
            authentication: ServerAuthentication::Unsecure,
        };
        let transport = NetcodeServerTransport::new(server_config, socket)
            .map_err(|e| TransportError::TransportCreation(e.to_string()))?;

        info!(
            "Transport bound to {} (up to {} clients, protocol {:016x})",
            bound, config.max_clients, PROTOCOL_ID
        );
        Ok(Self { transport })
    }

    /// Receive pending packets into `renet` and flush outgoing ones.
    pub fn update(&mut self, renet: &mut RenetServer) {
        if let Err(e) = self.transport.update(unix_now(), renet) {
            error!("Transport update error: {e}");
        }
        self.transport.send_packets(renet);
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.addresses().first().copied()
    }
}

fn unix_now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}
