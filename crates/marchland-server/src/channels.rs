//! Renet channel layout.
//!
//! Everything that mutates or mirrors game state rides the ordered channel:
//! command submissions upstream, full `SyncState` snapshots downstream. Chat
//! and lobby notifications are reliable but order-tolerant, and heartbeats
//! may be dropped outright.

use std::time::Duration;

use renet::{ChannelConfig, SendType};

/// Channel ids shared with the client.
pub mod channel_id {
    /// Commands upstream, full-state sync downstream; order matters.
    pub const COMMANDS: u8 = 0;
    /// Chat relay and lobby notifications.
    pub const CHAT: u8 = 1;
    /// Keepalive pings.
    pub const HEARTBEAT: u8 = 2;
}

const RESEND: Duration = Duration::from_millis(300);

// Full snapshots dominate traffic, so the sync channel gets most of the
// memory budget.
const SYNC_BUFFER: usize = 5 * 1024 * 1024;
const CHAT_BUFFER: usize = 512 * 1024;
const HEARTBEAT_BUFFER: usize = 64 * 1024;

pub fn create_channel_configs() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig {
            channel_id: channel_id::COMMANDS,
            max_memory_usage_bytes: SYNC_BUFFER,
            send_type: SendType::ReliableOrdered {
                resend_time: RESEND,
            },
        },
        ChannelConfig {
            channel_id: channel_id::CHAT,
            max_memory_usage_bytes: CHAT_BUFFER,
            send_type: SendType::ReliableUnordered {
                resend_time: RESEND,
            },
        },
        ChannelConfig {
            channel_id: channel_id::HEARTBEAT,
            max_memory_usage_bytes: HEARTBEAT_BUFFER,
            send_type: SendType::Unreliable,
        },
    ]
}
