use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// Category of an in-game log entry, used by the UI for styling/filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogCategory {
    War,
    Peace,
    Growth,
    Info,
}

/// One entry in the shared game log.
///
/// The log is part of synchronized game state, not server diagnostics. It is
/// kept newest-first: new entries are inserted at the front.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: u32,
    /// Acting civilization, or none for game-wide announcements.
    pub player: Option<PlayerId>,
    pub text: String,
    pub category: LogCategory,
}
