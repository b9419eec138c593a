use serde::{Deserialize, Serialize};

use crate::{
    Cell, ColonyId, Coord, GameResult, HubId, LogEntry, Phase, PlayerId,
};

/// An in-flight capital upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalUpgrade {
    pub target_level: u8,
    pub remaining_turns: u8,
}

/// A founded colony.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colony {
    pub id: ColonyId,
    pub at: Coord,
}

/// Serialized per-civilization state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CivSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub capital: Option<Coord>,
    pub capital_level: u8,
    pub capital_upgrade: Option<CapitalUpgrade>,
    pub colonies: Vec<Colony>,
    pub territory: Vec<Coord>,
    pub original_territories: Vec<Coord>,
    pub war_with: Vec<PlayerId>,
    pub truce_with: Vec<PlayerId>,
    pub truce_turns: Vec<(PlayerId, u8)>,
    pub truce_proposals: Vec<PlayerId>,
    pub eliminated: bool,
}

/// Serialized grid: `size * size` cells, row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: u32,
    pub cells: Vec<Cell>,
}

/// A decision blocking turn advance for the active civilization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PendingDecision {
    /// Manual tile-by-tile expansion: `remaining` claims left before the
    /// turn ends automatically.
    Expansion { hub: HubId, remaining: u32 },
    /// Forced-truce offer after capturing an enemy hub.
    ForcedTruce { with: PlayerId },
}

/// Complete synchronized game state.
///
/// The whole snapshot is broadcast after every committed action and adopted
/// wholesale by every follower; there is no delta protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub grid: GridSnapshot,
    pub players: Vec<CivSnapshot>,
    pub current_idx: u8,
    pub turn: u32,
    pub phase: Phase,
    /// Newest-first.
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub pending: Option<PendingDecision>,
    /// Engine RNG state, so the authoritative mutator's rolls stay
    /// reproducible across a full-state handoff.
    #[serde(default)]
    pub rng_state: [u8; 32],
    #[serde(default)]
    pub result: Option<GameResult>,
}
