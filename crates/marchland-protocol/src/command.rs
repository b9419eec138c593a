use serde::{Deserialize, Serialize};

use crate::{Coord, HubId, PlayerId};

/// All possible player intents. Fully serializable.
///
/// Every command is evaluated against the acting player and either commits a
/// state transition (usually ending the turn) or is rejected leaving state
/// untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    // Setup
    PlaceCapital { at: Coord },

    // Territory
    FoundColony { at: Coord },
    UpgradeColony { at: Coord },
    StartCapitalUpgrade,
    Expand { hub: HubId },
    /// One step of a pending manual expansion.
    ClaimTile { at: Coord },
    /// Abandon a pending manual expansion without advancing the turn.
    CancelExpansion,

    // Diplomacy
    DeclareWar { target: PlayerId },
    ProposeTruce { target: PlayerId },
    /// Accept or decline a truce proposal queued from `to`.
    RespondTruce { to: PlayerId, accept: bool },
    /// Accept or continue the war after capturing an enemy hub.
    ResolveForcedTruce { accept: bool },

    // Combat
    Invade,

    // Turn flow
    Pass,
}
