use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// How the game was won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryKind {
    /// Capital reached the maximum level.
    Technology,
    /// Every rival civilization was eliminated.
    Conquest,
}

/// Terminal outcome, set when the phase transitions to `End`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: PlayerId,
    pub kind: VictoryKind,
}
