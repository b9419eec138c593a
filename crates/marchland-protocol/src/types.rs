use serde::{Deserialize, Serialize};

use crate::{ColonyId, PlayerId};

/// What stands on a claimed tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Capital,
    City,
    Land,
}

/// The anchor a stable tile counts against for expansion capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HubId {
    Capital,
    Colony { id: ColonyId },
}

/// How a tile came under its owner's control.
///
/// `Hub` tiles were claimed through founding or expansion and count against
/// that hub's capacity. `Captured` tiles are exclaves: taken by conquest,
/// worth less, defending at half strength, and consolidated into the nearest
/// hub when a truce is struck. `from` records the colony's previous owner
/// where one is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TileControl {
    Hub { hub: HubId },
    Captured { from: Option<PlayerId> },
}

impl TileControl {
    #[inline]
    pub fn is_exclave(&self) -> bool {
        matches!(self, TileControl::Captured { .. })
    }

    #[inline]
    pub fn hub(&self) -> Option<HubId> {
        match self {
            TileControl::Hub { hub } => Some(*hub),
            TileControl::Captured { .. } => None,
        }
    }
}

/// Ownership record for a claimed tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub owner: PlayerId,
    pub kind: CellKind,
    pub control: TileControl,
    pub level: u8,
}

/// One grid tile. Unowned tiles carry no site, so owner/kind/control are
/// all present or all absent by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub site: Option<Site>,
}

impl Cell {
    #[inline]
    pub fn owner(&self) -> Option<PlayerId> {
        self.site.map(|s| s.owner)
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        self.site.is_some()
    }

    #[inline]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner() == Some(player)
    }
}

/// Game lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Capitals are being placed, one per civilization in turn order.
    Setup,
    /// The main loop.
    Play,
    /// Terminal; no further mutation is accepted.
    End,
}
