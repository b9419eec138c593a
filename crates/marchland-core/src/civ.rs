use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use marchland_protocol::{CapitalUpgrade, CivSnapshot, Colony, Coord, PlayerId};

/// Capital level at which the technology victory fires.
pub const MAX_CAPITAL_LEVEL: u8 = 10;

/// Turns a truce lasts once struck.
pub const TRUCE_TURNS: u8 = 4;

/// Turns until a capital upgrade to `target_level` completes.
pub fn upgrade_cost_turns(target_level: u8) -> u8 {
    match target_level {
        2..=4 => 2,
        5..=8 => 3,
        9 => 4,
        10 => 5,
        _ => 2,
    }
}

/// One competing faction. Created at game configuration time, mutated
/// throughout play, never destroyed; defeat only sets `eliminated`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Civilization {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    /// Set exactly once, during setup.
    pub capital: Option<Coord>,
    pub capital_level: u8,
    /// At most one upgrade in flight.
    pub capital_upgrade: Option<CapitalUpgrade>,
    /// Append-only; colony ids are sequential per civilization.
    pub colonies: Vec<Colony>,
    /// All tiles currently owned; mirrors the grid for membership checks.
    pub territory: HashSet<Coord>,
    /// Tiles claimed through own growth rather than conquest.
    pub original_territories: HashSet<Coord>,
    pub war_with: HashSet<PlayerId>,
    pub truce_with: HashSet<PlayerId>,
    pub truce_turns: HashMap<PlayerId, u8>,
    /// Civilizations that have proposed truce to this one; consumed on
    /// accept/decline.
    pub truce_proposals: HashSet<PlayerId>,
    pub eliminated: bool,
}

impl Civilization {
    pub fn new(id: PlayerId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            capital: None,
            capital_level: 1,
            capital_upgrade: None,
            colonies: Vec::new(),
            territory: HashSet::new(),
            original_territories: HashSet::new(),
            war_with: HashSet::new(),
            truce_with: HashSet::new(),
            truce_turns: HashMap::new(),
            truce_proposals: HashSet::new(),
            eliminated: false,
        }
    }

    pub fn is_at_war(&self) -> bool {
        !self.war_with.is_empty()
    }

    pub fn colony_at(&self, at: Coord) -> Option<&Colony> {
        self.colonies.iter().find(|c| c.at == at)
    }

    /// Snapshot form, with set-like fields sorted so serialization (and the
    /// snapshot hash built on it) is deterministic.
    pub fn snapshot(&self) -> CivSnapshot {
        let mut territory: Vec<Coord> = self.territory.iter().copied().collect();
        territory.sort();
        let mut original_territories: Vec<Coord> =
            self.original_territories.iter().copied().collect();
        original_territories.sort();
        let mut war_with: Vec<PlayerId> = self.war_with.iter().copied().collect();
        war_with.sort();
        let mut truce_with: Vec<PlayerId> = self.truce_with.iter().copied().collect();
        truce_with.sort();
        let mut truce_turns: Vec<(PlayerId, u8)> =
            self.truce_turns.iter().map(|(k, v)| (*k, *v)).collect();
        truce_turns.sort();
        let mut truce_proposals: Vec<PlayerId> = self.truce_proposals.iter().copied().collect();
        truce_proposals.sort();

        CivSnapshot {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            capital: self.capital,
            capital_level: self.capital_level,
            capital_upgrade: self.capital_upgrade,
            colonies: self.colonies.clone(),
            territory,
            original_territories,
            war_with,
            truce_with,
            truce_turns,
            truce_proposals,
            eliminated: self.eliminated,
        }
    }

    pub fn from_snapshot(snap: &CivSnapshot) -> Self {
        Self {
            id: snap.id,
            name: snap.name.clone(),
            color: snap.color.clone(),
            capital: snap.capital,
            capital_level: snap.capital_level,
            capital_upgrade: snap.capital_upgrade,
            colonies: snap.colonies.clone(),
            territory: snap.territory.iter().copied().collect(),
            original_territories: snap.original_territories.iter().copied().collect(),
            war_with: snap.war_with.iter().copied().collect(),
            truce_with: snap.truce_with.iter().copied().collect(),
            truce_turns: snap.truce_turns.iter().copied().collect(),
            truce_proposals: snap.truce_proposals.iter().copied().collect(),
            eliminated: snap.eliminated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_cost_schedule() {
        // Levels 2..10 cost 2,2,2,3,3,3,3,4,5 turns.
        let costs: Vec<u8> = (2..=10).map(upgrade_cost_turns).collect();
        assert_eq!(costs, vec![2, 2, 2, 3, 3, 3, 3, 4, 5]);
        assert_eq!(upgrade_cost_turns(11), 2);
    }

    #[test]
    fn snapshot_roundtrip_preserves_relations() {
        let mut civ = Civilization::new(PlayerId(0), "Alice", "#e74c3c");
        civ.capital = Some(Coord::new(7, 7));
        civ.territory.insert(Coord::new(7, 7));
        civ.territory.insert(Coord::new(7, 8));
        civ.original_territories.insert(Coord::new(7, 7));
        civ.war_with.insert(PlayerId(1));
        civ.truce_turns.insert(PlayerId(2), 3);
        civ.truce_with.insert(PlayerId(2));

        let restored = Civilization::from_snapshot(&civ.snapshot());
        assert_eq!(restored, civ);
    }

    #[test]
    fn snapshot_set_fields_are_sorted() {
        let mut civ = Civilization::new(PlayerId(0), "Alice", "#e74c3c");
        civ.territory.insert(Coord::new(9, 9));
        civ.territory.insert(Coord::new(1, 1));
        civ.territory.insert(Coord::new(5, 5));

        let snap = civ.snapshot();
        let mut sorted = snap.territory.clone();
        sorted.sort();
        assert_eq!(snap.territory, sorted);
    }
}
