//! The root game aggregate and turn/phase state machine.

use marchland_protocol::{
    ActionError, CapitalUpgrade, Command, GameResult, LogCategory, LogEntry, PendingDecision,
    Phase, PlayerId, Snapshot, VictoryKind,
};

use crate::{
    combat, diplomacy, territory, upgrade_cost_turns, Civilization, GameRng, Grid,
    MAX_CAPITAL_LEVEL,
};

/// Placeholder palette for game configuration.
pub const DEFAULT_COLORS: [&str; 4] = ["#e74c3c", "#3498db", "#2ecc71", "#f1c40f"];

/// Civilization configuration supplied before setup begins.
#[derive(Clone, Debug)]
pub struct PlayerSetup {
    pub name: String,
    pub color: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("grid dimensions do not match the cell buffer")]
    MalformedGrid,
    #[error("current player index out of range")]
    BadPlayerIndex,
}

/// Complete game state. Mutated only through [`Game::apply`]; a rejected
/// command leaves the state byte-for-byte untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Game {
    grid: Grid,
    civs: Vec<Civilization>,
    current_idx: usize,
    turn: u32,
    phase: Phase,
    /// Newest-first.
    logs: Vec<LogEntry>,
    pending: Option<PendingDecision>,
    rng: GameRng,
    result: Option<GameResult>,
}

impl Game {
    pub fn new(players: Vec<PlayerSetup>, seed: u64) -> Self {
        let grid = Grid::for_player_count(players.len() as u8);
        let civs = players
            .into_iter()
            .enumerate()
            .map(|(i, p)| Civilization::new(PlayerId(i as u8), p.name, p.color))
            .collect();
        let mut game = Self {
            grid,
            civs,
            current_idx: 0,
            turn: 1,
            phase: Phase::Setup,
            logs: Vec::new(),
            pending: None,
            rng: GameRng::seed_from_u64(seed),
            result: None,
        };
        game.log(None, "A new world awaits. Place your capitals.", LogCategory::Info);
        game
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn civs(&self) -> &[Civilization] {
        &self.civs
    }

    pub fn civ(&self, id: PlayerId) -> Option<&Civilization> {
        self.civs.iter().find(|c| c.id == id)
    }

    pub fn current_player(&self) -> PlayerId {
        self.civs[self.current_idx].id
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn pending(&self) -> Option<PendingDecision> {
        self.pending
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Apply one command for `actor`.
    ///
    /// Commits the full transition or rejects it with no state change: the
    /// command runs against a scratch clone that replaces `self` only on
    /// success.
    pub fn apply(&mut self, actor: PlayerId, cmd: Command) -> Result<(), ActionError> {
        let mut scratch = self.clone();
        scratch.apply_inner(actor, cmd)?;
        *self = scratch;
        Ok(())
    }

    fn apply_inner(&mut self, actor: PlayerId, cmd: Command) -> Result<(), ActionError> {
        if self.phase == Phase::End {
            return Err(ActionError::WrongPhase);
        }
        if self.current_player() != actor {
            return Err(ActionError::NotYourTurn);
        }
        let idx = self.current_idx;

        if let Some(pending) = self.pending {
            let allowed = match pending {
                PendingDecision::Expansion { .. } => {
                    matches!(cmd, Command::ClaimTile { .. } | Command::CancelExpansion)
                }
                PendingDecision::ForcedTruce { .. } => {
                    matches!(cmd, Command::ResolveForcedTruce { .. })
                }
            };
            if !allowed {
                return Err(ActionError::DecisionPending);
            }
        }

        match cmd {
            Command::PlaceCapital { at } => {
                if self.phase != Phase::Setup {
                    return Err(ActionError::WrongPhase);
                }
                territory::place_capital(&mut self.grid, &mut self.civs, idx, at)?;
                let name = self.civs[idx].name.clone();
                self.log(
                    Some(actor),
                    format!("{name} founded their capital."),
                    LogCategory::Growth,
                );
                if self.civs.iter().all(|c| c.capital.is_some()) {
                    self.phase = Phase::Play;
                    self.log(
                        None,
                        "All capitals are founded. The struggle begins.",
                        LogCategory::Info,
                    );
                }
                self.end_turn();
                Ok(())
            }

            Command::FoundColony { at } => {
                self.require_play()?;
                let id = territory::found_colony(&mut self.grid, &mut self.civs, idx, at)?;
                let name = self.civs[idx].name.clone();
                self.log(
                    Some(actor),
                    format!("{name} founded {id}."),
                    LogCategory::Growth,
                );
                self.end_turn();
                Ok(())
            }

            Command::UpgradeColony { at } => {
                self.require_play()?;
                let level = territory::upgrade_colony(&mut self.grid, &mut self.civs, idx, at)?;
                let name = self.civs[idx].name.clone();
                self.log(
                    Some(actor),
                    format!("{name} upgraded a colony to level {level}."),
                    LogCategory::Growth,
                );
                self.end_turn();
                Ok(())
            }

            Command::StartCapitalUpgrade => {
                self.require_play()?;
                let civ = &mut self.civs[idx];
                if civ.capital_upgrade.is_some() {
                    return Err(ActionError::UpgradeInProgress);
                }
                if civ.capital_level >= MAX_CAPITAL_LEVEL {
                    return Err(ActionError::LevelCap);
                }
                let target_level = civ.capital_level + 1;
                civ.capital_upgrade = Some(CapitalUpgrade {
                    target_level,
                    remaining_turns: upgrade_cost_turns(target_level),
                });
                let name = civ.name.clone();
                self.log(
                    Some(actor),
                    format!("{name} began upgrading their capital to level {target_level}."),
                    LogCategory::Growth,
                );
                self.end_turn();
                Ok(())
            }

            Command::Expand { hub } => {
                self.require_play()?;
                match territory::begin_expansion(&mut self.grid, &mut self.civs, idx, hub)? {
                    territory::ExpansionStart::Completed { claimed } => {
                        let name = self.civs[idx].name.clone();
                        self.log(
                            Some(actor),
                            format!("{name} expanded by {claimed} tiles."),
                            LogCategory::Growth,
                        );
                        self.end_turn();
                    }
                    territory::ExpansionStart::Manual { remaining } => {
                        self.pending = Some(PendingDecision::Expansion { hub, remaining });
                    }
                }
                Ok(())
            }

            Command::ClaimTile { at } => {
                self.require_play()?;
                let Some(PendingDecision::Expansion { hub, remaining }) = self.pending else {
                    return Err(ActionError::NoPendingDecision);
                };
                territory::claim_expansion_tile(&mut self.grid, &mut self.civs, idx, hub, at)?;
                let remaining = remaining - 1;
                if remaining == 0 {
                    self.pending = None;
                    let name = self.civs[idx].name.clone();
                    self.log(
                        Some(actor),
                        format!("{name} finished expanding their borders."),
                        LogCategory::Growth,
                    );
                    self.end_turn();
                } else {
                    self.pending = Some(PendingDecision::Expansion { hub, remaining });
                }
                Ok(())
            }

            Command::CancelExpansion => {
                self.require_play()?;
                if !matches!(self.pending, Some(PendingDecision::Expansion { .. })) {
                    return Err(ActionError::NoPendingDecision);
                }
                // Already-claimed tiles stay claimed; the turn does not
                // advance.
                self.pending = None;
                Ok(())
            }

            Command::DeclareWar { target } => {
                self.require_play()?;
                diplomacy::declare_war(&self.grid, &mut self.civs, idx, target)?;
                let name = self.civs[idx].name.clone();
                let target_name = self.name_of(target);
                self.log(
                    Some(actor),
                    format!("{name} declared war on {target_name}!"),
                    LogCategory::War,
                );
                self.end_turn();
                Ok(())
            }

            Command::ProposeTruce { target } => {
                self.require_play()?;
                diplomacy::propose_truce(&self.grid, &mut self.civs, idx, target)?;
                let name = self.civs[idx].name.clone();
                let target_name = self.name_of(target);
                self.log(
                    Some(actor),
                    format!("{name} proposed a truce to {target_name}."),
                    LogCategory::Peace,
                );
                self.end_turn();
                Ok(())
            }

            Command::RespondTruce { to, accept } => {
                self.require_play()?;
                diplomacy::respond_truce(&mut self.grid, &mut self.civs, idx, to, accept)?;
                let name = self.civs[idx].name.clone();
                let other = self.name_of(to);
                if accept {
                    self.log(
                        Some(actor),
                        format!("{name} and {other} agreed to a truce."),
                        LogCategory::Peace,
                    );
                } else {
                    self.log(
                        Some(actor),
                        format!("{name} declined {other}'s truce proposal."),
                        LogCategory::Peace,
                    );
                }
                // Responding does not end the turn; the player acts next.
                Ok(())
            }

            Command::Invade => {
                self.require_play()?;
                let report = combat::invade(&mut self.grid, &mut self.civs, idx, &mut self.rng)?;
                let name = self.civs[idx].name.clone();

                for defender in &report.capital_falls {
                    let fallen = self.name_of(*defender);
                    self.log(
                        Some(actor),
                        format!("{name} captured {fallen}'s capital! {fallen} is eliminated."),
                        LogCategory::War,
                    );
                }
                for (defender, colony) in &report.colony_captures {
                    let loser = self.name_of(*defender);
                    self.log(
                        Some(actor),
                        format!("{name} captured {loser}'s {colony}."),
                        LogCategory::War,
                    );
                }
                if report.captured_tiles > 0 {
                    self.log(
                        Some(actor),
                        format!("{name} seized {} tiles in the invasion.", report.captured_tiles),
                        LogCategory::War,
                    );
                } else {
                    self.log(
                        Some(actor),
                        format!("{name}'s invasion was repelled."),
                        LogCategory::War,
                    );
                }

                if let Some(with) = report.forced_truce {
                    self.pending = Some(PendingDecision::ForcedTruce { with });
                } else {
                    self.end_turn();
                }
                Ok(())
            }

            Command::ResolveForcedTruce { accept } => {
                self.require_play()?;
                let Some(PendingDecision::ForcedTruce { with }) = self.pending else {
                    return Err(ActionError::NoPendingDecision);
                };
                self.pending = None;
                let name = self.civs[idx].name.clone();
                let other = self.name_of(with);
                if accept {
                    if let Some(other_idx) = self.civs.iter().position(|c| c.id == with) {
                        diplomacy::establish_truce(&mut self.grid, &mut self.civs, idx, other_idx);
                    }
                    self.log(
                        Some(actor),
                        format!("{name} forced a truce upon {other}."),
                        LogCategory::Peace,
                    );
                } else {
                    self.log(
                        Some(actor),
                        format!("{name} presses the war against {other}."),
                        LogCategory::War,
                    );
                }
                self.end_turn();
                Ok(())
            }

            Command::Pass => {
                self.require_play()?;
                self.end_turn();
                Ok(())
            }
        }
    }

    fn require_play(&self) -> Result<(), ActionError> {
        if self.phase == Phase::Play {
            Ok(())
        } else {
            Err(ActionError::WrongPhase)
        }
    }

    fn name_of(&self, id: PlayerId) -> String {
        self.civ(id).map(|c| c.name.clone()).unwrap_or_else(|| id.to_string())
    }

    fn log(&mut self, player: Option<PlayerId>, text: impl Into<String>, category: LogCategory) {
        self.logs.insert(
            0,
            LogEntry {
                turn: self.turn,
                player,
                text: text.into(),
                category,
            },
        );
    }

    /// End-of-turn procedure: tick the acting civilization's capital upgrade
    /// and truce countdowns, evaluate win conditions, then rotate to the
    /// next living civilization.
    fn end_turn(&mut self) {
        if self.phase == Phase::End {
            return;
        }
        let idx = self.current_idx;
        let actor = self.civs[idx].id;

        if let Some(mut upgrade) = self.civs[idx].capital_upgrade {
            upgrade.remaining_turns = upgrade.remaining_turns.saturating_sub(1);
            if upgrade.remaining_turns == 0 {
                self.civs[idx].capital_level = upgrade.target_level;
                self.civs[idx].capital_upgrade = None;
                let name = self.civs[idx].name.clone();
                self.log(
                    Some(actor),
                    format!("{name}'s capital advanced to level {}.", upgrade.target_level),
                    LogCategory::Growth,
                );
            } else {
                self.civs[idx].capital_upgrade = Some(upgrade);
            }
        }

        let expired = diplomacy::tick_truces(&mut self.civs, idx);
        for partner in expired {
            let name = self.civs[idx].name.clone();
            let other = self.name_of(partner);
            self.log(
                Some(actor),
                format!("The truce between {name} and {other} has ended."),
                LogCategory::Peace,
            );
        }

        if self.phase == Phase::Play {
            self.check_victory();
            if self.phase == Phase::End {
                return;
            }
        }

        self.pending = None;

        let n = self.civs.len();
        let mut idx = self.current_idx;
        loop {
            idx = (idx + 1) % n;
            if idx == 0 {
                self.turn += 1;
            }
            if !self.civs[idx].eliminated {
                break;
            }
        }
        self.current_idx = idx;
    }

    /// Technology victory first, then conquest.
    fn check_victory(&mut self) {
        let technologist = self
            .civs
            .iter()
            .find(|c| !c.eliminated && c.capital_level >= MAX_CAPITAL_LEVEL);
        if let Some(winner) = technologist {
            let id = winner.id;
            let name = winner.name.clone();
            self.result = Some(GameResult {
                winner: id,
                kind: VictoryKind::Technology,
            });
            self.phase = Phase::End;
            self.log(
                None,
                format!("{name} achieved a technology victory!"),
                LogCategory::Info,
            );
            return;
        }

        let mut survivors = self.civs.iter().filter(|c| !c.eliminated);
        if let (Some(winner), None) = (survivors.next(), survivors.next()) {
            let id = winner.id;
            let name = winner.name.clone();
            self.result = Some(GameResult {
                winner: id,
                kind: VictoryKind::Conquest,
            });
            self.phase = Phase::End;
            self.log(
                None,
                format!("{name} achieved a conquest victory!"),
                LogCategory::Info,
            );
        }
    }

    /// Full serialized state, with set-like fields sorted so the snapshot
    /// hash is deterministic.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.snapshot(),
            players: self.civs.iter().map(|c| c.snapshot()).collect(),
            current_idx: self.current_idx as u8,
            turn: self.turn,
            phase: self.phase,
            logs: self.logs.clone(),
            pending: self.pending,
            rng_state: self.rng.state_bytes(),
            result: self.result,
        }
    }

    /// Adopt a received snapshot wholesale.
    pub fn from_snapshot(snap: &Snapshot) -> Result<Self, SnapshotError> {
        let grid = Grid::from_snapshot(&snap.grid).ok_or(SnapshotError::MalformedGrid)?;
        let civs: Vec<Civilization> =
            snap.players.iter().map(Civilization::from_snapshot).collect();
        if usize::from(snap.current_idx) >= civs.len() {
            return Err(SnapshotError::BadPlayerIndex);
        }
        Ok(Self {
            grid,
            civs,
            current_idx: usize::from(snap.current_idx),
            turn: snap.turn,
            phase: snap.phase,
            logs: snap.logs.clone(),
            pending: snap.pending,
            rng: GameRng::from_state_bytes(snap.rng_state),
            result: snap.result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marchland_protocol::{
        CellKind, Colony, ColonyId, Coord, HubId, Site, TileControl,
    };

    fn two_player_game() -> Game {
        Game::new(
            vec![
                PlayerSetup {
                    name: "Alice".into(),
                    color: DEFAULT_COLORS[0].into(),
                },
                PlayerSetup {
                    name: "Bob".into(),
                    color: DEFAULT_COLORS[1].into(),
                },
            ],
            42,
        )
    }

    fn p(i: u8) -> PlayerId {
        PlayerId(i)
    }

    #[test]
    fn setup_placement_scenario() {
        let mut game = two_player_game();
        assert_eq!(game.grid().size(), 15);
        assert_eq!(game.phase(), Phase::Setup);

        game.apply(p(0), Command::PlaceCapital { at: Coord::new(7, 7) }).unwrap();
        assert_eq!(game.current_player(), p(1));

        // Distance 3: rejected, state untouched.
        let before = game.clone();
        let err = game
            .apply(p(1), Command::PlaceCapital { at: Coord::new(7, 10) })
            .unwrap_err();
        assert!(matches!(err, ActionError::PlacementRejected { .. }));
        assert_eq!(game, before);

        // Distance 5: accepted, setup completes.
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(7, 2) }).unwrap();
        assert_eq!(game.phase(), Phase::Play);
        assert_eq!(game.current_player(), p(0));
    }

    #[test]
    fn acting_out_of_turn_is_rejected() {
        let mut game = two_player_game();
        let before = game.clone();
        let err = game
            .apply(p(1), Command::PlaceCapital { at: Coord::new(3, 3) })
            .unwrap_err();
        assert_eq!(err, ActionError::NotYourTurn);
        assert_eq!(game, before);
    }

    #[test]
    fn play_commands_rejected_during_setup() {
        let mut game = two_player_game();
        let err = game.apply(p(0), Command::Pass).unwrap_err();
        assert_eq!(err, ActionError::WrongPhase);
    }

    #[test]
    fn turn_counter_increments_on_wrap() {
        let mut game = two_player_game();
        assert_eq!(game.turn(), 1);
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(7, 7) }).unwrap();
        assert_eq!(game.turn(), 1);
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(7, 2) }).unwrap();
        // Wrapped back to index 0.
        assert_eq!(game.turn(), 2);
    }

    #[test]
    fn rotation_skips_eliminated_civs() {
        let mut game = Game::new(
            vec![
                PlayerSetup { name: "A".into(), color: DEFAULT_COLORS[0].into() },
                PlayerSetup { name: "B".into(), color: DEFAULT_COLORS[1].into() },
                PlayerSetup { name: "C".into(), color: DEFAULT_COLORS[2].into() },
            ],
            7,
        );
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(2, 2) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(9, 2) }).unwrap();
        game.apply(p(2), Command::PlaceCapital { at: Coord::new(2, 9) }).unwrap();
        assert_eq!(game.phase(), Phase::Play);

        // Eliminate A with C still to act; rotation must cycle B, C, B, C.
        game.civs[0].eliminated = true;
        game.current_idx = 1;
        game.apply(p(1), Command::Pass).unwrap();
        assert_eq!(game.current_player(), p(2));
        game.apply(p(2), Command::Pass).unwrap();
        assert_eq!(game.current_player(), p(1));
        game.apply(p(1), Command::Pass).unwrap();
        assert_eq!(game.current_player(), p(2));
    }

    #[test]
    fn technology_victory_with_correct_cooldowns() {
        let mut game = two_player_game();
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(7, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(7, 2) }).unwrap();

        // Alice upgrades relentlessly; Bob waits. Levels 2..10 cost
        // 2,2,2,3,3,3,3,4,5 of Alice's turns, 27 in total.
        let mut alice_turns = 0;
        while game.result().is_none() {
            assert!(alice_turns <= 27, "victory should land on turn-end 27");
            let civ = game.civ(p(0)).unwrap();
            let cmd = if civ.capital_upgrade.is_none() {
                Command::StartCapitalUpgrade
            } else {
                Command::Pass
            };
            game.apply(p(0), cmd).unwrap();
            alice_turns += 1;
            if game.result().is_some() {
                break;
            }
            game.apply(p(1), Command::Pass).unwrap();
        }

        assert_eq!(alice_turns, 27);
        let result = game.result().unwrap();
        assert_eq!(result.winner, p(0));
        assert_eq!(result.kind, VictoryKind::Technology);
        assert_eq!(game.phase(), Phase::End);
        assert_eq!(game.civ(p(0)).unwrap().capital_level, 10);
        // Bob survives; technology victory ignores survivor count.
        assert!(!game.civ(p(1)).unwrap().eliminated);

        // Terminal phase accepts nothing.
        let err = game.apply(p(0), Command::Pass).unwrap_err();
        assert_eq!(err, ActionError::WrongPhase);
    }

    #[test]
    fn manual_expansion_blocks_turn_until_consumed() {
        let mut game = two_player_game();
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(7, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(0, 0) }).unwrap();

        game.apply(p(0), Command::Expand { hub: HubId::Capital }).unwrap();
        game.apply(p(1), Command::Pass).unwrap();
        game.apply(p(0), Command::FoundColony { at: Coord::new(10, 7) }).unwrap();
        game.apply(p(1), Command::Pass).unwrap();

        let colony = HubId::Colony {
            id: game.civ(p(0)).unwrap().colonies[0].id,
        };
        game.apply(p(0), Command::Expand { hub: colony }).unwrap();
        assert_eq!(game.current_player(), p(1));
        game.apply(p(1), Command::Pass).unwrap();

        // Second wave exceeds remaining capacity: manual mode, turn held.
        game.apply(p(0), Command::Expand { hub: colony }).unwrap();
        let Some(PendingDecision::Expansion { remaining, .. }) = game.pending() else {
            panic!("expected a pending expansion");
        };
        assert_eq!(remaining, 4);
        assert_eq!(game.current_player(), p(0));

        // Other commands are blocked while the selection is pending.
        let err = game.apply(p(0), Command::Pass).unwrap_err();
        assert_eq!(err, ActionError::DecisionPending);

        let picks = [
            Coord::new(12, 5),
            Coord::new(12, 6),
            Coord::new(12, 7),
            Coord::new(12, 8),
        ];
        for (i, at) in picks.into_iter().enumerate() {
            game.apply(p(0), Command::ClaimTile { at }).unwrap();
            if i < 3 {
                assert_eq!(game.current_player(), p(0));
            }
        }
        // Capacity consumed: the turn ended automatically.
        assert_eq!(game.pending(), None);
        assert_eq!(game.current_player(), p(1));
    }

    #[test]
    fn cancel_expansion_keeps_the_turn() {
        let mut game = two_player_game();
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(7, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(0, 0) }).unwrap();
        game.apply(p(0), Command::Expand { hub: HubId::Capital }).unwrap();
        game.apply(p(1), Command::Pass).unwrap();
        game.apply(p(0), Command::FoundColony { at: Coord::new(10, 7) }).unwrap();
        game.apply(p(1), Command::Pass).unwrap();
        let colony = HubId::Colony {
            id: game.civ(p(0)).unwrap().colonies[0].id,
        };
        game.apply(p(0), Command::Expand { hub: colony }).unwrap();
        game.apply(p(1), Command::Pass).unwrap();
        game.apply(p(0), Command::Expand { hub: colony }).unwrap();
        assert!(matches!(game.pending(), Some(PendingDecision::Expansion { .. })));

        let claimed_before = game.civ(p(0)).unwrap().territory.len();
        game.apply(p(0), Command::ClaimTile { at: Coord::new(12, 5) }).unwrap();
        game.apply(p(0), Command::CancelExpansion).unwrap();
        assert_eq!(game.pending(), None);
        assert_eq!(game.current_player(), p(0));
        // The claim made before cancelling stays.
        assert_eq!(game.civ(p(0)).unwrap().territory.len(), claimed_before + 1);
    }

    #[test]
    fn forced_truce_decision_blocks_and_resolves() {
        let mut game = two_player_game();
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(4, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(9, 7) }).unwrap();
        game.civs[0].war_with.insert(p(1));
        game.civs[1].war_with.insert(p(0));

        game.pending = Some(PendingDecision::ForcedTruce { with: p(1) });

        let err = game.apply(p(0), Command::Pass).unwrap_err();
        assert_eq!(err, ActionError::DecisionPending);

        game.apply(p(0), Command::ResolveForcedTruce { accept: true }).unwrap();
        assert_eq!(game.pending(), None);
        assert_eq!(game.current_player(), p(1));
        assert!(game.civ(p(0)).unwrap().truce_with.contains(&p(1)));
        assert!(game.civ(p(1)).unwrap().truce_with.contains(&p(0)));
        assert!(game.civ(p(0)).unwrap().war_with.is_empty());
    }

    /// Two civs at war, with Bob holding a colony hub on Alice's frontier
    /// and his capital out of invasion reach.
    fn frontier_colony_war(seed: u64) -> Game {
        let mut game = Game::new(
            vec![
                PlayerSetup {
                    name: "Alice".into(),
                    color: DEFAULT_COLORS[0].into(),
                },
                PlayerSetup {
                    name: "Bob".into(),
                    color: DEFAULT_COLORS[1].into(),
                },
            ],
            seed,
        );
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(3, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(11, 7) }).unwrap();

        let at = Coord::new(5, 7);
        let id = ColonyId(0);
        game.grid.get_mut(at).unwrap().site = Some(Site {
            owner: p(1),
            kind: CellKind::City,
            control: TileControl::Hub {
                hub: HubId::Colony { id },
            },
            level: 1,
        });
        game.civs[1].colonies.push(Colony { id, at });
        game.civs[1].territory.insert(at);
        game.civs[1].original_territories.insert(at);
        game.civs[0].war_with.insert(p(1));
        game.civs[1].war_with.insert(p(0));
        game
    }

    #[test]
    fn invading_a_frontier_colony_forces_a_truce_offer() {
        // The per-tile roll comes from the seeded engine rng; scan seeds
        // until a capture lands, then verify the whole offer lifecycle.
        for seed in 0..64u64 {
            let mut game = frontier_colony_war(seed);
            let colony_at = Coord::new(5, 7);
            game.apply(p(0), Command::Invade).unwrap();

            let Some(PendingDecision::ForcedTruce { with }) = game.pending() else {
                // Repelled this time: the turn must have rotated normally.
                assert_eq!(game.current_player(), p(1));
                continue;
            };

            // The colony fell outside Alice's original territory, so its
            // surviving owner is owed the offer and the turn is held.
            assert_eq!(with, p(1));
            assert_eq!(game.current_player(), p(0));
            assert!(!game.civ(p(1)).unwrap().eliminated);
            let site = game.grid.site(colony_at).unwrap();
            assert_eq!(site.owner, p(0));
            assert_eq!(
                site.control,
                TileControl::Captured { from: Some(p(1)) }
            );

            let err = game.apply(p(0), Command::Pass).unwrap_err();
            assert_eq!(err, ActionError::DecisionPending);

            game.apply(p(0), Command::ResolveForcedTruce { accept: true }).unwrap();
            assert!(game.civ(p(0)).unwrap().truce_with.contains(&p(1)));
            assert!(game.civ(p(0)).unwrap().war_with.is_empty());
            assert_eq!(game.current_player(), p(1));
            return;
        }
        panic!("no seed in 0..64 produced a successful colony capture");
    }

    #[test]
    fn declining_forced_truce_keeps_the_war() {
        let mut game = two_player_game();
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(4, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(9, 7) }).unwrap();
        game.civs[0].war_with.insert(p(1));
        game.civs[1].war_with.insert(p(0));
        game.pending = Some(PendingDecision::ForcedTruce { with: p(1) });

        game.apply(p(0), Command::ResolveForcedTruce { accept: false }).unwrap();
        assert!(game.civ(p(0)).unwrap().war_with.contains(&p(1)));
        assert!(game.civ(p(0)).unwrap().truce_with.is_empty());
        assert_eq!(game.current_player(), p(1));
    }

    #[test]
    fn conquest_victory_when_one_survivor_remains() {
        let mut game = two_player_game();
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(7, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(7, 2) }).unwrap();

        game.civs[1].eliminated = true;
        game.apply(p(0), Command::Pass).unwrap();

        let result = game.result().unwrap();
        assert_eq!(result.winner, p(0));
        assert_eq!(result.kind, VictoryKind::Conquest);
        assert_eq!(game.phase(), Phase::End);
    }

    #[test]
    fn snapshot_roundtrip_preserves_the_game() {
        let mut game = two_player_game();
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(7, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(7, 2) }).unwrap();
        game.apply(p(0), Command::Expand { hub: HubId::Capital }).unwrap();

        let snap = game.snapshot();
        let restored = Game::from_snapshot(&snap).unwrap();
        assert_eq!(restored, game);
        assert_eq!(restored.snapshot(), snap);

        let hash_a = marchland_protocol::wire::snapshot_hash(&snap).unwrap();
        let hash_b = marchland_protocol::wire::snapshot_hash(&restored.snapshot()).unwrap();
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn upgrade_ticks_only_on_own_turn_end() {
        let mut game = two_player_game();
        game.apply(p(0), Command::PlaceCapital { at: Coord::new(7, 7) }).unwrap();
        game.apply(p(1), Command::PlaceCapital { at: Coord::new(7, 2) }).unwrap();

        game.apply(p(0), Command::StartCapitalUpgrade).unwrap();
        // Initiation itself ticks once: 2 -> 1.
        assert_eq!(
            game.civ(p(0)).unwrap().capital_upgrade.unwrap().remaining_turns,
            1
        );
        game.apply(p(1), Command::Pass).unwrap();
        assert_eq!(
            game.civ(p(0)).unwrap().capital_upgrade.unwrap().remaining_turns,
            1
        );
        game.apply(p(0), Command::Pass).unwrap();
        assert_eq!(game.civ(p(0)).unwrap().capital_upgrade, None);
        assert_eq!(game.civ(p(0)).unwrap().capital_level, 2);
    }
}
