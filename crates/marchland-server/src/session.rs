//! Server-authoritative game session.
//!
//! `marchland-server` owns networking and lobby concerns; the authoritative
//! engine lives in `marchland-core::Game`. This module wraps the engine and
//! exposes:
//! - current `Snapshot` + deterministic checksum
//! - validated/atomic command application
//! - forced turn release for disconnected players

use marchland_core::{Game, PlayerSetup};
use marchland_protocol::{
    wire::snapshot_hash, ActionError, Command, Coord, GameResult, PendingDecision, Phase,
    PlayerId, Snapshot,
};

/// Result of applying one command.
#[derive(Clone, Debug)]
pub enum ApplyOutcome {
    /// Command committed; the new full state to broadcast.
    Applied { snapshot: Snapshot, checksum: u64 },
    /// Command rejected; the error goes only to the submitter.
    Rejected(ActionError),
    /// Out-of-turn submission, dropped without a reply.
    Ignored,
}

/// Authoritative game session with checksum support.
pub struct Session {
    game: Game,
    snapshot: Snapshot,
    checksum: u64,
}

impl Session {
    pub fn new(players: Vec<PlayerSetup>, seed: u64) -> Self {
        let game = Game::new(players, seed);
        let snapshot = game.snapshot();
        let checksum = snapshot_hash(&snapshot).expect("snapshot hash");
        Self {
            game,
            snapshot,
            checksum,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Current snapshot (for sync to clients).
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    pub fn current_player(&self) -> PlayerId {
        self.game.current_player()
    }

    pub fn is_over(&self) -> bool {
        self.game.result().is_some()
    }

    pub fn result(&self) -> Option<GameResult> {
        self.game.result()
    }

    /// Apply one command for `actor`.
    pub fn apply(&mut self, actor: PlayerId, command: Command) -> ApplyOutcome {
        match self.game.apply(actor, command) {
            Ok(()) => {
                self.refresh();
                ApplyOutcome::Applied {
                    snapshot: self.snapshot.clone(),
                    checksum: self.checksum,
                }
            }
            Err(ActionError::NotYourTurn) => ApplyOutcome::Ignored,
            Err(err) => ApplyOutcome::Rejected(err),
        }
    }

    /// Release a stalled turn on behalf of `actor`: abandon any pending
    /// manual expansion, accept a pending forced truce, then pass.
    ///
    /// Returns the state to broadcast when anything was committed.
    pub fn force_pass(&mut self, actor: PlayerId) -> Option<(Snapshot, u64)> {
        if self.is_over() || self.current_player() != actor {
            return None;
        }

        // During setup there is no pass; place a capital on the first legal
        // tile instead.
        if self.game.phase() == Phase::Setup {
            let coords: Vec<Coord> = self.game.grid().coords().collect();
            let placed = coords
                .into_iter()
                .any(|at| self.game.apply(actor, Command::PlaceCapital { at }).is_ok());
            if !placed {
                return None;
            }
            self.refresh();
            return Some((self.snapshot.clone(), self.checksum));
        }

        match self.game.pending() {
            Some(PendingDecision::Expansion { .. }) => {
                self.game.apply(actor, Command::CancelExpansion).ok()?;
            }
            Some(PendingDecision::ForcedTruce { .. }) => {
                self.game
                    .apply(actor, Command::ResolveForcedTruce { accept: true })
                    .ok()?;
            }
            None => {}
        }

        // Resolving a forced truce already ends the turn.
        if self.game.current_player() == actor && self.game.result().is_none() {
            self.game.apply(actor, Command::Pass).ok()?;
        }

        self.refresh();
        Some((self.snapshot.clone(), self.checksum))
    }

    fn refresh(&mut self) {
        self.snapshot = self.game.snapshot();
        self.checksum = snapshot_hash(&self.snapshot).expect("snapshot hash");
    }
}
