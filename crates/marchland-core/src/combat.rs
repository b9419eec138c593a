//! Combat engine: invasion target discovery and per-tile probabilistic
//! resolution.
//!
//! There is no separate defense action. Defense is the passive score
//! comparison at invasion time, with exclave tiles defending at half
//! strength.

use marchland_protocol::{ActionError, CellKind, ColonyId, Coord, HubId, PlayerId, TileControl};

use crate::score::score;
use crate::territory::owner_of;
use crate::{Civilization, GameRng, Grid};

/// Token chance of success that always exists, whatever the score ratio.
pub const MIN_INVASION_CHANCE: f64 = 0.05;

/// What fell in one successful per-tile resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureKind {
    /// The defender's capital: the defender is eliminated and every tile
    /// they owned transfers to the attacker.
    CapitalFall { defender: PlayerId },
    /// A colony: every tile under that colony's control transfers.
    ColonyCaptured { defender: PlayerId, colony: ColonyId },
    /// A single plain tile.
    LandTaken { defender: PlayerId },
}

/// Outcome of a full invasion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvasionReport {
    pub captured_tiles: u32,
    pub capital_falls: Vec<PlayerId>,
    pub colony_captures: Vec<(PlayerId, ColonyId)>,
    /// Defender owed a forced-truce offer: a hub outside the attacker's
    /// original territory fell and its owner survived.
    pub forced_truce: Option<PlayerId>,
}

fn transfer_tile(
    grid: &mut Grid,
    civs: &mut [Civilization],
    from: usize,
    to: usize,
    at: Coord,
    control: TileControl,
) {
    if let Some(cell) = grid.get_mut(at) {
        if let Some(site) = cell.site.as_mut() {
            site.owner = civs[to].id;
            site.control = control;
        }
    }
    civs[from].territory.remove(&at);
    civs[to].territory.insert(at);
}

/// Transfer ownership after a successful roll against the tile at `at`.
pub(crate) fn capture(
    grid: &mut Grid,
    civs: &mut [Civilization],
    actor: usize,
    at: Coord,
) -> Option<(CaptureKind, u32)> {
    let site = grid.site(at)?;
    let defender = site.owner;
    let defender_idx = owner_of(civs, defender)?;

    match site.kind {
        CellKind::Capital => {
            // A full civilization wipe: every defender tile transfers.
            let tiles: Vec<Coord> = civs[defender_idx].territory.iter().copied().collect();
            let count = tiles.len() as u32;
            for tile in tiles {
                transfer_tile(
                    grid,
                    civs,
                    defender_idx,
                    actor,
                    tile,
                    TileControl::Captured { from: None },
                );
            }
            civs[defender_idx].eliminated = true;
            Some((CaptureKind::CapitalFall { defender }, count))
        }
        CellKind::City => {
            let hub = site.control.hub();
            let colony = match hub {
                Some(HubId::Colony { id }) => id,
                // A city tile whose control is already an exclave marker
                // transfers alone, like plain land.
                _ => {
                    transfer_tile(
                        grid,
                        civs,
                        defender_idx,
                        actor,
                        at,
                        TileControl::Captured { from: Some(defender) },
                    );
                    return Some((CaptureKind::LandTaken { defender }, 1));
                }
            };
            let group: Vec<Coord> = civs[defender_idx]
                .territory
                .iter()
                .copied()
                .filter(|tile| {
                    grid.site(*tile).is_some_and(|s| {
                        s.control
                            == TileControl::Hub {
                                hub: HubId::Colony { id: colony },
                            }
                    })
                })
                .collect();
            let count = group.len() as u32;
            for tile in group {
                transfer_tile(
                    grid,
                    civs,
                    defender_idx,
                    actor,
                    tile,
                    TileControl::Captured { from: Some(defender) },
                );
            }
            Some((CaptureKind::ColonyCaptured { defender, colony }, count))
        }
        CellKind::Land => {
            transfer_tile(
                grid,
                civs,
                defender_idx,
                actor,
                at,
                TileControl::Captured { from: None },
            );
            Some((CaptureKind::LandTaken { defender }, 1))
        }
    }
}

/// Resolve an invasion for the acting civilization against every reachable
/// enemy tile. Deterministic given the RNG state.
pub fn invade(
    grid: &mut Grid,
    civs: &mut [Civilization],
    actor: usize,
    rng: &mut GameRng,
) -> Result<InvasionReport, ActionError> {
    // Target set: enemy tiles 8-adjacent to own territory, fixed up front.
    let mut targets: Vec<Coord> = Vec::new();
    for at in &civs[actor].territory {
        for neighbor in grid.neighbors(*at) {
            let Some(owner) = grid.get(neighbor).and_then(|c| c.owner()) else {
                continue;
            };
            if civs[actor].war_with.contains(&owner) && !targets.contains(&neighbor) {
                targets.push(neighbor);
            }
        }
    }
    if targets.is_empty() {
        return Err(ActionError::NoTarget);
    }
    targets.sort();

    // Attacker strength is fixed for the whole invasion; defender strength
    // is recomputed per tile because ownership shifts mid-resolution.
    let attacker_score = score(grid, &civs[actor]);
    let mut report = InvasionReport::default();

    for at in targets {
        let Some(site) = grid.site(at) else {
            continue;
        };
        // An earlier capture this invasion may have transferred the tile.
        if !civs[actor].war_with.contains(&site.owner) {
            continue;
        }
        let Some(defender_idx) = owner_of(civs, site.owner) else {
            continue;
        };
        if civs[defender_idx].eliminated {
            continue;
        }

        let mut defender_score = score(grid, &civs[defender_idx]);
        if site.control.is_exclave() {
            defender_score /= 2;
        }

        let total = attacker_score + defender_score;
        let chance = if total == 0 {
            MIN_INVASION_CHANCE
        } else {
            (f64::from(attacker_score) / f64::from(total)).max(MIN_INVASION_CHANCE)
        };

        if rng.next_f64() >= chance {
            continue;
        }

        let Some((kind, count)) = capture(grid, civs, actor, at) else {
            continue;
        };
        report.captured_tiles += count;
        match kind {
            CaptureKind::CapitalFall { defender } => {
                report.capital_falls.push(defender);
            }
            CaptureKind::ColonyCaptured { defender, colony } => {
                report.colony_captures.push((defender, colony));
                if !civs[actor].original_territories.contains(&at) {
                    report.forced_truce = Some(defender);
                }
            }
            CaptureKind::LandTaken { .. } => {}
        }
    }

    // Never offer a truce to a civilization this same invasion eliminated.
    if let Some(candidate) = report.forced_truce {
        let eliminated = owner_of(civs, candidate)
            .map(|idx| civs[idx].eliminated)
            .unwrap_or(true);
        if eliminated {
            report.forced_truce = None;
        }
    }

    Ok(report)
}
