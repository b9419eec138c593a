//! Diplomacy engine: war declaration, truce proposal/acceptance, exclave
//! consolidation, and truce expiry.

use marchland_protocol::{ActionError, Coord, HubId, PlayerId, TileControl};

use crate::territory::owner_of;
use crate::{Civilization, Grid, TRUCE_TURNS};

/// True when civilization `a` holds a tile 8-adjacent to one of `b`'s.
pub fn reachable(grid: &Grid, a: &Civilization, b: PlayerId) -> bool {
    a.territory.iter().any(|at| {
        grid.neighbors(*at)
            .any(|n| grid.get(n).is_some_and(|c| c.is_owned_by(b)))
    })
}

fn validate_pair(
    civs: &[Civilization],
    actor: usize,
    target: PlayerId,
) -> Result<usize, ActionError> {
    let target_idx = owner_of(civs, target).ok_or(ActionError::UnknownPlayer)?;
    if target_idx == actor {
        return Err(ActionError::DiplomacyRejected {
            reason: "cannot target yourself".into(),
        });
    }
    if civs[target_idx].eliminated {
        return Err(ActionError::DiplomacyRejected {
            reason: "target is eliminated".into(),
        });
    }
    Ok(target_idx)
}

/// Declare war on `target`. Requires the target's territory be reachable
/// and the pair neither at war nor under truce.
pub fn declare_war(
    grid: &Grid,
    civs: &mut [Civilization],
    actor: usize,
    target: PlayerId,
) -> Result<(), ActionError> {
    let target_idx = validate_pair(civs, actor, target)?;
    if civs[actor].war_with.contains(&target) {
        return Err(ActionError::DiplomacyRejected {
            reason: "already at war".into(),
        });
    }
    if civs[actor].truce_with.contains(&target) {
        return Err(ActionError::DiplomacyRejected {
            reason: "a truce is in effect".into(),
        });
    }
    if !reachable(grid, &civs[actor], target) {
        return Err(ActionError::NoTarget);
    }

    let actor_id = civs[actor].id;
    civs[actor].war_with.insert(target);
    civs[target_idx].war_with.insert(actor_id);
    Ok(())
}

/// Queue a truce proposal on the target. Resolved on the target's turn.
pub fn propose_truce(
    grid: &Grid,
    civs: &mut [Civilization],
    actor: usize,
    target: PlayerId,
) -> Result<(), ActionError> {
    let target_idx = validate_pair(civs, actor, target)?;
    if !civs[actor].war_with.contains(&target) {
        return Err(ActionError::DiplomacyRejected {
            reason: "not at war".into(),
        });
    }
    if !reachable(grid, &civs[actor], target) {
        return Err(ActionError::NoTarget);
    }

    let actor_id = civs[actor].id;
    civs[target_idx].truce_proposals.insert(actor_id);
    Ok(())
}

/// Resolve a queued proposal from `from` on the acting civilization's turn.
pub fn respond_truce(
    grid: &mut Grid,
    civs: &mut [Civilization],
    actor: usize,
    from: PlayerId,
    accept: bool,
) -> Result<(), ActionError> {
    if !civs[actor].truce_proposals.remove(&from) {
        return Err(ActionError::DiplomacyRejected {
            reason: "no such proposal".into(),
        });
    }
    if !accept {
        return Ok(());
    }
    let from_idx = owner_of(civs, from).ok_or(ActionError::UnknownPlayer)?;
    establish_truce(grid, civs, actor, from_idx);
    Ok(())
}

/// Replace a war with a symmetric fixed-duration truce and consolidate both
/// parties' exclaves into their nearest hubs.
pub fn establish_truce(grid: &mut Grid, civs: &mut [Civilization], a: usize, b: usize) {
    let a_id = civs[a].id;
    let b_id = civs[b].id;

    civs[a].war_with.remove(&b_id);
    civs[b].war_with.remove(&a_id);
    civs[a].truce_with.insert(b_id);
    civs[b].truce_with.insert(a_id);
    civs[a].truce_turns.insert(b_id, TRUCE_TURNS);
    civs[b].truce_turns.insert(a_id, TRUCE_TURNS);
    civs[a].truce_proposals.remove(&b_id);
    civs[b].truce_proposals.remove(&a_id);

    consolidate_exclaves(grid, &mut civs[a]);
    consolidate_exclaves(grid, &mut civs[b]);
}

/// Reassign every captured tile of `civ` to its nearest hub (capital or
/// colony, by Manhattan distance), converting it from exclave to stable.
pub fn consolidate_exclaves(grid: &mut Grid, civ: &mut Civilization) {
    let hubs: Vec<(HubId, Coord)> = civ
        .capital
        .map(|at| (HubId::Capital, at))
        .into_iter()
        .chain(
            civ.colonies
                .iter()
                .map(|c| (HubId::Colony { id: c.id }, c.at)),
        )
        .collect();
    if hubs.is_empty() {
        return;
    }

    for at in civ.territory.iter().copied() {
        let Some(cell) = grid.get_mut(at) else {
            continue;
        };
        let Some(site) = cell.site.as_mut() else {
            continue;
        };
        if site.owner != civ.id || !site.control.is_exclave() {
            continue;
        }
        let mut nearest = hubs[0].0;
        let mut best = hubs[0].1.manhattan_distance(at);
        for (hub, hub_at) in &hubs[1..] {
            let d = hub_at.manhattan_distance(at);
            if d < best {
                best = d;
                nearest = *hub;
            }
        }
        site.control = TileControl::Hub { hub: nearest };
    }
}

/// Tick the acting civilization's truce countdowns. Truces reaching zero are
/// dissolved symmetrically; the dissolved partners are returned for logging.
pub fn tick_truces(civs: &mut [Civilization], actor: usize) -> Vec<PlayerId> {
    let mut expired = Vec::new();
    let partners: Vec<PlayerId> = civs[actor].truce_turns.keys().copied().collect();
    for partner in partners {
        let remaining = civs[actor]
            .truce_turns
            .get_mut(&partner)
            .map(|t| {
                *t = t.saturating_sub(1);
                *t
            })
            .unwrap_or(0);
        if remaining == 0 {
            expired.push(partner);
        }
    }
    expired.sort();

    let actor_id = civs[actor].id;
    for partner in &expired {
        civs[actor].truce_with.remove(partner);
        civs[actor].truce_turns.remove(partner);
        if let Some(partner_idx) = owner_of(civs, *partner) {
            civs[partner_idx].truce_with.remove(&actor_id);
            civs[partner_idx].truce_turns.remove(&actor_id);
        }
    }
    expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::territory::place_capital;
    use marchland_protocol::{CellKind, Site};

    fn bordering_civs() -> (Grid, Vec<Civilization>) {
        let mut grid = Grid::new(15);
        let mut civs = vec![
            Civilization::new(PlayerId(0), "Alice", "#e74c3c"),
            Civilization::new(PlayerId(1), "Bob", "#3498db"),
        ];
        place_capital(&mut grid, &mut civs, 0, Coord::new(4, 7)).unwrap();
        place_capital(&mut grid, &mut civs, 1, Coord::new(9, 7)).unwrap();
        // Rings reach x=5 and x=8; bridge the gap so the borders touch.
        grid.get_mut(Coord::new(6, 7)).unwrap().site = Some(Site {
            owner: PlayerId(0),
            kind: CellKind::Land,
            control: TileControl::Hub { hub: HubId::Capital },
            level: 1,
        });
        civs[0].territory.insert(Coord::new(6, 7));
        civs[0].original_territories.insert(Coord::new(6, 7));
        grid.get_mut(Coord::new(7, 7)).unwrap().site = Some(Site {
            owner: PlayerId(1),
            kind: CellKind::Land,
            control: TileControl::Hub { hub: HubId::Capital },
            level: 1,
        });
        civs[1].territory.insert(Coord::new(7, 7));
        civs[1].original_territories.insert(Coord::new(7, 7));
        (grid, civs)
    }

    #[test]
    fn war_requires_reachability() {
        let mut grid = Grid::new(15);
        let mut civs = vec![
            Civilization::new(PlayerId(0), "Alice", "#e74c3c"),
            Civilization::new(PlayerId(1), "Bob", "#3498db"),
        ];
        place_capital(&mut grid, &mut civs, 0, Coord::new(2, 2)).unwrap();
        place_capital(&mut grid, &mut civs, 1, Coord::new(12, 12)).unwrap();

        let err = declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap_err();
        assert_eq!(err, ActionError::NoTarget);
    }

    #[test]
    fn war_is_symmetric_and_exclusive_with_truce() {
        let (grid, mut civs) = bordering_civs();
        declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap();
        assert!(civs[0].war_with.contains(&PlayerId(1)));
        assert!(civs[1].war_with.contains(&PlayerId(0)));

        // Never both at war and under truce.
        for civ in &civs {
            for other in &civ.war_with {
                assert!(!civ.truce_with.contains(other));
            }
        }

        let err = declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap_err();
        assert!(matches!(err, ActionError::DiplomacyRejected { .. }));
    }

    #[test]
    fn truce_roundtrip_accept() {
        let (mut grid, mut civs) = bordering_civs();
        declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap();

        propose_truce(&grid, &mut civs, 0, PlayerId(1)).unwrap();
        assert!(civs[1].truce_proposals.contains(&PlayerId(0)));

        respond_truce(&mut grid, &mut civs, 1, PlayerId(0), true).unwrap();
        assert!(civs[0].truce_with.contains(&PlayerId(1)));
        assert!(civs[1].truce_with.contains(&PlayerId(0)));
        assert_eq!(civs[0].truce_turns.get(&PlayerId(1)), Some(&TRUCE_TURNS));
        assert_eq!(civs[1].truce_turns.get(&PlayerId(0)), Some(&TRUCE_TURNS));
        assert!(civs[0].war_with.is_empty());
        assert!(civs[1].war_with.is_empty());
        assert!(civs[1].truce_proposals.is_empty());

        // Truce blocks a fresh declaration.
        let err = declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap_err();
        assert!(matches!(err, ActionError::DiplomacyRejected { .. }));
    }

    #[test]
    fn truce_decline_only_clears_proposal() {
        let (mut grid, mut civs) = bordering_civs();
        declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap();
        propose_truce(&grid, &mut civs, 0, PlayerId(1)).unwrap();

        respond_truce(&mut grid, &mut civs, 1, PlayerId(0), false).unwrap();
        assert!(civs[1].truce_proposals.is_empty());
        assert!(civs[0].war_with.contains(&PlayerId(1)));
        assert!(civs[0].truce_with.is_empty());
    }

    #[test]
    fn truce_consolidates_exclaves_to_nearest_hub() {
        let (mut grid, mut civs) = bordering_civs();
        declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap();

        // Hand civ 0 a captured tile far from its capital.
        let taken = Coord::new(8, 6);
        grid.get_mut(taken).unwrap().site = Some(Site {
            owner: PlayerId(0),
            kind: CellKind::Land,
            control: TileControl::Captured { from: None },
            level: 1,
        });
        civs[0].territory.insert(taken);
        civs[1].territory.remove(&taken);

        propose_truce(&grid, &mut civs, 0, PlayerId(1)).unwrap();
        respond_truce(&mut grid, &mut civs, 1, PlayerId(0), true).unwrap();

        let site = grid.site(taken).unwrap();
        assert_eq!(site.control, TileControl::Hub { hub: HubId::Capital });
        assert!(!site.control.is_exclave());

        // No exclave remains for either party.
        for civ in &civs {
            for at in &civ.territory {
                assert!(!grid.site(*at).unwrap().control.is_exclave());
            }
        }
    }

    #[test]
    fn truce_expires_after_countdown() {
        let (mut grid, mut civs) = bordering_civs();
        declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap();
        propose_truce(&grid, &mut civs, 0, PlayerId(1)).unwrap();
        respond_truce(&mut grid, &mut civs, 1, PlayerId(0), true).unwrap();

        for _ in 0..3 {
            assert!(tick_truces(&mut civs, 0).is_empty());
        }
        let expired = tick_truces(&mut civs, 0);
        assert_eq!(expired, vec![PlayerId(1)]);
        assert!(civs[0].truce_with.is_empty());
        assert!(civs[1].truce_with.is_empty());
        assert!(civs[0].truce_turns.is_empty());
        assert!(civs[1].truce_turns.is_empty());

        // War can be redeclared immediately.
        declare_war(&grid, &mut civs, 0, PlayerId(1)).unwrap();
    }
}
