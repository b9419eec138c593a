//! Territory engine: capital placement, colony founding/upgrade, and
//! adjacency-based expansion.

use marchland_protocol::{
    ActionError, CellKind, Colony, ColonyId, Coord, HubId, PlayerId, Site, TileControl,
};

use crate::{Civilization, Grid};

/// Minimum Chebyshev distance between any two capitals.
pub const CAPITAL_MIN_DISTANCE: i32 = 5;
/// Minimum Chebyshev distance between a new colony and any existing hub.
pub const HUB_MIN_DISTANCE: i32 = 2;
/// Tiles a capital may hold under its own control.
pub const CAPITAL_CAPACITY: u32 = 25;
/// Tiles each colony may hold under its own control.
pub const COLONY_CAPACITY: u32 = 10;

/// Outcome of starting an expansion from a hub.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpansionStart {
    /// The whole frontier fit the remaining capacity and was claimed.
    Completed { claimed: u32 },
    /// Frontier exceeds capacity; the player must pick tiles one by one.
    Manual { remaining: u32 },
}

fn claim(
    grid: &mut Grid,
    civ: &mut Civilization,
    at: Coord,
    kind: CellKind,
    control: TileControl,
    level: u8,
) {
    if let Some(cell) = grid.get_mut(at) {
        cell.site = Some(Site {
            owner: civ.id,
            kind,
            control,
            level,
        });
        civ.territory.insert(at);
        civ.original_territories.insert(at);
    }
}

/// Place the acting civilization's capital and claim the surrounding ring.
///
/// Setup-phase only (enforced by the caller). The capital tile must be
/// unowned and at Chebyshev distance >= 5 from every existing capital. The
/// eight surrounding tiles are claimed too, where unowned and in bounds.
pub fn place_capital(
    grid: &mut Grid,
    civs: &mut [Civilization],
    actor: usize,
    at: Coord,
) -> Result<(), ActionError> {
    if !grid.in_bounds(at) {
        return Err(ActionError::PlacementRejected {
            reason: "outside the map".into(),
        });
    }
    if grid.get(at).is_some_and(|c| c.is_owned()) {
        return Err(ActionError::PlacementRejected {
            reason: "tile is already claimed".into(),
        });
    }
    for civ in civs.iter() {
        if let Some(capital) = civ.capital {
            if capital.chebyshev_distance(at) < CAPITAL_MIN_DISTANCE {
                return Err(ActionError::PlacementRejected {
                    reason: "too close to a rival capital".into(),
                });
            }
        }
    }

    let civ = &mut civs[actor];
    civ.capital = Some(at);
    claim(
        grid,
        civ,
        at,
        CellKind::Capital,
        TileControl::Hub { hub: HubId::Capital },
        1,
    );
    for neighbor in at.neighbors() {
        if grid.in_bounds(neighbor) && !grid.get(neighbor).is_some_and(|c| c.is_owned()) {
            claim(
                grid,
                civ,
                neighbor,
                CellKind::Land,
                TileControl::Hub { hub: HubId::Capital },
                1,
            );
        }
    }
    Ok(())
}

/// Every hub coordinate (capital or colony) of every civilization.
fn all_hub_coords(civs: &[Civilization]) -> impl Iterator<Item = Coord> + '_ {
    civs.iter().flat_map(|civ| {
        civ.capital
            .into_iter()
            .chain(civ.colonies.iter().map(|c| c.at))
    })
}

/// Found a new colony at `at` for the acting civilization.
pub fn found_colony(
    grid: &mut Grid,
    civs: &mut [Civilization],
    actor: usize,
    at: Coord,
) -> Result<ColonyId, ActionError> {
    if civs[actor].is_at_war() {
        return Err(ActionError::WartimeRestriction);
    }
    if !grid.in_bounds(at) || grid.get(at).is_some_and(|c| c.is_owned()) {
        return Err(ActionError::PlacementRejected {
            reason: "tile is not free".into(),
        });
    }
    let near_own = civs[actor]
        .territory
        .iter()
        .any(|t| t.chebyshev_distance(at) <= 1);
    if !near_own {
        return Err(ActionError::PlacementRejected {
            reason: "not adjacent to own territory".into(),
        });
    }
    let too_close = all_hub_coords(civs).any(|hub| hub.chebyshev_distance(at) < HUB_MIN_DISTANCE);
    if too_close {
        return Err(ActionError::PlacementRejected {
            reason: "too close to an existing capital or colony".into(),
        });
    }

    let civ = &mut civs[actor];
    let id = ColonyId(civ.colonies.len() as u8);
    claim(
        grid,
        civ,
        at,
        CellKind::City,
        TileControl::Hub {
            hub: HubId::Colony { id },
        },
        1,
    );
    civ.colonies.push(Colony { id, at });
    Ok(id)
}

/// Raise an owned city tile's level by one. A colony may never exceed the
/// capital's level.
pub fn upgrade_colony(
    grid: &mut Grid,
    civs: &mut [Civilization],
    actor: usize,
    at: Coord,
) -> Result<u8, ActionError> {
    if civs[actor].is_at_war() {
        return Err(ActionError::WartimeRestriction);
    }
    let owner = civs[actor].id;
    let Some(site) = grid.site(at).filter(|s| s.owner == owner && s.kind == CellKind::City)
    else {
        return Err(ActionError::NoTarget);
    };
    if site.level >= civs[actor].capital_level {
        return Err(ActionError::LevelCap);
    }

    let new_level = site.level + 1;
    if let Some(cell) = grid.get_mut(at) {
        if let Some(site) = cell.site.as_mut() {
            site.level = new_level;
        }
    }
    Ok(new_level)
}

/// Number of the acting civilization's tiles counted against `hub`.
pub fn hub_tile_count(grid: &Grid, civ: &Civilization, hub: HubId) -> u32 {
    civ.territory
        .iter()
        .filter(|at| {
            grid.site(**at)
                .is_some_and(|s| s.owner == civ.id && s.control == TileControl::Hub { hub })
        })
        .count() as u32
}

pub fn hub_capacity(hub: HubId) -> u32 {
    match hub {
        HubId::Capital => CAPITAL_CAPACITY,
        HubId::Colony { .. } => COLONY_CAPACITY,
    }
}

/// Unowned tiles 8-adjacent to any tile under `hub`'s control, sorted.
pub fn frontier(grid: &Grid, civ: &Civilization, hub: HubId) -> Vec<Coord> {
    let mut out: Vec<Coord> = Vec::new();
    for at in &civ.territory {
        let under_hub = grid
            .site(*at)
            .is_some_and(|s| s.owner == civ.id && s.control == TileControl::Hub { hub });
        if !under_hub {
            continue;
        }
        for neighbor in grid.neighbors(*at) {
            if !grid.get(neighbor).is_some_and(|c| c.is_owned()) && !out.contains(&neighbor) {
                out.push(neighbor);
            }
        }
    }
    out.sort();
    out
}

/// Begin an expansion from `hub`.
///
/// If the frontier fits the remaining capacity it is claimed whole;
/// otherwise the caller must collect `remaining` individual claims via
/// [`claim_expansion_tile`] before the turn can end.
pub fn begin_expansion(
    grid: &mut Grid,
    civs: &mut [Civilization],
    actor: usize,
    hub: HubId,
) -> Result<ExpansionStart, ActionError> {
    if civs[actor].is_at_war() {
        return Err(ActionError::WartimeRestriction);
    }
    if !hub_exists(&civs[actor], hub) {
        return Err(ActionError::NoTarget);
    }

    let used = hub_tile_count(grid, &civs[actor], hub);
    let capacity = hub_capacity(hub);
    if used >= capacity {
        return Err(ActionError::CapacityReached);
    }
    let remaining = capacity - used;

    let front = frontier(grid, &civs[actor], hub);
    if front.is_empty() {
        return Err(ActionError::NoTarget);
    }

    if front.len() as u32 <= remaining {
        let civ = &mut civs[actor];
        let claimed = front.len() as u32;
        for at in front {
            claim(
                grid,
                civ,
                at,
                CellKind::Land,
                TileControl::Hub { hub },
                1,
            );
        }
        Ok(ExpansionStart::Completed { claimed })
    } else {
        Ok(ExpansionStart::Manual { remaining })
    }
}

/// Claim one tile of a pending manual expansion.
pub fn claim_expansion_tile(
    grid: &mut Grid,
    civs: &mut [Civilization],
    actor: usize,
    hub: HubId,
    at: Coord,
) -> Result<(), ActionError> {
    if !frontier(grid, &civs[actor], hub).contains(&at) {
        return Err(ActionError::NoTarget);
    }
    claim(
        grid,
        &mut civs[actor],
        at,
        CellKind::Land,
        TileControl::Hub { hub },
        1,
    );
    Ok(())
}

fn hub_exists(civ: &Civilization, hub: HubId) -> bool {
    match hub {
        HubId::Capital => civ.capital.is_some(),
        HubId::Colony { id } => civ.colonies.iter().any(|c| c.id == id),
    }
}

pub(crate) fn owner_of(civs: &[Civilization], id: PlayerId) -> Option<usize> {
    civs.iter().position(|c| c.id == id)
}
