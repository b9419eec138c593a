//! Power score: the single metric driving both combat strength and the
//! win check. Always recomputed from current grid and civilization state,
//! never cached, since ownership changes mid-invasion.

use marchland_protocol::CellKind;

use crate::{Civilization, Grid};

/// Points per capital level.
pub const W_CAPITAL: u32 = 10;
/// Points per city level.
pub const W_CITY: u32 = 5;
/// Points per organically held tile.
pub const W_STABLE: u32 = 2;
/// Points per exclave (captured) tile.
pub const W_EXCLAVE: u32 = 1;

/// Compute a civilization's score from current state.
///
/// Eliminated or capital-less civilizations score 0.
pub fn score(grid: &Grid, civ: &Civilization) -> u32 {
    if civ.eliminated || civ.capital.is_none() {
        return 0;
    }

    let mut total = u32::from(civ.capital_level) * W_CAPITAL;

    for at in &civ.territory {
        let Some(site) = grid.site(*at) else {
            continue;
        };
        if site.owner != civ.id {
            continue;
        }
        if site.kind == CellKind::City {
            total += u32::from(site.level) * W_CITY;
        }
        total += if site.control.is_exclave() {
            W_EXCLAVE
        } else {
            W_STABLE
        };
    }

    total
}
