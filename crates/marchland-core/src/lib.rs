//! Deterministic game engine for Marchland.
//!
//! No I/O, no networking, no wall clock. All state lives in [`Game`] and is
//! mutated only through [`Game::apply`], which either commits a full
//! transition or rejects the command leaving state untouched.

mod civ;
mod combat;
mod diplomacy;
mod game;
mod grid;
mod rng;
mod score;
mod territory;

pub use crate::civ::*;
pub use crate::combat::InvasionReport;
pub use crate::game::*;
pub use crate::grid::*;
pub use crate::rng::GameRng;
pub use crate::score::{score, W_CAPITAL, W_CITY, W_EXCLAVE, W_STABLE};
