//! Shared protocol types for Marchland.
//!
//! Everything that crosses the wire or is shared between the engine and the
//! server lives here: coordinates, ids, cell/control types, commands,
//! rejection reasons, the in-game log, the full-state snapshot, and the
//! MessagePack/JSON codec.

mod command;
mod coord;
mod error;
mod ids;
mod log;
mod snapshot;
mod types;
mod victory;
pub mod wire;

pub use crate::command::*;
pub use crate::coord::*;
pub use crate::error::*;
pub use crate::ids::*;
pub use crate::log::*;
pub use crate::snapshot::*;
pub use crate::types::*;
pub use crate::victory::*;
pub use crate::wire::WireError;
