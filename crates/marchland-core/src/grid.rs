use serde::{Deserialize, Serialize};

use marchland_protocol::{Cell, Coord, GridSnapshot, PlayerId, Site};

/// Grid side length for a given player count.
pub fn grid_size_for_players(player_count: u8) -> u32 {
    match player_count {
        2 => 15,
        3 => 18,
        _ => 20,
    }
}

/// The shared board: a fixed `size * size` square of cells, row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    size: u32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            cells: vec![Cell::default(); (size as usize) * (size as usize)],
        }
    }

    pub fn for_player_count(player_count: u8) -> Self {
        Self::new(grid_size_for_players(player_count))
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, at: Coord) -> bool {
        at.x >= 0 && at.y >= 0 && at.x < self.size as i32 && at.y < self.size as i32
    }

    pub fn index_of(&self, at: Coord) -> Option<usize> {
        if !self.in_bounds(at) {
            return None;
        }
        Some((at.y as usize) * (self.size as usize) + (at.x as usize))
    }

    pub fn coord_at_index(&self, index: usize) -> Option<Coord> {
        if index >= self.cells.len() {
            return None;
        }
        let x = (index % self.size as usize) as i32;
        let y = (index / self.size as usize) as i32;
        Some(Coord { x, y })
    }

    pub fn get(&self, at: Coord) -> Option<&Cell> {
        self.index_of(at).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, at: Coord) -> Option<&mut Cell> {
        self.index_of(at).map(move |i| &mut self.cells[i])
    }

    pub fn site(&self, at: Coord) -> Option<Site> {
        self.get(at).and_then(|c| c.site)
    }

    /// In-bounds 8-adjacent neighbors of `at`, in stable offset order.
    pub fn neighbors(&self, at: Coord) -> impl Iterator<Item = Coord> + '_ {
        at.neighbors().filter(|n| self.in_bounds(*n))
    }

    /// Every coordinate on the grid, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        let size = self.size as i32;
        (0..size).flat_map(move |y| (0..size).map(move |x| Coord { x, y }))
    }

    /// All coordinates owned by `player`, row-major.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = Coord> + '_ {
        self.coords()
            .filter(move |c| self.get(*c).is_some_and(|cell| cell.is_owned_by(player)))
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            size: self.size,
            cells: self.cells.clone(),
        }
    }

    pub fn from_snapshot(snap: &GridSnapshot) -> Option<Self> {
        let expected = (snap.size as usize) * (snap.size as usize);
        if snap.cells.len() != expected {
            return None;
        }
        Some(Self {
            size: snap.size,
            cells: snap.cells.clone(),
        })
    }
}
