use serde::{Deserialize, Serialize};

/// A square-grid coordinate (column `x`, row `y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    /// The eight adjacent offsets, row by row.
    pub const NEIGHBORS: [Coord; 8] = [
        Coord { x: -1, y: -1 },
        Coord { x: 0, y: -1 },
        Coord { x: 1, y: -1 },
        Coord { x: -1, y: 0 },
        Coord { x: 1, y: 0 },
        Coord { x: -1, y: 1 },
        Coord { x: 0, y: 1 },
        Coord { x: 1, y: 1 },
    ];

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn neighbors(self) -> impl Iterator<Item = Coord> {
        Self::NEIGHBORS.into_iter().map(move |d| self + d)
    }

    /// Chessboard distance: adjacent in 8 directions means distance 1.
    #[inline]
    pub fn chebyshev_distance(self, other: Coord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    #[inline]
    pub fn manhattan_distance(self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    #[inline]
    pub fn is_adjacent(self, other: Coord) -> bool {
        self != other && self.chebyshev_distance(other) <= 1
    }
}

impl std::ops::Add for Coord {
    type Output = Coord;

    fn add(self, other: Coord) -> Coord {
        Coord {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_are_the_eight_adjacent_coords() {
        let center = Coord::new(3, 3);
        let neighbors: Vec<_> = center.neighbors().collect();
        assert_eq!(neighbors.len(), 8);
        assert!(neighbors.iter().all(|n| center.is_adjacent(*n)));
        assert!(!neighbors.contains(&center));
    }

    #[test]
    fn chebyshev_distance_matches_expected() {
        let a = Coord::new(7, 7);
        assert_eq!(a.chebyshev_distance(Coord::new(7, 10)), 3);
        assert_eq!(a.chebyshev_distance(Coord::new(2, 7)), 5);
        assert_eq!(a.chebyshev_distance(Coord::new(8, 8)), 1);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn manhattan_distance_sums_axes() {
        let a = Coord::new(0, 0);
        assert_eq!(a.manhattan_distance(Coord::new(3, -1)), 4);
        assert_eq!(a.manhattan_distance(Coord::new(-2, -2)), 4);
    }

    #[test]
    fn not_adjacent_to_self() {
        let a = Coord::new(1, 1);
        assert!(!a.is_adjacent(a));
        assert!(a.is_adjacent(Coord::new(0, 0)));
        assert!(!a.is_adjacent(Coord::new(3, 1)));
    }
}
