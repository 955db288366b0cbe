//! Spatial model - square cell grid with integer coordinates

use std::fmt;

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Cell position (or offset) on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this position by another coordinate
    pub fn shift(self, offset: Coord) -> Coord {
        Coord::new(self.x + offset.x, self.y + offset.y)
    }

    /// Manhattan distance between two positions
    pub fn distance(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The eight single-cell steps a creature may take
pub const STEPS: [Coord; 8] = [
    Coord::new(-1, -1),
    Coord::new(-1, 0),
    Coord::new(-1, 1),
    Coord::new(0, -1),
    Coord::new(0, 1),
    Coord::new(1, -1),
    Coord::new(1, 0),
    Coord::new(1, 1),
];

/// Square grid of `size` x `size` cells
#[derive(Debug, Clone)]
pub struct Grid {
    size: i32,
    offsets: Vec<Coord>,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        Self {
            size,
            offsets: sorted_offsets(size),
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        (self.size.max(0) as usize).pow(2)
    }

    pub fn in_bounds(&self, pos: Coord) -> bool {
        (0..self.size).contains(&pos.x) && (0..self.size).contains(&pos.y)
    }

    /// Neighbouring positions (8-connectivity), bounds unchecked
    pub fn neighbors(&self, pos: Coord) -> impl Iterator<Item = Coord> {
        STEPS.into_iter().map(move |step| pos.shift(step))
    }

    /// Every non-zero offset reachable on this grid, nearest first.
    ///
    /// Ties in Manhattan distance keep the order in which a ring-by-ring
    /// sweep (radius 1, 2, ...) first produces each offset.
    pub fn offsets(&self) -> &[Coord] {
        &self.offsets
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.size).flat_map(move |y| (0..self.size).map(move |x| Coord::new(x, y)))
    }

    /// Draw `count` distinct cells uniformly at random
    pub fn random_cells(&self, count: usize, rng: &mut dyn RngCore) -> Vec<Coord> {
        let cells: Vec<Coord> = self.cells().collect();
        cells.choose_multiple(rng, count).copied().collect()
    }
}

fn sorted_offsets(size: i32) -> Vec<Coord> {
    let reach = (size - 1).max(0);
    let mut offsets = Vec::new();
    for dx in -reach..=reach {
        for dy in -reach..=reach {
            if dx != 0 || dy != 0 {
                offsets.push(Coord::new(dx, dy));
            }
        }
    }
    offsets.sort_by_key(|o| (o.x.abs() + o.y.abs(), o.x.abs().max(o.y.abs())));
    offsets
}
