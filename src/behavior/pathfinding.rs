//! A* search over the 8-connected grid
//!
//! Unit step cost, Manhattan heuristic. Successors are filtered through the
//! searching creature's [`MovePolicy`].

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::trace;

use crate::{behavior::legality::MovePolicy, spatial::Coord, world::WorldMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    coord: Coord,
    f_cost: u32,
    seq: u64,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on f, first-in first-out among equals
        Reverse((self.f_cost, self.seq)).cmp(&Reverse((other.f_cost, other.seq)))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Path from `start` to `goal`, excluding `start`, ordered start -> goal.
///
/// Empty when the goal is unreachable, when `start == goal`, or when more
/// than `size²` nodes were expanded.
pub fn find_path(map: &WorldMap, policy: &MovePolicy, start: Coord, goal: Coord) -> Vec<Coord> {
    let max_expansions = map.grid().cell_count();
    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<Coord, Coord> = HashMap::new();
    let mut g_scores: HashMap<Coord, u32> = HashMap::new();
    let mut closed: HashSet<Coord> = HashSet::new();
    let mut seq = 0_u64;

    g_scores.insert(start, 0);
    open_set.push(OpenNode {
        coord: start,
        f_cost: start.distance(goal),
        seq,
    });

    let mut expansions = 0;
    while let Some(current) = open_set.pop() {
        // a cell is re-pushed whenever its g improves; older heap entries for
        // an already expanded cell are stale and skipped here
        if !closed.insert(current.coord) {
            continue;
        }
        expansions += 1;
        if expansions > max_expansions {
            trace!(%start, %goal, "path search exceeded expansion limit");
            return Vec::new();
        }
        if current.coord == goal {
            return reconstruct_path(&came_from, goal);
        }

        let current_g = g_scores[&current.coord];
        for neighbor in map.grid().neighbors(current.coord) {
            if closed.contains(&neighbor) || !policy.allows(map, neighbor) {
                continue;
            }
            let tentative_g = current_g + 1;
            if tentative_g < g_scores.get(&neighbor).copied().unwrap_or(u32::MAX) {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);
                seq += 1;
                open_set.push(OpenNode {
                    coord: neighbor,
                    f_cost: tentative_g + neighbor.distance(goal),
                    seq,
                });
            }
        }
    }

    trace!(%start, %goal, "no path");
    Vec::new()
}

fn reconstruct_path(came_from: &HashMap<Coord, Coord>, mut current: Coord) -> Vec<Coord> {
    let mut path = Vec::new();
    while let Some(&prev) = came_from.get(&current) {
        path.push(current);
        current = prev;
    }
    path.reverse();
    path
}
