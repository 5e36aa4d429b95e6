use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use super::oracle::PassabilityOracle;
use super::tile::{Direction, TileCoord};

/// Ordered tile sequence from start (first) to goal (last). Never empty and
/// never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Path {
    tiles: Vec<TileCoord>,
}

impl Path {
    pub fn single(tile: TileCoord) -> Self {
        Self { tiles: vec![tile] }
    }

    /// Unvalidated straight run of `count` steps from `start`. Stops early if
    /// the coordinate space overflows.
    pub fn straight_line(start: TileCoord, direction: Direction, count: u32) -> Self {
        let mut tiles = Vec::with_capacity(count as usize + 1);
        tiles.push(start);
        let mut cursor = start;
        for _ in 0..count {
            let Some(next) = cursor.offset(direction) else {
                break;
            };
            tiles.push(next);
            cursor = next;
        }
        Self { tiles }
    }

    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn start(&self) -> TileCoord {
        self.tiles[0]
    }

    pub fn goal(&self) -> TileCoord {
        self.tiles[self.tiles.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<TileCoord> {
        self.tiles.get(index).copied()
    }

    /// Number of single-tile moves, which is also the total cost.
    pub fn step_count(&self) -> usize {
        self.tiles.len() - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableReason {
    Exhausted,
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no path from {start} to {goal} ({reason:?} after {expanded} expansions)")]
pub struct Unreachable {
    pub start: TileCoord,
    pub goal: TileCoord,
    pub expanded: usize,
    pub reason: UnreachableReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    coord: TileCoord,
    g_cost: u32,
    h_cost: u32,
    f_cost: u32,
    insertion_order: u64,
}

impl OpenNode {
    fn order_key(&self) -> (u32, u32, i32, i32, u64) {
        (
            self.f_cost,
            self.h_cost,
            self.coord.y,
            self.coord.x,
            self.insertion_order,
        )
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest key pops first.
        other.order_key().cmp(&self.order_key())
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Four-connected A* with unit edge cost and a Manhattan heuristic.
///
/// Ties on `f` break by lower `h`, then row, then column, then insertion
/// order. At most `expansion_budget` nodes are expanded; running out reports
/// [`UnreachableReason::BudgetExhausted`]. The start tile itself is never
/// checked against the oracle.
pub fn find_path<O>(
    start: TileCoord,
    goal: TileCoord,
    oracle: &O,
    expansion_budget: usize,
) -> Result<Path, Unreachable>
where
    O: PassabilityOracle + ?Sized,
{
    if start == goal {
        return Ok(Path::single(start));
    }

    let mut open = BinaryHeap::new();
    let mut closed: HashSet<TileCoord> = HashSet::new();
    let mut best_g: HashMap<TileCoord, u32> = HashMap::new();
    let mut parent: HashMap<TileCoord, TileCoord> = HashMap::new();
    let mut expanded = 0usize;
    let mut next_insertion = 0u64;

    let start_h = start.manhattan_distance(goal);
    open.push(OpenNode {
        coord: start,
        g_cost: 0,
        h_cost: start_h,
        f_cost: start_h,
        insertion_order: next_insertion,
    });
    next_insertion = next_insertion.saturating_add(1);
    best_g.insert(start, 0);

    while let Some(current) = open.pop() {
        if closed.contains(&current.coord) {
            continue;
        }
        if expanded >= expansion_budget {
            return Err(Unreachable {
                start,
                goal,
                expanded,
                reason: UnreachableReason::BudgetExhausted,
            });
        }
        expanded += 1;
        closed.insert(current.coord);

        if current.coord == goal {
            return Ok(reconstruct_path(&parent, start, goal));
        }

        for direction in Direction::ALL {
            let Some(neighbor) = current.coord.offset(direction) else {
                continue;
            };
            if closed.contains(&neighbor) {
                continue;
            }
            let tentative_g = current.g_cost.saturating_add(1);
            if best_g
                .get(&neighbor)
                .is_some_and(|known| tentative_g >= *known)
            {
                continue;
            }
            if !oracle.is_passable(neighbor) {
                continue;
            }

            best_g.insert(neighbor, tentative_g);
            parent.insert(neighbor, current.coord);
            let h_cost = neighbor.manhattan_distance(goal);
            open.push(OpenNode {
                coord: neighbor,
                g_cost: tentative_g,
                h_cost,
                f_cost: tentative_g.saturating_add(h_cost),
                insertion_order: next_insertion,
            });
            next_insertion = next_insertion.saturating_add(1);
        }
    }

    Err(Unreachable {
        start,
        goal,
        expanded,
        reason: UnreachableReason::Exhausted,
    })
}

fn reconstruct_path(
    parent: &HashMap<TileCoord, TileCoord>,
    start: TileCoord,
    goal: TileCoord,
) -> Path {
    let mut tiles = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        let Some(previous) = parent.get(&cursor).copied() else {
            break;
        };
        tiles.push(previous);
        cursor = previous;
    }
    tiles.reverse();
    Path { tiles }
}
