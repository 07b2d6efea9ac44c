#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted A* search over the tile grid.

use std::{cmp::Ordering, collections::BinaryHeap};

use serde::Deserialize;
use sprout_core::{BlockedRange, CellCoord, Dimensions, TileQuery};

static CARDINAL_STEPS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, 1), (0, -1)];
static DIAGONAL_STEPS: [(i32, i32); 4] = [(-1, -1), (1, 1), (-1, 1), (1, -1)];

/// Distance estimate used to rank open nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum Heuristic {
    /// `weight * (|dx| + |dy|)`.
    Manhattan,
    /// `weight * round(sqrt(dx² + dy²))`.
    #[default]
    Euclidean,
}

impl Heuristic {
    /// Estimates the cost between two cells.
    #[must_use]
    pub fn estimate(self, from: CellCoord, to: CellCoord, weight: u32) -> u32 {
        match self {
            Heuristic::Manhattan => weight.saturating_mul(from.manhattan_distance(to)),
            Heuristic::Euclidean => {
                let dx = f64::from(from.column().abs_diff(to.column()));
                let dy = f64::from(from.row().abs_diff(to.row()));
                let rounded = (dx * dx + dy * dy).sqrt().round();
                weight.saturating_mul(rounded as u32)
            }
        }
    }
}

/// Neighbourhood explored around each node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum Connectivity {
    /// Horizontal and vertical neighbours only.
    #[default]
    Four,
    /// Horizontal, vertical and diagonal neighbours.
    Eight,
}

impl Connectivity {
    fn steps(self) -> impl Iterator<Item = (i32, i32)> {
        let diagonals: &'static [(i32, i32)] = match self {
            Connectivity::Four => &[],
            Connectivity::Eight => &DIAGONAL_STEPS,
        };
        CARDINAL_STEPS.iter().chain(diagonals).copied()
    }

    /// Largest Manhattan gap a single-step path may bridge.
    const fn single_step_reach(self) -> u32 {
        match self {
            Connectivity::Four => 1,
            Connectivity::Eight => 2,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Node {
    parent: Option<CellCoord>,
    g: u32,
    f: u32,
}

impl Node {
    const UNVISITED: Self = Self {
        parent: None,
        g: u32::MAX,
        f: u32::MAX,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    h: u32,
    sequence: u64,
    cell: CellCoord,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the greatest entry; lowest f, then h, then age wins.
        (other.f, other.h, other.sequence).cmp(&(self.f, self.h, self.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable A* searcher.
///
/// Scratch buffers are sized to the grid on first use and reset between
/// searches; they are reallocated only when the grid dimensions change.
#[derive(Debug)]
pub struct PathFinder {
    connectivity: Connectivity,
    blocked: BlockedRange,
    prepared: Option<Dimensions>,
    nodes: Vec<Node>,
    closed: Vec<bool>,
    open: BinaryHeap<OpenEntry>,
    sequence: u64,
}

impl PathFinder {
    /// Creates a searcher that treats the trees band as obstructions.
    #[must_use]
    pub fn new(connectivity: Connectivity) -> Self {
        Self {
            connectivity,
            blocked: BlockedRange::TREES,
            prepared: None,
            nodes: Vec::new(),
            closed: Vec::new(),
            open: BinaryHeap::new(),
            sequence: 0,
        }
    }

    /// Neighbourhood used by the searcher.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Finds a path from `start` to `goal`.
    ///
    /// The returned cells begin with the first step after `start` and end at
    /// `goal`. The path is empty when either endpoint is blocked or outside
    /// the grid, when the goal is unreachable, or when `start == goal`.
    pub fn find_path<W>(
        &mut self,
        world: &W,
        start: CellCoord,
        goal: CellCoord,
        heuristic: Heuristic,
        weight: u32,
    ) -> Vec<CellCoord>
    where
        W: TileQuery + ?Sized,
    {
        let dimensions = world.dimensions();
        self.prepare(dimensions);

        let (Some(start_index), Some(goal_index)) = (dimensions.index(start), dimensions.index(goal))
        else {
            return Vec::new();
        };
        if self.blocked.contains(world.block_at(start)) || self.blocked.contains(world.block_at(goal)) {
            return Vec::new();
        }

        self.nodes[start_index] = Node {
            parent: Some(start),
            g: 0,
            f: 0,
        };
        self.push(start, 0, heuristic.estimate(start, goal, weight));

        while let Some(entry) = self.open.pop() {
            if entry.cell == goal {
                break;
            }
            let Some(current_index) = dimensions.index(entry.cell) else {
                continue;
            };
            if self.closed[current_index] {
                continue;
            }
            self.closed[current_index] = true;
            let next_g = self.nodes[current_index].g.saturating_add(1);

            for (dx, dy) in self.connectivity.steps() {
                let neighbor = entry.cell.offset(dx, dy);
                let Some(neighbor_index) = dimensions.index(neighbor) else {
                    continue;
                };
                if self.closed[neighbor_index] || self.blocked.contains(world.block_at(neighbor)) {
                    continue;
                }

                let h = heuristic.estimate(neighbor, goal, weight);
                let f = next_g.saturating_add(h);
                if f < self.nodes[neighbor_index].f {
                    self.nodes[neighbor_index] = Node {
                        parent: Some(entry.cell),
                        g: next_g,
                        f,
                    };
                    self.push(neighbor, f, h);
                }
            }
        }

        let path = self.build_path(dimensions, start, goal, goal_index);
        tracing::trace!(
            start = %start,
            goal = %goal,
            steps = path.len(),
            "path search finished"
        );
        path
    }

    fn prepare(&mut self, dimensions: Dimensions) {
        let area = dimensions.area();
        if self.prepared != Some(dimensions) {
            self.nodes = vec![Node::UNVISITED; area];
            self.closed = vec![false; area];
            self.prepared = Some(dimensions);
        } else {
            self.nodes.fill(Node::UNVISITED);
            self.closed.fill(false);
        }
        self.open.clear();
        self.sequence = 0;
    }

    fn push(&mut self, cell: CellCoord, f: u32, h: u32) {
        self.open.push(OpenEntry {
            f,
            h,
            sequence: self.sequence,
            cell,
        });
        self.sequence += 1;
    }

    fn build_path(
        &self,
        dimensions: Dimensions,
        start: CellCoord,
        goal: CellCoord,
        goal_index: usize,
    ) -> Vec<CellCoord> {
        if self.nodes[goal_index].parent.is_none() {
            return Vec::new();
        }

        let mut path = Vec::new();
        let mut current = goal;
        while let Some(index) = dimensions.index(current) {
            let Some(parent) = self.nodes[index].parent else {
                return Vec::new();
            };
            if parent == current || path.len() > self.nodes.len() {
                break;
            }
            path.push(current);
            current = parent;
        }
        path.reverse();

        if path.len() == 1 && start.manhattan_distance(goal) > self.connectivity.single_step_reach()
        {
            path.clear();
        }
        path
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new(Connectivity::Four)
    }
}
