//! Strategies for finding a free spot.
//!
//! Every strategy walks the 4-connected neighbour graph of a [`Grid`] from the
//! [entrance](crate::domain::grid::ENTRANCE), in the fixed
//! [direction order](crate::domain::grid::DIRECTIONS), and returns the first
//! cell accepted by the `eligible` predicate. Cells that fail the predicate are
//! still walked through. Each cell is visited at most once, so every search is
//! bounded by the size of the grid.
//!
//! The strategies differ only in the order they visit cells:
//!
//! - [`bfs`] visits by increasing hop count and returns the nearest cell.
//! - [`dfs`] descends as far as it can before backtracking, and usually
//!   returns a farther cell.
//! - [`best_first`] pops the lowest estimated cost from a priority frontier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Coord, Grid};

pub mod best_first;
pub mod bfs;
pub mod dfs;

/// Selects one of the search algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Breadth-first search.
    Bfs,
    /// Depth-first search.
    Dfs,
    /// Cost-guided best-first search.
    #[serde(alias = "astar")]
    BestFirst,
}

impl Strategy {
    /// Every strategy.
    pub const ALL: [Self; 3] = [Self::Bfs, Self::Dfs, Self::BestFirst];

    /// The short name used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bfs => "bfs",
            Self::Dfs => "dfs",
            Self::BestFirst => "best-first",
        }
    }

    /// Runs this strategy over `grid`.
    pub fn search(self, grid: &Grid, eligible: impl Fn(Coord) -> bool) -> Option<Coord> {
        match self {
            Self::Bfs => bfs::search(grid, eligible),
            Self::Dfs => dfs::search(grid, eligible),
            Self::BestFirst => best_first::search(grid, eligible),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dense visited set over the cells of one grid.
#[derive(Debug)]
pub(crate) struct Visited<'a> {
    grid: &'a Grid,
    seen: Vec<bool>,
}

impl<'a> Visited<'a> {
    pub(crate) fn new(grid: &'a Grid) -> Self {
        Self {
            grid,
            seen: vec![false; grid.len()],
        }
    }

    /// Marks `coord` as visited. Returns `false` if it already was.
    pub(crate) fn insert(&mut self, coord: Coord) -> bool {
        let index = self.grid.offset(coord);
        !std::mem::replace(&mut self.seen[index], true)
    }

    pub(crate) fn contains(&self, coord: Coord) -> bool {
        self.seen[self.grid.offset(coord)]
    }
}
