use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{
    domain::{Coord, Grid, grid::ENTRANCE},
    search::Visited,
};

/// Estimated remaining cost from `coord`: its Manhattan distance to the
/// entrance.
#[must_use]
pub const fn heuristic(coord: Coord) -> usize {
    coord.manhattan(ENTRANCE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    /// `g + h`.
    f: usize,
    /// Insertion order, breaks ties between equal `f`.
    seq: u64,
    g: usize,
    coord: Coord,
}

// Reversed so that `BinaryHeap` pops the lowest `(f, seq)` first.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first search from the entrance, ordered by `f = g + h`.
///
/// `g` counts the cells traversed from the entrance and `h` is
/// [`heuristic`]. A cell is tested when it is popped from the frontier.
pub fn search(grid: &Grid, eligible: impl Fn(Coord) -> bool) -> Option<Coord> {
    let mut frontier = BinaryHeap::with_capacity(grid.len());
    let mut closed = Visited::new(grid);
    let mut best_g = vec![usize::MAX; grid.len()];
    let mut seq = 0_u64;

    best_g[grid.offset(ENTRANCE)] = 0;
    frontier.push(Entry {
        f: heuristic(ENTRANCE),
        seq,
        g: 0,
        coord: ENTRANCE,
    });

    while let Some(Entry { g, coord, .. }) = frontier.pop() {
        if !closed.insert(coord) {
            continue;
        }
        if eligible(coord) {
            tracing::trace!(%coord, g, "best-first found spot");
            return Some(coord);
        }

        for next in grid.neighbours(coord) {
            if closed.contains(next) {
                continue;
            }
            let cost = g + 1;
            let slot = &mut best_g[grid.offset(next)];
            if cost < *slot {
                *slot = cost;
                seq += 1;
                frontier.push(Entry {
                    f: cost + heuristic(next),
                    seq,
                    g: cost,
                    coord: next,
                });
            }
        }
    }

    tracing::trace!("best-first exhausted grid");
    None
}
