use crate::{
    domain::{
        Coord, Grid,
        grid::{DIRECTIONS, ENTRANCE},
    },
    search::Visited,
};

/// Depth-first search from the entrance.
///
/// Cells are tested in pre-order: a cell is tested when it is first reached,
/// then its neighbours are explored one branch at a time. The visited set is
/// shared across branches, so a cell reached on one branch is never revisited
/// from another.
pub fn search(grid: &Grid, eligible: impl Fn(Coord) -> bool) -> Option<Coord> {
    let mut visited = Visited::new(grid);

    visited.insert(ENTRANCE);
    if eligible(ENTRANCE) {
        return Some(ENTRANCE);
    }

    // Each frame holds a cell and the index of the next direction to try.
    let mut stack = vec![(ENTRANCE, 0_usize)];

    while let Some(frame) = stack.last_mut() {
        let Some(&delta) = DIRECTIONS.get(frame.1) else {
            stack.pop();
            continue;
        };
        frame.1 += 1;

        let Some(next) = grid.step(frame.0, delta) else {
            continue;
        };
        if !visited.insert(next) {
            continue;
        }
        if eligible(next) {
            tracing::trace!(coord = %next, depth = stack.len(), "dfs found spot");
            return Some(next);
        }
        stack.push((next, 0));
    }

    tracing::trace!("dfs exhausted grid");
    None
}
