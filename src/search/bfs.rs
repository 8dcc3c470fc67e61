use std::collections::VecDeque;

use crate::{
    domain::{Coord, Grid, grid::ENTRANCE},
    search::Visited,
};

/// Breadth-first search from the entrance.
///
/// Returns the eligible cell with the fewest hops from the entrance. Cells at
/// equal distance are ranked by expansion order.
pub fn search(grid: &Grid, eligible: impl Fn(Coord) -> bool) -> Option<Coord> {
    let mut visited = Visited::new(grid);
    let mut queue = VecDeque::with_capacity(grid.len());

    visited.insert(ENTRANCE);
    queue.push_back(ENTRANCE);

    while let Some(coord) = queue.pop_front() {
        if eligible(coord) {
            tracing::trace!(%coord, "bfs found spot");
            return Some(coord);
        }
        for next in grid.neighbours(coord) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    tracing::trace!("bfs exhausted grid");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_cell_wins() {
        let grid = Grid::new(5, 5, Vec::new()).unwrap();
        let far = Coord::new(4, 4);
        let near = Coord::new(1, 1);
        let found = search(&grid, |coord| coord == far || coord == near);
        assert_eq!(found, Some(near));
    }

    #[test]
    fn equal_distance_prefers_right_before_down() {
        let grid = Grid::new(3, 3, Vec::new()).unwrap();
        let found = search(&grid, |coord| coord != ENTRANCE);
        assert_eq!(found, Some(Coord::new(0, 1)));
    }

    #[test]
    fn visits_by_hop_count() {
        let grid = Grid::new(3, 3, Vec::new()).unwrap();
        let order = crate::search::tests::visit_order(crate::search::Strategy::Bfs, &grid);
        let hops: Vec<_> = order.iter().map(|coord| coord.manhattan(ENTRANCE)).collect();
        assert!(hops.windows(2).all(|pair| pair[0] <= pair[1]), "{hops:?}");
    }
}
