use crate::domain::{Coord, Grid, VehicleClass};

/// The default charging radius: electric vehicles park where
/// `row + col <= 3`, the cluster nearest the entrance.
pub const DEFAULT_CHARGING_RADIUS: usize = 3;

/// Per-class rules deciding whether a free spot may be assigned.
///
/// A spot that is reserved or occupied never qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Electric vehicles qualify only where `row + col` is at most this.
    pub charging_radius: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            charging_radius: DEFAULT_CHARGING_RADIUS,
        }
    }
}

impl Rules {
    /// Returns `true` if `coord` may be assigned to a vehicle of `class`.
    #[must_use]
    pub fn is_eligible(&self, class: VehicleClass, grid: &Grid, coord: Coord) -> bool {
        grid.is_free(coord)
            && match class {
                VehicleClass::Car | VehicleClass::Bike => true,
                VehicleClass::Electric => coord.row + coord.col <= self.charging_radius,
                VehicleClass::Suv => grid.is_border(coord),
            }
    }

    /// The eligibility predicate for one class over the current grid state.
    pub fn predicate<'a>(
        &'a self,
        class: VehicleClass,
        grid: &'a Grid,
    ) -> impl Fn(Coord) -> bool + 'a {
        move |coord| self.is_eligible(class, grid, coord)
    }
}
