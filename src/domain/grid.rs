//! The fixed-size occupancy matrix of a lot.
//!
//! The [`Grid`] knows nothing about prices or search strategies. It stores one
//! [`SpotState`] per cell and exposes the primitives everything else is built
//! on.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{
    VehicleClass,
    spot::{Coord, MAX_ROWS, Reservation, Spot, SpotName, SpotState},
};

/// The cell every search starts from.
pub const ENTRANCE: Coord = Coord::new(0, 0);

/// Neighbour expansion order: right, down, left, up.
///
/// Search results depend on this order, so it must not change.
pub const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Errors raised by grid primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The coordinate lies outside the grid.
    #[error("spot ({row}, {col}) is outside the lot")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The spot cannot take a vehicle because it is reserved or occupied.
    #[error("spot {0} is not free")]
    SpotNotFree(SpotName),

    /// The spot holds no vehicle.
    #[error("spot {0} is not occupied")]
    SpotNotOccupied(SpotName),

    /// No spot in this lot has the given name.
    #[error("unknown spot '{0}'")]
    UnknownSpotName(String),

    /// The grid size is unsupported.
    #[error("invalid lot size {rows}x{cols}: rows must be between 1 and 26, columns at least 1")]
    InvalidDimensions {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },

    /// The same spot was reserved twice.
    #[error("spot {0} is reserved more than once")]
    DuplicateReservation(SpotName),
}

/// An R×C matrix of spots with a fixed set of reservations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Row-major cell states.
    cells: Vec<SpotState>,
    /// Re-applied on every reset.
    reservations: Vec<Reservation>,
}

impl Grid {
    /// Creates an empty grid and applies the given reservations.
    ///
    /// # Errors
    ///
    /// Fails if the dimensions are unsupported, or if a reservation is out of
    /// bounds or duplicated.
    pub fn new(rows: usize, cols: usize, reservations: Vec<Reservation>) -> Result<Self, Error> {
        if rows == 0 || rows > MAX_ROWS || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols });
        }

        let mut grid = Self {
            rows,
            cols,
            cells: vec![SpotState::Empty; rows * cols],
            reservations: Vec::with_capacity(reservations.len()),
        };

        for reservation in reservations {
            let index = grid.index(reservation.spot)?;
            if grid.cells[index].is_reserved() {
                return Err(Error::DuplicateReservation(grid.name_of(reservation.spot)));
            }
            grid.cells[index] = SpotState::Reserved {
                kind: reservation.kind,
            };
            grid.reservations.push(reservation);
        }

        Ok(grid)
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Always `false`; a grid has at least one cell.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The reservations applied at construction and on every reset.
    #[must_use]
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Returns `true` if the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// Returns `true` if the coordinate lies on the outer ring of the grid.
    #[must_use]
    pub const fn is_border(&self, coord: Coord) -> bool {
        self.contains(coord)
            && (coord.row == 0
                || coord.row == self.rows - 1
                || coord.col == 0
                || coord.col == self.cols - 1)
    }

    /// Position of an in-bounds coordinate in row-major order.
    pub(crate) const fn offset(&self, coord: Coord) -> usize {
        coord.row * self.cols + coord.col
    }

    fn index(&self, coord: Coord) -> Result<usize, Error> {
        if self.contains(coord) {
            Ok(self.offset(coord))
        } else {
            Err(Error::OutOfBounds {
                row: coord.row,
                col: coord.col,
            })
        }
    }

    /// The cell one step from `coord` in direction `(d_row, d_col)`, if it is
    /// inside the grid.
    #[must_use]
    pub fn step(&self, coord: Coord, (d_row, d_col): (isize, isize)) -> Option<Coord> {
        coord
            .offset(d_row, d_col)
            .filter(|&next| self.contains(next))
    }

    /// In-bounds 4-neighbours of `coord`, in [`DIRECTIONS`] order.
    pub fn neighbours(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        DIRECTIONS
            .into_iter()
            .filter_map(move |delta| self.step(coord, delta))
    }

    /// The name of the spot at `coord`.
    ///
    /// Names depend only on the coordinates, never on state.
    #[must_use]
    pub fn name_of(&self, coord: Coord) -> SpotName {
        SpotName::try_from(coord).unwrap_or_else(|_| {
            unreachable!("grid rows are capped at {MAX_ROWS}, so every row has a letter")
        })
    }

    /// Resolves a spot name to its coordinate.
    ///
    /// Parsing is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSpotName`] if the name is malformed or lies
    /// outside this grid.
    pub fn lookup_by_name(&self, name: &str) -> Result<Coord, Error> {
        name.parse::<SpotName>()
            .ok()
            .map(SpotName::coord)
            .filter(|&coord| self.contains(coord))
            .ok_or_else(|| Error::UnknownSpotName(name.trim().to_string()))
    }

    /// A copy of the spot at `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `coord` is outside the grid.
    pub fn spot_at(&self, coord: Coord) -> Result<Spot, Error> {
        let index = self.index(coord)?;
        Ok(Spot::new(self.name_of(coord), self.cells[index]))
    }

    /// Returns `true` if the spot is inside the grid and empty.
    #[must_use]
    pub fn is_free(&self, coord: Coord) -> bool {
        self.index(coord)
            .is_ok_and(|index| self.cells[index].is_empty())
    }

    /// Parks a vehicle at `coord`, stamping it with `now`.
    ///
    /// # Errors
    ///
    /// Fails if the spot is out of bounds, reserved or already occupied.
    pub fn occupy(
        &mut self,
        coord: Coord,
        class: VehicleClass,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let index = self.index(coord)?;
        if !self.cells[index].is_empty() {
            return Err(Error::SpotNotFree(self.name_of(coord)));
        }
        self.cells[index] = SpotState::Occupied { class, since: now };
        Ok(())
    }

    /// Removes the vehicle at `coord`, returning its class and entry time.
    ///
    /// # Errors
    ///
    /// Fails if the spot is out of bounds or holds no vehicle.
    pub fn release(&mut self, coord: Coord) -> Result<(VehicleClass, DateTime<Utc>), Error> {
        let index = self.index(coord)?;
        let occupant = self.cells[index]
            .occupant()
            .ok_or_else(|| Error::SpotNotOccupied(self.name_of(coord)))?;
        self.cells[index] = SpotState::Empty;
        Ok(occupant)
    }

    /// Empties every spot and re-applies the reservations.
    pub fn reset(&mut self) {
        self.cells.fill(SpotState::Empty);
        for reservation in &self.reservations {
            let index = self.offset(reservation.spot);
            self.cells[index] = SpotState::Reserved {
                kind: reservation.kind,
            };
        }
    }

    /// All spots in row-major order.
    pub fn spots(&self) -> impl Iterator<Item = Spot> + '_ {
        self.cells.iter().enumerate().map(|(index, &state)| {
            let coord = Coord::new(index / self.cols, index % self.cols);
            Spot::new(self.name_of(coord), state)
        })
    }

    /// Number of empty spots.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.cells.iter().filter(|state| state.is_empty()).count()
    }

    /// Number of occupied spots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|state| state.occupant().is_some())
            .count()
    }
}
