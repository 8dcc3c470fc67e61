use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::VehicleClass;

/// The largest number of rows a lot can have; each row is named by one letter.
pub const MAX_ROWS: usize = 26;

/// A 0-indexed `(row, col)` position in the parking grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Coord {
    /// Row index, counted down from the entrance.
    pub row: usize,
    /// Column index, counted right from the entrance.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance between two coordinates.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Moves one step by `(d_row, d_col)`, returning `None` on underflow.
    #[must_use]
    pub const fn offset(self, d_row: isize, d_col: isize) -> Option<Self> {
        match (
            self.row.checked_add_signed(d_row),
            self.col.checked_add_signed(d_col),
        ) {
            (Some(row), Some(col)) => Some(Self { row, col }),
            _ => None,
        }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The human-readable name of a spot, such as `A1` or `C5`.
///
/// The letter encodes the row (`A` is row 0) and the number encodes the
/// column, counting from 1. Names are a pure function of the coordinates.
///
/// ```
/// use parking::domain::{Coord, SpotName};
///
/// let name: SpotName = "c4".parse().unwrap();
/// assert_eq!(name.to_string(), "C4");
/// assert_eq!(name.coord(), Coord::new(2, 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpotName {
    coord: Coord,
}

impl SpotName {
    /// The coordinate this name refers to.
    #[must_use]
    pub const fn coord(self) -> Coord {
        self.coord
    }

    /// The row letter (`'A'..='Z'`).
    #[must_use]
    pub const fn letter(self) -> char {
        // The constructor guarantees row < 26.
        (b'A' + self.coord.row as u8) as char
    }

    /// The 1-based column number.
    #[must_use]
    pub const fn number(self) -> usize {
        self.coord.col + 1
    }
}

impl TryFrom<Coord> for SpotName {
    type Error = ParseSpotNameError;

    fn try_from(coord: Coord) -> Result<Self, Self::Error> {
        if coord.row >= MAX_ROWS {
            return Err(ParseSpotNameError::RowOutOfRange(coord.row));
        }
        Ok(Self { coord })
    }
}

impl fmt::Display for SpotName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.letter(), self.number())
    }
}

impl FromStr for SpotName {
    type Err = ParseSpotNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();

        let Some(letter) = chars.next().filter(char::is_ascii_alphabetic) else {
            return Err(ParseSpotNameError::Syntax(s.to_string()));
        };
        let row = usize::from(letter.to_ascii_uppercase() as u8 - b'A');

        let digits = chars.as_str();
        if digits.is_empty() {
            return Err(ParseSpotNameError::Syntax(s.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) || digits.starts_with('0') {
            return Err(ParseSpotNameError::Column(s.to_string()));
        }
        let number = digits
            .parse::<usize>()
            .map_err(|_| ParseSpotNameError::Column(s.to_string()))?;

        Self::try_from(Coord::new(row, number - 1))
    }
}

impl TryFrom<&str> for SpotName {
    type Error = ParseSpotNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

impl Serialize for SpotName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpotName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing or constructing a [`SpotName`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseSpotNameError {
    /// The name is not a letter followed by a number.
    #[error("Invalid spot name '{0}': expected a row letter followed by a column number (e.g. B3)")]
    Syntax(String),

    /// The column part is not a positive integer.
    #[error("Invalid spot name '{0}': column must be a positive integer without leading zeros")]
    Column(String),

    /// The row index cannot be expressed as a single letter.
    #[error("Row {0} cannot be named: at most 26 rows are supported")]
    RowOutOfRange(usize),
}

/// Why a spot is permanently held back from automatic allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationKind {
    /// Accessible parking.
    Handicapped,
    /// VIP parking.
    Vip,
}

impl fmt::Display for ReservationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Handicapped => "Handicapped",
            Self::Vip => "VIP",
        })
    }
}

/// A spot carved out of the lot at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reservation {
    /// Where the reservation sits.
    pub spot: Coord,
    /// What the spot is reserved for.
    pub kind: ReservationKind,
}

impl Reservation {
    /// Creates a reservation.
    #[must_use]
    pub const fn new(spot: Coord, kind: ReservationKind) -> Self {
        Self { spot, kind }
    }
}

/// The occupancy state of a single spot.
///
/// The entry timestamp lives inside [`SpotState::Occupied`], so a spot has an
/// `occupied_since` time if and only if it is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SpotState {
    /// Free for allocation.
    Empty,
    /// Held back from allocation.
    Reserved {
        /// What the spot is reserved for.
        kind: ReservationKind,
    },
    /// Holding a vehicle.
    Occupied {
        /// The class of the parked vehicle.
        class: VehicleClass,
        /// When the vehicle checked in.
        since: DateTime<Utc>,
    },
}

impl SpotState {
    /// Returns `true` if the spot is free.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if the spot is reserved.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved { .. })
    }

    /// The parked vehicle's class and entry time, if occupied.
    #[must_use]
    pub const fn occupant(&self) -> Option<(VehicleClass, DateTime<Utc>)> {
        match *self {
            Self::Occupied { class, since } => Some((class, since)),
            _ => None,
        }
    }

    /// A short status label for display ("Empty", "Reserved", "Car", ...).
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Reserved { .. } => "Reserved",
            Self::Occupied { class, .. } => class.label(),
        }
    }
}

/// A read-only copy of one cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spot {
    name: SpotName,
    state: SpotState,
}

impl Spot {
    pub(crate) const fn new(name: SpotName, state: SpotState) -> Self {
        Self { name, state }
    }

    /// The spot's name.
    #[must_use]
    pub const fn name(&self) -> SpotName {
        self.name
    }

    /// The spot's coordinate.
    #[must_use]
    pub const fn coord(&self) -> Coord {
        self.name.coord
    }

    /// Row index.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.name.coord.row
    }

    /// Column index.
    #[must_use]
    pub const fn col(&self) -> usize {
        self.name.coord.col
    }

    /// The spot's occupancy state.
    #[must_use]
    pub const fn state(&self) -> SpotState {
        self.state
    }

    /// When the current occupant checked in.
    #[must_use]
    pub const fn occupied_since(&self) -> Option<DateTime<Utc>> {
        match self.state.occupant() {
            Some((_, since)) => Some(since),
            None => None,
        }
    }
}
