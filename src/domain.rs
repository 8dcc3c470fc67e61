//! Domain models for the parking lot.
//!
//! This module contains the grid and its spots, vehicle classes and their
//! tariffs, the eligibility rules, and configuration.

pub mod grid;
pub use grid::Grid;

/// Spot coordinates, names and states.
pub mod spot;
pub use spot::{Coord, Reservation, ReservationKind, Spot, SpotName, SpotState};

/// Vehicle classes and the rate table.
pub mod vehicle;
pub use vehicle::{RateTable, Tariff, VehicleClass};

/// Which spots each vehicle class may use.
pub mod eligibility;
pub use eligibility::Rules;

mod config;
pub use config::{Config, ReservedSpot};
