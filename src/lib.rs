//! Grid parking lot allocation.
//!
//! Arriving vehicles are assigned a spot in a fixed-size grid by one of three
//! search strategies. Departing vehicles are billed per started hour.
//!
//! ```
//! use chrono::{TimeDelta, Utc};
//! use parking::{Config, Lot, VehicleClass};
//!
//! let mut lot = Lot::from_config(&Config::default()).unwrap();
//! let now = Utc::now();
//!
//! let check_in = lot.check_in(VehicleClass::Car, now).unwrap();
//! assert_eq!(check_in.name.to_string(), "B1");
//!
//! let receipt = lot.check_out("b1", now + TimeDelta::minutes(90)).unwrap();
//! assert_eq!(receipt.amount, 200.0);
//! ```

pub mod domain;
pub use domain::{Config, Coord, Grid, RateTable, Rules, SpotName, VehicleClass};

pub mod billing;

pub mod search;
pub use search::Strategy;

pub mod lot;
pub use lot::{CheckIn, CheckOutError, GridSnapshot, Lot, NoSpotAvailable, Receipt, SharedLot};
