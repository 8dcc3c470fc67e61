//! The allocation engine.
//!
//! A [`Lot`] owns a [`Grid`], the [`RateTable`] and the eligibility
//! [`Rules`]. All changes to spot state go through it.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::{
    billing::{self, InvalidDuration},
    domain::{
        Config, Coord, Grid, RateTable, Rules, SpotName, SpotState, VehicleClass, grid,
        vehicle::InvalidRate,
    },
};

pub mod shared;
pub use shared::SharedLot;

/// Error returned when no eligible spot is free for a vehicle.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("No suitable parking spots available for {0}")]
pub struct NoSpotAvailable(pub VehicleClass);

/// Errors raised when a vehicle leaves.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CheckOutError {
    /// No spot in the lot has this name.
    #[error("unknown spot '{0}'")]
    UnknownSpotName(String),

    /// The spot holds no vehicle.
    #[error("spot {0} is not occupied")]
    SpotNotOccupied(SpotName),

    /// The exit time precedes the entry time. The vehicle stays parked.
    #[error(transparent)]
    InvalidDuration(#[from] InvalidDuration),
}

/// Errors raised when building a lot from configuration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BuildError {
    /// The layout cannot be built.
    #[error("invalid lot layout: {0}")]
    Grid(#[from] grid::Error),

    /// A configured rate is not positive.
    #[error("invalid rates: {0}")]
    Rates(#[from] InvalidRate),
}

/// The result of a successful check-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckIn {
    /// The assigned spot.
    pub spot: Coord,
    /// The assigned spot's name.
    pub name: SpotName,
    /// The class of the vehicle.
    pub class: VehicleClass,
    /// Description of the parking type.
    pub description: String,
    /// Hourly rate in force at check-in.
    pub hourly_rate: f64,
    /// Check-in time.
    pub at: DateTime<Utc>,
}

/// The bill handed out at check-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// The vacated spot.
    pub spot: SpotName,
    /// The class of the vehicle.
    pub class: VehicleClass,
    /// Description of the parking type.
    pub description: String,
    /// Hourly rate applied.
    pub hourly_rate: f64,
    /// Check-in time.
    pub entry: DateTime<Utc>,
    /// Check-out time.
    pub exit: DateTime<Utc>,
    /// Exact length of the stay in hours.
    pub hours_parked: f64,
    /// Hours billed after rounding up.
    pub billed_hours: u64,
    /// Total amount due.
    pub amount: f64,
}

/// A read-only view of the whole lot at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSnapshot {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Number of empty spots.
    pub free: usize,
    /// Number of occupied spots.
    pub occupied: usize,
    /// Every spot in row-major order.
    pub spots: Vec<SpotView>,
}

/// One spot in a [`GridSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotView {
    /// The spot's name.
    pub name: SpotName,
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// Occupancy state.
    #[serde(flatten)]
    pub state: SpotState,
    /// Whole seconds since check-in, if occupied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupied_seconds: Option<i64>,
}

impl GridSnapshot {
    /// The spots of one row, left to right.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &SpotView> {
        self.spots.iter().skip(row * self.cols).take(self.cols)
    }
}

/// A parking lot.
#[derive(Debug, Clone)]
pub struct Lot {
    grid: Grid,
    rates: RateTable,
    rules: Rules,
}

impl Lot {
    /// Creates a lot from its parts.
    #[must_use]
    pub const fn new(grid: Grid, rates: RateTable, rules: Rules) -> Self {
        Self { grid, rates, rules }
    }

    /// Builds an empty lot from configuration.
    ///
    /// # Errors
    ///
    /// Fails if the layout or the rates in `config` are invalid.
    pub fn from_config(config: &Config) -> Result<Self, BuildError> {
        Ok(Self::new(config.grid()?, config.rate_table()?, config.rules()))
    }

    /// The underlying grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The current rate table.
    #[must_use]
    pub const fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// The eligibility rules.
    #[must_use]
    pub const fn rules(&self) -> Rules {
        self.rules
    }

    /// Parks a vehicle in the first eligible spot found by its class's search
    /// strategy.
    ///
    /// # Errors
    ///
    /// Returns [`NoSpotAvailable`] if no eligible spot is free. The lot is
    /// left unchanged.
    #[instrument(level = "debug", skip(self))]
    pub fn check_in(
        &mut self,
        class: VehicleClass,
        now: DateTime<Utc>,
    ) -> Result<CheckIn, NoSpotAvailable> {
        let tariff = self.rates.get(class);
        let strategy = tariff.strategy();

        let Some(coord) = strategy.search(&self.grid, self.rules.predicate(class, &self.grid))
        else {
            tracing::debug!(%strategy, "no eligible spot");
            return Err(NoSpotAvailable(class));
        };

        if let Err(e) = self.grid.occupy(coord, class, now) {
            tracing::error!("search returned a spot that cannot be occupied: {e}");
            return Err(NoSpotAvailable(class));
        }

        let name = self.grid.name_of(coord);
        tracing::debug!(%name, %strategy, "vehicle checked in");

        Ok(CheckIn {
            spot: coord,
            name,
            class,
            description: tariff.description().to_string(),
            hourly_rate: tariff.hourly_rate(),
            at: now,
        })
    }

    /// Removes the vehicle parked at `name` and bills the stay.
    ///
    /// The spot is only released once the charge is computed, so a failed
    /// check-out leaves the vehicle parked.
    ///
    /// # Errors
    ///
    /// Fails if the name does not resolve to a spot in this lot, if the spot
    /// is not occupied, or if `now` precedes the check-in time.
    #[instrument(level = "debug", skip(self))]
    pub fn check_out(&mut self, name: &str, now: DateTime<Utc>) -> Result<Receipt, CheckOutError> {
        let coord = self
            .grid
            .lookup_by_name(name)
            .map_err(|_| CheckOutError::UnknownSpotName(name.trim().to_string()))?;
        let spot = self.grid.name_of(coord);

        let (class, entry) = self
            .grid
            .spot_at(coord)
            .ok()
            .and_then(|spot| spot.state().occupant())
            .ok_or(CheckOutError::SpotNotOccupied(spot))?;

        let charge = self.rates.charge(class, entry, now)?;
        self.grid
            .release(coord)
            .map_err(|_| CheckOutError::SpotNotOccupied(spot))?;

        tracing::debug!(%spot, amount = charge.amount, "vehicle checked out");

        Ok(Receipt {
            spot,
            class,
            description: self.rates.get(class).description().to_string(),
            hourly_rate: charge.hourly_rate,
            entry,
            exit: now,
            hours_parked: charge.hours_parked,
            billed_hours: charge.billed_hours,
            amount: charge.amount,
        })
    }

    /// Clears every vehicle and re-applies the reservations. Rates are kept.
    #[instrument(level = "debug", skip(self))]
    pub fn reset(&mut self) {
        self.grid.reset();
    }

    /// A read-only view of every spot at `now`.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> GridSnapshot {
        let spots = self
            .grid
            .spots()
            .map(|spot| SpotView {
                name: spot.name(),
                row: spot.row(),
                col: spot.col(),
                state: spot.state(),
                occupied_seconds: spot
                    .occupied_since()
                    .map(|since| (now - since).num_seconds().max(0)),
            })
            .collect();

        GridSnapshot {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            free: self.grid.free_count(),
            occupied: self.grid.occupied_count(),
            spots,
        }
    }

    /// Changes the hourly rate of one class, returning the previous rate.
    ///
    /// Vehicles already parked are billed at the new rate when they leave.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRate`] if `rate` is not positive.
    #[instrument(level = "debug", skip(self))]
    pub fn set_rate(&mut self, class: VehicleClass, rate: f64) -> Result<f64, InvalidRate> {
        self.rates.set_rate(class, rate)
    }

    /// Changes several rates at once. If any rate is invalid, none is applied.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidRate`].
    pub fn set_rates(
        &mut self,
        rates: impl IntoIterator<Item = (VehicleClass, f64)>,
    ) -> Result<(), InvalidRate> {
        self.rates.set_rates(rates)
    }

    /// Prices a stay of the given length without touching the lot.
    #[must_use]
    pub fn quote(&self, class: VehicleClass, duration: TimeDelta) -> billing::Charge {
        billing::quote(self.rates.hourly_rate(class), duration)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::domain::{ReservationKind, ReservedSpot};

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn default_lot() -> Lot {
        Lot::from_config(&Config::default()).unwrap()
    }

    fn open_lot(rows: usize, cols: usize) -> Lot {
        Lot::from_config(&Config::default().with_size(rows, cols).with_reserved([])).unwrap()
    }

    #[test]
    fn car_gets_nearest_free_spot() {
        let mut lot = default_lot();
        let check_in = lot.check_in(VehicleClass::Car, t0()).unwrap();

        assert_eq!(check_in.name.to_string(), "B1");
        assert_eq!(check_in.spot, Coord::new(1, 0));
        assert_eq!(check_in.description, "AC Parking");
        assert_eq!(check_in.hourly_rate, 100.0);
        assert_eq!(check_in.at, t0());
    }

    #[test]
    fn bike_follows_depth_first_order() {
        let mut lot = default_lot();
        let check_in = lot.check_in(VehicleClass::Bike, t0()).unwrap();
        assert_eq!(check_in.name.to_string(), "A3");
    }

    #[test]
    fn suv_and_electric_use_their_rules() {
        let mut lot = default_lot();
        let suv = lot.check_in(VehicleClass::Suv, t0()).unwrap();
        assert!(lot.grid().is_border(suv.spot));

        let electric = lot.check_in(VehicleClass::Electric, t0()).unwrap();
        assert!(electric.spot.row + electric.spot.col <= 3);
    }

    #[test]
    fn reserved_spots_are_never_assigned() {
        let mut lot = default_lot();
        while let Ok(check_in) = lot.check_in(VehicleClass::Car, t0()) {
            assert!(check_in.spot.row > 0 || check_in.spot.col > 1);
        }
        assert_eq!(lot.grid().free_count(), 0);
        assert_eq!(lot.grid().occupied_count(), 23);
    }

    #[test]
    fn full_lot_reports_no_spot_and_changes_nothing() {
        let mut lot = open_lot(2, 2);
        for _ in 0..4 {
            lot.check_in(VehicleClass::Car, t0()).unwrap();
        }
        let before = lot.snapshot(t0());

        assert_eq!(
            lot.check_in(VehicleClass::Bike, t0()),
            Err(NoSpotAvailable(VehicleClass::Bike))
        );
        assert_eq!(lot.snapshot(t0()), before);
    }

    #[test]
    fn electric_never_gets_a_spot_outside_the_charging_radius() {
        let mut lot = default_lot();
        let far = Coord::new(2, 2);
        for spot in lot.grid().clone().spots() {
            if spot.coord() != far && spot.state().is_empty() {
                lot.grid.occupy(spot.coord(), VehicleClass::Car, t0()).unwrap();
            }
        }
        assert!(lot.grid().is_free(far));

        assert_eq!(
            lot.check_in(VehicleClass::Electric, t0()),
            Err(NoSpotAvailable(VehicleClass::Electric))
        );
        assert!(lot.grid().is_free(far));
    }

    #[test]
    fn check_out_bills_the_stay() {
        let mut lot = default_lot();
        let check_in = lot.check_in(VehicleClass::Car, t0()).unwrap();

        let receipt = lot
            .check_out(&check_in.name.to_string(), t0() + TimeDelta::minutes(90))
            .unwrap();

        assert_eq!(receipt.spot, check_in.name);
        assert_eq!(receipt.class, VehicleClass::Car);
        assert_eq!(receipt.hours_parked, 1.5);
        assert_eq!(receipt.billed_hours, 2);
        assert_eq!(receipt.amount, 200.0);
        assert!(lot.grid().is_free(check_in.spot));
    }

    #[test]
    fn check_out_accepts_lowercase_names() {
        let mut lot = default_lot();
        lot.check_in(VehicleClass::Car, t0()).unwrap();
        let receipt = lot.check_out(" b1 ", t0() + TimeDelta::minutes(5)).unwrap();
        assert_eq!(receipt.amount, 100.0);
    }

    #[test]
    fn check_out_rejects_unknown_and_empty_spots() {
        let mut lot = default_lot();
        assert_eq!(
            lot.check_out("Z9", t0()),
            Err(CheckOutError::UnknownSpotName("Z9".to_string()))
        );
        assert_eq!(
            lot.check_out("B6", t0()),
            Err(CheckOutError::UnknownSpotName("B6".to_string()))
        );
        assert_eq!(
            lot.check_out("C3", t0()),
            Err(CheckOutError::SpotNotOccupied("C3".parse().unwrap()))
        );
        assert_eq!(
            lot.check_out("A1", t0()),
            Err(CheckOutError::SpotNotOccupied("A1".parse().unwrap()))
        );
    }

    #[test]
    fn check_out_before_entry_keeps_vehicle_parked() {
        let mut lot = default_lot();
        let entry = t0() + TimeDelta::hours(1);
        let check_in = lot.check_in(VehicleClass::Car, entry).unwrap();

        let error = lot.check_out("B1", t0()).unwrap_err();
        assert!(matches!(error, CheckOutError::InvalidDuration(_)));
        assert!(!lot.grid().is_free(check_in.spot));
    }

    #[test]
    fn freed_spot_can_be_reused() {
        let mut lot = default_lot();
        let first = lot.check_in(VehicleClass::Car, t0()).unwrap();
        lot.check_out(&first.name.to_string(), t0()).unwrap();
        let second = lot.check_in(VehicleClass::Car, t0()).unwrap();
        assert_eq!(second.spot, first.spot);
    }

    #[test]
    fn reset_clears_vehicles_and_keeps_reservations() {
        let mut lot = default_lot();
        lot.set_rate(VehicleClass::Car, 125.0).unwrap();
        for class in VehicleClass::ALL {
            lot.check_in(class, t0()).unwrap();
        }

        lot.reset();

        let snapshot = lot.snapshot(t0());
        assert_eq!(snapshot.occupied, 0);
        assert_eq!(snapshot.free, 23);
        assert_eq!(
            snapshot.spots[0].state,
            SpotState::Reserved {
                kind: ReservationKind::Handicapped
            }
        );
        assert_eq!(
            snapshot.spots[1].state,
            SpotState::Reserved {
                kind: ReservationKind::Vip
            }
        );
        assert_eq!(lot.rates().hourly_rate(VehicleClass::Car), 125.0);

        lot.reset();
        assert_eq!(lot.snapshot(t0()), snapshot);
    }

    #[test]
    fn invalid_rate_keeps_previous_rate() {
        let mut lot = default_lot();
        let error = lot.set_rate(VehicleClass::Car, -5.0).unwrap_err();
        assert_eq!(error.class, VehicleClass::Car);
        assert_eq!(lot.rates().hourly_rate(VehicleClass::Car), 100.0);
    }

    #[test]
    fn new_rate_applies_to_parked_vehicles() {
        let mut lot = default_lot();
        lot.check_in(VehicleClass::Bike, t0()).unwrap();
        lot.set_rates([(VehicleClass::Bike, 70.0)]).unwrap();
        let receipt = lot.check_out("A3", t0() + TimeDelta::minutes(30)).unwrap();
        assert_eq!(receipt.amount, 70.0);
    }

    #[test]
    fn snapshot_reports_occupied_time() {
        let mut lot = default_lot();
        lot.check_in(VehicleClass::Car, t0()).unwrap();

        let snapshot = lot.snapshot(t0() + TimeDelta::seconds(125));
        let b1 = snapshot.row(1).next().unwrap();
        assert_eq!(b1.name.to_string(), "B1");
        assert_eq!(b1.occupied_seconds, Some(125));
        assert!(
            snapshot
                .spots
                .iter()
                .filter(|spot| spot.name != b1.name)
                .all(|spot| spot.occupied_seconds.is_none())
        );
    }

    #[test]
    fn snapshot_serializes_state_inline() {
        let mut lot = default_lot();
        lot.check_in(VehicleClass::Car, t0()).unwrap();
        let json = serde_json::to_value(lot.snapshot(t0())).unwrap();

        assert_eq!(json["rows"], 5);
        assert_eq!(json["spots"][0]["status"], "reserved");
        assert_eq!(json["spots"][0]["kind"], "handicapped");
        assert_eq!(json["spots"][5]["name"], "B1");
        assert_eq!(json["spots"][5]["status"], "occupied");
        assert_eq!(json["spots"][5]["class"], "car");
        assert_eq!(json["spots"][5]["occupied_seconds"], 0);
        assert!(json["spots"][2].get("occupied_seconds").is_none());
    }

    #[test]
    fn from_config_rejects_bad_layouts() {
        let config = Config::default().with_size(0, 5);
        assert!(matches!(Lot::from_config(&config), Err(BuildError::Grid(_))));

        let config = Config::default().with_reserved([
            ReservedSpot {
                spot: "A1".parse().unwrap(),
                kind: ReservationKind::Vip,
            },
            ReservedSpot {
                spot: "a1".parse().unwrap(),
                kind: ReservationKind::Handicapped,
            },
        ]);
        assert!(matches!(
            Lot::from_config(&config),
            Err(BuildError::Grid(grid::Error::DuplicateReservation(_)))
        ));
    }

    #[test]
    fn quote_does_not_need_a_vehicle() {
        let lot = default_lot();
        assert_eq!(lot.quote(VehicleClass::Suv, TimeDelta::minutes(61)).amount, 300.0);
    }

    fn class() -> impl Strategy<Value = VehicleClass> {
        prop::sample::select(VehicleClass::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn check_in_only_assigns_free_spots(
            rows in 1_usize..=8,
            cols in 1_usize..=8,
            arrivals in prop::collection::vec(class(), 0..80),
        ) {
            let mut lot = Lot::from_config(&Config::default().with_size(rows, cols).with_reserved(
                (cols > 1).then(|| ReservedSpot {
                    spot: "A2".parse().unwrap(),
                    kind: ReservationKind::Vip,
                }),
            ))
            .unwrap();

            for class in arrivals {
                let before = lot.grid().clone();
                let rules = lot.rules();
                match lot.check_in(class, t0()) {
                    Ok(check_in) => {
                        prop_assert!(rules.is_eligible(class, &before, check_in.spot));
                        prop_assert_eq!(lot.grid().free_count(), before.free_count() - 1);
                    }
                    Err(NoSpotAvailable(failed)) => {
                        prop_assert_eq!(failed, class);
                        prop_assert_eq!(lot.grid(), &before);
                        prop_assert!(
                            before
                                .spots()
                                .all(|spot| !rules.is_eligible(class, &before, spot.coord()))
                        );
                    }
                }
            }

            let grid = lot.grid();
            for reservation in grid.reservations() {
                prop_assert!(grid.spot_at(reservation.spot).unwrap().state().is_reserved());
            }
        }

        #[test]
        fn check_in_then_check_out_round_trips(
            rows in 1_usize..=6,
            cols in 1_usize..=6,
            class in class(),
            minutes in 0_i64..10_000,
        ) {
            let mut lot = open_lot(rows, cols);
            if let Ok(check_in) = lot.check_in(class, t0()) {
                let receipt = lot
                    .check_out(&check_in.name.to_string(), t0() + TimeDelta::minutes(minutes))
                    .unwrap();
                prop_assert!(receipt.hours_parked >= 0.0);
                prop_assert!(receipt.billed_hours >= 1);
                prop_assert_eq!(lot.grid().free_count(), rows * cols);
            }
        }
    }
}
