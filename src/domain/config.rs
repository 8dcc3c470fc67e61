use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        Grid, RateTable, Tariff, VehicleClass,
        eligibility::{DEFAULT_CHARGING_RADIUS, Rules},
        grid,
        spot::{Reservation, ReservationKind, SpotName},
        vehicle::InvalidRate,
    },
    search::Strategy,
};

/// Startup configuration for a lot.
///
/// The configuration describes the initial layout and prices. It is read once
/// at startup and never written back with lot state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    rows: usize,
    cols: usize,

    /// Spots held back from allocation, re-applied on every reset.
    reserved: Vec<ReservedSpot>,

    /// Electric vehicles park where `row + col` is at most this.
    charging_radius: usize,

    /// Label printed in front of amounts, such as `Rs.`.
    currency: String,

    tariffs: BTreeMap<VehicleClass, Tariff>,
}

/// One reserved spot, as written in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedSpot {
    /// The spot's name, such as `A1`.
    pub spot: SpotName,
    /// What it is reserved for.
    pub kind: ReservationKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            reserved: default_reserved(),
            charging_radius: DEFAULT_CHARGING_RADIUS,
            currency: default_currency(),
            tariffs: default_tariffs(),
        }
    }
}

impl Config {
    /// Loads and validates the configuration from a TOML file at the given
    /// path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the TOML content is
    /// invalid, or if it describes a lot that cannot be built.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration at `path`, or the defaults if there is no file
    /// there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Checks that the configuration describes a lot that can be built.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        self.grid()
            .map_err(|e| format!("Invalid config file: {e}"))?;
        self.rate_table()
            .map_err(|e| format!("Invalid config file: {e}"))?;
        Ok(())
    }

    /// Number of rows in the lot.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns in the lot.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// The reserved spots.
    #[must_use]
    pub fn reserved(&self) -> &[ReservedSpot] {
        &self.reserved
    }

    /// The radius of the charging cluster.
    #[must_use]
    pub const fn charging_radius(&self) -> usize {
        self.charging_radius
    }

    /// The currency label.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The configured tariff of a class.
    #[must_use]
    pub fn tariff(&self, class: VehicleClass) -> Tariff {
        self.tariffs
            .get(&class)
            .cloned()
            .unwrap_or_else(|| Tariff::default_for(class))
    }

    /// The eligibility rules this configuration implies.
    #[must_use]
    pub const fn rules(&self) -> Rules {
        Rules {
            charging_radius: self.charging_radius,
        }
    }

    /// Builds an empty grid with the configured reservations.
    ///
    /// # Errors
    ///
    /// Fails if the size is unsupported or a reservation does not fit.
    pub fn grid(&self) -> Result<Grid, grid::Error> {
        let reservations = self
            .reserved
            .iter()
            .map(|reserved| Reservation::new(reserved.spot.coord(), reserved.kind))
            .collect();
        Grid::new(self.rows, self.cols, reservations)
    }

    /// Builds the validated rate table.
    ///
    /// # Errors
    ///
    /// Fails if any configured rate is not positive.
    pub fn rate_table(&self) -> Result<RateTable, InvalidRate> {
        RateTable::new(VehicleClass::ALL.map(|class| (class, self.tariff(class))))
    }

    /// Sets the lot size.
    #[must_use]
    pub const fn with_size(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Replaces the reserved spots.
    #[must_use]
    pub fn with_reserved(mut self, reserved: impl IntoIterator<Item = ReservedSpot>) -> Self {
        self.reserved = reserved.into_iter().collect();
        self
    }

    /// Sets the charging radius.
    #[must_use]
    pub const fn with_charging_radius(mut self, radius: usize) -> Self {
        self.charging_radius = radius;
        self
    }

    /// Sets the currency label.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Replaces the tariff of one class.
    #[must_use]
    pub fn with_tariff(mut self, class: VehicleClass, tariff: Tariff) -> Self {
        self.tariffs.insert(class, tariff);
        self
    }
}

const fn default_rows() -> usize {
    5
}

const fn default_cols() -> usize {
    5
}

const fn default_charging_radius() -> usize {
    DEFAULT_CHARGING_RADIUS
}

fn default_currency() -> String {
    "Rs.".to_string()
}

fn default_reserved() -> Vec<ReservedSpot> {
    [
        (0, ReservationKind::Handicapped),
        (1, ReservationKind::Vip),
    ]
    .into_iter()
    .filter_map(|(col, kind)| {
        SpotName::try_from(crate::domain::Coord::new(0, col))
            .ok()
            .map(|spot| ReservedSpot { spot, kind })
    })
    .collect()
}

fn default_tariffs() -> BTreeMap<VehicleClass, Tariff> {
    VehicleClass::ALL
        .into_iter()
        .map(|class| (class, Tariff::default_for(class)))
        .collect()
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_rows")]
        rows: usize,

        #[serde(default = "default_cols")]
        cols: usize,

        #[serde(default = "default_charging_radius")]
        charging_radius: usize,

        #[serde(default = "default_currency")]
        currency: String,

        #[serde(default = "default_reserved")]
        reserved: Vec<ReservedSpot>,

        #[serde(default)]
        rates: RatesV1,
    },
}

/// Per-class overrides. Missing classes and fields keep their defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RatesV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    car: Option<TariffV1>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bike: Option<TariffV1>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suv: Option<TariffV1>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "ev")]
    electric: Option<TariffV1>,
}

impl RatesV1 {
    fn slot(&mut self, class: VehicleClass) -> &mut Option<TariffV1> {
        match class {
            VehicleClass::Car => &mut self.car,
            VehicleClass::Bike => &mut self.bike,
            VehicleClass::Suv => &mut self.suv,
            VehicleClass::Electric => &mut self.electric,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TariffV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
}

impl TariffV1 {
    fn merge_onto(self, defaults: Tariff) -> Tariff {
        Tariff::new(
            self.rate.unwrap_or(defaults.hourly_rate()),
            self.description
                .unwrap_or_else(|| defaults.description().to_string()),
            self.strategy.unwrap_or(defaults.strategy()),
        )
    }
}

impl From<Tariff> for TariffV1 {
    fn from(tariff: Tariff) -> Self {
        Self {
            rate: Some(tariff.hourly_rate()),
            description: Some(tariff.description().to_string()),
            strategy: Some(tariff.strategy()),
        }
    }
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                rows,
                cols,
                charging_radius,
                currency,
                reserved,
                mut rates,
            } => {
                let tariffs = VehicleClass::ALL
                    .into_iter()
                    .map(|class| {
                        let defaults = Tariff::default_for(class);
                        let tariff = match rates.slot(class).take() {
                            Some(overrides) => overrides.merge_onto(defaults),
                            None => defaults,
                        };
                        (class, tariff)
                    })
                    .collect();
                Self {
                    rows,
                    cols,
                    reserved,
                    charging_radius,
                    currency,
                    tariffs,
                }
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        let mut rates = RatesV1::default();
        for class in VehicleClass::ALL {
            *rates.slot(class) = Some(config.tariff(class).into());
        }
        Self::V1 {
            rows: config.rows,
            cols: config.cols,
            charging_radius: config.charging_radius,
            currency: config.currency,
            reserved: config.reserved,
            rates,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::Coord;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_reads_valid_file() {
        let file = write_config(
            r#"
_version = "1"
rows = 8
cols = 10
charging_radius = 5
currency = "$"

[[reserved]]
spot = "c4"
kind = "vip"

[rates.car]
rate = 120.0

[rates.ev]
description = "Fast charging"
strategy = "bfs"
"#,
        );

        let config = Config::load(file.path()).unwrap();

        assert_eq!((config.rows(), config.cols()), (8, 10));
        assert_eq!(config.charging_radius(), 5);
        assert_eq!(config.currency(), "$");
        assert_eq!(
            config.reserved(),
            &[ReservedSpot {
                spot: "C4".parse().unwrap(),
                kind: ReservationKind::Vip,
            }]
        );

        let car = config.tariff(VehicleClass::Car);
        assert_eq!(car.hourly_rate(), 120.0);
        assert_eq!(car.description(), "AC Parking");

        let electric = config.tariff(VehicleClass::Electric);
        assert_eq!(electric.hourly_rate(), 80.0);
        assert_eq!(electric.description(), "Fast charging");
        assert_eq!(electric.strategy(), Strategy::Bfs);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_or_default_falls_back_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("parking.toml");

        assert_eq!(Config::load_or_default(&missing).unwrap(), Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let file = write_config("_version = \"1\"\nrows = \"five\"\n");

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn load_rejects_unbuildable_lot() {
        let file = write_config("_version = \"1\"\nrows = 27\n");
        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Invalid config file:"), "{error}");

        let file = write_config("_version = \"1\"\n[rates.bike]\nrate = -1.0\n");
        let error = Config::load(file.path()).unwrap_err();
        assert!(error.contains("Invalid rate for Bike"), "{error}");
    }

    #[test]
    fn load_rejects_reservation_outside_lot() {
        let file = write_config(
            "_version = \"1\"\nrows = 2\ncols = 2\n[[reserved]]\nspot = \"C1\"\nkind = \"handicapped\"\n",
        );
        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Invalid config file:"), "{error}");
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn empty_reserved_list_disables_reservations() {
        let config: Config = toml::from_str("_version = \"1\"\nreserved = []\n").unwrap();
        assert!(config.reserved().is_empty());
        assert_eq!(config.grid().unwrap().free_count(), 25);
    }

    #[test]
    fn default_reserves_first_two_spots() {
        let grid = Config::default().grid().unwrap();
        assert_eq!(grid.reservations().len(), 2);
        assert!(!grid.is_free(Coord::new(0, 0)));
        assert!(!grid.is_free(Coord::new(0, 1)));
        assert_eq!(grid.free_count(), 23);
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("parking.toml");
        let config = Config::default()
            .with_size(6, 9)
            .with_charging_radius(4)
            .with_currency("EUR")
            .with_tariff(
                VehicleClass::Suv,
                Tariff::new(175.5, "Covered perimeter", Strategy::Dfs),
            );

        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("_version = \"1\""));
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn rules_follow_charging_radius() {
        let config = Config::default().with_charging_radius(7);
        assert_eq!(config.rules().charging_radius, 7);
    }
}
