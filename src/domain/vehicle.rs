use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{billing, search::Strategy};

/// The classes of vehicle the lot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    /// A regular car.
    Car,
    /// A two-wheeler.
    Bike,
    /// A large vehicle that needs a wide perimeter spot.
    Suv,
    /// An electric vehicle that needs a spot near the chargers.
    Electric,
}

impl VehicleClass {
    /// Every class, in display order.
    pub const ALL: [Self; 4] = [Self::Car, Self::Bike, Self::Suv, Self::Electric];

    /// The display label for the class.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Bike => "Bike",
            Self::Suv => "SUV",
            Self::Electric => "Electric",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Car => 0,
            Self::Bike => 1,
            Self::Suv => 2,
            Self::Electric => 3,
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VehicleClass {
    type Err = UnknownVehicleClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(Self::Car),
            "bike" => Ok(Self::Bike),
            "suv" => Ok(Self::Suv),
            "electric" | "ev" => Ok(Self::Electric),
            _ => Err(UnknownVehicleClass(s.to_string())),
        }
    }
}

/// Error returned when a string does not name a vehicle class.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown vehicle class '{0}': expected one of car, bike, suv, electric")]
pub struct UnknownVehicleClass(String);

/// Error returned when an hourly rate is not a positive, finite number.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Invalid rate for {class}: {rate} (rates must be positive numbers)")]
pub struct InvalidRate {
    /// The class the rate was meant for.
    pub class: VehicleClass,
    /// The rejected rate.
    pub rate: f64,
}

fn validate_rate(class: VehicleClass, rate: f64) -> Result<f64, InvalidRate> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(InvalidRate { class, rate })
    }
}

/// How a vehicle class is priced and placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    hourly_rate: f64,
    description: String,
    strategy: Strategy,
}

impl Tariff {
    /// Creates a tariff. The rate is validated when the tariff enters a
    /// [`RateTable`].
    #[must_use]
    pub fn new(hourly_rate: f64, description: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            hourly_rate,
            description: description.into(),
            strategy,
        }
    }

    /// The built-in tariff for a class.
    #[must_use]
    pub fn default_for(class: VehicleClass) -> Self {
        match class {
            VehicleClass::Car => Self::new(100.0, "AC Parking", Strategy::Bfs),
            VehicleClass::Bike => Self::new(50.0, "Regular Parking", Strategy::Dfs),
            VehicleClass::Suv => Self::new(150.0, "Premium Parking", Strategy::BestFirst),
            VehicleClass::Electric => {
                Self::new(80.0, "EV Parking with Charging", Strategy::BestFirst)
            }
        }
    }

    /// Price per started hour.
    #[must_use]
    pub const fn hourly_rate(&self) -> f64 {
        self.hourly_rate
    }

    /// Human-readable description of the parking type.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The search strategy used to find spots for this class.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }
}

/// Validated tariffs for every vehicle class.
///
/// Every rate held by the table is positive and finite.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    tariffs: [Tariff; 4],
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            tariffs: VehicleClass::ALL.map(Tariff::default_for),
        }
    }
}

impl RateTable {
    /// Builds a table from explicit tariffs. Classes that are not listed keep
    /// their built-in tariff.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRate`] if any supplied rate is not positive.
    pub fn new(
        tariffs: impl IntoIterator<Item = (VehicleClass, Tariff)>,
    ) -> Result<Self, InvalidRate> {
        let mut table = Self::default();
        for (class, tariff) in tariffs {
            validate_rate(class, tariff.hourly_rate)?;
            table.tariffs[class.index()] = tariff;
        }
        Ok(table)
    }

    /// The tariff for a class.
    #[must_use]
    pub const fn get(&self, class: VehicleClass) -> &Tariff {
        &self.tariffs[class.index()]
    }

    /// The hourly rate for a class.
    #[must_use]
    pub const fn hourly_rate(&self, class: VehicleClass) -> f64 {
        self.get(class).hourly_rate
    }

    /// Iterates over every class and its tariff, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (VehicleClass, &Tariff)> {
        VehicleClass::ALL.into_iter().zip(&self.tariffs)
    }

    /// Changes the hourly rate of one class, returning the previous rate.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRate`] if `rate` is not positive. The table is left
    /// unchanged.
    pub fn set_rate(&mut self, class: VehicleClass, rate: f64) -> Result<f64, InvalidRate> {
        let rate = validate_rate(class, rate)?;
        let tariff = &mut self.tariffs[class.index()];
        Ok(std::mem::replace(&mut tariff.hourly_rate, rate))
    }

    /// Changes several rates at once.
    ///
    /// Either every rate is applied or, if any is invalid, none is.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidRate`] encountered.
    pub fn set_rates(
        &mut self,
        rates: impl IntoIterator<Item = (VehicleClass, f64)>,
    ) -> Result<(), InvalidRate> {
        let validated = rates
            .into_iter()
            .map(|(class, rate)| validate_rate(class, rate).map(|rate| (class, rate)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        for (class, rate) in validated {
            self.tariffs[class.index()].hourly_rate = rate;
        }
        Ok(())
    }

    /// Computes the charge for a stay of a given class.
    ///
    /// # Errors
    ///
    /// Returns [`billing::InvalidDuration`] if `exit` precedes `entry`.
    pub fn charge(
        &self,
        class: VehicleClass,
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
    ) -> Result<billing::Charge, billing::InvalidDuration> {
        billing::charge(self.hourly_rate(class), entry, exit)
    }
}
