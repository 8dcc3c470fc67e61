use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{CheckIn, CheckOutError, GridSnapshot, Lot, NoSpotAvailable, Receipt};
use crate::domain::{RateTable, VehicleClass, vehicle::InvalidRate};

/// A cloneable, thread-safe handle to one [`Lot`].
///
/// Each operation holds the lock for its whole duration, so a search and the
/// occupy that follows it can never interleave with another thread's.
#[derive(Debug, Clone)]
pub struct SharedLot {
    inner: Arc<Mutex<Lot>>,
}

impl From<Lot> for SharedLot {
    fn from(lot: Lot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(lot)),
        }
    }
}

impl SharedLot {
    // Every operation leaves the lot consistent before anything can panic, so
    // a poisoned lock still guards valid state.
    fn lock(&self) -> MutexGuard<'_, Lot> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// See [`Lot::check_in`].
    ///
    /// # Errors
    ///
    /// Returns [`NoSpotAvailable`] if no eligible spot is free.
    pub fn check_in(
        &self,
        class: VehicleClass,
        now: DateTime<Utc>,
    ) -> Result<CheckIn, NoSpotAvailable> {
        self.lock().check_in(class, now)
    }

    /// See [`Lot::check_out`].
    ///
    /// # Errors
    ///
    /// Fails like [`Lot::check_out`].
    pub fn check_out(&self, name: &str, now: DateTime<Utc>) -> Result<Receipt, CheckOutError> {
        self.lock().check_out(name, now)
    }

    /// See [`Lot::reset`].
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// See [`Lot::snapshot`].
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> GridSnapshot {
        self.lock().snapshot(now)
    }

    /// A copy of the current rate table.
    #[must_use]
    pub fn rates(&self) -> RateTable {
        self.lock().rates().clone()
    }

    /// See [`Lot::set_rate`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRate`] if `rate` is not positive.
    pub fn set_rate(&self, class: VehicleClass, rate: f64) -> Result<f64, InvalidRate> {
        self.lock().set_rate(class, rate)
    }

    /// Runs `f` with exclusive access to the lot.
    pub fn with<T>(&self, f: impl FnOnce(&mut Lot) -> T) -> T {
        f(&mut self.lock())
    }
}
