//! Text rendering of lot state.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use parking::{
    CheckIn, GridSnapshot, RateTable, Receipt,
    billing::Charge,
    domain::{SpotState, VehicleClass},
    lot::SpotView,
};

use super::terminal::Colorize;

/// How much room the grid gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    /// One labelled cell per spot.
    Wide,
    /// One character per spot.
    Compact,
}

impl Density {
    /// Picks the layout that fits the current terminal.
    pub fn detect() -> Self {
        if super::terminal::is_narrow() {
            Self::Compact
        } else {
            Self::Wide
        }
    }
}

/// Formats an amount, e.g. `Rs. 200.00`.
pub fn money(currency: &str, amount: f64) -> String {
    format!("{currency} {amount:.2}")
}

/// Formats a duration in seconds as hours, e.g. `1.5h`.
pub fn hours(seconds: i64) -> String {
    format!("{:.1}h", seconds as f64 / 3600.0)
}

/// Formats a timestamp as local wall-clock time.
pub fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn cell_label(spot: &SpotView) -> String {
    match spot.state {
        SpotState::Empty => "Empty".to_string(),
        SpotState::Reserved { kind } => kind.to_string(),
        SpotState::Occupied { class, .. } => match spot.occupied_seconds {
            Some(seconds) => format!("{class} {}", hours(seconds)),
            None => class.to_string(),
        },
    }
}

const fn cell_glyph(state: SpotState) -> char {
    match state {
        SpotState::Empty => '.',
        SpotState::Reserved { .. } => 'R',
        SpotState::Occupied { class, .. } => match class {
            VehicleClass::Car => 'C',
            VehicleClass::Bike => 'B',
            VehicleClass::Suv => 'S',
            VehicleClass::Electric => 'E',
        },
    }
}

fn colour(state: SpotState, text: &str) -> String {
    match state {
        SpotState::Empty => text.free(),
        SpotState::Reserved { .. } => text.reserved(),
        SpotState::Occupied { .. } => text.occupied(),
    }
}

/// Renders the grid, one line per row.
pub fn grid(snapshot: &GridSnapshot, density: Density) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!(
            "Lot {}x{}: {} free, {} occupied",
            snapshot.rows, snapshot.cols, snapshot.free, snapshot.occupied
        )
        .heading()
    );

    match density {
        Density::Wide => {
            for row in 0..snapshot.rows {
                let cells: Vec<_> = snapshot
                    .row(row)
                    .map(|spot| {
                        let cell = format!("{:<4}{:<12}", spot.name, cell_label(spot));
                        colour(spot.state, &cell)
                    })
                    .collect();
                let _ = writeln!(out, "{}", cells.join(" ").trim_end());
            }
            let _ = writeln!(out, "{}", "Entrance at A1".dim());
        }
        Density::Compact => {
            for row in 0..snapshot.rows {
                let mut line = String::new();
                for spot in snapshot.row(row) {
                    if line.is_empty() {
                        let _ = write!(line, "{} ", spot.name.letter());
                    }
                    line.push_str(&colour(spot.state, &cell_glyph(spot.state).to_string()));
                }
                let _ = writeln!(out, "{line}");
            }
            let _ = writeln!(out, "{}", ". empty  R reserved  C/B/S/E vehicle".dim());
        }
    }
    out
}

/// Renders the rate table.
pub fn rates(table: &RateTable, currency: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!(
            "{:<10} {:<16} {:<28} {}",
            "Vehicle", "Rate", "Type", "Search"
        )
        .heading()
    );
    for (class, tariff) in table.iter() {
        let _ = writeln!(
            out,
            "{:<10} {:<16} {:<28} {}",
            class.label(),
            format!("{}/hour", money(currency, tariff.hourly_rate())),
            tariff.description(),
            tariff.strategy()
        );
    }
    out
}

/// Renders the confirmation of a check-in.
pub fn check_in(check_in: &CheckIn, currency: &str) -> String {
    format!(
        "Spot assigned: {}\nType: {}\nRate: {currency} {}/hour\nCheck-in time: {}\n",
        check_in.name.to_string().occupied(),
        check_in.description,
        check_in.hourly_rate,
        clock(check_in.at)
    )
}

/// Renders the bill of a check-out.
pub fn receipt(receipt: &Receipt, currency: &str) -> String {
    format!(
        "Spot: {}\nVehicle: {}\nType: {}\nCheck-in: {}\nCheck-out: {}\nDuration: {:.2} hours \
         (billed {})\nRate: {currency} {}/hour\nTotal charges: {}\n",
        receipt.spot,
        receipt.class,
        receipt.description,
        clock(receipt.entry),
        clock(receipt.exit),
        receipt.hours_parked,
        billed(receipt.billed_hours),
        receipt.hourly_rate,
        money(currency, receipt.amount).heading()
    )
}

/// Renders a price preview.
pub fn quote(class: VehicleClass, charge: &Charge, currency: &str) -> String {
    format!(
        "{class}: {:.2} hours billed as {} at {currency} {}/hour = {}\n",
        charge.hours_parked,
        billed(charge.billed_hours),
        charge.hourly_rate,
        money(currency, charge.amount)
    )
}

fn billed(hours: u64) -> String {
    if hours == 1 {
        "1 hour".to_string()
    } else {
        format!("{hours} hours")
    }
}
