use chrono::TimeDelta;
use parking::{Config, VehicleClass, billing};
use serde_json::json;
use tracing::instrument;

use super::{OutputFormat, render};

#[derive(Debug, clap::Parser)]
#[command(about = "Price a stay without parking")]
pub struct Quote {
    /// Vehicle class (car, bike, suv, electric)
    #[arg(value_parser = super::parse_class)]
    class: VehicleClass,

    /// Length of the stay in minutes
    #[arg(long)]
    minutes: u32,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Quote {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let table = config
            .rate_table()
            .map_err(|e| anyhow::anyhow!("Invalid rates: {e}"))?;
        let charge = billing::quote(
            table.hourly_rate(self.class),
            TimeDelta::minutes(i64::from(self.minutes)),
        );

        match self.output {
            OutputFormat::Table => print!("{}", render::quote(self.class, &charge, config.currency())),
            OutputFormat::Json => {
                let output = json!({
                    "class": self.class,
                    "minutes": self.minutes,
                    "currency": config.currency(),
                    "charge": charge,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }
}
