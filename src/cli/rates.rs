use parking::Config;
use serde_json::json;
use tracing::instrument;

use super::{OutputFormat, render};

#[derive(Debug, clap::Parser)]
#[command(about = "Show the configured rates")]
pub struct Rates {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Rates {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let table = config
            .rate_table()
            .map_err(|e| anyhow::anyhow!("Invalid rates: {e}"))?;

        match self.output {
            OutputFormat::Table => print!("{}", render::rates(&table, config.currency())),
            OutputFormat::Json => {
                let rates: Vec<_> = table
                    .iter()
                    .map(|(class, tariff)| {
                        json!({
                            "class": class,
                            "hourly_rate": tariff.hourly_rate(),
                            "description": tariff.description(),
                            "strategy": tariff.strategy(),
                        })
                    })
                    .collect();
                let output = json!({
                    "currency": config.currency(),
                    "rates": rates,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }
}
