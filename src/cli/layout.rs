use chrono::Utc;
use parking::{Config, Lot};

use super::{
    OutputFormat,
    render::{self, Density},
};

#[derive(Debug, clap::Parser)]
#[command(about = "Show the empty lot with its reserved spots")]
pub struct Layout {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Force the one-character-per-spot layout
    #[arg(long)]
    compact: bool,
}

impl Layout {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let snapshot = Lot::from_config(config)?.snapshot(Utc::now());

        match self.output {
            OutputFormat::Table => {
                let density = if self.compact {
                    Density::Compact
                } else {
                    Density::detect()
                };
                print!("{}", render::grid(&snapshot, density));
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        }
        Ok(())
    }
}
