use std::path::Path;

use parking::Config;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
#[command(about = "Write the default lot configuration")]
pub struct Init {
    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

impl Init {
    #[instrument(level = "debug")]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        if path.exists() && !self.force {
            anyhow::bail!(
                "Configuration already exists at {} (use --force to overwrite)",
                path.display()
            );
        }

        Config::default()
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", path.display()))?;

        println!("{} {}", "Created".free(), path.display());
        println!("  Edit rows, cols, reserved spots and [rates] to describe your lot.");
        Ok(())
    }
}
