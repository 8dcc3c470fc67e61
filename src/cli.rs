use std::path::{Path, PathBuf};

mod init;
mod layout;
mod quote;
mod rates;
mod render;
mod session;
mod terminal;

use clap::ArgAction;
use init::Init;
use layout::Layout;
use parking::{Config, VehicleClass};
use quote::Quote;
use rates::Rates;
use session::Session;

/// Parse a vehicle class, ignoring case.
fn parse_class(s: &str) -> Result<VehicleClass, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Output format shared by the reporting commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The lot configuration file. Built-in defaults are used if it is missing.
    #[arg(short, long, default_value = "parking.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Session(Session::default()))
            .run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Run an interactive session (default)
    ///
    /// Reads one command per line from standard input.
    Session(Session),

    /// Show the configured rates
    Rates(Rates),

    /// Show the empty lot
    Layout(Layout),

    /// Price a stay without parking
    Quote(Quote),

    /// Write the default configuration file
    Init(Init),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => return command.run(config_path),
            Self::Session(command) => command.run(&load_config(config_path)?)?,
            Self::Rates(command) => command.run(&load_config(config_path)?)?,
            Self::Layout(command) => command.run(&load_config(config_path)?)?,
            Self::Quote(command) => command.run(&load_config(config_path)?)?,
        }
        Ok(())
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load_or_default(path).map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        rows = config.rows(),
        cols = config.cols(),
        "Loaded lot configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use test_case::test_case;

    use super::*;

    #[test_case("car", VehicleClass::Car)]
    #[test_case("EV", VehicleClass::Electric)]
    fn classes_parse_at_the_boundary(input: &str, expected: VehicleClass) {
        assert_eq!(parse_class(input), Ok(expected));
    }

    #[test]
    fn unknown_class_message_names_the_input() {
        let error = parse_class("truck").unwrap_err();
        assert!(error.contains("truck"));
    }

    #[test]
    fn session_is_the_default_command() {
        let cli = Cli::try_parse_from(["parking"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("parking.toml"));
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["parking", "rates", "-vv", "--config", "lot.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("lot.toml"));
        assert!(matches!(cli.command, Some(Command::Rates(_))));
    }

    #[test]
    fn quote_requires_minutes() {
        assert!(Cli::try_parse_from(["parking", "quote", "car"]).is_err());
        assert!(Cli::try_parse_from(["parking", "quote", "car", "--minutes", "90"]).is_ok());
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parking.toml");
        std::fs::write(&path, "_version = \"1\"\ncols = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
