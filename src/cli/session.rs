use std::io::{self, BufRead, IsTerminal, Write};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use parking::{Config, Lot, VehicleClass};
use tracing::instrument;

use super::{
    OutputFormat,
    render::{self, Density},
    terminal::Colorize,
};

#[derive(Debug, Parser, Default)]
#[command(about = "Run an interactive parking session")]
pub struct Session {
    /// Reset without asking for confirmation
    #[arg(long)]
    yes: bool,
}

impl Session {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let lot = Lot::from_config(config)?;
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        let confirm = if self.yes || !interactive {
            Confirm::Assume(true)
        } else {
            Confirm::Prompt
        };

        let mut repl = Repl {
            lot,
            currency: config.currency().to_string(),
            confirm,
            prompt: interactive,
            density: Density::detect(),
            clock: Utc::now,
        };
        if interactive {
            println!("{}", "Smart parking session. Type 'help' for commands.".heading());
        }
        repl.run(stdin.lock(), io::stdout().lock())?;
        Ok(())
    }
}

/// How a destructive command is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirm {
    /// Ask on the terminal.
    Prompt,
    /// Answer without asking.
    Assume(bool),
}

impl Confirm {
    fn ask(self, question: &str) -> io::Result<bool> {
        match self {
            Self::Assume(answer) => Ok(answer),
            Self::Prompt => dialoguer::Confirm::new()
                .with_prompt(question)
                .default(false)
                .interact()
                .map_err(io::Error::other),
        }
    }
}

/// One line of session input.
#[derive(Debug, Parser)]
#[command(
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct Line {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    /// Park a vehicle (car, bike, suv, electric)
    CheckIn {
        #[arg(value_parser = super::parse_class)]
        class: VehicleClass,
    },

    /// Release a spot and print the bill
    CheckOut {
        /// The spot name, such as B3
        spot: String,
    },

    /// Show the lot
    Status {
        /// Output format (table, json)
        #[arg(long, value_name = "FORMAT", default_value = "table")]
        output: OutputFormat,
    },

    /// Show the rates
    Rates,

    /// Change the hourly rate of a class
    SetRate {
        #[arg(value_parser = super::parse_class)]
        class: VehicleClass,
        #[arg(allow_negative_numbers = true)]
        rate: f64,
    },

    /// Clear every vehicle from the lot
    Reset {
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },

    /// List the commands
    Help,

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

const HELP: &str = "\
Commands:
  check-in <class>           park a car, bike, suv or electric vehicle
  check-out <spot>           release a spot, e.g. check-out B1
  status [--output json]     show the lot
  rates                      show the rates
  set-rate <class> <rate>    change an hourly rate
  reset [--yes]              clear every vehicle
  help                       show this message
  quit                       end the session
";

/// The command loop, generic over its input, output and clock.
struct Repl<C> {
    lot: Lot,
    currency: String,
    confirm: Confirm,
    prompt: bool,
    density: Density,
    clock: C,
}

/// Whether the loop should keep reading.
enum Flow {
    Continue,
    Quit,
}

impl<C: Fn() -> DateTime<Utc>> Repl<C> {
    fn run(&mut self, input: impl BufRead, mut out: impl Write) -> anyhow::Result<()> {
        let mut lines = input.lines();
        loop {
            if self.prompt {
                write!(out, "parking> ")?;
                out.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            let words: Vec<_> = line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }

            match Line::try_parse_from(words) {
                Ok(Line { command }) => {
                    if let Flow::Quit = self.execute(command, &mut out)? {
                        break;
                    }
                }
                Err(e) => write!(out, "{}", e.render())?,
            }
        }
        Ok(())
    }

    fn execute(&mut self, command: SessionCommand, out: &mut impl Write) -> anyhow::Result<Flow> {
        let now = (self.clock)();
        tracing::debug!(?command, "session command");

        match command {
            SessionCommand::CheckIn { class } => match self.lot.check_in(class, now) {
                Ok(check_in) => write!(out, "{}", render::check_in(&check_in, &self.currency))?,
                Err(e) => writeln!(out, "{}", format!("Error: {e}").reserved())?,
            },
            SessionCommand::CheckOut { spot } => match self.lot.check_out(&spot, now) {
                Ok(receipt) => write!(out, "{}", render::receipt(&receipt, &self.currency))?,
                Err(e) => writeln!(out, "{}", format!("Error: {e}").reserved())?,
            },
            SessionCommand::Status { output } => {
                let snapshot = self.lot.snapshot(now);
                match output {
                    OutputFormat::Table => write!(out, "{}", render::grid(&snapshot, self.density))?,
                    OutputFormat::Json => {
                        writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
                    }
                }
            }
            SessionCommand::Rates => {
                write!(out, "{}", render::rates(self.lot.rates(), &self.currency))?;
            }
            SessionCommand::SetRate { class, rate } => match self.lot.set_rate(class, rate) {
                Ok(previous) => writeln!(
                    out,
                    "{class} rate changed from {} to {} per hour",
                    render::money(&self.currency, previous),
                    render::money(&self.currency, rate)
                )?,
                Err(e) => writeln!(out, "{}", format!("Error: {e}").reserved())?,
            },
            SessionCommand::Reset { yes } => {
                let confirmed = yes
                    || self.confirm.ask(
                        "Are you sure you want to reset the parking lot? This will clear all \
                         parked vehicles.",
                    )?;
                if confirmed {
                    self.lot.reset();
                    writeln!(out, "Parking lot has been reset to initial state!")?;
                } else {
                    writeln!(out, "Reset cancelled")?;
                }
            }
            SessionCommand::Help => write!(out, "{HELP}")?,
            SessionCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeDelta;

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn repl(
        now: &Cell<DateTime<Utc>>,
        confirm: Confirm,
    ) -> Repl<impl Fn() -> DateTime<Utc> + '_> {
        Repl {
            lot: Lot::from_config(&Config::default()).unwrap(),
            currency: "Rs.".to_string(),
            confirm,
            prompt: false,
            density: Density::Compact,
            clock: move || now.get(),
        }
    }

    fn run(repl: &mut Repl<impl Fn() -> DateTime<Utc>>, script: &str) -> String {
        let mut out = Vec::new();
        repl.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn check_in_then_check_out_bills_the_stay() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(true));

        let output = run(&mut repl, "check-in car\n");
        assert!(output.contains("Spot assigned: B1"), "{output}");
        assert!(output.contains("Type: AC Parking"));
        assert!(output.contains("Rate: Rs. 100/hour"));

        now.set(t0() + TimeDelta::minutes(90));
        let output = run(&mut repl, "check-out b1\n");
        assert!(output.contains("Total charges: Rs. 200.00"), "{output}");
        assert!(repl.lot.grid().is_free(parking::Coord::new(1, 0)));
    }

    #[test]
    fn errors_do_not_end_the_session() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(true));

        let output = run(
            &mut repl,
            "check-out C3\ncheck-in truck\nfly away\nset-rate car -5\ncheck-in bike\n",
        );

        assert!(output.contains("spot C3 is not occupied"), "{output}");
        assert!(output.contains("truck"));
        assert!(output.contains("Invalid rate for Car: -5"));
        assert!(output.contains("Spot assigned: A3"));
        assert_eq!(repl.lot.rates().hourly_rate(VehicleClass::Car), 100.0);
    }

    #[test]
    fn quit_stops_reading() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(true));

        run(&mut repl, "check-in car\nquit\ncheck-in car\n");
        assert_eq!(repl.lot.grid().occupied_count(), 1);

        run(&mut repl, "exit\ncheck-in car\n");
        assert_eq!(repl.lot.grid().occupied_count(), 1);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(true));
        assert_eq!(run(&mut repl, "\n   \n"), "");
    }

    #[test]
    fn set_rate_applies_to_later_bills() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(true));

        let output = run(&mut repl, "set-rate SUV 175.5\nrates\n");
        assert!(output.contains("SUV rate changed from Rs. 150.00 to Rs. 175.50 per hour"));
        assert!(output.contains("Rs. 175.50/hour"));
    }

    #[test]
    fn reset_asks_first() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(false));

        let output = run(&mut repl, "check-in car\nreset\n");
        assert!(output.contains("Reset cancelled"));
        assert_eq!(repl.lot.grid().occupied_count(), 1);

        let output = run(&mut repl, "reset --yes\n");
        assert!(output.contains("Parking lot has been reset to initial state!"));
        assert_eq!(repl.lot.grid().occupied_count(), 0);
    }

    #[test]
    fn status_renders_table_or_json() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(true));

        let output = run(&mut repl, "check-in bike\nstatus\n");
        assert!(output.contains("Lot 5x5: 22 free, 1 occupied"), "{output}");
        assert!(output.contains("A RRB.."));

        let output = run(&mut repl, "status --output json\n");
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["occupied"], 1);
        assert_eq!(json["spots"][2]["class"], "bike");
    }

    #[test]
    fn help_lists_commands() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(true));
        let output = run(&mut repl, "help\n");
        assert!(output.contains("check-in <class>"));
        assert!(output.contains("set-rate <class> <rate>"));
    }

    #[test]
    fn full_lot_reports_no_spot() {
        let now = Cell::new(t0());
        let mut repl = repl(&now, Confirm::Assume(true));
        let script = "check-in car\n".repeat(24);

        let output = run(&mut repl, &script);
        assert_eq!(output.matches("Spot assigned").count(), 23);
        assert!(output.contains("No suitable parking spots available for Car"));
    }
}
