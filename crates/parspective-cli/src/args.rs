use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "parspective",
    version,
    about = "Draw diagrams of SpiNNaker place-and-route solutions"
)]
pub struct Cli {
    /// JSON netlist bundle, or '-' to draw an empty machine
    pub input: String,

    /// PNG file to write
    pub output: PathBuf,

    /// Image width in pixels
    #[arg(default_value_t = 1000)]
    pub width: u32,

    /// Image height in pixels
    #[arg(default_value_t = 700)]
    pub height: u32,

    /// More logging (repeat for even more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Leave the background transparent instead of white
    #[arg(short, long)]
    pub transparent: bool,

    /// Machine to use instead of the one in the netlist: 'spinn3', 'spinn5'
    /// or WIDTHxHEIGHT. Everything is placed, allocated and routed again.
    #[arg(short, long, value_name = "SPEC")]
    pub machine: Option<String>,

    /// Place again even if the netlist has placements
    #[arg(short, long)]
    pub place: bool,

    /// Allocate again even if the netlist has allocations
    #[arg(short, long)]
    pub allocate: bool,

    /// Route again even if the netlist has routes
    #[arg(short, long)]
    pub route: bool,

    /// Draw a ratsnest instead of routes
    #[arg(short = 'R', long)]
    pub ratsnest: bool,

    /// Don't reserve core 0 of every chip for the monitor
    #[arg(short = 'M', long)]
    pub no_monitor: bool,

    /// Don't colour cores reserved by constraints
    #[arg(short = 'C', long)]
    pub no_constraint_colours: bool,

    /// Placement algorithm passed to the place-and-route command
    #[arg(long, default_value = "default")]
    pub placer: String,

    /// Allocation algorithm passed to the place-and-route command
    #[arg(long, default_value = "default")]
    pub allocator: String,

    /// Routing algorithm passed to the place-and-route command
    #[arg(long, default_value = "default")]
    pub router: String,

    /// External place-and-route command
    #[arg(long, env = "PARSPECTIVE_PAR_COMMAND", value_name = "CMD")]
    pub par_command: Option<String>,

    /// JSON file overriding diagram geometry settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Whether the input is '-', meaning no netlist at all.
    pub fn no_input(&self) -> bool {
        self.input == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &str) -> Cli {
        Cli::try_parse_from(args.split_whitespace()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse("parspective in.json out.png");
        assert_eq!(cli.input, "in.json");
        assert_eq!(cli.output, PathBuf::from("out.png"));
        assert_eq!((cli.width, cli.height), (1000, 700));
        assert_eq!(cli.placer, "default");
        assert_eq!(cli.allocator, "default");
        assert_eq!(cli.router, "default");
        assert_eq!(cli.log_level(), LevelFilter::Warn);
        assert!(!cli.transparent && !cli.ratsnest && !cli.no_monitor);
        assert!(!cli.no_input());
    }

    #[test]
    fn test_flags() {
        let cli = parse("parspective - out.png 10 20 -vv -t -m 4x4 -p -a -r -R -M -C --router ner");
        assert!(cli.no_input());
        assert_eq!((cli.width, cli.height), (10, 20));
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert_eq!(cli.machine.as_deref(), Some("4x4"));
        assert!(cli.transparent && cli.place && cli.allocate && cli.route);
        assert!(cli.ratsnest && cli.no_monitor && cli.no_constraint_colours);
        assert_eq!(cli.router, "ner");
        assert_eq!(parse("parspective - out.png -vvvv").log_level(), LevelFilter::Trace);
    }

    #[test]
    fn test_missing_output() {
        assert!(Cli::try_parse_from(["parspective", "in.json"]).is_err());
        assert!(Cli::try_parse_from(["parspective", "a", "b", "wide"]).is_err());
    }
}
