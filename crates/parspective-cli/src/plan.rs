use std::fmt;

use parspective_io::NetlistFile;

use crate::args::Cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Place,
    Allocate,
    Route,
}

impl Stage {
    /// Name passed to the place-and-route command.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Place => "place",
            Stage::Allocate => "allocate",
            Stage::Route => "route",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Place => "placement",
            Stage::Allocate => "allocation",
            Stage::Route => "routing",
        })
    }
}

/// Which place-and-route stages must run before drawing.
///
/// A stage runs when forced, when its result is missing, or when an earlier
/// stage ran. A new machine (given on the command line or defaulted) forces
/// everything. Asking for a ratsnest means never routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    pub place: bool,
    pub allocate: bool,
    pub route: bool,
}

impl StagePlan {
    pub fn decide(cli: &Cli, netlist: &NetlistFile) -> Self {
        let place = cli.place
            || cli.machine.is_some()
            || netlist.machine.is_none()
            || netlist.placements.is_none();
        let allocate = place || cli.allocate || netlist.allocations.is_none();
        let route = !cli.ratsnest && (allocate || cli.route || netlist.routes.is_none());
        Self {
            place,
            allocate,
            route,
        }
    }
}
