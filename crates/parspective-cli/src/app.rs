//! From command-line arguments to a finished PNG.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use parspective_core::{
    Allocations, Constraint, Machine, Net, Placements, Routes, VerticesResources,
    DEFAULT_CORE_RESOURCE,
};
use parspective_io::{read_netlist, write_png, NetlistFile};
use parspective_renderer::style::{
    default_chip_style, default_core_style, default_link_style, default_net_style,
};
use parspective_renderer::{
    CoreOwner, CoreStyle, Diagram, DiagramConfig, DiagramData, DiagramStyles, Rgba,
};

use crate::args::Cli;
use crate::backend::{BackendError, ParBackend, ParRequest};
use crate::error::CliError;
use crate::machine::get_machine;
use crate::plan::{Stage, StagePlan};

/// Fill colour given to cores reserved by constraints.
pub const CONSTRAINT_FILL: Rgba = Rgba(0.3, 0.3, 0.3, 1.0);

/// Everything needed to draw the diagram, once defaults are filled in and
/// every required stage has run.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub machine: Machine,
    pub vertices_resources: VerticesResources,
    pub nets: Vec<Net>,
    pub constraints: Vec<Constraint>,
    pub placements: Placements,
    pub allocations: Allocations,
    pub routes: Routes,
    pub core_resource: String,
    pub styles: DiagramStyles,
    pub config: DiagramConfig,
    pub plan: StagePlan,
}

impl Prepared {
    pub fn data(&self) -> DiagramData<'_> {
        DiagramData {
            machine: &self.machine,
            vertices_resources: &self.vertices_resources,
            nets: &self.nets,
            constraints: &self.constraints,
            placements: &self.placements,
            allocations: &self.allocations,
            routes: &self.routes,
            core_resource: &self.core_resource,
        }
    }
}

pub fn run(cli: &Cli, backend: Option<&mut dyn ParBackend>) -> Result<(), CliError> {
    let prepared = prepare(cli, backend)?;
    let diagram = Diagram::new(
        prepared.data(),
        prepared.styles.clone(),
        prepared.config.clone(),
    )?;
    let background = (!cli.transparent).then_some(Rgba::WHITE);
    let pixmap = diagram.render(cli.width, cli.height, background)?;
    write_png(&pixmap, &cli.output)?;
    Ok(())
}

/// Read the input, fill in defaults and run whichever place-and-route
/// stages are needed.
pub fn prepare(
    cli: &Cli,
    mut backend: Option<&mut dyn ParBackend>,
) -> Result<Prepared, CliError> {
    let netlist = if cli.no_input() {
        NetlistFile::default()
    } else {
        read_netlist(Path::new(&cli.input))?
    };
    let plan = StagePlan::decide(cli, &netlist);
    debug!("{plan:?}");

    let NetlistFile {
        vertices_resources,
        nets,
        machine,
        constraints,
        placements,
        allocations,
        routes,
        core_resource,
        chip_style,
        link_style,
        core_style,
        net_style,
    } = netlist;
    let core_resource = core_resource.unwrap_or_else(|| DEFAULT_CORE_RESOURCE.to_string());

    let machine = match (cli.machine.as_deref(), machine) {
        (Some(spec), _) => get_machine(Some(spec), &core_resource)?,
        (None, Some(machine)) => {
            machine.validate()?;
            machine
        }
        (None, None) => get_machine(None, &core_resource)?,
    };

    let constraints = match constraints {
        Some(constraints) => constraints,
        None if cli.no_monitor => Vec::new(),
        None => vec![Constraint::reserve(&core_resource, 0, 1)],
    };

    let has_vertices = !vertices_resources.is_empty();
    let request = ParRequest {
        vertices_resources: &vertices_resources,
        nets: &nets,
        machine: &machine,
        constraints: &constraints,
        placements: None,
        allocations: None,
        core_resource: &core_resource,
    };

    let placements = if plan.place {
        info!("Placing {} vertices", vertices_resources.len());
        run_stage(has_vertices, backend.as_deref_mut(), |b| {
            b.place(&request, &cli.placer)
        })?
        .ok_or(CliError::NoBackend { stage: Stage::Place })?
    } else {
        placements.unwrap_or_default()
    };

    let allocations = if plan.allocate {
        info!("Allocating {} vertices", placements.len());
        let request = ParRequest {
            placements: Some(&placements),
            ..request
        };
        run_stage(has_vertices, backend.as_deref_mut(), |b| {
            b.allocate(&request, &cli.allocator)
        })?
        .ok_or(CliError::NoBackend {
            stage: Stage::Allocate,
        })?
    } else {
        allocations.unwrap_or_default()
    };

    let routes = if cli.ratsnest {
        Routes::new()
    } else if plan.route {
        info!("Routing {} nets", nets.len());
        let request = ParRequest {
            placements: Some(&placements),
            allocations: Some(&allocations),
            ..request
        };
        run_stage(has_vertices, backend.as_deref_mut(), |b| {
            b.route(&request, &cli.router)
        })?
        .unwrap_or_else(|| {
            warn!("No place-and-route command given, drawing a ratsnest instead of routes");
            Routes::new()
        })
    } else {
        routes.unwrap_or_default()
    };

    let mut styles = DiagramStyles {
        chip: chip_style.unwrap_or_else(default_chip_style),
        link: link_style.unwrap_or_else(default_link_style),
        core: core_style.unwrap_or_else(default_core_style),
        net: net_style.unwrap_or_else(default_net_style),
    };
    if !cli.no_constraint_colours {
        colour_constraints(&mut styles.core, &constraints, &core_resource);
    }

    let config = read_config(cli.config.as_deref())?;

    Ok(Prepared {
        machine,
        vertices_resources,
        nets,
        constraints,
        placements,
        allocations,
        routes,
        core_resource,
        styles,
        config,
        plan,
    })
}

/// `None` when there is no backend to run the stage with. Netlists without
/// vertices need no backend: every stage has an empty result.
fn run_stage<'b, T: Default>(
    has_vertices: bool,
    backend: Option<&mut (dyn ParBackend + 'b)>,
    call: impl FnOnce(&mut (dyn ParBackend + 'b)) -> Result<T, BackendError>,
) -> Result<Option<T>, BackendError> {
    if !has_vertices {
        return Ok(Some(T::default()));
    }
    backend.map(call).transpose()
}

/// Give every core reserved by a constraint a grey fill, unless the style
/// already says how to draw it.
pub fn colour_constraints(style: &mut CoreStyle, constraints: &[Constraint], core_resource: &str) {
    for (id, constraint) in constraints.iter().enumerate() {
        let key = Some(CoreOwner::Constraint(id));
        if constraint.is_reservation_of(core_resource) && !style.has_exception(&key) {
            style.exception_mut(key).fill = Some(Some(CONSTRAINT_FILL));
        }
    }
}

fn read_config(path: Option<&Path>) -> Result<DiagramConfig, CliError> {
    let Some(path) = path else {
        return Ok(DiagramConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}
