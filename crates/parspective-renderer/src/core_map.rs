//! Which vertex or constraint occupies each core of each chip.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use parspective_core::{
    Allocations, ChipXY, Constraint, Machine, Placements, VertexId, VerticesResources,
};

use crate::style::CoreOwner;

/// Chips claiming more cores than this are drawn with this many.
pub const MAX_CORES_PER_CHIP: u64 = 1024;

#[derive(Debug, Clone, Default)]
pub struct CoreMap {
    chips: HashMap<ChipXY, Vec<Option<CoreOwner>>>,
    vertices: BTreeMap<VertexId, (ChipXY, Vec<usize>)>,
}

impl CoreMap {
    /// Reservations are applied before allocations, so a vertex allocated a
    /// reserved core is drawn as the vertex.
    pub fn new(
        machine: &Machine,
        vertices_resources: &VerticesResources,
        constraints: &[Constraint],
        placements: &Placements,
        allocations: &Allocations,
        core_resource: &str,
    ) -> Self {
        let mut chips: HashMap<ChipXY, Vec<Option<CoreOwner>>> = machine
            .chips()
            .map(|(x, y)| {
                let num_cores = machine
                    .resources_at(x, y)
                    .get(core_resource)
                    .copied()
                    .unwrap_or(0);
                if num_cores > MAX_CORES_PER_CHIP {
                    warn!("Chip ({x}, {y}) has {num_cores} cores, drawing {MAX_CORES_PER_CHIP}");
                }
                let num_cores = num_cores.min(MAX_CORES_PER_CHIP) as usize;
                ((x, y), vec![None; num_cores])
            })
            .collect();

        for (id, constraint) in constraints.iter().enumerate() {
            if !constraint.is_reservation_of(core_resource) {
                continue;
            }
            for (xy, cores) in chips.iter_mut() {
                if let Some(range) = constraint.reservation_on(core_resource, *xy) {
                    for core in range.iter_within(cores.len() as u64) {
                        cores[core as usize] = Some(CoreOwner::Constraint(id));
                    }
                }
            }
        }

        for (vertex, ranges) in allocations {
            let Some(range) = ranges.get(core_resource) else {
                continue;
            };
            let Some(xy) = placements.get(vertex) else {
                warn!("Vertex '{vertex}' has an allocation but no placement");
                continue;
            };
            let Some(cores) = chips.get_mut(xy) else {
                warn!("Vertex '{vertex}' is placed on dead chip {xy:?}");
                continue;
            };
            if !vertices_resources.contains_key(vertex) {
                debug!("Allocated vertex '{vertex}' is not in the netlist");
            }
            for core in range.iter_within(cores.len() as u64) {
                cores[core as usize] = Some(CoreOwner::Vertex(vertex.clone()));
            }
        }

        let mut vertices: BTreeMap<VertexId, (ChipXY, Vec<usize>)> = BTreeMap::new();
        for (vertex, xy) in placements {
            let cores = chips
                .get(xy)
                .map(|cores| {
                    cores
                        .iter()
                        .enumerate()
                        .filter(|(_, owner)| matches!(owner, Some(CoreOwner::Vertex(v)) if v == vertex))
                        .map(|(core, _)| core)
                        .collect()
                })
                .unwrap_or_default();
            vertices.insert(vertex.clone(), (*xy, cores));
        }

        Self { chips, vertices }
    }

    /// The cores of chip (x, y) with their owners. Dead chips have none.
    pub fn cores(&self, xy: ChipXY) -> &[Option<CoreOwner>] {
        self.chips.get(&xy).map_or(&[][..], Vec::as_slice)
    }

    pub fn num_cores(&self, xy: ChipXY) -> usize {
        self.cores(xy).len()
    }

    /// Core counts of every live chip.
    pub fn core_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.chips.values().map(Vec::len)
    }

    /// The chip a vertex is placed on and the cores it occupies there, in
    /// ascending order.
    pub fn cores_of(&self, vertex: &str) -> Option<(ChipXY, &[usize])> {
        self.vertices
            .get(vertex)
            .map(|(xy, cores)| (*xy, cores.as_slice()))
    }
}
