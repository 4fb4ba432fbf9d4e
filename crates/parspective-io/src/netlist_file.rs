//! The JSON bundle describing a netlist and whatever is already known about
//! its place-and-route solution.
//!
//! Every key is optional:
//!
//! ```json
//! {
//!   "vertices_resources": {"v0": {"cores": 1}},
//!   "nets": [{"source": "v0", "sinks": ["v0"], "weight": 1.0}],
//!   "machine": {"width": 2, "height": 2},
//!   "constraints": [{"type": "reserve_resource", "resource": "cores", "reservation": [0, 1]}],
//!   "placements": {"v0": [0, 0]},
//!   "allocations": {"v0": {"cores": [1, 2]}},
//!   "routes": {"0": {"chip": [0, 0], "children": [{"route": {"core": 1}, "vertex": "v0"}]}},
//!   "core_resource": "cores",
//!   "chip_style": {"defaults": {"stroke": [0, 0, 0, 1], "line_width": 0.05}}
//! }
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use parspective_core::{Allocations, Constraint, Machine, Net, Placements, Routes, VerticesResources};
use parspective_renderer::{ChipStyle, CoreStyle, LinkStyle, NetStyle};

use crate::error::IoError;

const KNOWN_KEYS: &[&str] = &[
    "vertices_resources",
    "nets",
    "machine",
    "constraints",
    "placements",
    "allocations",
    "routes",
    "core_resource",
    "chip_style",
    "link_style",
    "core_style",
    "net_style",
];

/// Absent solution stages are `None` so callers can tell "not given" from
/// "given but empty".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetlistFile {
    pub vertices_resources: VerticesResources,
    pub nets: Vec<Net>,
    pub machine: Option<Machine>,
    pub constraints: Option<Vec<Constraint>>,
    pub placements: Option<Placements>,
    pub allocations: Option<Allocations>,
    pub routes: Option<Routes>,
    pub core_resource: Option<String>,
    pub chip_style: Option<ChipStyle>,
    pub link_style: Option<LinkStyle>,
    pub core_style: Option<CoreStyle>,
    pub net_style: Option<NetStyle>,
}

pub fn read_netlist(path: &Path) -> Result<NetlistFile, IoError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(IoError::Empty(path.to_path_buf()));
    }

    let parse_error = |source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(&text).map_err(parse_error)?;
    let serde_json::Value::Object(map) = value else {
        return Err(IoError::NotAnObject(path.to_path_buf()));
    };
    for key in map.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
        debug!("Ignoring unknown key '{key}' in {}", path.display());
    }

    let netlist: NetlistFile =
        serde_json::from_value(serde_json::Value::Object(map)).map_err(parse_error)?;
    debug!(
        "Read {} vertices and {} nets from {}",
        netlist.vertices_resources.len(),
        netlist.nets.len(),
        path.display()
    );
    Ok(netlist)
}
