use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::machine::{ChipXY, Link, Resources};

/// Vertices are identified by name.
pub type VertexId = String;

/// Index of a net within the netlist.
pub type NetId = usize;

/// Index of a constraint within the constraint list.
pub type ConstraintId = usize;

/// Resources consumed by each vertex.
pub type VerticesResources = BTreeMap<VertexId, Resources>;

fn default_weight() -> f64 {
    1.0
}

/// A multicast connection from one vertex to any number of sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub source: VertexId,
    #[serde(default)]
    pub sinks: Vec<VertexId>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Net {
    pub fn new(source: &str, sinks: &[&str]) -> Self {
        Self {
            source: source.to_string(),
            sinks: sinks.iter().map(|s| s.to_string()).collect(),
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A half-open range `[start, end)` of a resource, written `[start, end]` in
/// JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u64, u64)", into = "(u64, u64)")]
pub struct ResourceRange {
    pub start: u64,
    pub end: u64,
}

impl ResourceRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The indices in this range which are below `limit`.
    pub fn iter_within(&self, limit: u64) -> impl Iterator<Item = u64> {
        self.start.min(limit)..self.end.min(limit)
    }
}

impl From<(u64, u64)> for ResourceRange {
    fn from((start, end): (u64, u64)) -> Self {
        Self { start, end }
    }
}

impl From<ResourceRange> for (u64, u64) {
    fn from(range: ResourceRange) -> Self {
        (range.start, range.end)
    }
}

/// Constraints on how a netlist may be placed, allocated and routed.
///
/// Only resource reservations affect the diagram; the rest are carried
/// through to the place-and-route backend untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Reserve part of a resource, on every chip or only on `location`.
    ReserveResource {
        resource: String,
        reservation: ResourceRange,
        #[serde(default)]
        location: Option<ChipXY>,
    },
    /// Force a vertex onto a particular chip.
    Location { vertex: VertexId, location: ChipXY },
    /// Place a group of vertices on the same chip.
    SameChip { vertices: Vec<VertexId> },
    /// Route nets sinking at `vertex` out of the given link instead of to a
    /// core.
    RouteEndpoint { vertex: VertexId, route: Link },
}

impl Constraint {
    /// Reserve a range of a resource on every chip.
    pub fn reserve(resource: &str, start: u64, end: u64) -> Self {
        Constraint::ReserveResource {
            resource: resource.to_string(),
            reservation: ResourceRange::new(start, end),
            location: None,
        }
    }

    /// Reserve a range of a resource on a single chip.
    pub fn reserve_at(resource: &str, start: u64, end: u64, location: ChipXY) -> Self {
        Constraint::ReserveResource {
            resource: resource.to_string(),
            reservation: ResourceRange::new(start, end),
            location: Some(location),
        }
    }

    /// The reserved range of `resource` on chip `xy`, if this constraint
    /// reserves any.
    pub fn reservation_on(&self, resource: &str, xy: ChipXY) -> Option<ResourceRange> {
        match self {
            Constraint::ReserveResource {
                resource: r,
                reservation,
                location,
            } if r == resource && location.map_or(true, |l| l == xy) => Some(*reservation),
            _ => None,
        }
    }

    pub fn is_reservation_of(&self, resource: &str) -> bool {
        matches!(self, Constraint::ReserveResource { resource: r, .. } if r == resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_defaults() {
        let net: Net = serde_json::from_str(r#"{"source": "a"}"#).unwrap();
        assert_eq!(net.source, "a");
        assert!(net.sinks.is_empty());
        assert_eq!(net.weight, 1.0);
    }

    #[test]
    fn test_range_within() {
        let r = ResourceRange::new(10, 20);
        assert_eq!(r.len(), 10);
        assert_eq!(r.iter_within(12).collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(r.iter_within(5).count(), 0);
        assert!(ResourceRange::new(4, 2).is_empty());
    }

    #[test]
    fn test_constraint_json() {
        let json = r#"[
            {"type": "reserve_resource", "resource": "cores", "reservation": [0, 1]},
            {"type": "reserve_resource", "resource": "cores", "reservation": [1, 3], "location": [1, 1]},
            {"type": "route_endpoint", "vertex": "v", "route": "south_west"},
            {"type": "location", "vertex": "v", "location": [0, 0]},
            {"type": "same_chip", "vertices": ["a", "b"]}
        ]"#;
        let constraints: Vec<Constraint> = serde_json::from_str(json).unwrap();
        assert_eq!(constraints[0], Constraint::reserve("cores", 0, 1));
        assert_eq!(constraints[1], Constraint::reserve_at("cores", 1, 3, (1, 1)));
        assert_eq!(
            constraints[2],
            Constraint::RouteEndpoint {
                vertex: "v".to_string(),
                route: Link::SouthWest
            }
        );
        assert_eq!(constraints.len(), 5);
    }

    #[test]
    fn test_reservation_on() {
        let global = Constraint::reserve("cores", 0, 1);
        let local = Constraint::reserve_at("cores", 1, 3, (1, 1));
        assert_eq!(global.reservation_on("cores", (5, 5)), Some(ResourceRange::new(0, 1)));
        assert_eq!(global.reservation_on("sdram", (5, 5)), None);
        assert_eq!(local.reservation_on("cores", (1, 1)), Some(ResourceRange::new(1, 3)));
        assert_eq!(local.reservation_on("cores", (0, 1)), None);
        assert!(local.is_reservation_of("cores"));
        assert!(!Constraint::SameChip { vertices: vec![] }.is_reservation_of("cores"));
    }
}
