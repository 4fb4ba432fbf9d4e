use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::machine::{ChipXY, Link, Machine};
use crate::netlist::{NetId, ResourceRange, VertexId};

/// The chip each vertex was placed on.
pub type Placements = BTreeMap<VertexId, ChipXY>;

/// The ranges of each resource allocated to each vertex on its chip.
pub type Allocations = BTreeMap<VertexId, BTreeMap<String, ResourceRange>>;

/// The routing tree of each net.
pub type Routes = BTreeMap<NetId, RoutingTree>;

/// Where a routing table entry sends a packet: out of a link or to a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Route {
    Link(Link),
    Core { core: u32 },
}

impl Route {
    pub fn core(core: u32) -> Self {
        Route::Core { core }
    }
}

/// What lies at the end of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// The route continues on another chip.
    Tree(Box<RoutingTree>),
    /// The route terminates at a sink vertex.
    Vertex(VertexId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingChild {
    pub route: Route,
    #[serde(flatten)]
    pub target: RouteTarget,
}

/// The multicast tree taken by a net, rooted at the chip of its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingTree {
    pub chip: ChipXY,
    #[serde(default)]
    pub children: Vec<RoutingChild>,
}

impl RoutingTree {
    pub fn new(chip: ChipXY) -> Self {
        Self {
            chip,
            children: Vec::new(),
        }
    }

    /// Continue the route on the chip reached by `link`.
    pub fn with_tree(mut self, link: Link, tree: RoutingTree) -> Self {
        self.children.push(RoutingChild {
            route: Route::Link(link),
            target: RouteTarget::Tree(Box::new(tree)),
        });
        self
    }

    /// Terminate the route at `vertex` via `route`.
    pub fn with_sink(mut self, route: Route, vertex: &str) -> Self {
        self.children.push(RoutingChild {
            route,
            target: RouteTarget::Vertex(vertex.to_string()),
        });
        self
    }

    /// Every node of the tree, depth first, starting with this one.
    pub fn traverse(&self) -> Vec<&RoutingTree> {
        let mut nodes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            for child in node.children.iter().rev() {
                if let RouteTarget::Tree(tree) = &child.target {
                    stack.push(tree);
                }
            }
        }
        nodes
    }

    /// Check that every hop of the tree stays on live chips and follows a
    /// link which actually reaches the next chip.
    pub fn validate(&self, net: NetId, machine: &Machine) -> Result<(), CoreError> {
        for node in self.traverse() {
            let (x, y) = node.chip;
            if !machine.contains_chip(x, y) {
                return Err(CoreError::RouteOutsideMachine { net, x, y });
            }
            for child in &node.children {
                let RouteTarget::Tree(tree) = &child.target else {
                    continue;
                };
                let Route::Link(link) = child.route else {
                    return Err(CoreError::CoreRouteToChip { net, x, y });
                };
                if machine.neighbour(x, y, link) != tree.chip {
                    return Err(CoreError::InvalidRoute {
                        net,
                        x,
                        y,
                        link,
                        to_x: tree.chip.0,
                        to_y: tree.chip.1,
                    });
                }
            }
        }
        Ok(())
    }
}
