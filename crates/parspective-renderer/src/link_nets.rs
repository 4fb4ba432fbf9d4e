//! Side-by-side packing of the nets which share a chip-to-chip link.

use std::collections::HashMap;

use log::warn;

use parspective_core::{Link, Machine, Net, NetId, Point, Route, Routes};

use crate::layout::Layout;

type LinkEnd = (u32, u32, Link);

#[derive(Debug, Clone)]
pub struct LinkNets {
    allocations: HashMap<LinkEnd, Vec<NetId>>,
    weights: Vec<f64>,
    spacing: f64,
    weight_scale: f64,
}

impl LinkNets {
    pub fn new(machine: &Machine, nets: &[Net], routes: &Routes, weight_scale: f64) -> Self {
        let spacing = nets
            .iter()
            .map(|n| n.weight)
            .fold(None, |min: Option<f64>, w| Some(min.map_or(w, |m| m.min(w))))
            .unwrap_or(1.0);

        let mut link_nets = Self {
            allocations: HashMap::new(),
            weights: nets.iter().map(|n| n.weight).collect(),
            spacing,
            weight_scale,
        };

        for (&net, tree) in routes {
            if net >= nets.len() {
                warn!("Route given for unknown net {net}");
                continue;
            }
            for node in tree.traverse() {
                for child in &node.children {
                    if let Route::Link(link) = child.route {
                        link_nets.allocate(machine, net, node.chip.0, node.chip.1, link);
                    }
                }
            }
        }
        link_nets
    }

    fn allocate(&mut self, machine: &Machine, net: NetId, x: u32, y: u32, link: Link) {
        let here = (x, y, link);
        let (x2, y2) = machine.neighbour(x, y, link);
        let there = (x2, y2, link.opposite());

        // North, East and South-West ends list nets in the order they arrive;
        // the other end lists them in reverse so both agree on screen.
        let (back, front) = match link.opposite() {
            Link::North | Link::East | Link::SouthWest => (there, here),
            _ => (here, there),
        };
        self.allocations.entry(back).or_default().push(net);
        self.allocations.entry(front).or_default().insert(0, net);
    }

    /// The nets using the given end of a link, in drawing order.
    pub fn nets_on(&self, x: u32, y: u32, link: Link) -> &[NetId] {
        self.allocations
            .get(&(x, y, link))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Where `net` crosses the band at the given link end. (x, y) may lie
    /// outside the machine, in which case the band of the virtual chip is
    /// used with the nets of its real counterpart.
    pub fn net_position(
        &self,
        machine: &Machine,
        layout: &Layout,
        x: i64,
        y: i64,
        link: Link,
        net: NetId,
    ) -> Option<Point> {
        let (wx, wy) = machine.wrap(x, y);
        let nets = self.nets_on(wx, wy, link);
        if !nets.contains(&net) {
            return None;
        }

        let mut nets_width = 0.0;
        let mut net_offset = 0.0;
        let mut last = 0.0;
        for &n in nets {
            if n == net {
                net_offset = nets_width;
            }
            last = self.weight(n) + self.spacing;
            nets_width += last;
        }
        nets_width -= last;

        let nets_width = nets_width * self.weight_scale / layout.link_width;
        let net_offset =
            net_offset * self.weight_scale / layout.link_width + (1.0 - nets_width) / 2.0;

        let (p1, p2) = layout.link_band(x, y, link);
        Some(p1.lerp(&p2, net_offset))
    }

    fn weight(&self, net: NetId) -> f64 {
        self.weights.get(net).copied().unwrap_or(1.0)
    }
}
