//! Drawing a complete place-and-route diagram.
//!
//! The diagram is painted back to front: chips, the links between them, the
//! nets (either routed wires or, when nothing is routed, a ratsnest) faded
//! out towards the edges of the machine, and finally the cores.

use std::f64::consts::FRAC_PI_2;

use log::{debug, warn};
use tiny_skia::{
    Color, FillRule, GradientStop, LinearGradient, Mask, MaskType, Paint, Path, PathBuilder,
    Pixmap, PixmapPaint, RadialGradient, Shader, SpreadMode, Transform,
};

use parspective_core::geometry::shortest_torus_path;
use parspective_core::{
    Allocations, ChipXY, Constraint, Link, Machine, Net, NetId, Placements, Point, Route,
    RouteTarget, RoutingTree, Routes, VerticesResources,
};

use crate::config::DiagramConfig;
use crate::core_map::CoreMap;
use crate::error::RenderError;
use crate::layout::Layout;
use crate::link_nets::LinkNets;
use crate::style::{
    default_chip_style, default_core_style, default_link_style, default_net_style, solid,
    ChipStyle, CoreStyle, LinkStyle, NetStyle, PolygonStyle, Rgba,
};
use crate::viewport::Viewport;

const FILL_FADE: &[(f32, f32)] = &[(0.0, 1.0), (0.5, 1.0), (1.0, 0.0)];
const STROKE_FADE: &[(f32, f32)] = &[(0.0, 1.0), (0.5, 0.0)];

/// Everything known about the netlist and its place-and-route solution.
#[derive(Debug, Clone, Copy)]
pub struct DiagramData<'a> {
    pub machine: &'a Machine,
    pub vertices_resources: &'a VerticesResources,
    pub nets: &'a [Net],
    pub constraints: &'a [Constraint],
    pub placements: &'a Placements,
    pub allocations: &'a Allocations,
    /// When empty, nets are drawn as a ratsnest.
    pub routes: &'a Routes,
    pub core_resource: &'a str,
}

#[derive(Debug, Clone)]
pub struct DiagramStyles {
    pub chip: ChipStyle,
    pub link: LinkStyle,
    pub core: CoreStyle,
    pub net: NetStyle,
}

impl Default for DiagramStyles {
    fn default() -> Self {
        Self {
            chip: default_chip_style(),
            link: default_link_style(),
            core: default_core_style(),
            net: default_net_style(),
        }
    }
}

/// A net's resolved style and the width its wires are drawn at.
struct Wire {
    style: PolygonStyle,
    width: f64,
}

pub struct Diagram<'a> {
    data: DiagramData<'a>,
    styles: DiagramStyles,
    config: DiagramConfig,
    layout: Layout,
    core_map: CoreMap,
    link_nets: LinkNets,
    has_wrap_around_links: bool,
}

impl<'a> Diagram<'a> {
    pub fn new(
        data: DiagramData<'a>,
        styles: DiagramStyles,
        config: DiagramConfig,
    ) -> Result<Self, RenderError> {
        let machine = data.machine;
        if machine.chip_count() == 0 {
            return Err(RenderError::NoLiveChips);
        }
        for (&net, tree) in data.routes {
            tree.validate(net, machine)?;
        }

        let core_map = CoreMap::new(
            machine,
            data.vertices_resources,
            data.constraints,
            data.placements,
            data.allocations,
            data.core_resource,
        );
        let layout = Layout::new(
            machine,
            &config,
            styles.chip.defaults().line_width.unwrap_or(0.0),
            styles.link.defaults().line_width.unwrap_or(0.0),
            core_map.core_counts(),
        );
        let link_nets = LinkNets::new(machine, data.nets, data.routes, config.net_weight_scale);
        let has_wrap_around_links = machine.has_wrap_around_links(config.wrap_around_proportion);
        debug!(
            "Diagram of {}x{} machine: {} nets, {} routed, wrap-around links {}",
            machine.width,
            machine.height,
            data.nets.len(),
            data.routes.len(),
            if has_wrap_around_links { "present" } else { "absent" },
        );

        Ok(Self {
            data,
            styles,
            config,
            layout,
            core_map,
            link_nets,
            has_wrap_around_links,
        })
    }

    /// Draw onto a new `width` x `height` image, optionally filled with a
    /// background colour first.
    pub fn render(
        &self,
        width: u32,
        height: u32,
        background: Option<Rgba>,
    ) -> Result<Pixmap, RenderError> {
        let mut pixmap = new_pixmap(width, height)?;
        if let Some(colour) = background {
            pixmap.fill(colour.to_color());
        }
        self.draw(&mut pixmap)?;
        Ok(pixmap)
    }

    /// Draw the diagram scaled to fit and centred in `pixmap`.
    pub fn draw(&self, pixmap: &mut Pixmap) -> Result<(), RenderError> {
        let machine = self.data.machine;
        let bbox = self.layout.bbox(machine).ok_or(RenderError::NoLiveChips)?;
        let (width, height) = (pixmap.width(), pixmap.height());
        let mut viewport = Viewport::new(width as f64, height as f64);
        viewport.fit_bbox(&bbox);
        let transform = viewport.transform();

        for (x, y) in machine.chips() {
            self.draw_chip(pixmap, transform, x, y);
        }
        for (x, y, link) in self.links() {
            self.draw_link(pixmap, transform, x, y, link);
        }

        let mut nets = new_pixmap(width, height)?;
        if self.data.routes.is_empty() {
            let mut ratsnest = new_pixmap(width, height)?;
            for (id, net) in self.data.nets.iter().enumerate() {
                self.draw_ratsnest(&mut ratsnest, transform, id, net);
            }
            let paint = PixmapPaint {
                opacity: self.config.ratsnest_alpha.clamp(0.0, 1.0),
                ..Default::default()
            };
            nets.draw_pixmap(0, 0, ratsnest.as_ref(), &paint, Transform::identity(), None);
        } else {
            self.draw_routes(&mut nets, transform);
        }

        let mut mask_layer = new_pixmap(width, height)?;
        self.draw_wire_mask(&mut mask_layer, transform);
        let mask = Mask::from_pixmap(mask_layer.as_ref(), MaskType::Alpha);
        pixmap.draw_pixmap(
            0,
            0,
            nets.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            Some(&mask),
        );

        for (x, y) in machine.chips() {
            self.draw_cores(pixmap, transform, x, y);
        }
        Ok(())
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        let machine = self.data.machine;
        (0..machine.width as i64).contains(&x) && (0..machine.height as i64).contains(&y)
    }

    /// The links to draw, each identified by the chip it leaves.
    ///
    /// Links inside the machine are listed once, from their lower end.
    /// Wrap-around links are listed from both edges of the machine. Links to
    /// dead chips are not listed.
    pub fn links(&self) -> Vec<(u32, u32, Link)> {
        let machine = self.data.machine;
        let mut links = Vec::new();
        for (x, y) in machine.chips() {
            for link in Link::ALL {
                if !machine.contains_link(x, y, link) {
                    continue;
                }
                let (dx, dy) = link.to_vector();
                let (x2, y2) = (x as i64 + dx, y as i64 + dy);
                let wraps = !self.in_bounds(x2, y2);
                let (wx, wy) = machine.wrap(x2, y2);
                if machine.contains_chip(wx, wy) && (wraps || (x as i64, y as i64) < (x2, y2)) {
                    links.push((x, y, link));
                }
            }
        }
        links
    }

    fn draw_chip(&self, pixmap: &mut Pixmap, transform: Transform, x: u32, y: u32) {
        let style = self.styles.chip.get(&(x, y));
        if let Some(path) = polygon_path(&self.layout.hexagon(x as i64, y as i64)) {
            style.paint(pixmap, &path, transform);
        }
    }

    fn draw_link(&self, pixmap: &mut Pixmap, transform: Transform, x: u32, y: u32, link: Link) {
        let style = self.styles.link.get(&(x, y, link));
        if !style.is_visible() {
            return;
        }
        let (dx, dy) = link.to_vector();
        let (x2, y2) = (x as i64 + dx, y as i64 + dy);
        let (a1, a2) = self.layout.link_band(x as i64, y as i64, link);
        let (b1, b2) = self.layout.link_band(x2, y2, link.opposite());
        let wraps = !self.in_bounds(x2, y2);

        if let Some(band) = polygon_path(&[a1, b2, b1, a2]) {
            if wraps {
                style.fill_path(pixmap, &band, transform, &|c: Rgba| fade(a1, b2, c, FILL_FADE));
            } else {
                style.fill_path(pixmap, &band, transform, &solid);
            }
        }

        let mut pb = PathBuilder::new();
        pb.move_to(a1.x as f32, a1.y as f32);
        pb.line_to(b2.x as f32, b2.y as f32);
        pb.move_to(a2.x as f32, a2.y as f32);
        pb.line_to(b1.x as f32, b1.y as f32);
        if let Some(edges) = pb.finish() {
            if wraps {
                style.stroke_path(pixmap, &edges, transform, &|c: Rgba| fade(a1, b2, c, STROKE_FADE));
            } else {
                style.stroke_path(pixmap, &edges, transform, &solid);
            }
        }
    }

    fn draw_cores(&self, pixmap: &mut Pixmap, transform: Transform, x: u32, y: u32) {
        let cores = self.core_map.cores((x, y));
        let radius = (self.layout.core_diameter / 2.0) as f32;
        for (core, owner) in cores.iter().enumerate() {
            let style = self.styles.core.get(owner);
            if !style.is_visible() {
                continue;
            }
            let p = self.layout.core_position(x as i64, y as i64, cores.len(), core);
            if let Some(circle) = PathBuilder::from_circle(p.x as f32, p.y as f32, radius) {
                style.paint(pixmap, &circle, transform);
            }
        }
    }

    fn wire(&self, net: NetId) -> Option<Wire> {
        let weight = self.data.nets.get(net)?.weight;
        let style = self.styles.net.get(&net);
        if style.stroke.is_none() {
            return None;
        }
        let width = style
            .line_width
            .unwrap_or(weight * self.config.net_weight_scale);
        if width <= 0.0 {
            debug!("Net {net} has zero width, not drawn");
            return None;
        }
        Some(Wire { style, width })
    }

    fn stroke_wire(&self, pixmap: &mut Pixmap, transform: Transform, wire: &Wire, path: &Path) {
        wire.style
            .stroke_path_with_width(pixmap, path, transform, wire.width, &solid);
    }

    /// The places a vertex's wires attach to: each of its cores, or the chip
    /// centre when it has none. `None` if the vertex is not placed.
    fn vertex_ends(&self, vertex: &str) -> Option<(ChipXY, Vec<Option<usize>>)> {
        let (xy, cores) = self.core_map.cores_of(vertex)?;
        if cores.is_empty() {
            Some((xy, vec![None]))
        } else {
            Some((xy, cores.iter().map(|&c| Some(c)).collect()))
        }
    }

    /// Position of a wire end on chip (x, y), which may be a virtual copy of
    /// the real chip `real` beyond the edge of the machine.
    fn end_position(&self, x: i64, y: i64, real: ChipXY, core: Option<usize>) -> Point {
        match core {
            Some(core) => {
                self.layout
                    .core_position(x, y, self.core_map.num_cores(real), core)
            }
            None => self.layout.chip_center(x, y),
        }
    }

    fn draw_ratsnest(&self, pixmap: &mut Pixmap, transform: Transform, id: NetId, net: &Net) {
        let Some(wire) = self.wire(id) else {
            return;
        };
        let Some((src, src_ends)) = self.vertex_ends(&net.source) else {
            warn!("Net {id}: source '{}' is not placed", net.source);
            return;
        };
        for &sc in &src_ends {
            for sink in &net.sinks {
                let Some((dst, dst_ends)) = self.vertex_ends(sink) else {
                    warn!("Net {id}: sink '{sink}' is not placed");
                    continue;
                };
                for &dc in &dst_ends {
                    for (a, b) in self.ratswire_segments(src, sc, dst, dc) {
                        if let Some(path) = self.ratswire_path(a, b) {
                            self.stroke_wire(pixmap, transform, &wire, &path);
                        }
                    }
                }
            }
        }
    }

    /// The straight segments a ratsnest wire is made of. A wire whose
    /// shortest path crosses the edge of a torus is split into one half
    /// leaving the machine and another coming back in on the far side.
    fn ratswire_segments(
        &self,
        src: ChipXY,
        sc: Option<usize>,
        dst: ChipXY,
        dc: Option<usize>,
    ) -> Vec<(Point, Point)> {
        let machine = self.data.machine;
        let (sx, sy) = (src.0 as i64, src.1 as i64);
        let (dx, dy) = (dst.0 as i64, dst.1 as i64);
        let (vx, vy, vz) = shortest_torus_path((sx, sy, 0), (dx, dy, 0), machine.width, machine.height);
        let (vx, vy) = (vx - vz, vy - vz);
        let wraps = !self.in_bounds(sx + vx, sy + vy);

        if !self.has_wrap_around_links || !wraps {
            vec![(
                self.end_position(sx, sy, src, sc),
                self.end_position(dx, dy, dst, dc),
            )]
        } else {
            vec![
                (
                    self.end_position(sx, sy, src, sc),
                    self.end_position(sx + vx, sy + vy, dst, dc),
                ),
                (
                    self.end_position(dx - vx, dy - vy, src, sc),
                    self.end_position(dx, dy, dst, dc),
                ),
            ]
        }
    }

    /// A gently arched wire from `a` to `b`, or a loop when they coincide.
    fn ratswire_path(&self, a: Point, b: Point) -> Option<Path> {
        let (c1, c2) = if a != b {
            let (hx, hy) = ((b.x - a.x) / 2.0, (b.y - a.y) / 2.0);
            let normal = hy.atan2(hx) + FRAC_PI_2;
            let mid = a
                .translate(hx, hy)
                .polar_offset(self.config.ratswire_arc_height, normal);
            (mid, mid)
        } else {
            let height = self.config.ratswire_loop_height;
            let angle = self.config.ratswire_loop_angle;
            (
                a.polar_offset(height, -FRAC_PI_2 - angle),
                b.polar_offset(height, -FRAC_PI_2 + angle),
            )
        };
        let mut pb = PathBuilder::new();
        pb.move_to(a.x as f32, a.y as f32);
        pb.cubic_to(
            c1.x as f32,
            c1.y as f32,
            c2.x as f32,
            c2.y as f32,
            b.x as f32,
            b.y as f32,
        );
        pb.finish()
    }

    fn draw_routes(&self, pixmap: &mut Pixmap, transform: Transform) {
        let machine = self.data.machine;

        // Chip-to-chip sections. The far end of a wrap-around link is the
        // virtual chip beyond the edge; the other half is drawn when the
        // link is listed from the opposite edge.
        for (x, y, link) in self.links() {
            let (dx, dy) = link.to_vector();
            let (x2, y2) = (x as i64 + dx, y as i64 + dy);
            for &net in self.link_nets.nets_on(x, y, link) {
                let Some(wire) = self.wire(net) else {
                    continue;
                };
                let a = self
                    .link_nets
                    .net_position(machine, &self.layout, x as i64, y as i64, link, net);
                let b = self
                    .link_nets
                    .net_position(machine, &self.layout, x2, y2, link.opposite(), net);
                if let Some(path) = a.zip(b).and_then(|(a, b)| line_path(a, b)) {
                    self.stroke_wire(pixmap, transform, &wire, &path);
                }
            }
        }

        // Sections within chips.
        for (&net, tree) in self.data.routes {
            let Some(wire) = self.wire(net) else {
                continue;
            };
            let Some(source) = self.data.nets.get(net) else {
                warn!("Route given for unknown net {net}");
                continue;
            };
            let Some((xy, ends)) = self.vertex_ends(&source.source) else {
                warn!("Net {net}: source '{}' is not placed", source.source);
                continue;
            };
            for (i, core) in ends.into_iter().enumerate() {
                let origin = self.end_position(xy.0 as i64, xy.1 as i64, xy, core);
                self.draw_tree_internal(pixmap, transform, net, &wire, origin, tree, i == 0);
            }
        }
    }

    /// Wires from `origin` to every place `node` sends the net on its chip.
    /// With `recurse`, the rest of the tree is drawn too.
    #[allow(clippy::too_many_arguments)]
    fn draw_tree_internal(
        &self,
        pixmap: &mut Pixmap,
        transform: Transform,
        net: NetId,
        wire: &Wire,
        origin: Point,
        node: &RoutingTree,
        recurse: bool,
    ) {
        let machine = self.data.machine;
        let (x, y) = node.chip;
        for child in &node.children {
            let end = match (child.route, &child.target) {
                (Route::Link(link), target) => {
                    if let (true, RouteTarget::Tree(tree)) = (recurse, target) {
                        let (nx, ny) = machine.neighbour(x, y, link);
                        let far = self.link_nets.net_position(
                            machine,
                            &self.layout,
                            nx as i64,
                            ny as i64,
                            link.opposite(),
                            net,
                        );
                        if let Some(far) = far {
                            self.draw_tree_internal(pixmap, transform, net, wire, far, tree, true);
                        }
                    }
                    self.link_nets
                        .net_position(machine, &self.layout, x as i64, y as i64, link, net)
                }
                (Route::Core { core }, _) => Some(self.layout.core_position(
                    x as i64,
                    y as i64,
                    self.core_map.num_cores(node.chip),
                    core as usize,
                )),
            };
            if let Some(path) = end.and_then(|end| line_path(origin, end)) {
                self.stroke_wire(pixmap, transform, wire, &path);
            }
        }
    }

    /// Opaque over the interior of the machine, fading out radially around
    /// every chip on its edge.
    fn draw_wire_mask(&self, pixmap: &mut Pixmap, transform: Transform) {
        let machine = self.data.machine;
        let (w, h) = (machine.width, machine.height);
        let inner = 0.5 + self.config.chip_spacing / 2.0;
        let outer = 0.5 + self.config.chip_spacing;

        let rows: Vec<u32> = if h > 1 { vec![0, h - 1] } else { vec![0] };
        let cols: Vec<u32> = if w > 1 { vec![0, w - 1] } else { vec![0] };
        let edge_chips = (0..w)
            .flat_map(|x| rows.iter().map(move |&y| (x, y)))
            .chain((1..h.saturating_sub(1)).flat_map(|y| cols.iter().map(move |&x| (x, y))));

        for (x, y) in edge_chips {
            let c = self.layout.chip_center(x as i64, y as i64);
            let centre = tiny_skia::Point::from_xy(c.x as f32, c.y as f32);
            let stops = vec![
                GradientStop::new(0.0, Color::BLACK),
                GradientStop::new((inner / outer) as f32, Color::BLACK),
                GradientStop::new(1.0, Color::TRANSPARENT),
            ];
            let Some(shader) = RadialGradient::new(
                centre,
                centre,
                outer as f32,
                stops,
                SpreadMode::Pad,
                Transform::identity(),
            ) else {
                continue;
            };
            let Some(circle) = PathBuilder::from_circle(c.x as f32, c.y as f32, outer as f32) else {
                continue;
            };
            let paint = Paint {
                shader,
                anti_alias: true,
                ..Default::default()
            };
            pixmap.fill_path(&circle, &paint, FillRule::Winding, transform, None);
        }

        let corners = [
            self.layout.chip_center(0, 0),
            self.layout.chip_center(w as i64 - 1, 0),
            self.layout.chip_center(w as i64 - 1, h as i64 - 1),
            self.layout.chip_center(0, h as i64 - 1),
        ];
        if let Some(interior) = polygon_path(&corners) {
            PolygonStyle::filled(Rgba::BLACK).paint(pixmap, &interior, transform);
        }
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, RenderError> {
    Pixmap::new(width, height).ok_or(RenderError::PixmapAlloc { width, height })
}

fn polygon_path(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}

fn line_path(a: Point, b: Point) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(a.x as f32, a.y as f32);
    pb.line_to(b.x as f32, b.y as f32);
    pb.finish()
}

/// A linear gradient of `colour` from `start` to `end`, with the alpha scaled
/// by each `(position, alpha)` stop.
fn fade(start: Point, end: Point, colour: Rgba, stops: &[(f32, f32)]) -> Shader<'static> {
    let stops = stops
        .iter()
        .map(|&(pos, alpha)| GradientStop::new(pos, colour.with_alpha(colour.3 * alpha).to_color()))
        .collect();
    LinearGradient::new(
        tiny_skia::Point::from_xy(start.x as f32, start.y as f32),
        tiny_skia::Point::from_xy(end.x as f32, end.y as f32),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or_else(|| solid(colour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use parspective_core::{ResourceRange, Resources};

    use crate::style::Style;

    fn resources(cores: u64) -> Resources {
        Resources::from([("cores".to_string(), cores)])
    }

    /// Owned inputs for a diagram.
    struct Fixture {
        machine: Machine,
        vertices_resources: VerticesResources,
        nets: Vec<Net>,
        constraints: Vec<Constraint>,
        placements: Placements,
        allocations: Allocations,
        routes: Routes,
    }

    impl Fixture {
        fn new(machine: Machine) -> Self {
            Self {
                machine,
                vertices_resources: VerticesResources::new(),
                nets: Vec::new(),
                constraints: Vec::new(),
                placements: Placements::new(),
                allocations: Allocations::new(),
                routes: Routes::new(),
            }
        }

        /// Place `name` on `chip` with the given cores.
        fn vertex(&mut self, name: &str, chip: ChipXY, cores: (u64, u64)) {
            self.vertices_resources
                .insert(name.to_string(), resources(cores.1 - cores.0));
            self.placements.insert(name.to_string(), chip);
            self.allocations.insert(
                name.to_string(),
                BTreeMap::from([("cores".to_string(), ResourceRange::new(cores.0, cores.1))]),
            );
        }

        fn data(&self) -> DiagramData<'_> {
            DiagramData {
                machine: &self.machine,
                vertices_resources: &self.vertices_resources,
                nets: &self.nets,
                constraints: &self.constraints,
                placements: &self.placements,
                allocations: &self.allocations,
                routes: &self.routes,
                core_resource: "cores",
            }
        }

        fn render(&self, styles: DiagramStyles) -> Pixmap {
            Diagram::new(self.data(), styles, DiagramConfig::default())
                .unwrap()
                .render(200, 150, Some(Rgba::WHITE))
                .unwrap()
        }
    }

    fn count_pixels(pixmap: &Pixmap, pred: impl Fn(u8, u8, u8) -> bool) -> usize {
        pixmap
            .pixels()
            .iter()
            .map(|p| p.demultiply())
            .filter(|p| pred(p.red(), p.green(), p.blue()))
            .count()
    }

    fn reddish(r: u8, g: u8, b: u8) -> bool {
        r as i32 - g as i32 > 60 && r as i32 - b as i32 > 60
    }

    /// Nets drawn thick enough to find in a small image.
    fn thick_nets() -> DiagramStyles {
        let mut styles = DiagramStyles::default();
        styles.net.defaults_mut().line_width = Some(0.1);
        styles
    }

    /// A 3x3 mesh with a vertex in opposite corners and a net between them.
    fn mesh() -> Fixture {
        let mut machine = Machine::new(3, 3).unwrap().with_chip_resources(resources(4));
        machine.remove_wrap_around_links();
        let mut f = Fixture::new(machine);
        f.vertex("a", (0, 0), (1, 2));
        f.vertex("b", (2, 2), (1, 2));
        f.nets.push(Net::new("a", &["b"]));
        f
    }

    #[test]
    fn test_links_listed() {
        let f = Fixture::new(Machine::new(3, 3).unwrap());
        let d = Diagram::new(f.data(), DiagramStyles::default(), DiagramConfig::default()).unwrap();
        // 16 links inside the machine, 11 wrap-around links listed twice
        assert_eq!(d.links().len(), 38);
        assert!(d.links().contains(&(0, 0, Link::East)));
        assert!(!d.links().contains(&(1, 0, Link::West)));
        assert!(d.links().contains(&(0, 0, Link::West)));

        let mut f = mesh();
        f.machine.dead_chips.insert((1, 1));
        let d = Diagram::new(f.data(), DiagramStyles::default(), DiagramConfig::default()).unwrap();
        assert_eq!(d.links().len(), 16 - 6);
    }

    #[test]
    fn test_no_live_chips() {
        let mut machine = Machine::new(1, 1).unwrap();
        machine.dead_chips.insert((0, 0));
        let f = Fixture::new(machine);
        let result = Diagram::new(f.data(), DiagramStyles::default(), DiagramConfig::default());
        assert!(matches!(result, Err(RenderError::NoLiveChips)));
    }

    #[test]
    fn test_invalid_route_rejected() {
        let mut f = mesh();
        f.routes.insert(
            0,
            RoutingTree::new((0, 0)).with_tree(Link::East, RoutingTree::new((1, 1))),
        );
        let result = Diagram::new(f.data(), DiagramStyles::default(), DiagramConfig::default());
        assert!(matches!(result, Err(RenderError::InvalidRoute(_))));
    }

    #[test]
    fn test_core_colours() {
        let machine = Machine::new(1, 1).unwrap().with_chip_resources(resources(1));
        let mut f = Fixture::new(machine);
        let pixmap = f.render(DiagramStyles::default());
        let p = pixmap.pixel(100, 75).unwrap().demultiply();
        assert_eq!((p.red(), p.green(), p.blue()), (217, 217, 217));

        f.vertex("v", (0, 0), (0, 1));
        let pixmap = f.render(DiagramStyles::default());
        let p = pixmap.pixel(100, 75).unwrap().demultiply();
        assert_eq!((p.red(), p.green(), p.blue()), (0, 0, 255));
    }

    #[test]
    fn test_empty_styles_draw_nothing() {
        let mut f = mesh();
        f.routes.insert(
            0,
            RoutingTree::new((0, 0)).with_tree(
                Link::NorthEast,
                RoutingTree::new((1, 1))
                    .with_tree(Link::NorthEast, RoutingTree::new((2, 2)).with_sink(Route::core(1), "b")),
            ),
        );
        let styles = DiagramStyles {
            chip: Style::default(),
            link: Style::default(),
            core: Style::default(),
            net: Style::default(),
        };
        let pixmap = f.render(styles);
        assert_eq!(count_pixels(&pixmap, |r, g, b| (r, g, b) != (255, 255, 255)), 0);
    }

    #[test]
    fn test_ratsnest() {
        let f = mesh();
        let pixmap = f.render(thick_nets());
        assert!(count_pixels(&pixmap, reddish) > 0);

        // Without nets there is nothing red
        let mut f = mesh();
        f.nets.clear();
        let pixmap = f.render(thick_nets());
        assert_eq!(count_pixels(&pixmap, reddish), 0);
    }

    #[test]
    fn test_routed() {
        let mut f = mesh();
        f.routes.insert(
            0,
            RoutingTree::new((0, 0)).with_tree(
                Link::NorthEast,
                RoutingTree::new((1, 1))
                    .with_tree(Link::NorthEast, RoutingTree::new((2, 2)).with_sink(Route::core(1), "b")),
            ),
        );
        let pixmap = f.render(thick_nets());
        assert!(count_pixels(&pixmap, reddish) > 0);
    }

    #[test]
    fn test_zero_width_nets_skipped() {
        let f = mesh();
        let mut styles = DiagramStyles::default();
        styles.net.defaults_mut().line_width = Some(0.0);
        let pixmap = f.render(styles);
        assert_eq!(count_pixels(&pixmap, reddish), 0);
    }

    #[test]
    fn test_wrap_around_network() {
        let mut f = Fixture::new(Machine::new(4, 4).unwrap());
        f.vertex("a", (0, 0), (1, 3));
        f.vertex("b", (3, 3), (1, 2));
        f.vertex("c", (1, 2), (1, 2));
        f.nets.push(Net::new("a", &["b", "c"]));
        f.nets.push(Net::new("b", &["b"]).with_weight(2.0));
        assert!(count_pixels(&f.render(thick_nets()), reddish) > 0);

        // The shortest route from (0, 0) to (3, 3) wraps around
        f.routes.insert(
            0,
            RoutingTree::new((0, 0))
                .with_tree(Link::SouthWest, RoutingTree::new((3, 3)).with_sink(Route::core(1), "b"))
                .with_tree(
                    Link::North,
                    RoutingTree::new((0, 1)).with_tree(
                        Link::NorthEast,
                        RoutingTree::new((1, 2)).with_sink(Route::core(1), "c"),
                    ),
                ),
        );
        assert!(count_pixels(&f.render(thick_nets()), reddish) > 0);
    }

    #[test]
    fn test_ratswire_split_on_torus() {
        let f = Fixture::new(Machine::new(4, 4).unwrap());
        let d = Diagram::new(f.data(), DiagramStyles::default(), DiagramConfig::default()).unwrap();
        let segments = d.ratswire_segments((0, 0), None, (3, 3), None);
        assert_eq!(segments.len(), 2);
        // Out of the bottom left corner, back in at the top right
        assert_eq!(segments[0].0, d.layout.chip_center(0, 0));
        assert_eq!(segments[0].1, d.layout.chip_center(-1, -1));
        assert_eq!(segments[1].0, d.layout.chip_center(4, 4));
        assert_eq!(segments[1].1, d.layout.chip_center(3, 3));

        let mut f = f;
        f.machine.remove_wrap_around_links();
        let d = Diagram::new(f.data(), DiagramStyles::default(), DiagramConfig::default()).unwrap();
        let segments = d.ratswire_segments((0, 0), None, (3, 3), None);
        assert_eq!(
            segments,
            vec![(d.layout.chip_center(0, 0), d.layout.chip_center(3, 3))]
        );
    }

    /// Alpha of the pixel a fraction `t` of the way along the middle of a
    /// link, from the chip it leaves to the chip it reaches.
    fn alpha_along_link(d: &Diagram<'_>, pixmap: &Pixmap, x: u32, y: u32, link: Link, t: f64) -> u8 {
        let (dx, dy) = link.to_vector();
        let (a1, a2) = d.layout.link_band(x as i64, y as i64, link);
        let (b1, b2) = d.layout.link_band(x as i64 + dx, y as i64 + dy, link.opposite());
        let near = a1.lerp(&a2, 0.5);
        let far = b1.lerp(&b2, 0.5);
        let p = near.lerp(&far, t);

        let bbox = d.layout.bbox(d.data.machine).unwrap();
        let mut viewport = Viewport::new(pixmap.width() as f64, pixmap.height() as f64);
        viewport.fit_bbox(&bbox);
        let (px, py) = (viewport.screen_x(p.x), viewport.screen_y(p.y));
        pixmap.pixel(px as u32, py as u32).unwrap().alpha()
    }

    #[test]
    fn test_wrap_around_links_fade() {
        let f = Fixture::new(Machine::new(3, 3).unwrap());
        let styles = DiagramStyles {
            chip: Style::default(),
            link: Style::new(PolygonStyle::filled(Rgba::BLACK)),
            core: Style::default(),
            net: Style::default(),
        };
        let d = Diagram::new(f.data(), styles, DiagramConfig::default()).unwrap();
        let pixmap = d.render(400, 300, None).unwrap();

        // (0, 1) West leaves the machine: solid near its chip, gone at the far end
        assert!(alpha_along_link(&d, &pixmap, 0, 1, Link::West, 0.1) > 200);
        assert!(alpha_along_link(&d, &pixmap, 0, 1, Link::West, 0.95) < 60);

        // Links inside the machine are solid all the way
        assert!(alpha_along_link(&d, &pixmap, 1, 1, Link::East, 0.1) > 200);
        assert!(alpha_along_link(&d, &pixmap, 1, 1, Link::East, 0.95) > 200);
    }

    #[test]
    fn test_spinn5_with_unplaced_vertex() {
        let mut f = Fixture::new(Machine::spinn5());
        f.vertex("a", (0, 0), (1, 2));
        f.vertex("b", (4, 4), (1, 17));
        f.vertex("c", (7, 7), (3, 4));
        f.vertices_resources.insert("lost".to_string(), resources(1));
        f.nets.push(Net::new("a", &["b", "c", "lost"]));
        f.nets.push(Net::new("lost", &["a"]));
        f.constraints.push(Constraint::reserve("cores", 0, 1));
        let pixmap = f.render(DiagramStyles::default());
        assert_eq!(pixmap.width(), 200);
    }

    #[test]
    fn test_self_loop() {
        let mut f = mesh();
        f.nets = vec![Net::new("a", &["a"])];
        assert!(count_pixels(&f.render(thick_nets()), reddish) > 0);
    }
}
