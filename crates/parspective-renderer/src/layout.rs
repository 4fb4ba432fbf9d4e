//! Where things go: the position of every chip, link band and core in
//! diagram coordinates.
//!
//! Chips are hexagons of radius 0.5 laid out on a skewed grid so that the six
//! links of each chip meet its neighbours edge-on. Diagram y grows downwards
//! while chip y grows upwards.

use std::collections::HashMap;
use std::f64::consts::PI;

use parspective_core::geometry::core_ring_position;
use parspective_core::{BBox, Link, Machine, Point};

use crate::config::DiagramConfig;

#[derive(Debug, Clone)]
pub struct Layout {
    machine_height: u32,
    chip_spacing: f64,
    core_gap: f64,
    /// Outline width of a chip hexagon.
    pub chip_stroke_width: f64,
    /// Width of the band drawn for each chip-to-chip link.
    pub link_width: f64,
    /// Diameter of the circle drawn for each core.
    pub core_diameter: f64,
    core_offsets: HashMap<usize, Vec<Point>>,
}

impl Layout {
    /// `core_counts` lists the number of cores on each chip; the fullest chip
    /// decides how small cores must be drawn.
    pub fn new(
        machine: &Machine,
        config: &DiagramConfig,
        chip_stroke_width: f64,
        link_stroke_width: f64,
        core_counts: impl IntoIterator<Item = usize>,
    ) -> Self {
        let counts: Vec<usize> = core_counts.into_iter().collect();
        let max_core_diameter = 0.5 - chip_stroke_width;
        let max_cores = counts.iter().copied().max().unwrap_or(0);

        let core_diameter = if max_cores == 0 {
            max_core_diameter
        } else {
            let rings = core_ring_position(max_cores, max_cores - 1).0 as f64 + 1.0;
            let available = (1.0 - chip_stroke_width) * (PI / 6.0).cos();
            let gaps = config.core_gap * rings * 2.0;
            ((available - gaps) / (rings * 2.0 - 1.0)).min(max_core_diameter)
        };

        let mut layout = Self {
            machine_height: machine.height,
            chip_spacing: config.chip_spacing,
            core_gap: config.core_gap,
            chip_stroke_width,
            link_width: (PI / 6.0).sin() - (link_stroke_width / 2.0),
            core_diameter,
            core_offsets: HashMap::new(),
        };
        for count in counts {
            if !layout.core_offsets.contains_key(&count) {
                let offsets = layout.compute_core_offsets(count);
                layout.core_offsets.insert(count, offsets);
            }
        }
        layout
    }

    /// Centre of the chip at (x, y). Coordinates outside the machine give
    /// the position a neighbouring copy of the torus would occupy.
    pub fn chip_center(&self, x: i64, y: i64) -> Point {
        let y = (self.machine_height as i64 - y - 1) as f64;
        let x = x as f64 * (1.0 + self.chip_spacing);
        let y = y * (1.0 + self.chip_spacing);
        Point::new(x + y * (PI / 6.0).sin(), y * (PI / 6.0).cos())
    }

    /// The six corners of a chip's hexagon, starting from the bottom.
    pub fn hexagon(&self, x: i64, y: i64) -> [Point; 6] {
        let c = self.chip_center(x, y);
        std::array::from_fn(|step| {
            let angle = step as f64 * PI / 3.0;
            c.translate(0.5 * angle.sin(), 0.5 * angle.cos())
        })
    }

    /// The two sides of the band where `link` leaves chip (x, y), in
    /// clockwise order.
    pub fn link_band(&self, x: i64, y: i64, link: Link) -> (Point, Point) {
        // 0 is east, counter-clockwise on screen
        let angle = -(link.index() as f64) * (PI / 3.0);
        let offset = 0.5 * (PI / 6.0).cos() + self.chip_stroke_width / 2.0;
        let edge = self.chip_center(x, y).polar_offset(offset, angle);
        let half = self.link_width / 2.0;
        (
            edge.polar_offset(half, angle - PI / 2.0),
            edge.polar_offset(half, angle + PI / 2.0),
        )
    }

    fn compute_core_offsets(&self, num_cores: usize) -> Vec<Point> {
        (0..num_cores)
            .map(|core| self.ring_offset(num_cores, core))
            .collect()
    }

    fn ring_offset(&self, num_cores: usize, core: usize) -> Point {
        let (layer, index, num_in_layer) = core_ring_position(num_cores, core);
        let radius = layer as f64 * (self.core_diameter + self.core_gap);
        let angle = 2.0 * PI * (index as f64 / num_in_layer as f64);
        Point::new(radius * angle.sin(), radius * angle.cos())
    }

    /// Offset of a core from the centre of a chip with `num_cores` cores.
    /// Cores beyond the end of the chip continue its rings outwards.
    pub fn core_offset(&self, num_cores: usize, core: usize) -> Point {
        match self.core_offsets.get(&num_cores).and_then(|o| o.get(core)) {
            Some(p) => *p,
            None => self.ring_offset(num_cores.max(core + 1), core),
        }
    }

    /// Position of a core on a (possibly virtual) chip.
    pub fn core_position(&self, x: i64, y: i64, num_cores: usize, core: usize) -> Point {
        let c = self.chip_center(x, y);
        let o = self.core_offset(num_cores, core);
        c.translate(o.x, o.y)
    }

    /// The area covered by the live chips plus half a chip gap and the
    /// fade-out distance on every side.
    pub fn bbox(&self, machine: &Machine) -> Option<BBox> {
        let centers: Vec<Point> = machine
            .chips()
            .map(|(x, y)| self.chip_center(x as i64, y as i64))
            .collect();
        let spacing = (1.0 + self.chip_stroke_width) / 2.0 + self.chip_spacing;
        BBox::from_points(&centers).map(|bb| bb.expand(spacing))
    }
}
