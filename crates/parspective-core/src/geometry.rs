use serde::{Deserialize, Serialize};

/// A 2D point in diagram coordinates (hexagon widths).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Point at `distance` from this one in direction `angle` (radians).
    pub fn polar_offset(&self, distance: f64, angle: f64) -> Self {
        self.translate(distance * angle.cos(), distance * angle.sin())
    }

    /// Linear interpolation towards `other` (`t = 0` is `self`).
    pub fn lerp(&self, other: &Point, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Grow the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: self.min.translate(-margin, -margin),
            max: self.max.translate(margin, margin),
        }
    }
}

// ── Hexagonal coordinates ────────────────────────────────────────────

/// A vector in SpiNNaker's hexagonal (x, y, z) coordinate system, where
/// z points along the north-east/south-west diagonal.
pub type HexVector = (i64, i64, i64);

/// Remove the redundant component of a hexagonal vector, giving the
/// equivalent vector with the fewest hops.
pub fn minimise_xyz(v: HexVector) -> HexVector {
    let (x, y, z) = v;
    let mut sorted = [x, y, z];
    sorted.sort_unstable();
    let median = sorted[1];
    (x - median, y - median, z - median)
}

/// Number of hops taken by a (minimised) hexagonal vector.
pub fn hex_length(v: HexVector) -> i64 {
    v.0.abs() + v.1.abs() + v.2.abs()
}

/// The shortest vector from `source` to `destination` on a `width` by
/// `height` torus of hexagonally connected chips.
pub fn shortest_torus_path(
    source: HexVector,
    destination: HexVector,
    width: u32,
    height: u32,
) -> HexVector {
    let w = width as i64;
    let h = height as i64;

    let (dx, dy, dz) = (
        destination.0 - source.0,
        destination.1 - source.1,
        destination.2 - source.2,
    );
    let x = (dx - dz).rem_euclid(w);
    let y = (dy - dz).rem_euclid(h);

    let candidates = [
        (x, y, 0),
        (-(w - x), y, 0),
        (x, -(h - y), 0),
        (-(w - x), -(h - y), 0),
    ];

    let mut best = minimise_xyz(candidates[0]);
    for candidate in &candidates[1..] {
        let v = minimise_xyz(*candidate);
        if hex_length(v) < hex_length(best) {
            best = v;
        }
    }
    best
}

/// Locate a core within the concentric hexagonal rings used to draw the
/// cores of a chip.
///
/// Returns `(layer, index, num_in_layer)`: the ring the core sits in, its
/// position around that ring and the number of cores in the ring. Core 0
/// sits alone in the centre, ring `n` holds up to `6n` cores and the
/// outermost ring only holds whatever cores remain.
pub fn core_ring_position(num_cores: usize, core: usize) -> (usize, usize, usize) {
    if core == 0 {
        return (0, 0, 1);
    }

    let mut layer = 0;
    let mut remaining_core = core;
    let mut remaining_cores = num_cores;
    let mut num_in_full_layer = 1;
    loop {
        remaining_core -= num_in_full_layer;
        remaining_cores = remaining_cores.saturating_sub(num_in_full_layer);

        layer += 1;
        num_in_full_layer = layer * 6;

        if remaining_core < num_in_full_layer {
            break;
        }
    }

    (layer, remaining_core, remaining_cores.min(num_in_full_layer))
}
