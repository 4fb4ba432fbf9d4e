use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Name of the resource which counts processor cores, unless a netlist
/// chooses its own.
pub const DEFAULT_CORE_RESOURCE: &str = "cores";

/// Chip-level resources, keyed by resource name.
pub type Resources = BTreeMap<String, u64>;

/// Chip coordinates.
pub type ChipXY = (u32, u32);

/// The six links leaving a SpiNNaker chip, numbered counter-clockwise from
/// east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    East = 0,
    NorthEast = 1,
    North = 2,
    West = 3,
    SouthWest = 4,
    South = 5,
}

impl Link {
    pub const ALL: [Link; 6] = [
        Link::East,
        Link::NorthEast,
        Link::North,
        Link::West,
        Link::SouthWest,
        Link::South,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The (dx, dy) step taken when following this link.
    pub fn to_vector(self) -> (i64, i64) {
        match self {
            Link::East => (1, 0),
            Link::NorthEast => (1, 1),
            Link::North => (0, 1),
            Link::West => (-1, 0),
            Link::SouthWest => (-1, -1),
            Link::South => (0, -1),
        }
    }

    /// The link at the other end of this one.
    pub fn opposite(self) -> Link {
        Self::ALL[(self.index() + 3) % 6]
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Link::East => "east",
            Link::NorthEast => "north_east",
            Link::North => "north",
            Link::West => "west",
            Link::SouthWest => "south_west",
            Link::South => "south",
        };
        f.write_str(name)
    }
}

/// A SpiNNaker machine: a (possibly faulty) hexagonal torus of chips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub width: u32,
    pub height: u32,
    /// Resources available on every chip unless overridden.
    #[serde(default = "default_chip_resources")]
    pub chip_resources: Resources,
    /// Per-chip resource overrides.
    #[serde(default, with = "chip_exceptions")]
    pub chip_resource_exceptions: HashMap<ChipXY, Resources>,
    #[serde(default)]
    pub dead_chips: HashSet<ChipXY>,
    #[serde(default)]
    pub dead_links: HashSet<(u32, u32, Link)>,
}

fn default_chip_resources() -> Resources {
    Resources::from([
        (DEFAULT_CORE_RESOURCE.to_string(), 18),
        ("sdram".to_string(), 128 * 1024 * 1024),
        ("sram".to_string(), 32 * 1024),
    ])
}

impl Machine {
    pub fn new(width: u32, height: u32) -> Result<Self, CoreError> {
        let machine = Self {
            width,
            height,
            chip_resources: default_chip_resources(),
            chip_resource_exceptions: HashMap::new(),
            dead_chips: HashSet::new(),
            dead_links: HashSet::new(),
        };
        machine.validate()?;
        Ok(machine)
    }

    pub fn with_chip_resources(mut self, resources: Resources) -> Self {
        self.chip_resources = resources;
        self
    }

    /// A single SpiNN-3 board: four fully-connected chips.
    pub fn spinn3() -> Self {
        Self {
            width: 2,
            height: 2,
            chip_resources: default_chip_resources(),
            chip_resource_exceptions: HashMap::new(),
            dead_chips: HashSet::new(),
            dead_links: HashSet::new(),
        }
    }

    /// A single SpiNN-5 board: 48 chips arranged in a hexagon within an 8x8
    /// grid.
    pub fn spinn5() -> Self {
        // (first live x, live chip count) for each row, starting from y = 0.
        const ROWS: [(u32, u32); 8] = [
            (0, 5),
            (0, 6),
            (0, 7),
            (0, 8),
            (1, 7),
            (2, 6),
            (3, 5),
            (4, 4),
        ];
        let mut dead_chips = HashSet::new();
        for (y, &(first, count)) in ROWS.iter().enumerate() {
            for x in 0..8 {
                if x < first || x >= first + count {
                    dead_chips.insert((x, y as u32));
                }
            }
        }
        Self {
            width: 8,
            height: 8,
            chip_resources: default_chip_resources(),
            chip_resource_exceptions: HashMap::new(),
            dead_chips,
            dead_links: HashSet::new(),
        }
    }

    /// Build a machine from a short description: `spinn3`, `spinn5` or
    /// `WxH`.
    pub fn from_spec(spec: &str) -> Result<Self, CoreError> {
        match spec.trim().to_ascii_lowercase().as_str() {
            "spinn3" | "spinn-3" => Ok(Self::spinn3()),
            "spinn5" | "spinn-5" => Ok(Self::spinn5()),
            other => {
                let invalid = || CoreError::InvalidMachineSpec(spec.to_string());
                let (w, h) = other.split_once('x').ok_or_else(invalid)?;
                let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
                let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
                Self::new(width, height)
            }
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::EmptyMachine {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Rename the core resource from the default name to `name` in both the
    /// default chip resources and every per-chip exception.
    pub fn with_core_resource(mut self, name: &str) -> Self {
        if name == DEFAULT_CORE_RESOURCE {
            return self;
        }
        rename_resource(&mut self.chip_resources, name);
        for resources in self.chip_resource_exceptions.values_mut() {
            rename_resource(resources, name);
        }
        self
    }

    pub fn contains_chip(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && !self.dead_chips.contains(&(x, y))
    }

    /// Whether the given link of a live chip is working. The chip at the
    /// far end is not checked.
    pub fn contains_link(&self, x: u32, y: u32, link: Link) -> bool {
        self.contains_chip(x, y) && !self.dead_links.contains(&(x, y, link))
    }

    /// Resources of the chip at (x, y).
    pub fn resources_at(&self, x: u32, y: u32) -> &Resources {
        self.chip_resource_exceptions
            .get(&(x, y))
            .unwrap_or(&self.chip_resources)
    }

    /// Wrap (possibly out of range) coordinates onto the torus.
    pub fn wrap(&self, x: i64, y: i64) -> ChipXY {
        (
            x.rem_euclid(self.width as i64) as u32,
            y.rem_euclid(self.height as i64) as u32,
        )
    }

    /// The chip reached by following `link` from (x, y), wrapping around
    /// the edges of the machine.
    pub fn neighbour(&self, x: u32, y: u32, link: Link) -> ChipXY {
        let (dx, dy) = link.to_vector();
        self.wrap(x as i64 + dx, y as i64 + dy)
    }

    /// All live chips, in x-major order.
    pub fn chips(&self) -> impl Iterator<Item = ChipXY> + '_ {
        (0..self.width)
            .flat_map(move |x| (0..self.height).map(move |y| (x, y)))
            .filter(move |&(x, y)| self.contains_chip(x, y))
    }

    pub fn chip_count(&self) -> usize {
        self.chips().count()
    }

    /// The working links from chip `a` which arrive at chip `b`.
    pub fn links_between(&self, a: ChipXY, b: ChipXY) -> Vec<Link> {
        Link::ALL
            .iter()
            .copied()
            .filter(|&link| self.contains_link(a.0, a.1, link) && self.neighbour(a.0, a.1, link) == b)
            .collect()
    }

    /// Whether at least `minimum_proportion` of the links which cross the
    /// edges of the machine are working.
    pub fn has_wrap_around_links(&self, minimum_proportion: f64) -> bool {
        let (w, h) = (self.width, self.height);
        let mut working = 0usize;
        for x in 0..w {
            for (y, link) in [
                (0, Link::South),
                (0, Link::SouthWest),
                (h - 1, Link::North),
                (h - 1, Link::NorthEast),
            ] {
                if self.contains_link(x, y, link) {
                    working += 1;
                }
            }
        }
        for y in 0..h {
            for (x, link) in [
                (0, Link::West),
                (0, Link::SouthWest),
                (w - 1, Link::East),
                (w - 1, Link::NorthEast),
            ] {
                if self.contains_link(x, y, link) {
                    working += 1;
                }
            }
        }
        let total = (4 * w as usize) + (4 * h as usize);
        debug!("{working} of {total} wrap-around links working");
        working as f64 / total as f64 >= minimum_proportion
    }

    /// Remove every link which crosses an edge of the machine.
    pub fn remove_wrap_around_links(&mut self) {
        let (w, h) = (self.width, self.height);
        for x in 0..w {
            self.dead_links.insert((x, 0, Link::South));
            self.dead_links.insert((x, 0, Link::SouthWest));
            self.dead_links.insert((x, h - 1, Link::North));
            self.dead_links.insert((x, h - 1, Link::NorthEast));
        }
        for y in 0..h {
            self.dead_links.insert((0, y, Link::West));
            self.dead_links.insert((0, y, Link::SouthWest));
            self.dead_links.insert((w - 1, y, Link::East));
            self.dead_links.insert((w - 1, y, Link::NorthEast));
        }
    }
}

fn rename_resource(resources: &mut Resources, name: &str) {
    if let Some(count) = resources.remove(DEFAULT_CORE_RESOURCE) {
        resources.insert(name.to_string(), count);
    }
}

/// JSON objects only allow string keys, so per-chip exceptions are stored as
/// a list of `{ "chip": [x, y], "resources": {...} }` entries.
mod chip_exceptions {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{ChipXY, Resources};

    #[derive(Serialize, Deserialize)]
    struct Entry {
        chip: ChipXY,
        resources: Resources,
    }

    pub fn serialize<S: Serializer>(
        map: &HashMap<ChipXY, Resources>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<Entry> = map
            .iter()
            .map(|(&chip, resources)| Entry {
                chip,
                resources: resources.clone(),
            })
            .collect();
        entries.sort_by_key(|e| e.chip);
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<ChipXY, Resources>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.chip, e.resources)).collect())
    }
}
