use thiserror::Error;

use crate::machine::Link;
use crate::netlist::NetId;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Machine must be at least 1x1, got {width}x{height}")]
    EmptyMachine { width: u32, height: u32 },

    #[error("Invalid machine specification '{0}' (expected 'spinn3', 'spinn5' or WxH)")]
    InvalidMachineSpec(String),

    #[error("Net {net}: route {link:?} from chip ({x}, {y}) does not lead to chip ({to_x}, {to_y})")]
    InvalidRoute {
        net: NetId,
        x: u32,
        y: u32,
        link: Link,
        to_x: u32,
        to_y: u32,
    },

    #[error("Net {net}: a core route on chip ({x}, {y}) cannot continue to another chip")]
    CoreRouteToChip { net: NetId, x: u32, y: u32 },

    #[error("Net {net}: route tree refers to chip ({x}, {y}) which is not in the machine")]
    RouteOutsideMachine { net: NetId, x: u32, y: u32 },
}
