use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Tunable diagram geometry. All lengths are in hexagon widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Gap left between neighbouring chips.
    pub chip_spacing: f64,
    /// Minimum gap between cores and between cores and the chip edge.
    pub core_gap: f64,
    /// Net weights are multiplied by this to give their line width.
    pub net_weight_scale: f64,
    /// Opacity of the ratsnest drawn when nets are unrouted.
    pub ratsnest_alpha: f32,
    /// Height of the arc formed by a ratsnest wire.
    pub ratswire_arc_height: f64,
    /// Height and angle of a self-loop ratsnest wire.
    pub ratswire_loop_height: f64,
    pub ratswire_loop_angle: f64,
    /// Proportion of edge links which must work for the machine to be
    /// treated as a torus.
    pub wrap_around_proportion: f64,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            chip_spacing: 0.3,
            core_gap: 0.06,
            net_weight_scale: 0.005,
            ratsnest_alpha: 0.5,
            ratswire_arc_height: 0.1,
            ratswire_loop_height: 1.0,
            ratswire_loop_angle: PI / 5.0,
            wrap_around_proportion: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: DiagramConfig = serde_json::from_str(r#"{"net_weight_scale": 0.1}"#).unwrap();
        assert_eq!(config.net_weight_scale, 0.1);
        assert_eq!(config.chip_spacing, 0.3);
    }
}
