use serde::{Deserialize, Serialize};
use tiny_skia::Transform;

use parspective_core::BBox;

/// Maps diagram coordinates onto the pixels of the output image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Center X in diagram coordinates.
    pub center_x: f64,
    /// Center Y in diagram coordinates.
    pub center_y: f64,
    /// Zoom level (pixels per hexagon width).
    pub zoom: f64,
    /// Canvas width in pixels.
    pub canvas_width: f64,
    /// Canvas height in pixels.
    pub canvas_height: f64,
}

impl Viewport {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            zoom: 1.0,
            canvas_width,
            canvas_height,
        }
    }

    /// Zoom so the bounding box exactly fits the canvas, centred along the
    /// axis with room to spare.
    pub fn fit_bbox(&mut self, bbox: &BBox) {
        let width = bbox.width();
        let height = bbox.height();
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let center = bbox.center();
        self.center_x = center.x;
        self.center_y = center.y;
        self.zoom = (self.canvas_width / width).min(self.canvas_height / height);
    }

    /// Convert diagram X coordinate to screen coordinate.
    pub fn screen_x(&self, x: f64) -> f64 {
        (x - self.center_x) * self.zoom + self.canvas_width / 2.0
    }

    /// Convert diagram Y coordinate to screen coordinate.
    pub fn screen_y(&self, y: f64) -> f64 {
        (y - self.center_y) * self.zoom + self.canvas_height / 2.0
    }

    /// The rasteriser transform equivalent to this viewport.
    pub fn transform(&self) -> Transform {
        let zoom = self.zoom as f32;
        Transform::from_row(
            zoom,
            0.0,
            0.0,
            zoom,
            self.screen_x(0.0) as f32,
            self.screen_y(0.0) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parspective_core::Point;

    #[test]
    fn test_fit_wide_bbox() {
        let mut vp = Viewport::new(100.0, 100.0);
        vp.fit_bbox(&BBox::new(Point::new(0.0, 0.0), Point::new(10.0, 5.0)));
        assert!((vp.zoom - 10.0).abs() < 1e-10);
        // Left and right edges touch the canvas edges
        assert!(vp.screen_x(0.0).abs() < 1e-10);
        assert!((vp.screen_x(10.0) - 100.0).abs() < 1e-10);
        // Vertically centred
        assert!((vp.screen_y(0.0) - 25.0).abs() < 1e-10);
        assert!((vp.screen_y(5.0) - 75.0).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate_bbox_ignored() {
        let mut vp = Viewport::new(100.0, 100.0);
        vp.fit_bbox(&BBox::new(Point::new(1.0, 1.0), Point::new(1.0, 3.0)));
        assert_eq!(vp.zoom, 1.0);
    }

    #[test]
    fn test_transform_matches_conversion() {
        let mut vp = Viewport::new(200.0, 80.0);
        vp.fit_bbox(&BBox::new(Point::new(-2.0, -1.0), Point::new(2.0, 1.0)));
        let mut p = tiny_skia::Point::from_xy(1.5, -0.5);
        vp.transform().map_point(&mut p);
        assert!((p.x as f64 - vp.screen_x(1.5)).abs() < 1e-4);
        assert!((p.y as f64 - vp.screen_y(-0.5)).abs() < 1e-4);
    }
}
