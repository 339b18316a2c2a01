//! Canvas sizing and screen/world conversion.
//!
//! The canvas is square. World space is centered on the board with +y up;
//! canvas pixels start at the top-left with +y down.

use glam::{Vec2, Vec3};

/// Vertical space reserved for the HUD in landscape.
const LANDSCAPE_CHROME_PX: f64 = 140.0;
const LANDSCAPE_MAX_PX: f64 = 300.0;
const PORTRAIT_MARGIN_PX: f64 = 40.0;
const PORTRAIT_MAX_PX: f64 = 360.0;

/// Canvas edge length (px) for a window of `width` x `height`.
pub fn fit_canvas(width: f64, height: f64) -> f64 {
    let px = if width > height {
        (height - LANDSCAPE_CHROME_PX).min(LANDSCAPE_MAX_PX)
    } else {
        (width.min(height) - PORTRAIT_MARGIN_PX).min(PORTRAIT_MAX_PX)
    };
    px.max(1.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub canvas_px: f64,
    /// World units spanned by the canvas edge.
    pub view_extent: f32,
}

impl Viewport {
    pub fn new(canvas_px: f64, view_extent: f32) -> Self {
        Self {
            canvas_px: canvas_px.max(1.0),
            view_extent,
        }
    }

    pub fn px_per_unit(&self) -> f32 {
        self.canvas_px as f32 / self.view_extent
    }

    pub fn screen_to_world(&self, x: f64, y: f64) -> Vec2 {
        let half = self.canvas_px / 2.0;
        let s = self.px_per_unit();
        Vec2::new(((x - half) as f32) / s, -((y - half) as f32) / s)
    }

    pub fn world_to_screen(&self, p: Vec3) -> (f64, f64) {
        let half = self.canvas_px / 2.0;
        let s = self.px_per_unit() as f64;
        (half + p.x as f64 * s, half - p.y as f64 * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_canvas_orientations() {
        assert_eq!(fit_canvas(1280.0, 720.0), 300.0);
        assert_eq!(fit_canvas(1000.0, 400.0), 260.0);
        assert_eq!(fit_canvas(375.0, 812.0), 335.0);
        assert_eq!(fit_canvas(800.0, 1200.0), 360.0);
        assert_eq!(fit_canvas(30.0, 30.0), 1.0);
    }

    #[test]
    fn test_screen_world_round_trip() {
        let v = Viewport::new(300.0, 6.0);
        assert_eq!(v.screen_to_world(150.0, 150.0), Vec2::ZERO);
        assert_eq!(v.screen_to_world(0.0, 0.0), Vec2::new(-3.0, 3.0));
        let (x, y) = v.world_to_screen(Vec3::new(-2.5, 2.5, 0.0));
        assert!((x - 25.0).abs() < 1e-3 && (y - 25.0).abs() < 1e-3);
    }
}
