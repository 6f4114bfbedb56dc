//! On-screen scaling of the map canvas.
//!
//! The canvas always works in unscaled map pixels; zoom is applied by the
//! surrounding view. Pointer positions therefore have to be divided by the view
//! scale before they are compared against token positions.

use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

/// Default view scale (100%).
pub const DEFAULT_VIEW_SCALE: f64 = 1.0;

/// View placement of the canvas on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Top-left of the canvas element in screen coordinates.
    pub canvas_origin: Point,
    /// Current zoom factor.
    pub scale: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
}

impl Default for View {
    fn default() -> Self {
        Self {
            canvas_origin: Point::ZERO,
            scale: DEFAULT_VIEW_SCALE,
            min_scale: 0.1,
            max_scale: 5.0,
        }
    }
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.canvas_origin.to_vec2()) * Affine::scale(self.scale)
    }

    /// Convert a screen point to map coordinates.
    pub fn screen_to_map(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.canvas_origin.x) / self.scale,
            (screen_point.y - self.canvas_origin.y) / self.scale,
        )
    }

    /// Convert a map point to screen coordinates.
    pub fn map_to_screen(&self, map_point: Point) -> Point {
        self.transform() * map_point
    }

    /// Set the scale, clamped to the allowed range. Returns whether it changed.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() {
            return false;
        }
        let clamped = scale.clamp(self.min_scale, self.max_scale);
        if (clamped - self.scale).abs() < f64::EPSILON {
            return false;
        }
        self.scale = clamped;
        true
    }

    /// Multiply the current scale.
    pub fn zoom_by(&mut self, factor: f64) -> bool {
        self.set_scale(self.scale * factor)
    }
}
