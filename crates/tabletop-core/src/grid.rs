//! Grid settings and the size/snap math shared by rendering and interaction.

use crate::token::Token;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Default cell size in map pixels.
pub const DEFAULT_GRID_SIZE: f64 = 50.0;
/// Smallest allowed cell size.
pub const MIN_GRID_SIZE: f64 = 20.0;
/// Largest allowed cell size.
pub const MAX_GRID_SIZE: f64 = 150.0;

/// Grid display and snapping settings for a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Whether grid lines are drawn.
    pub enabled: bool,
    /// Pixels per cell.
    pub size: f64,
    /// Whether drag and realign quantize token positions.
    pub snap_to_grid: bool,
    /// Override for "one cell" when sizing tokens. Defaults to `size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_base_size: Option<f64>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            size: DEFAULT_GRID_SIZE,
            snap_to_grid: false,
            token_base_size: None,
        }
    }
}

impl GridSettings {
    /// Set the cell size, clamped to the allowed range.
    pub fn set_size(&mut self, size: f64) {
        self.size = clamp_grid_size(size);
    }

    /// Pixel size of one cell when sizing tokens.
    pub fn base_token_size(&self) -> f64 {
        self.token_base_size.unwrap_or(self.size)
    }
}

/// Clamp a requested cell size into `MIN_GRID_SIZE..=MAX_GRID_SIZE`.
/// Non-finite input falls back to the default.
pub fn clamp_grid_size(size: f64) -> f64 {
    if size.is_finite() {
        size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE)
    } else {
        DEFAULT_GRID_SIZE
    }
}

/// A token's on-map diameter in pixels.
pub fn effective_token_diameter(token: &Token, grid: &GridSettings) -> f64 {
    grid.base_token_size() * token.size.multiplier()
}

/// Snap a coordinate to the center of the cell containing it.
///
/// Tokens sit inside a square rather than on a grid intersection.
pub fn snap_to_cell_center(value: f64, cell_size: f64) -> f64 {
    (value / cell_size).floor() * cell_size + cell_size / 2.0
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The (possibly) snapped point.
    pub point: Point,
    /// Whether snapping was applied.
    pub snapped: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped: false,
        }
    }
}

/// Snap a point to its cell center on both axes.
pub fn snap_to_grid(point: Point, cell_size: f64) -> SnapResult {
    SnapResult {
        point: Point::new(
            snap_to_cell_center(point.x, cell_size),
            snap_to_cell_center(point.y, cell_size),
        ),
        snapped: true,
    }
}

/// Snap a point if the grid has snapping turned on.
pub fn snap_point(point: Point, grid: &GridSettings) -> SnapResult {
    if grid.snap_to_grid {
        snap_to_grid(point, grid.size)
    } else {
        SnapResult::none(point)
    }
}

/// Re-quantize every token position to its cell center.
pub fn realign_all(tokens: &[Token], grid: &GridSettings) -> Vec<Token> {
    tokens
        .iter()
        .map(|token| {
            let mut token = token.clone();
            token.position = snap_to_grid(token.position, grid.size).point;
            token
        })
        .collect()
}
