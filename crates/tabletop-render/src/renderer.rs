//! Renderer trait abstraction.

use peniko::Color;
use tabletop_core::session::Session;
use tabletop_core::token::TokenId;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Image not available: {0}")]
    ImageUnavailable(String),
    #[error("Image decode failed: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Colors and stroke widths used to paint a frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderStyle {
    pub background_color: Color,
    pub grid_color: Color,
    pub grid_line_width: f64,
    pub token_outline_color: Color,
    pub token_outline_width: f64,
    pub selection_color: Color,
    pub selection_width: f64,
    pub label_color: Color,
    pub label_outline_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background_color: Color::from_rgba8(32, 32, 36, 255),
            grid_color: Color::from_rgba8(0, 0, 0, 90),
            grid_line_width: 1.0,
            token_outline_color: Color::from_rgba8(20, 20, 20, 255),
            token_outline_width: 2.0,
            selection_color: Color::from_rgba8(250, 204, 21, 255), // Amber
            selection_width: 4.0,
            label_color: Color::from_rgba8(255, 255, 255, 255),
            label_outline_color: Color::from_rgba8(0, 0, 0, 255),
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The session to render.
    pub session: &'a Session,
    /// Currently selected token, drawn with a highlight border.
    pub selection: Option<TokenId>,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    pub style: RenderStyle,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            selection: None,
            scale_factor: 1.0,
            style: RenderStyle::default(),
        }
    }

    pub fn with_selection(mut self, selection: Option<TokenId>) -> Self {
        self.selection = selection;
        self
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.style.background_color = color;
        self
    }
}

/// Trait for rendering backends.
///
/// A frame is a pure read of the context: building it never mutates the session.
pub trait Renderer {
    /// Build the draw commands for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.style.background_color
    }
}
