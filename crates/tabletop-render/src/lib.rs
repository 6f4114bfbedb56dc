//! Tabletop Render Library
//!
//! Renderer abstraction and a display-list implementation that paints the map,
//! the grid and the tokens of a session.

mod images;
mod renderer;
mod scene;

pub use images::{
    DEFAULT_RETRY_INTERVAL, FsImageSource, ImageCache, ImageSource, MemoryImageSource,
    decode_image,
};
pub use renderer::{RenderContext, RenderResult, RenderStyle, Renderer, RendererError};
pub use scene::{DrawCommand, Frame, SceneRenderer};

/// Pointer resolution lives with the model so the drag machine can use it.
pub use tabletop_core::hit_test::{hit_test, tokens_at_point};
