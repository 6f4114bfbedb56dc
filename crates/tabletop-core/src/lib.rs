//! Tabletop Core Library
//!
//! Platform-agnostic model for a virtual tabletop: tokens placed on a map image,
//! grid snapping, pointer-driven dragging, initiative order and per-map session
//! persistence.

pub mod drag;
pub mod engine;
pub mod grid;
pub mod hit_test;
pub mod initiative;
pub mod input;
pub mod session;
pub mod storage;
pub mod token;
pub mod view;

pub use drag::{DragController, DragOutcome, DragState};
pub use engine::VttEngine;
pub use grid::{
    DEFAULT_GRID_SIZE, GridSettings, MAX_GRID_SIZE, MIN_GRID_SIZE, effective_token_diameter,
    realign_all, snap_point, snap_to_cell_center,
};
pub use hit_test::{hit_test, tokens_at_point};
pub use initiative::{InitiativeTracker, combatants};
pub use input::PointerEvent;
pub use session::Session;
pub use storage::{SessionPersistence, Storage, StorageError, StorageResult};
pub use token::{SerializableColor, Token, TokenId, TokenPatch, TokenSize, TokenVisual};
pub use view::View;
