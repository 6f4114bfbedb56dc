//! The tabletop session owned by an open map view.
//!
//! `VttEngine` bundles the persisted [`Session`] with the transient interaction
//! state (selection, drag, turn order, view placement). Every mutation that
//! touches persisted data raises a dirty flag which the persistence observer
//! drains; see [`crate::storage::SessionPersistence::observe`].

use crate::drag::{DragController, DragOutcome, DragState};
use crate::grid::realign_all;
use crate::initiative::{InitiativeTracker, combatants};
use crate::input::PointerEvent;
use crate::session::Session;
use crate::token::{Token, TokenId, TokenPatch};
use crate::view::View;
use kurbo::Point;

/// Programmatic surface of an open tabletop.
#[derive(Debug, Clone)]
pub struct VttEngine {
    session: Session,
    view: View,
    selection: Option<TokenId>,
    drag: DragController,
    initiative: InitiativeTracker,
    dirty: bool,
}

impl VttEngine {
    /// Open an empty session for a map.
    pub fn new(map_image: impl Into<String>) -> Self {
        Self::from_session(Session::new(map_image))
    }

    /// Open a previously stored session.
    pub fn from_session(mut session: Session) -> Self {
        let mut view = View::new();
        view.set_scale(session.view_scale);
        session.view_scale = view.scale;
        Self {
            session,
            view,
            selection: None,
            drag: DragController::new(),
            initiative: InitiativeTracker::new(),
            dirty: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn selection(&self) -> Option<TokenId> {
        self.selection
    }

    pub fn selected_token(&self) -> Option<&Token> {
        self.selection.and_then(|id| self.session.token(id))
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn initiative(&self) -> &InitiativeTracker {
        &self.initiative
    }

    /// Whether persisted state changed since the last [`Self::take_dirty`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // --- Tokens ---

    /// Place a token on top of the others.
    ///
    /// A labelled token without a number joining others of the same label is
    /// numbered after them ("Goblin", "Goblin 2", ...).
    pub fn add_token(&mut self, mut token: Token) -> TokenId {
        if let (Some(label), None) = (token.label.as_deref(), token.number) {
            let same_label = self
                .session
                .tokens
                .iter()
                .filter(|t| t.label.as_deref() == Some(label))
                .count() as u32;
            if same_label > 0 {
                token.number = Some(self.session.next_number_for(label).max(same_label + 1));
            }
        }
        let id = self.session.add_token(token);
        log::debug!("token {id} added");
        self.mark_dirty();
        id
    }

    /// Apply a partial update. Returns false if the token doesn't exist.
    pub fn update_token(&mut self, id: TokenId, patch: TokenPatch) -> bool {
        let Some(token) = self.session.token_mut(id) else {
            return false;
        };
        patch.apply(token);
        self.mark_dirty();
        true
    }

    pub fn remove_token(&mut self, id: TokenId) -> Option<Token> {
        let removed = self.session.remove_token(id)?;
        if self.selection == Some(id) {
            self.selection = None;
        }
        if self.drag.dragged_token() == Some(id) {
            self.drag.cancel();
        }
        self.mark_dirty();
        Some(removed)
    }

    pub fn damage_token(&mut self, id: TokenId, amount: i32) -> bool {
        self.edit_token(id, |token| token.apply_damage(amount))
    }

    pub fn heal_token(&mut self, id: TokenId, amount: i32) -> bool {
        self.edit_token(id, |token| token.heal(amount))
    }

    /// Toggle a condition; returns whether the token now has it.
    pub fn toggle_condition(&mut self, id: TokenId, condition: &str) -> Option<bool> {
        let token = self.session.token_mut(id)?;
        let present = token.toggle_condition(condition);
        self.mark_dirty();
        Some(present)
    }

    fn edit_token(&mut self, id: TokenId, edit: impl FnOnce(&mut Token)) -> bool {
        let Some(token) = self.session.token_mut(id) else {
            return false;
        };
        edit(token);
        self.mark_dirty();
        true
    }

    /// Select a token (or nothing). Turn order is unaffected.
    pub fn select(&mut self, id: Option<TokenId>) {
        self.selection = id.filter(|id| self.session.token(*id).is_some());
    }

    // --- Grid ---

    pub fn set_grid_enabled(&mut self, enabled: bool) {
        if self.session.grid.enabled != enabled {
            self.session.grid.enabled = enabled;
            self.mark_dirty();
        }
    }

    /// Change the cell size. With snapping on, tokens are re-quantized to the
    /// new cells.
    pub fn set_grid_size(&mut self, size: f64) {
        let previous = self.session.grid.size;
        self.session.grid.set_size(size);
        if self.session.grid.size == previous {
            return;
        }
        if self.session.grid.snap_to_grid {
            self.realign_tokens();
        }
        self.mark_dirty();
    }

    pub fn set_snap_to_grid(&mut self, snap: bool) {
        if self.session.grid.snap_to_grid != snap {
            self.session.grid.snap_to_grid = snap;
            self.mark_dirty();
        }
    }

    /// Override the pixel size of "one cell" for token sizing.
    pub fn set_token_base_size(&mut self, size: Option<f64>) {
        self.session.grid.token_base_size = size.filter(|s| s.is_finite() && *s > 0.0);
        self.mark_dirty();
    }

    /// Snap every token to its cell center.
    pub fn realign_tokens(&mut self) {
        self.session.tokens = realign_all(&self.session.tokens, &self.session.grid);
        self.mark_dirty();
    }

    // --- Canvas and view ---

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
            return;
        }
        if self.session.canvas_width != width || self.session.canvas_height != height {
            self.session.canvas_width = width;
            self.session.canvas_height = height;
            self.mark_dirty();
        }
    }

    pub fn set_view_scale(&mut self, scale: f64) {
        let changed = self.view.set_scale(scale);
        self.sync_view_scale(changed);
    }

    pub fn zoom_by(&mut self, factor: f64) {
        let changed = self.view.zoom_by(factor);
        self.sync_view_scale(changed);
    }

    fn sync_view_scale(&mut self, changed: bool) {
        if changed {
            self.session.view_scale = self.view.scale;
            self.mark_dirty();
        }
    }

    /// Screen position of the canvas element. Not persisted.
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.view.canvas_origin = origin;
    }

    // --- Pointer input ---

    /// Route a pointer event through the drag state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> DragOutcome {
        let outcome =
            self.drag
                .handle_event(event, &self.view, &mut self.session, &mut self.selection);
        if outcome.moved {
            self.mark_dirty();
        }
        outcome
    }

    // --- Initiative ---

    pub fn combatants(&self) -> Vec<&Token> {
        combatants(&self.session.tokens)
    }

    pub fn active_combatant(&self) -> Option<&Token> {
        self.initiative.active_combatant(&self.session.tokens)
    }

    /// Advance the turn and select the newly active token.
    pub fn next_turn(&mut self) -> Option<TokenId> {
        let active = self.initiative.next_turn(&self.session.tokens)?;
        self.selection = Some(active);
        Some(active)
    }

    /// Step the turn back and select the newly active token.
    pub fn prev_turn(&mut self) -> Option<TokenId> {
        let active = self.initiative.prev_turn(&self.session.tokens)?;
        self.selection = Some(active);
        Some(active)
    }

    pub fn reset_initiative(&mut self) {
        self.initiative.reset();
    }

    // --- Session ---

    /// Clear the whole session in memory. The persisted copy is removed by
    /// [`crate::storage::SessionPersistence::reset`].
    pub fn reset(&mut self) {
        self.session.clear();
        self.view.set_scale(self.session.view_scale);
        self.selection = None;
        self.drag.cancel();
        self.initiative.reset();
        self.dirty = false;
        log::debug!("session for {} reset", self.session.map_image);
    }
}
