//! Pointer-driven token dragging.

use crate::grid::snap_point;
use crate::hit_test::hit_test;
use crate::input::PointerEvent;
use crate::session::Session;
use crate::token::TokenId;
use crate::view::View;
use kurbo::{Point, Vec2};

/// State of the drag interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// Waiting for a pointer press.
    #[default]
    Idle,
    /// A token follows the pointer.
    Dragging {
        token_id: TokenId,
        /// Token center minus pointer position at grab time.
        grab_offset: Vec2,
    },
}

/// What a pointer event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragOutcome {
    pub selection_changed: bool,
    pub moved: bool,
}

impl DragOutcome {
    pub fn needs_redraw(&self) -> bool {
        self.selection_changed || self.moved
    }
}

/// Turns pointer events into selection changes and token moves.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Token currently being dragged.
    pub fn dragged_token(&self) -> Option<TokenId> {
        match self.state {
            DragState::Dragging { token_id, .. } => Some(token_id),
            DragState::Idle => None,
        }
    }

    /// Abort any drag without moving anything.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Feed one pointer event through the state machine.
    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        view: &View,
        session: &mut Session,
        selection: &mut Option<TokenId>,
    ) -> DragOutcome {
        match event {
            PointerEvent::Down { position } => {
                self.pointer_down(view.screen_to_map(position), session, selection)
            }
            PointerEvent::Move { position } => self.pointer_move(view.screen_to_map(position), session),
            PointerEvent::Up { .. } | PointerEvent::Leave => {
                if self.is_dragging() {
                    log::debug!("drag ended");
                }
                self.state = DragState::Idle;
                DragOutcome::default()
            }
        }
    }

    fn pointer_down(
        &mut self,
        pointer: Point,
        session: &Session,
        selection: &mut Option<TokenId>,
    ) -> DragOutcome {
        let previous = *selection;
        match hit_test(pointer, &session.tokens, &session.grid) {
            Some(token) => {
                let token_id = token.id();
                *selection = Some(token_id);
                self.state = DragState::Dragging {
                    token_id,
                    grab_offset: token.position - pointer,
                };
                log::debug!("drag started on token {token_id}");
            }
            None => {
                *selection = None;
                self.state = DragState::Idle;
            }
        }
        DragOutcome {
            selection_changed: previous != *selection,
            moved: false,
        }
    }

    fn pointer_move(&mut self, pointer: Point, session: &mut Session) -> DragOutcome {
        let DragState::Dragging {
            token_id,
            grab_offset,
        } = self.state
        else {
            return DragOutcome::default();
        };

        let target = snap_point(pointer + grab_offset, &session.grid).point;
        let Some(token) = session.token_mut(token_id) else {
            // Token vanished under the pointer
            self.state = DragState::Idle;
            return DragOutcome::default();
        };

        let moved = token.position != target;
        token.position = target;
        DragOutcome {
            selection_changed: false,
            moved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
        }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
        }
    }

    #[test]
    fn test_drag_with_snap_end_to_end() {
        let mut session = Session::new("map");
        session.grid.set_size(50.0);
        let id = session.add_token(Token::new(Point::new(123.0, 77.0)));
        session.grid.snap_to_grid = true;

        let view = View::new();
        let mut selection = None;
        let mut drag = DragController::new();

        let outcome = drag.handle_event(down(123.0, 77.0), &view, &mut session, &mut selection);
        assert!(outcome.selection_changed);
        assert_eq!(selection, Some(id));
        assert!(drag.is_dragging());

        let outcome = drag.handle_event(mv(128.0, 80.0), &view, &mut session, &mut selection);
        assert!(outcome.moved);
        assert_eq!(session.token(id).unwrap().position, Point::new(125.0, 75.0));

        drag.handle_event(up(128.0, 80.0), &view, &mut session, &mut selection);
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(session.token(id).unwrap().position, Point::new(125.0, 75.0));
    }

    #[test]
    fn test_grab_offset_preserved_without_snap() {
        let mut session = Session::new("map");
        let id = session.add_token(Token::new(Point::new(100.0, 100.0)));
        let view = View::new();
        let mut selection = None;
        let mut drag = DragController::new();

        // Grab 10px left of center
        drag.handle_event(down(90.0, 100.0), &view, &mut session, &mut selection);
        drag.handle_event(mv(200.0, 150.0), &view, &mut session, &mut selection);

        assert_eq!(session.token(id).unwrap().position, Point::new(210.0, 150.0));
    }

    #[test]
    fn test_continuous_resnap_while_dragging() {
        let mut session = Session::new("map");
        session.grid.snap_to_grid = true;
        let id = session.add_token(Token::new(Point::new(25.0, 25.0)));
        let view = View::new();
        let mut selection = None;
        let mut drag = DragController::new();

        drag.handle_event(down(25.0, 25.0), &view, &mut session, &mut selection);
        drag.handle_event(mv(60.0, 25.0), &view, &mut session, &mut selection);
        assert_eq!(session.token(id).unwrap().position, Point::new(75.0, 25.0));

        let outcome = drag.handle_event(mv(70.0, 30.0), &view, &mut session, &mut selection);
        assert!(!outcome.moved);

        drag.handle_event(mv(110.0, 30.0), &view, &mut session, &mut selection);
        assert_eq!(session.token(id).unwrap().position, Point::new(125.0, 25.0));
    }

    #[test]
    fn test_pointer_uses_view_scale() {
        let mut session = Session::new("map");
        let id = session.add_token(Token::new(Point::new(100.0, 100.0)));
        let view = View {
            scale: 2.0,
            ..Default::default()
        };
        let mut selection = None;
        let mut drag = DragController::new();

        // Screen (200, 200) is map (100, 100)
        drag.handle_event(down(200.0, 200.0), &view, &mut session, &mut selection);
        assert_eq!(selection, Some(id));

        drag.handle_event(mv(300.0, 200.0), &view, &mut session, &mut selection);
        assert_eq!(session.token(id).unwrap().position, Point::new(150.0, 100.0));
    }

    #[test]
    fn test_click_empty_space_clears_selection() {
        let mut session = Session::new("map");
        let id = session.add_token(Token::new(Point::new(100.0, 100.0)));
        let view = View::new();
        let mut selection = Some(id);
        let mut drag = DragController::new();

        let outcome = drag.handle_event(down(500.0, 500.0), &view, &mut session, &mut selection);
        assert!(outcome.selection_changed);
        assert_eq!(selection, None);
        assert!(!drag.is_dragging());

        // Moving while idle does nothing
        let outcome = drag.handle_event(mv(100.0, 100.0), &view, &mut session, &mut selection);
        assert_eq!(outcome, DragOutcome::default());
        assert_eq!(session.token(id).unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_leave_ends_drag() {
        let mut session = Session::new("map");
        let id = session.add_token(Token::new(Point::new(100.0, 100.0)));
        let view = View::new();
        let mut selection = None;
        let mut drag = DragController::new();

        drag.handle_event(down(100.0, 100.0), &view, &mut session, &mut selection);
        drag.handle_event(PointerEvent::Leave, &view, &mut session, &mut selection);
        drag.handle_event(mv(300.0, 300.0), &view, &mut session, &mut selection);

        assert_eq!(session.token(id).unwrap().position, Point::new(100.0, 100.0));
        // Selection survives the end of the drag
        assert_eq!(selection, Some(id));
    }

    #[test]
    fn test_removed_token_cancels_drag() {
        let mut session = Session::new("map");
        let id = session.add_token(Token::new(Point::new(100.0, 100.0)));
        let view = View::new();
        let mut selection = None;
        let mut drag = DragController::new();

        drag.handle_event(down(100.0, 100.0), &view, &mut session, &mut selection);
        session.remove_token(id);
        let outcome = drag.handle_event(mv(120.0, 100.0), &view, &mut session, &mut selection);

        assert!(!outcome.moved);
        assert!(!drag.is_dragging());
    }
}
