//! The persisted state of one open tabletop view.

use crate::grid::GridSettings;
use crate::token::{Token, TokenId};
use crate::view::DEFAULT_VIEW_SCALE;
use serde::{Deserialize, Serialize};

/// Default canvas width in map pixels when no map size is known yet.
pub const DEFAULT_CANVAS_WIDTH: f64 = 1600.0;
/// Default canvas height in map pixels when no map size is known yet.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 1200.0;

/// Prefix for persisted session keys.
const STORAGE_KEY_PREFIX: &str = "vtt-session:";

/// Tokens, grid, canvas size and view scale for a single map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Map resource reference; also the persistence key.
    pub map_image: String,
    /// Tokens in draw order (back to front).
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f64,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f64,
    #[serde(default = "default_view_scale")]
    pub view_scale: f64,
}

fn default_canvas_width() -> f64 {
    DEFAULT_CANVAS_WIDTH
}

fn default_canvas_height() -> f64 {
    DEFAULT_CANVAS_HEIGHT
}

fn default_view_scale() -> f64 {
    DEFAULT_VIEW_SCALE
}

impl Session {
    /// Create an empty session for a map.
    pub fn new(map_image: impl Into<String>) -> Self {
        Self {
            map_image: map_image.into(),
            tokens: Vec::new(),
            grid: GridSettings::default(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            view_scale: DEFAULT_VIEW_SCALE,
        }
    }

    /// Persistence key for a map identity.
    pub fn storage_key_for(map_image: &str) -> String {
        format!("{STORAGE_KEY_PREFIX}{map_image}")
    }

    /// Persistence key for this session.
    pub fn storage_key(&self) -> String {
        Self::storage_key_for(&self.map_image)
    }

    /// Add a token on top of all others.
    pub fn add_token(&mut self, token: Token) -> TokenId {
        let id = token.id();
        self.tokens.push(token);
        id
    }

    /// Remove a token.
    pub fn remove_token(&mut self, id: TokenId) -> Option<Token> {
        let index = self.tokens.iter().position(|t| t.id() == id)?;
        Some(self.tokens.remove(index))
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id() == id)
    }

    pub fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id() == id)
    }

    /// Next free number for tokens sharing `label`.
    pub fn next_number_for(&self, label: &str) -> u32 {
        self.tokens
            .iter()
            .filter(|t| t.label.as_deref() == Some(label))
            .filter_map(|t| t.number)
            .max()
            .map_or(1, |n| n + 1)
    }

    /// Drop all tokens and restore default settings, keeping the map identity.
    pub fn clear(&mut self) {
        *self = Self::new(std::mem::take(&mut self.map_image));
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize the session to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a session from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_storage_key_distinct_per_map() {
        let a = Session::new("maps/cave.png");
        let b = Session::new("maps/keep.png");
        assert_ne!(a.storage_key(), b.storage_key());
        assert_eq!(a.storage_key(), "vtt-session:maps/cave.png");
    }

    #[test]
    fn test_add_remove_token() {
        let mut session = Session::new("map");
        let id = session.add_token(Token::new(Point::new(1.0, 2.0)));
        assert!(session.token(id).is_some());
        assert!(session.remove_token(id).is_some());
        assert!(session.is_empty());
        assert!(session.remove_token(id).is_none());
    }

    #[test]
    fn test_next_number_for_label() {
        let mut session = Session::new("map");
        assert_eq!(session.next_number_for("Goblin"), 1);

        let mut goblin = Token::new(Point::ZERO).with_label("Goblin");
        goblin.number = Some(2);
        session.add_token(goblin);
        session.add_token(Token::new(Point::ZERO).with_label("Orc"));

        assert_eq!(session.next_number_for("Goblin"), 3);
        assert_eq!(session.next_number_for("Orc"), 1);
    }

    #[test]
    fn test_clear_keeps_map() {
        let mut session = Session::new("map");
        session.add_token(Token::new(Point::ZERO));
        session.grid.set_size(80.0);
        session.clear();

        assert_eq!(session, Session::new("map"));
    }

    #[test]
    fn test_json_defaults_fill_missing_fields() {
        let session = Session::from_json(r#"{ "map_image": "map" }"#).unwrap();
        assert_eq!(session, Session::new("map"));
    }
}
