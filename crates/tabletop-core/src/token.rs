//! Tokens placed on the map.

use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a token within a session.
pub type TokenId = Uuid;

/// Fill used for tokens created without an explicit visual.
pub const DEFAULT_TOKEN_COLOR: SerializableColor = SerializableColor::new(220, 38, 38, 255);

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Creature size category.
///
/// Each category covers a fixed number of grid cells across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl TokenSize {
    pub const ALL: [TokenSize; 6] = [
        TokenSize::Tiny,
        TokenSize::Small,
        TokenSize::Medium,
        TokenSize::Large,
        TokenSize::Huge,
        TokenSize::Gargantuan,
    ];

    /// Diameter relative to one grid cell.
    pub fn multiplier(self) -> f64 {
        match self {
            TokenSize::Tiny => 0.5,
            TokenSize::Small | TokenSize::Medium => 1.0,
            TokenSize::Large => 2.0,
            TokenSize::Huge => 3.0,
            TokenSize::Gargantuan => 4.0,
        }
    }

    /// Cycle to the next size category.
    pub fn next(self) -> Self {
        match self {
            TokenSize::Tiny => TokenSize::Small,
            TokenSize::Small => TokenSize::Medium,
            TokenSize::Medium => TokenSize::Large,
            TokenSize::Large => TokenSize::Huge,
            TokenSize::Huge => TokenSize::Gargantuan,
            TokenSize::Gargantuan => TokenSize::Tiny,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenSize::Tiny => "tiny",
            TokenSize::Small => "small",
            TokenSize::Medium => "medium",
            TokenSize::Large => "large",
            TokenSize::Huge => "huge",
            TokenSize::Gargantuan => "gargantuan",
        }
    }
}

impl fmt::Display for TokenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        TokenSize::ALL
            .into_iter()
            .find(|size| size.name() == lower)
            .ok_or_else(|| format!("unknown token size: {s}"))
    }
}

/// How a token is painted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TokenVisual {
    /// Flat color disc.
    Color(SerializableColor),
    /// Image reference, clipped to the disc. Falls back to `fallback` when it can't load.
    Image {
        reference: String,
        #[serde(default = "default_fallback")]
        fallback: SerializableColor,
    },
}

fn default_fallback() -> SerializableColor {
    DEFAULT_TOKEN_COLOR
}

impl Default for TokenVisual {
    fn default() -> Self {
        TokenVisual::Color(DEFAULT_TOKEN_COLOR)
    }
}

impl TokenVisual {
    pub fn image(reference: impl Into<String>) -> Self {
        TokenVisual::Image {
            reference: reference.into(),
            fallback: DEFAULT_TOKEN_COLOR,
        }
    }

    /// The flat color used when no image is drawn.
    pub fn base_color(&self) -> SerializableColor {
        match self {
            TokenVisual::Color(color) => *color,
            TokenVisual::Image { fallback, .. } => *fallback,
        }
    }

    pub fn image_reference(&self) -> Option<&str> {
        match self {
            TokenVisual::Color(_) => None,
            TokenVisual::Image { reference, .. } => Some(reference),
        }
    }
}

/// One placed entity on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub(crate) id: TokenId,
    /// Center of the token in map pixel space.
    pub position: Point,
    #[serde(default)]
    pub size: TokenSize,
    #[serde(default)]
    pub visual: TokenVisual,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor_class: Option<i32>,
    /// Tokens without an initiative never enter turn order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<i32>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub conditions: BTreeSet<String>,
}

impl Token {
    /// Create a medium token centered at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            size: TokenSize::default(),
            visual: TokenVisual::default(),
            label: None,
            number: None,
            current_hp: None,
            max_hp: None,
            armor_class: None,
            initiative: None,
            conditions: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn with_size(mut self, size: TokenSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_visual(mut self, visual: TokenVisual) -> Self {
        self.visual = visual;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = Some(initiative);
        self
    }

    pub fn with_hp(mut self, current: i32, max: i32) -> Self {
        self.current_hp = Some(current);
        self.max_hp = Some(max);
        self
    }

    pub fn is_combatant(&self) -> bool {
        self.initiative.is_some()
    }

    /// Text drawn on the token: label, number, or both ("Goblin 2").
    pub fn display_text(&self) -> Option<String> {
        match (self.label.as_deref(), self.number) {
            (Some(label), Some(n)) if !label.is_empty() => Some(format!("{label} {n}")),
            (Some(label), None) if !label.is_empty() => Some(label.to_string()),
            (_, Some(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Subtract hit points, never dropping below zero.
    pub fn apply_damage(&mut self, amount: i32) {
        if let Some(hp) = self.current_hp.as_mut() {
            *hp = hp.saturating_sub(amount.max(0)).max(0);
        }
    }

    /// Restore hit points, capped at `max_hp` when one is set.
    pub fn heal(&mut self, amount: i32) {
        if let Some(hp) = self.current_hp.as_mut() {
            let healed = hp.saturating_add(amount.max(0));
            *hp = match self.max_hp {
                Some(max) => healed.min(max),
                None => healed,
            };
        }
    }

    /// Add the condition if absent, remove it otherwise.
    /// Returns whether the token has the condition afterwards.
    pub fn toggle_condition(&mut self, condition: &str) -> bool {
        let condition = condition.trim();
        if condition.is_empty() {
            return false;
        }
        if self.conditions.remove(condition) {
            false
        } else {
            self.conditions.insert(condition.to_string());
            true
        }
    }
}

/// Partial update for a token. `None` leaves a field untouched; for the optional
/// stats, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPatch {
    pub position: Option<Point>,
    pub size: Option<TokenSize>,
    pub visual: Option<TokenVisual>,
    pub label: Option<Option<String>>,
    pub number: Option<Option<u32>>,
    pub current_hp: Option<Option<i32>>,
    pub max_hp: Option<Option<i32>>,
    pub armor_class: Option<Option<i32>>,
    pub initiative: Option<Option<i32>>,
    pub conditions: Option<BTreeSet<String>>,
}

impl TokenPatch {
    pub fn apply(self, token: &mut Token) {
        if let Some(position) = self.position {
            token.position = position;
        }
        if let Some(size) = self.size {
            token.size = size;
        }
        if let Some(visual) = self.visual {
            token.visual = visual;
        }
        if let Some(label) = self.label {
            token.label = label;
        }
        if let Some(number) = self.number {
            token.number = number;
        }
        if let Some(hp) = self.current_hp {
            token.current_hp = hp;
        }
        if let Some(max) = self.max_hp {
            token.max_hp = max;
        }
        if let Some(ac) = self.armor_class {
            token.armor_class = ac;
        }
        if let Some(initiative) = self.initiative {
            token.initiative = initiative;
        }
        if let Some(conditions) = self.conditions {
            token.conditions = conditions;
        }
    }
}
