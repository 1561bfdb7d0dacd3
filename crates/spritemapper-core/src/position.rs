//! Background positions as authored in CSS.
//!
//! Only pixel positions take part in offset arithmetic. Anything else (percentages,
//! font-relative units, non-zero keywords) is kept verbatim and makes arithmetic fail
//! with [`SpriteError::UnsupportedUnit`] instead of producing wrong pixels.

use crate::error::{Result, SpriteError};
use crate::sprite::URL_RE;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+(?:\.\d+)?)(%|px|in|cm|mm|em|rem|ex|pt|pc|vw|vh)?$")
        .expect("length pattern is valid")
});

/// One component of a background position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PositionComponent {
    /// Whole pixels (also unitless numbers and zero in any unit).
    Px(i64),
    /// A length or percentage that cannot be resolved to pixels, kept as written.
    Unresolved(String),
}

impl PositionComponent {
    /// Parses a keyword (`top`, `center`, ...) or a length token. Returns `None` for
    /// tokens that are not positions at all (repeat keywords, colors, ...).
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let percent = match token.to_ascii_lowercase().as_str() {
            "top" | "left" => Some("0%"),
            "center" | "middle" => Some("50%"),
            "bottom" | "right" => Some("100%"),
            _ => None,
        };
        let token = percent.unwrap_or(token);
        let caps = LENGTH_RE.captures(token)?;
        let number = &caps[1];
        let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        let value: f64 = number.parse().ok()?;
        if value == 0.0 {
            return Some(Self::Px(0));
        }
        if unit.is_empty() || unit == "px" {
            if let Ok(px) = number.parse::<i64>() {
                return Some(Self::Px(px));
            }
        }
        Some(Self::Unresolved(token.to_string()))
    }

    pub fn as_px(&self) -> Option<i64> {
        match self {
            Self::Px(v) => Some(*v),
            Self::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for PositionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(0) => f.write_str("0px"),
            Self::Px(v) => write!(f, "{v}px"),
            Self::Unresolved(s) => f.write_str(s),
        }
    }
}

/// Ordered position components; empty means "no explicit position", i.e. `0px 0px`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackgroundPosition(Vec<PositionComponent>);

impl BackgroundPosition {
    pub fn new(components: Vec<PositionComponent>) -> Self {
        Self(components)
    }

    pub fn from_pixels(x: i64, y: i64) -> Self {
        Self(vec![PositionComponent::Px(x), PositionComponent::Px(y)])
    }

    /// Extracts the position tokens of a `background`, `background-image` or
    /// `background-position` value.
    ///
    /// Tokens are only scanned when at least two remain after the `url(...)` token
    /// (the `url() repeat x y` shorthand), or when `asserted` is set because the
    /// property itself is a position.
    ///
    /// Function tokens (`rgb(0 0 0)`, `linear-gradient(...)`) count as one token each.
    /// Length functions such as `calc(...)` are kept unresolved; the rest are ignored.
    pub fn parse(value: &str, asserted: bool) -> Self {
        let without_url = URL_RE.replace_all(value, " ");
        let cleaned = without_url.replace(';', " ").replace("!important", " ");
        let tokens = value_tokens(&cleaned);
        if !asserted && tokens.len() < 2 {
            return Self::default();
        }
        Self(tokens.into_iter().filter_map(component).collect())
    }

    pub fn components(&self) -> &[PositionComponent] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolves the position to a pixel offset `(x, y)`.
    ///
    /// Defined for an empty position (`(0, 0)`) and for exactly two pixel components.
    pub fn pixel_offset(&self) -> Result<(i64, i64)> {
        match self.0.as_slice() {
            [] => Ok((0, 0)),
            [x, y] => match (x.as_px(), y.as_px()) {
                (Some(x), Some(y)) => Ok((x, y)),
                _ => Err(SpriteError::UnsupportedUnit(self.to_string())),
            },
            _ => Err(SpriteError::UnsupportedUnit(format!(
                "{} (expected two components)",
                self
            ))),
        }
    }

    /// Componentwise `self - other`, pixel positions only.
    pub fn subtract(&self, other: &BackgroundPosition) -> Result<BackgroundPosition> {
        let (ax, ay) = self.pixel_offset()?;
        let (bx, by) = other.pixel_offset()?;
        match (ax.checked_sub(bx), ay.checked_sub(by)) {
            (Some(x), Some(y)) => Ok(Self::from_pixels(x, y)),
            _ => Err(SpriteError::UnsupportedUnit(format!(
                "{self} minus {other} is out of range"
            ))),
        }
    }
}

/// Functions whose result is a length; they stay in the position unresolved.
const LENGTH_FUNCTIONS: [&str; 6] = ["calc", "var", "env", "min", "max", "clamp"];

fn component(token: &str) -> Option<PositionComponent> {
    match token.split_once('(') {
        Some((name, _)) => LENGTH_FUNCTIONS
            .contains(&name.to_ascii_lowercase().as_str())
            .then(|| PositionComponent::Unresolved(token.to_string())),
        None => PositionComponent::parse(token),
    }
}

/// Splits on whitespace outside parentheses.
fn value_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => {
                depth += 1;
                start.get_or_insert(i);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                start.get_or_insert(i);
            }
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&value[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

impl fmt::Display for BackgroundPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
