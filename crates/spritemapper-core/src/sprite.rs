use crate::css::{CssEvent, split_declaration};
use crate::error::{Result, SpriteError};
use crate::paths::UrlResolver;
use crate::position::BackgroundPosition;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub(crate) static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:'([^']*)'|"([^"]*)"|([^)'"\s]*))\s*\)"#)
        .expect("url pattern is valid")
});

/// Properties whose value may name a sprite.
pub const BACKGROUND_PROPERTIES: [&str; 2] = ["background", "background-image"];

/// One background image reference found in a stylesheet.
///
/// `path` is the identity: references to the same file anywhere in any stylesheet
/// resolve to the same placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteRef {
    /// Normalized image path.
    pub path: PathBuf,
    /// Stylesheet the reference came from.
    pub source: PathBuf,
    /// Position as authored; empty means `0px 0px`.
    pub declared_position: BackgroundPosition,
}

impl SpriteRef {
    pub fn new(
        path: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
        declared_position: BackgroundPosition,
    ) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            declared_position,
        }
    }

    /// Same reference with another declared position.
    pub fn with_position(&self, declared_position: BackgroundPosition) -> Self {
        Self {
            declared_position,
            ..self.clone()
        }
    }
}

impl fmt::Display for SpriteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// The raw `url(...)` argument of a background value, quotes removed.
pub fn background_url(value: &str) -> Result<&str> {
    let caps = URL_RE
        .captures(value)
        .ok_or_else(|| SpriteError::NoSpriteFound(value.to_string()))?;
    let url = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().trim())
        .unwrap_or("");
    if url.is_empty() {
        return Err(SpriteError::NoSpriteFound(value.to_string()));
    }
    Ok(url)
}

/// Builds a [`SpriteRef`] from a `background`/`background-image` declaration.
///
/// Fails with `NoSpriteFound` for other properties, values without `url(...)` and
/// URLs that do not name a local file.
pub fn extract(declaration: &str, source: &Path, resolver: &UrlResolver) -> Result<SpriteRef> {
    let (prop, value) = split_declaration(declaration)
        .ok_or_else(|| SpriteError::NoSpriteFound(declaration.to_string()))?;
    if !BACKGROUND_PROPERTIES.contains(&prop.as_str()) {
        return Err(SpriteError::NoSpriteFound(declaration.to_string()));
    }
    let url = background_url(value)?;
    let path = resolver
        .resolve(url)
        .ok_or_else(|| SpriteError::NoSpriteFound(declaration.to_string()))?;
    Ok(SpriteRef::new(
        path,
        source,
        BackgroundPosition::parse(value, false),
    ))
}

/// Every sprite reference of a stylesheet's events, in document order.
pub fn find_sprite_refs(
    events: &[CssEvent],
    source: &Path,
    resolver: &UrlResolver,
) -> Vec<SpriteRef> {
    events
        .iter()
        .filter_map(|ev| match ev {
            CssEvent::Declaration(d) => extract(&d.text, source, resolver).ok(),
            _ => None,
        })
        .collect()
}
