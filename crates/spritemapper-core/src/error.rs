use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// The declaration does not reference a local image through `url(...)`.
    #[error("No sprite found in declaration: {0}")]
    NoSpriteFound(String),
    /// Position arithmetic was requested on a non-pixel position.
    #[error("Unsupported background position unit: {0}")]
    UnsupportedUnit(String),
    /// A sprite of a packed spritemap has no placement. Fatal for the pass.
    #[error("{}:{line}: no placement for sprite {} in a packed spritemap", source_css.display(), path.display())]
    PlacementNotFound {
        source_css: PathBuf,
        line: usize,
        path: PathBuf,
    },
    #[error("Unreadable sprite {}: {reason}", path.display())]
    UnreadableSprite { path: PathBuf, reason: String },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Nothing to pack")]
    Empty,
}

pub type Result<T> = std::result::Result<T, SpriteError>;
