//! Sprite image access and spritemap compositing.

use crate::error::{Result, SpriteError};
use crate::model::PackedLayout;
use image::{ImageFormat, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of sprite pixels. Dimensions are read separately so packing never has to
/// decode a whole image.
pub trait SpriteImages: Sync {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)>;
    fn load(&self, path: &Path) -> Result<RgbaImage>;
    /// Whether `path` is a directory of sprite sources.
    fn is_dir(&self, path: &Path) -> bool;
}

/// Reads sprites from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImages;

impl SpriteImages for FsImages {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        image::image_dimensions(path).map_err(|e| unreadable(path, e))
    }

    fn load(&self, path: &Path) -> Result<RgbaImage> {
        Ok(image::open(path).map_err(|e| unreadable(path, e))?.to_rgba8())
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

fn unreadable(path: &Path, e: impl std::fmt::Display) -> SpriteError {
    SpriteError::UnreadableSprite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Sprites held in memory, keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryImages {
    images: HashMap<PathBuf, RgbaImage>,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, image: RgbaImage) {
        self.images.insert(path.into(), image);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, image: RgbaImage) -> Self {
        self.insert(path, image);
        self
    }
}

impl SpriteImages for MemoryImages {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        self.images
            .get(path)
            .map(|img| img.dimensions())
            .ok_or_else(|| unreadable(path, "not loaded"))
    }

    fn load(&self, path: &Path) -> Result<RgbaImage> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| unreadable(path, "not loaded"))
    }

    fn is_dir(&self, path: &Path) -> bool {
        !path.as_os_str().is_empty()
            && self.images.keys().any(|k| k != path && k.starts_with(path))
    }
}

/// Copy `src` into `canvas` with its top-left corner at (dx, dy). Pixels falling
/// outside the canvas are dropped.
pub fn blit(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    for yy in 0..sh {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..sw {
            if dx + xx >= cw {
                break;
            }
            canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(xx, yy));
        }
    }
}

/// Draws every sprite of `layout` onto a transparent canvas.
pub fn compose(layout: &PackedLayout<PathBuf>, images: &dyn SpriteImages) -> Result<RgbaImage> {
    let mut canvas = RgbaImage::new(layout.width, layout.height);
    for p in &layout.placements {
        let src = images.load(&p.key)?;
        if src.dimensions() != (p.frame.w, p.frame.h) {
            return Err(SpriteError::InvalidInput(format!(
                "{} is {}x{}, packed as {}x{}",
                p.key.display(),
                src.width(),
                src.height(),
                p.frame.w,
                p.frame.h
            )));
        }
        blit(&src, &mut canvas, p.frame.x, p.frame.y);
    }
    debug!(
        width = layout.width,
        height = layout.height,
        sprites = layout.placements.len(),
        "composed spritemap"
    );
    Ok(canvas)
}

/// Writes a canvas as PNG, creating parent directories.
pub fn save_png(canvas: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    canvas.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
