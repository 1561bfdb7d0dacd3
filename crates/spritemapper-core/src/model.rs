use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        self.x < r.x + r.w && r.x < self.x + self.w && self.y < r.y + r.h && r.y < self.y + self.h
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
}

/// Packing input: one distinct sprite of a spritemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRect<K = String> {
    pub key: K,
    pub w: u32,
    pub h: u32,
}

impl<K> SpriteRect<K> {
    pub fn new(key: K, w: u32, h: u32) -> Self {
        Self { key, w, h }
    }
}

/// Packing output: where a sprite landed inside the spritemap canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement<K = String> {
    pub key: K,
    /// Sprite rectangle within the canvas (padding excluded).
    pub frame: Rect,
}

impl<K> Placement<K> {
    /// Top-left pixel offset of the sprite.
    pub fn position(&self) -> (u32, u32) {
        (self.frame.x, self.frame.y)
    }

    /// Sprite rectangle grown by the trailing padding reserved after it.
    pub fn padded(&self, padding: (u32, u32)) -> Rect {
        Rect::new(
            self.frame.x,
            self.frame.y,
            self.frame.w + padding.0,
            self.frame.h + padding.1,
        )
    }
}

/// A packed canvas: placements plus the tight canvas size around them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedLayout<K = String> {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement<K>>,
    pub stats: PackStats,
}

impl<K> PackedLayout<K> {
    pub fn area(&self) -> u64 {
        (self.width as u64) * (self.height as u64)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

impl<K: PartialEq> PackedLayout<K> {
    pub fn get(&self, key: &K) -> Option<&Placement<K>> {
        self.placements.iter().find(|p| &p.key == key)
    }
}

/// A packed spritemap: the output image and where each sprite file landed in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedSpriteMap {
    pub image: PathBuf,
    pub layout: PackedLayout<PathBuf>,
}

/// Statistics about one packing run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PackStats {
    /// Number of sprites placed.
    pub num_sprites: usize,
    /// Sum of sprite areas (padding excluded).
    pub sprite_area: u64,
    /// Area of the final canvas.
    pub canvas_area: u64,
    /// Occupancy ratio: sprite_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
    /// Annealing steps run.
    pub steps: u64,
    /// Candidates accepted as the new current state.
    pub accepted: u64,
    /// Candidates that improved on the best state seen so far.
    pub improved: u64,
}

impl PackStats {
    pub(crate) fn measure<K>(placements: &[Placement<K>], width: u32, height: u32) -> Self {
        let sprite_area: u64 = placements.iter().map(|p| p.frame.area()).sum();
        let canvas_area = (width as u64) * (height as u64);
        let occupancy = if canvas_area > 0 {
            sprite_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        Self {
            num_sprites: placements.len(),
            sprite_area,
            canvas_area,
            occupancy,
            ..Default::default()
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Sprites: {}, Occupancy: {:.2}%, Canvas Area: {} px², Sprite Area: {} px², Steps: {}, Accepted: {}, Improved: {}",
            self.num_sprites,
            self.occupancy * 100.0,
            self.canvas_area,
            self.sprite_area,
            self.steps,
            self.accepted,
            self.improved,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.sprite_area)
    }
}
