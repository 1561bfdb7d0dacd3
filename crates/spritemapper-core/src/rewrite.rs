//! Coordinate rewriting.
//!
//! A sprite drawn at `declared` inside its own image moves to `placement` inside the
//! spritemap, so the background has to be shifted by `declared - placement` on each
//! axis. That is the only sign convention used anywhere in the crate.

use crate::css::{CssEvent, Declaration};
use crate::error::{Result, SpriteError};
use crate::group::{ActiveBackground, DeclarationGroup, MergeOutcome};
use crate::mapper::SpriteMapper;
use crate::model::{PackedSpriteMap, Placement};
use crate::paths::{UrlResolver, spritemap_url};
use crate::position::BackgroundPosition;
use crate::sprite::{self, BACKGROUND_PROPERTIES, SpriteRef};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Replacement text for a sprite's background declaration.
///
/// Fails with `UnsupportedUnit` when the declared position is not a pixel pair.
pub fn rewrite_declaration<K>(
    sprite: &SpriteRef,
    placement: &Placement<K>,
    spritemap_url: &str,
) -> Result<String> {
    let (px, py) = placement.position();
    let offset = sprite
        .declared_position
        .subtract(&BackgroundPosition::from_pixels(px as i64, py as i64))?;
    Ok(format!(
        "background: url('{}') no-repeat {}",
        spritemap_url.replace('\\', "/"),
        offset
    ))
}

/// Placements of every packed spritemap of a pass, keyed by spritemap and sprite path.
#[derive(Debug, Clone, Default)]
pub struct PlacementIndex {
    maps: HashMap<PathBuf, HashMap<PathBuf, Placement<PathBuf>>>,
    skipped: HashSet<PathBuf>,
}

/// What the index knows about a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The spritemap was not packed (fewer than two sprites).
    Dropped,
    /// Left out of packing: the file could not be read, or it is a spritemap itself.
    Skipped,
    Placed(&'a Placement<PathBuf>),
    /// The spritemap was packed without this sprite.
    Missing,
}

impl PlacementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spritemaps<'a>(maps: impl IntoIterator<Item = &'a PackedSpriteMap>) -> Self {
        let mut index = Self::new();
        for m in maps {
            index.insert(m);
        }
        index
    }

    pub fn insert(&mut self, map: &PackedSpriteMap) {
        let placements = map
            .layout
            .placements
            .iter()
            .map(|p| (p.key.clone(), p.clone()))
            .collect();
        self.maps.insert(map.image.clone(), placements);
    }

    pub fn skip(&mut self, sprite: impl Into<PathBuf>) {
        self.skipped.insert(sprite.into());
    }

    pub fn lookup(&self, spritemap: &Path, sprite: &Path) -> Lookup<'_> {
        if self.skipped.contains(sprite) {
            return Lookup::Skipped;
        }
        match self.maps.get(spritemap) {
            None => Lookup::Dropped,
            Some(placements) => placements
                .get(sprite)
                .map(Lookup::Placed)
                .unwrap_or(Lookup::Missing),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

/// Result of rewriting one stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenSheet {
    pub events: Vec<CssEvent>,
    /// Number of background declarations replaced.
    pub rewrites: usize,
}

/// Replays a stylesheet's events, replacing sprite backgrounds whose spritemap was
/// packed.
pub struct SpriteReplacer<'a> {
    index: &'a PlacementIndex,
    mapper: &'a dyn SpriteMapper,
    resolver: UrlResolver,
    source: PathBuf,
    css_out_dir: PathBuf,
    base_url: Option<String>,
    group: DeclarationGroup,
    out: Vec<CssEvent>,
    rewrites: usize,
}

impl<'a> SpriteReplacer<'a> {
    /// `css_out_dir` is where the rewritten stylesheet will live; spritemap URLs are
    /// made relative to it unless `base_url` is given.
    pub fn new(
        index: &'a PlacementIndex,
        mapper: &'a dyn SpriteMapper,
        source: &Path,
        resolver: UrlResolver,
        css_out_dir: &Path,
        base_url: Option<&str>,
    ) -> Self {
        Self {
            index,
            mapper,
            resolver,
            source: source.to_path_buf(),
            css_out_dir: css_out_dir.to_path_buf(),
            base_url: base_url.map(str::to_string),
            group: DeclarationGroup::new(),
            out: Vec::new(),
            rewrites: 0,
        }
    }

    pub fn feed(&mut self, event: CssEvent) -> Result<()> {
        match event {
            CssEvent::Declaration(decl) => self.declaration(decl),
            CssEvent::BlockEnd => {
                if let Some(active) = self.group.close() {
                    self.resolve(active)?;
                }
                self.out.push(CssEvent::BlockEnd);
                Ok(())
            }
            other => {
                self.emit(other);
                Ok(())
            }
        }
    }

    /// Flushes a background left open by an unterminated block.
    pub fn finish(mut self) -> Result<RewrittenSheet> {
        if let Some(active) = self.group.close() {
            self.resolve(active)?;
        }
        Ok(RewrittenSheet {
            events: self.out,
            rewrites: self.rewrites,
        })
    }

    fn declaration(&mut self, decl: Declaration) -> Result<()> {
        let property = decl.property().unwrap_or_default();
        if BACKGROUND_PROPERTIES.contains(&property.as_str()) {
            if let Ok(sprite) = sprite::extract(&decl.text, &self.source, &self.resolver) {
                if let Some(previous) = self.group.open(decl, sprite) {
                    self.resolve(previous)?;
                }
                return Ok(());
            }
        } else if property == "background-position" {
            let line = decl.line;
            match self.group.merge_position(decl) {
                MergeOutcome::Merged => {}
                MergeOutcome::Unsupported(reason) => warn!(
                    source = %self.source.display(),
                    line,
                    %reason,
                    "background-position not merged; leaving the sprite as is"
                ),
                MergeOutcome::PassThrough(d) => self.out.push(CssEvent::Declaration(d)),
            }
            return Ok(());
        }
        self.emit(CssEvent::Declaration(decl));
        Ok(())
    }

    fn emit(&mut self, event: CssEvent) {
        if let Some(event) = self.group.defer(event) {
            self.out.push(event);
        }
    }

    fn resolve(&mut self, active: ActiveBackground) -> Result<()> {
        let index = self.index;
        let spritemap = self.mapper.classify(&active.sprite);
        let placement = match index.lookup(&spritemap, &active.sprite.path) {
            Lookup::Dropped | Lookup::Skipped => {
                self.out.extend(active.into_events(None));
                return Ok(());
            }
            Lookup::Missing => {
                return Err(SpriteError::PlacementNotFound {
                    source_css: self.source.clone(),
                    line: active.declaration.line,
                    path: active.sprite.path.clone(),
                });
            }
            Lookup::Placed(p) => p,
        };
        if active.unsupported.is_some() {
            self.out.extend(active.into_events(None));
            return Ok(());
        }
        let url = spritemap_url(&spritemap, &self.css_out_dir, self.base_url.as_deref());
        match rewrite_declaration(&active.sprite, placement, &url) {
            Ok(mut text) => {
                if active.declaration.is_important() {
                    text.push_str(" !important");
                }
                debug!(
                    source = %self.source.display(),
                    line = active.declaration.line,
                    sprite = %active.sprite,
                    x = placement.frame.x,
                    y = placement.frame.y,
                    "rewrote background"
                );
                self.rewrites += 1;
                self.out.extend(active.into_events(Some(text)));
            }
            Err(SpriteError::UnsupportedUnit(unit)) => {
                warn!(
                    source = %self.source.display(),
                    line = active.declaration.line,
                    sprite = %active.sprite,
                    %unit,
                    "unsupported background position; leaving the sprite as is"
                );
                self.out.extend(active.into_events(None));
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

/// Rewrites one stylesheet's events in a single pass.
pub fn rewrite_stylesheet(
    events: Vec<CssEvent>,
    mut replacer: SpriteReplacer<'_>,
) -> Result<RewrittenSheet> {
    for event in events {
        replacer.feed(event)?;
    }
    replacer.finish()
}
