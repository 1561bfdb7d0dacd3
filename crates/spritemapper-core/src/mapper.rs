//! Grouping of sprite references into spritemaps.

use crate::config::{MappingMode, SpritemapConfig};
use crate::error::{Result, SpriteError};
use crate::images::SpriteImages;
use crate::sprite::SpriteRef;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Decides which spritemap image a sprite goes into.
pub trait SpriteMapper: Send + Sync {
    fn classify(&self, sprite: &SpriteRef) -> PathBuf;

    /// Whether `path` is an image this mapper writes. Stylesheets that were already
    /// rewritten reference such images; they are never packed again.
    fn is_spritemap(&self, path: &Path, images: &dyn SpriteImages) -> bool;
}

/// One spritemap per sprite directory: `img/icons/a.png` -> `img/icons.png`.
/// Sprites without a parent directory go into `sprites.png`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryMapper;

impl SpriteMapper for DirectoryMapper {
    fn classify(&self, sprite: &SpriteRef) -> PathBuf {
        match sprite.path.parent() {
            Some(dir) if dir.file_name().is_some() => {
                let mut name: OsString = dir.as_os_str().to_owned();
                name.push(".png");
                PathBuf::from(name)
            }
            Some(dir) => dir.join("sprites.png"),
            None => PathBuf::from("sprites.png"),
        }
    }

    /// `<dir>.png` next to a sprite directory `<dir>/`, or a top-level `sprites.png`.
    fn is_spritemap(&self, path: &Path, images: &dyn SpriteImages) -> bool {
        if !path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("png"))
        {
            return false;
        }
        let fallback = path.file_name().is_some_and(|n| n == "sprites.png")
            && path.parent().is_none_or(|d| d.file_name().is_none());
        fallback || images.is_dir(&path.with_extension(""))
    }
}

/// Every sprite goes into one configured image.
#[derive(Debug, Clone)]
pub struct FixedMapper {
    output: PathBuf,
}

impl FixedMapper {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl SpriteMapper for FixedMapper {
    fn classify(&self, _sprite: &SpriteRef) -> PathBuf {
        self.output.clone()
    }

    fn is_spritemap(&self, path: &Path, _images: &dyn SpriteImages) -> bool {
        path == self.output
    }
}

/// The mapper selected by `cfg.mapping`.
pub fn mapper_for(cfg: &SpritemapConfig) -> Result<Box<dyn SpriteMapper>> {
    match cfg.mapping {
        MappingMode::Directory => Ok(Box::new(DirectoryMapper)),
        MappingMode::Fixed => {
            let output = cfg.output_image.as_ref().ok_or_else(|| {
                SpriteError::InvalidConfig("mapping = fixed requires output_image".into())
            })?;
            Ok(Box::new(FixedMapper::new(output)))
        }
    }
}

/// An output canvas and the unique sprite paths it holds, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteMap {
    pub path: PathBuf,
    pub members: Vec<PathBuf>,
}

impl SpriteMap {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Maps with a single member are never packed.
    pub fn is_packable(&self) -> bool {
        self.members.len() >= 2
    }
}

/// Collects the unique sprites of every spritemap over one pass.
#[derive(Debug, Default)]
pub struct SpriteMapCollector {
    maps: Vec<SpriteMap>,
    index: HashMap<PathBuf, usize>,
    seen: HashSet<(usize, PathBuf)>,
}

impl SpriteMapCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `sprite` in the map `mapper` assigns it to. Returns false when the
    /// map already holds that path.
    pub fn add(&mut self, mapper: &dyn SpriteMapper, sprite: &SpriteRef) -> bool {
        self.insert(&mapper.classify(sprite), &sprite.path)
    }

    pub fn insert(&mut self, map: &Path, sprite: &Path) -> bool {
        let idx = match self.index.get(map) {
            Some(&i) => i,
            None => {
                self.maps.push(SpriteMap {
                    path: map.to_path_buf(),
                    members: Vec::new(),
                });
                self.index.insert(map.to_path_buf(), self.maps.len() - 1);
                self.maps.len() - 1
            }
        };
        if !self.seen.insert((idx, sprite.to_path_buf())) {
            return false;
        }
        self.maps[idx].members.push(sprite.to_path_buf());
        true
    }

    pub fn maps(&self) -> &[SpriteMap] {
        &self.maps
    }

    pub fn into_maps(self) -> Vec<SpriteMap> {
        self.maps
    }
}
