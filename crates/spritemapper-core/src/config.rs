use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// How sprite references are grouped into spritemaps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MappingMode {
    /// One spritemap per sprite directory: `img/icons/a.png` -> `img/icons.png`.
    Directory,
    /// Every sprite goes into `output_image`.
    Fixed,
}

impl FromStr for MappingMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "directory" | "dir" => Ok(Self::Directory),
            "fixed" | "single" => Ok(Self::Fixed),
            _ => Err(()),
        }
    }
}

/// Skyline placement heuristics used while annealing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkylineHeuristic {
    BottomLeft,
    MinWaste,
}

impl FromStr for SkylineHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "minwaste" | "mw" => Ok(Self::MinWaste),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpritemapConfig {
    /// Pixels kept between neighbouring sprites, per axis.
    #[serde(default = "default_padding")]
    pub padding: (u32, u32),
    /// Annealing step budget per spritemap. 0 keeps the shelf baseline.
    #[serde(default = "default_anneal_steps")]
    pub anneal_steps: u64,
    /// Seed of the annealing RNG; equal seeds give equal layouts.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_skyline_heuristic")]
    pub skyline_heuristic: SkylineHeuristic,

    #[serde(default = "default_mapping")]
    pub mapping: MappingMode,
    /// Spritemap image for `MappingMode::Fixed`.
    #[serde(default)]
    pub output_image: Option<PathBuf>,
    /// Root for `/`-absolute sprite URLs. None => the stylesheet's directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// When set, spritemap URLs are `<base_url>/<file name>` instead of relative paths.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Rewritten stylesheets are written as `<stem><css_suffix>.css`.
    #[serde(default = "default_css_suffix")]
    pub css_suffix: String,
    /// Directory for rewritten stylesheets. None => next to the source.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Pack independent spritemaps in parallel when feature "parallel" is on.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for SpritemapConfig {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            anneal_steps: default_anneal_steps(),
            seed: default_seed(),
            skyline_heuristic: default_skyline_heuristic(),
            mapping: default_mapping(),
            output_image: None,
            root: None,
            base_url: None,
            css_suffix: default_css_suffix(),
            output_dir: None,
            parallel: false,
        }
    }
}

impl SpritemapConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Fixed mapping is selected without an output image
    /// - Rewritten stylesheets would overwrite their sources
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpriteError;

        if self.mapping == MappingMode::Fixed && self.output_image.is_none() {
            return Err(SpriteError::InvalidConfig(
                "mapping = fixed requires output_image".into(),
            ));
        }
        if self.css_suffix.is_empty() && self.output_dir.is_none() {
            return Err(SpriteError::InvalidConfig(
                "empty css_suffix without output_dir would overwrite the input stylesheets".into(),
            ));
        }
        if self.css_suffix.contains(['/', '\\']) {
            return Err(SpriteError::InvalidConfig(format!(
                "css_suffix must not contain path separators: {:?}",
                self.css_suffix
            )));
        }
        Ok(())
    }
}

fn default_padding() -> (u32, u32) {
    (1, 1)
}
fn default_anneal_steps() -> u64 {
    9200
}
fn default_seed() -> u64 {
    0x5eed
}
fn default_skyline_heuristic() -> SkylineHeuristic {
    SkylineHeuristic::BottomLeft
}
fn default_mapping() -> MappingMode {
    MappingMode::Directory
}
fn default_css_suffix() -> String {
    "-sprite".into()
}

/// Builder for `SpritemapConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct SpritemapConfigBuilder {
    cfg: SpritemapConfig,
}

impl SpritemapConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: SpritemapConfig::default(),
        }
    }
    pub fn padding(mut self, x: u32, y: u32) -> Self {
        self.cfg.padding = (x, y);
        self
    }
    pub fn anneal_steps(mut self, v: u64) -> Self {
        self.cfg.anneal_steps = v;
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.cfg.seed = v;
        self
    }
    pub fn skyline_heuristic(mut self, v: SkylineHeuristic) -> Self {
        self.cfg.skyline_heuristic = v;
        self
    }
    pub fn mapping(mut self, v: MappingMode) -> Self {
        self.cfg.mapping = v;
        self
    }
    /// Sets the output image and switches to fixed mapping.
    pub fn output_image(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.output_image = Some(v.into());
        self.cfg.mapping = MappingMode::Fixed;
        self
    }
    pub fn root(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.root = Some(v.into());
        self
    }
    pub fn base_url(mut self, v: impl Into<String>) -> Self {
        self.cfg.base_url = Some(v.into());
        self
    }
    pub fn css_suffix(mut self, v: impl Into<String>) -> Self {
        self.cfg.css_suffix = v.into();
        self
    }
    pub fn output_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.output_dir = Some(v.into());
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> SpritemapConfig {
        self.cfg
    }
}

impl SpritemapConfig {
    /// Create a fluent builder for `SpritemapConfig`.
    pub fn builder() -> SpritemapConfigBuilder {
        SpritemapConfigBuilder::new()
    }
}
