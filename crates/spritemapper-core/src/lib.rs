//! Core library for combining CSS background sprites into spritemaps.
//!
//! - Packing: simulated annealing over packing orders and bin widths, re-packed with a
//!   skyline packer; a shelf packing is the baseline
//! - Rewriting: background declarations are replaced by the spritemap URL and the
//!   offset `declared - placement`, with `background-position` longhands folded in
//! - Pipeline: `process` works on in-memory stylesheets and images, `run` reads and
//!   writes files
//!
//! Quick example:
//! ```ignore
//! use spritemapper_core::{SpritemapConfig, RunOptions, run};
//! # fn main() -> anyhow::Result<()> {
//! let cfg = SpritemapConfig::builder().output_image("img/sheet.png").build();
//! let report = run(&["site.css".into()], &cfg, &RunOptions::default())?;
//! println!("rewrites: {}", report.rewrites());
//! # Ok(()) }
//! ```

pub mod anneal;
pub mod config;
pub mod css;
pub mod error;
pub mod export;
pub mod group;
pub mod images;
pub mod mapper;
pub mod model;
pub mod packer;
pub mod paths;
pub mod pipeline;
pub mod position;
pub mod rewrite;
pub mod sprite;

pub use anneal::{acceptance_probability, pack_sprites, temperature};
pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `spritemapper_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{MappingMode, SkylineHeuristic, SpritemapConfig, SpritemapConfigBuilder};
    pub use crate::css::{CssEvent, Declaration, parse_stylesheet, print_css};
    pub use crate::images::{FsImages, MemoryImages, SpriteImages};
    pub use crate::mapper::{DirectoryMapper, FixedMapper, SpriteMapper};
    pub use crate::model::{PackStats, PackedLayout, PackedSpriteMap, Placement, Rect, SpriteRect};
    pub use crate::position::{BackgroundPosition, PositionComponent};
    pub use crate::rewrite::{PlacementIndex, SpriteReplacer, rewrite_declaration};
    pub use crate::sprite::SpriteRef;
    pub use crate::{Processed, RunOptions, RunReport, Stylesheet, pack_sprites, process, run};
}
