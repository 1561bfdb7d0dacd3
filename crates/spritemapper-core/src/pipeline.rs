use crate::anneal::pack_sprites;
use crate::config::SpritemapConfig;
use crate::css::{CssEvent, Directives, parse_stylesheet, print_css};
use crate::error::{Result, SpriteError};
use crate::images::{FsImages, SpriteImages, compose, save_png};
use crate::mapper::{SpriteMap, SpriteMapCollector, mapper_for};
use crate::model::{PackedSpriteMap, SpriteRect};
use crate::paths::UrlResolver;
use crate::rewrite::{PlacementIndex, RewrittenSheet, SpriteReplacer, rewrite_stylesheet};
use crate::sprite::find_sprite_refs;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A parsed stylesheet and the configuration that applies to it.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub path: PathBuf,
    pub events: Vec<CssEvent>,
    /// Global configuration with the stylesheet's directive comments applied.
    pub config: SpritemapConfig,
}

impl Stylesheet {
    pub fn parse(path: impl Into<PathBuf>, text: &str, base: &SpritemapConfig) -> Self {
        let path = path.into();
        let events = parse_stylesheet(text);
        let directives = Directives::from_events(&events);
        let config = if directives.is_empty() {
            base.clone()
        } else {
            directives.apply_to(base, &css_dir(&path))
        };
        Self {
            path,
            events,
            config,
        }
    }

    pub fn read(path: &Path, base: &SpritemapConfig) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, &text, base))
    }

    pub fn resolver(&self) -> UrlResolver {
        UrlResolver::for_stylesheet(&self.path, self.config.root.as_deref())
    }

    /// Where the rewritten stylesheet goes.
    pub fn output_path(&self) -> PathBuf {
        output_css_path(&self.path, &self.config)
    }
}

fn css_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// `<stem><css_suffix>.css`, next to the source or inside `cfg.output_dir`.
pub fn output_css_path(source: &Path, cfg: &SpritemapConfig) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{}{}.css", stem, cfg.css_suffix);
    match &cfg.output_dir {
        Some(dir) => dir.join(name),
        None => css_dir(source).join(name),
    }
}

/// A sprite left out of packing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSprite {
    pub path: PathBuf,
    pub reason: String,
}

/// Spritemaps of a pass with the size of every sprite that can be packed.
#[derive(Debug, Clone, Default)]
pub struct SpritePlan {
    /// Maps with at least two readable sprites.
    pub packable: Vec<(PathBuf, Vec<SpriteRect<PathBuf>>)>,
    /// Maps left unpacked; their references pass through.
    pub dropped: Vec<SpriteMap>,
    pub skipped: Vec<SkippedSprite>,
}

/// Spritemaps of a pass, plus references to images written by an earlier pass.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub maps: Vec<SpriteMap>,
    /// Spritemap images referenced by the stylesheets. They pass through unchanged.
    pub spritemaps: Vec<PathBuf>,
}

/// Groups the sprites of all stylesheets into spritemaps, first-seen order.
///
/// A path that any stylesheet's mapper would write to is never a sprite, so a
/// rewritten stylesheet is left alone when it is processed again.
pub fn collect_spritemaps(sheets: &[Stylesheet], images: &dyn SpriteImages) -> Result<Collected> {
    let mut refs = Vec::with_capacity(sheets.len());
    let mut spritemaps: Vec<PathBuf> = Vec::new();
    for sheet in sheets {
        let mapper = mapper_for(&sheet.config)?;
        let sprites = find_sprite_refs(&sheet.events, &sheet.path, &sheet.resolver());
        for sprite in &sprites {
            if mapper.is_spritemap(&sprite.path, images) && !spritemaps.contains(&sprite.path) {
                debug!(spritemap = %sprite.path.display(), "reference to a spritemap left as is");
                spritemaps.push(sprite.path.clone());
            }
        }
        refs.push((mapper, sprites));
    }

    let mut collector = SpriteMapCollector::new();
    for (mapper, sprites) in &refs {
        for sprite in sprites.iter().filter(|s| !spritemaps.contains(&s.path)) {
            collector.add(mapper.as_ref(), sprite);
        }
    }
    Ok(Collected {
        maps: collector.into_maps(),
        spritemaps,
    })
}

/// Reads sprite sizes and decides which maps get packed. Unreadable sprites are
/// skipped and logged; maps that end up with fewer than two sprites are dropped.
pub fn plan_spritemaps(maps: Vec<SpriteMap>, images: &dyn SpriteImages) -> SpritePlan {
    let mut plan = SpritePlan::default();
    let mut checked: HashSet<PathBuf> = HashSet::new();
    for map in maps {
        if !map.is_packable() {
            plan.dropped.push(map);
            continue;
        }
        let mut rects = Vec::with_capacity(map.len());
        for member in &map.members {
            match images.dimensions(member) {
                Ok((w, h)) if w > 0 && h > 0 => rects.push(SpriteRect::new(member.clone(), w, h)),
                Ok((w, h)) => skip(&mut plan, &mut checked, member, format!("empty image ({w}x{h})")),
                Err(SpriteError::UnreadableSprite { reason, .. }) => {
                    skip(&mut plan, &mut checked, member, reason)
                }
                Err(e) => skip(&mut plan, &mut checked, member, e.to_string()),
            }
        }
        if rects.len() < 2 {
            plan.dropped.push(map);
        } else {
            plan.packable.push((map.path, rects));
        }
    }
    plan
}

fn skip(plan: &mut SpritePlan, checked: &mut HashSet<PathBuf>, path: &Path, reason: String) {
    if !checked.insert(path.to_path_buf()) {
        return;
    }
    error!(sprite = %path.display(), %reason, "skipping unreadable sprite");
    plan.skipped.push(SkippedSprite {
        path: path.to_path_buf(),
        reason,
    });
}

/// Packs every map of the plan. Maps are independent, so with the `parallel`
/// feature and `cfg.parallel` they are annealed on the rayon pool.
#[instrument(skip_all, fields(maps = plan.packable.len()))]
pub fn pack_spritemaps(plan: &SpritePlan, cfg: &SpritemapConfig) -> Result<Vec<PackedSpriteMap>> {
    let pack_one = |(image, rects): &(PathBuf, Vec<SpriteRect<PathBuf>>)| -> Result<PackedSpriteMap> {
        let layout = pack_sprites(rects, cfg)?;
        info!(
            spritemap = %image.display(),
            width = layout.width,
            height = layout.height,
            sprites = layout.placements.len(),
            "packed spritemap"
        );
        Ok(PackedSpriteMap {
            image: image.clone(),
            layout,
        })
    };

    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            return plan.packable.par_iter().map(pack_one).collect();
        }
    }
    plan.packable.iter().map(pack_one).collect()
}

/// In-memory result of a pass: nothing has been written yet.
#[derive(Debug, Clone)]
pub struct Processed {
    pub spritemaps: Vec<PackedSpriteMap>,
    pub skipped: Vec<SkippedSprite>,
    /// Rewritten stylesheets with their output paths, in input order.
    pub stylesheets: Vec<(Stylesheet, PathBuf, RewrittenSheet)>,
}

impl Processed {
    pub fn rewrites(&self) -> usize {
        self.stylesheets.iter().map(|(_, _, r)| r.rewrites).sum()
    }
}

/// Runs the whole pass over parsed stylesheets without touching the filesystem:
/// collect, plan, pack, rewrite.
#[instrument(skip_all, fields(stylesheets = sheets.len()))]
pub fn process(
    sheets: Vec<Stylesheet>,
    cfg: &SpritemapConfig,
    images: &dyn SpriteImages,
) -> Result<Processed> {
    cfg.validate()?;
    for sheet in &sheets {
        sheet.config.validate()?;
    }
    let collected = collect_spritemaps(&sheets, images)?;
    let plan = plan_spritemaps(collected.maps, images);
    let spritemaps = pack_spritemaps(&plan, cfg)?;

    let mut index = PlacementIndex::from_spritemaps(&spritemaps);
    for s in &plan.skipped {
        index.skip(&s.path);
    }
    for path in collected.spritemaps {
        index.skip(path);
    }

    let mut stylesheets = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let output = sheet.output_path();
        let mapper = mapper_for(&sheet.config)?;
        let replacer = SpriteReplacer::new(
            &index,
            mapper.as_ref(),
            &sheet.path,
            sheet.resolver(),
            &css_dir(&output),
            sheet.config.base_url.as_deref(),
        );
        let rewritten = rewrite_stylesheet(sheet.events.clone(), replacer)?;
        stylesheets.push((sheet, output, rewritten));
    }
    Ok(Processed {
        spritemaps,
        skipped: plan.skipped,
        stylesheets,
    })
}

/// Composes one spritemap from its sprite files and writes it as PNG.
pub fn write_spritemap(map: &PackedSpriteMap, images: &dyn SpriteImages) -> Result<()> {
    let canvas = compose(&map.layout, images)?;
    save_png(&canvas, &map.image)?;
    info!(
        spritemap = %map.image.display(),
        width = map.layout.width,
        height = map.layout.height,
        "wrote spritemap"
    );
    Ok(())
}

/// Writes a rewritten stylesheet, creating parent directories.
pub fn write_stylesheet(output: &Path, sheet: &RewrittenSheet) -> Result<()> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let mut buf = Vec::new();
    print_css(&sheet.events, &mut buf)?;
    std::fs::write(output, buf)?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Pack and rewrite in memory only.
    pub dry_run: bool,
}

/// A stylesheet handled by [`run`].
#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rewrites: usize,
}

/// Summary of a filesystem pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub spritemaps: Vec<PackedSpriteMap>,
    pub skipped: Vec<SkippedSprite>,
    pub stylesheets: Vec<SheetReport>,
}

impl RunReport {
    pub fn rewrites(&self) -> usize {
        self.stylesheets.iter().map(|s| s.rewrites).sum()
    }
}

/// Reads `css_files`, packs their sprites from disk, writes spritemaps and rewritten
/// stylesheets (unless `opts.dry_run`).
#[instrument(skip_all, fields(files = css_files.len()))]
pub fn run(css_files: &[PathBuf], cfg: &SpritemapConfig, opts: &RunOptions) -> Result<RunReport> {
    let sheets = css_files
        .iter()
        .map(|p| Stylesheet::read(p, cfg))
        .collect::<Result<Vec<_>>>()?;
    let processed = process(sheets, cfg, &FsImages)?;
    if !opts.dry_run {
        write_outputs(&processed, cfg, &FsImages)?;
    }
    Ok(report(processed))
}

/// Writes every spritemap and stylesheet of a processed pass.
pub fn write_outputs(
    processed: &Processed,
    cfg: &SpritemapConfig,
    images: &dyn SpriteImages,
) -> Result<()> {
    write_spritemaps(&processed.spritemaps, cfg, images)?;
    for (_, output, rewritten) in &processed.stylesheets {
        write_stylesheet(output, rewritten)?;
    }
    Ok(())
}

fn write_spritemaps(
    maps: &[PackedSpriteMap],
    cfg: &SpritemapConfig,
    images: &dyn SpriteImages,
) -> Result<()> {
    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            return maps.par_iter().try_for_each(|m| write_spritemap(m, images));
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = cfg;
    maps.iter().try_for_each(|m| write_spritemap(m, images))
}

/// Drops the rewritten events and keeps the summary.
pub fn report(processed: Processed) -> RunReport {
    RunReport {
        stylesheets: processed
            .stylesheets
            .iter()
            .map(|(sheet, output, r)| SheetReport {
                source: sheet.path.clone(),
                output: output.clone(),
                rewrites: r.rewrites,
            })
            .collect(),
        spritemaps: processed.spritemaps,
        skipped: processed.skipped,
    }
}
