use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use spritemapper_core::config::{MappingMode, SkylineHeuristic};
use spritemapper_core::images::FsImages;
use spritemapper_core::{
    PackedSpriteMap, Processed, SpritemapConfig, Stylesheet, process, to_json, write_spritemap,
    write_stylesheet,
};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "spritemapper",
    about = "Combine CSS background images into spritemaps and rewrite the stylesheets",
    version,
    author
)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
}

#[derive(Parser, Debug, Clone)]
struct RunArgs {
    // Input/Output
    /// Stylesheets or directories to scan for *.css
    #[arg(required = true, help_heading = "Input/Output")]
    inputs: Vec<PathBuf>,
    /// YAML config file path (CLI flags override it)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Put every sprite into this image (fixed mapping)
    #[arg(long, help_heading = "Input/Output")]
    output_image: Option<PathBuf>,
    /// Directory for rewritten stylesheets (default: next to the source)
    #[arg(long, help_heading = "Input/Output")]
    output_dir: Option<PathBuf>,
    /// Suffix of rewritten stylesheets: site.css -> site<suffix>.css
    #[arg(long, help_heading = "Input/Output")]
    css_suffix: Option<String>,
    /// Root directory for /-absolute sprite URLs
    #[arg(long, help_heading = "Input/Output")]
    root: Option<PathBuf>,
    /// Emit spritemap URLs as <base-url>/<file name>
    #[arg(long, help_heading = "Input/Output")]
    base_url: Option<String>,

    // Packing
    /// Padding between sprites: N or X,Y
    #[arg(long, value_parser = parse_padding, help_heading = "Packing")]
    padding: Option<(u32, u32)>,
    /// Annealing steps per spritemap (0 = shelf baseline only)
    #[arg(long, help_heading = "Packing")]
    anneal_steps: Option<u64>,
    /// Annealing RNG seed
    #[arg(long, help_heading = "Packing")]
    seed: Option<u64>,
    /// Skyline heuristic used while annealing: bl|minwaste
    #[arg(long, help_heading = "Packing")]
    skyline: Option<String>,
    /// Pack spritemaps in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Packing")]
    parallel: bool,

    // Export
    /// Export the packed layout (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_layout: Option<PathBuf>,
    /// Print the merged configuration (after YAML/CLI) and exit: json|yaml
    #[arg(long, num_args = 0..=1, default_missing_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config: Option<String>,
    /// Dry run: pack and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    run(&cli.args, cli.progress && !cli.quiet)
}

fn run(cli: &RunArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(cli)?;

    if let Some(format) = &cli.print_config {
        match format.as_str() {
            "yaml" => print!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }
    cfg.validate().context("invalid configuration")?;

    let mut css_files = Vec::new();
    for input in &cli.inputs {
        css_files.extend(gather_paths(input, &cli.include, &cli.exclude, &cfg.css_suffix)?);
    }
    css_files.sort();
    css_files.dedup();
    if css_files.is_empty() {
        anyhow::bail!("no stylesheets found");
    }
    info!(count = css_files.len(), "stylesheets found");

    let sheets = read_stylesheets_with_progress(&css_files, &cfg, show_progress)?;
    let processed = process(sheets, &cfg, &FsImages)?;

    for map in &processed.spritemaps {
        print_packed_size(map);
    }
    for s in &processed.skipped {
        warn!(sprite = %s.path.display(), reason = %s.reason, "sprite left out");
    }

    if let Some(path) = &cli.export_layout {
        let value = to_json(&processed.spritemaps, &cfg);
        if cli.dry_run {
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            fs::write(path, serde_json::to_string_pretty(&value)?)
                .with_context(|| format!("write {}", path.display()))?;
            info!(?path, "layout exported");
        }
    }

    if cli.dry_run {
        println!(
            "dry run: {} spritemaps, {} rewrites in {} stylesheets",
            processed.spritemaps.len(),
            processed.rewrites(),
            processed.stylesheets.len()
        );
        return Ok(());
    }
    write_with_progress(&processed, show_progress)?;
    info!(
        spritemaps = processed.spritemaps.len(),
        rewrites = processed.rewrites(),
        skipped = processed.skipped.len(),
        "done"
    );
    Ok(())
}

/// Defaults, then the YAML file, then CLI flags.
fn build_config(cli: &RunArgs) -> anyhow::Result<SpritemapConfig> {
    let mut cfg = SpritemapConfig::default();
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_spritemap_config(cfg)?;
    }
    if let Some(v) = cli.padding {
        cfg.padding = v;
    }
    if let Some(v) = cli.anneal_steps {
        cfg.anneal_steps = v;
    }
    if let Some(v) = cli.seed {
        cfg.seed = v;
    }
    if let Some(v) = &cli.skyline {
        cfg.skyline_heuristic = parse_skyline(v)?;
    }
    if let Some(v) = &cli.output_image {
        cfg.output_image = Some(v.clone());
        cfg.mapping = MappingMode::Fixed;
    }
    if let Some(v) = &cli.output_dir {
        cfg.output_dir = Some(v.clone());
    }
    if let Some(v) = &cli.css_suffix {
        cfg.css_suffix = v.clone();
    }
    if let Some(v) = &cli.root {
        cfg.root = Some(v.clone());
    }
    if let Some(v) = &cli.base_url {
        cfg.base_url = Some(v.clone());
    }
    if cli.parallel {
        cfg.parallel = true;
    }
    Ok(cfg)
}

fn parse_padding(s: &str) -> Result<(u32, u32), String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid padding {:?}: {}", s, e))
    };
    match s.split_once(',') {
        Some((x, y)) => Ok((parse(x)?, parse(y)?)),
        None => {
            let v = parse(s)?;
            Ok((v, v))
        }
    }
}

fn parse_skyline(s: &str) -> anyhow::Result<SkylineHeuristic> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown skyline heuristic: {}", s))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
    css_suffix: &str,
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let wanted = |p: &Path| {
        is_css(p)
            && !is_rewritten_output(p, css_suffix)
            && !should_skip(p, inc_set.as_ref(), exc_set.as_ref())
    };
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if wanted(path) {
            list.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && wanted(p) {
                list.push(p.to_path_buf());
            }
        }
    } else {
        anyhow::bail!("input not found: {}", path.display());
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("invalid glob {:?}", pat))?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_css(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if ext == "css"
    )
}

/// Output of an earlier run (`site-sprite.css` for suffix `-sprite`).
fn is_rewritten_output(p: &Path, css_suffix: &str) -> bool {
    !css_suffix.is_empty()
        && p.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.ends_with(css_suffix))
}

fn progress_bar(len: usize, verb: &str, show: bool) -> anyhow::Result<Option<ProgressBar>> {
    if !show {
        return Ok(None);
    }
    let b = ProgressBar::new(len as u64);
    b.set_style(ProgressStyle::with_template(&format!(
        "{{spinner:.green}} {verb} {{pos}}/{{len}} [{{elapsed_precise}}] {{wide_msg}}"
    ))?);
    Ok(Some(b))
}

fn file_label(p: &Path) -> String {
    p.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}

fn read_stylesheets_with_progress(
    paths: &[PathBuf],
    cfg: &SpritemapConfig,
    progress: bool,
) -> anyhow::Result<Vec<Stylesheet>> {
    let bar = progress_bar(paths.len(), "reading", progress)?;
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        if let Some(b) = &bar {
            b.set_message(file_label(p));
        }
        match Stylesheet::read(p, cfg) {
            Ok(sheet) => list.push(sheet),
            Err(e) => error!(?p, error = %e, "skip stylesheet"),
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn write_with_progress(processed: &Processed, progress: bool) -> anyhow::Result<()> {
    let total = processed.spritemaps.len() + processed.stylesheets.len();
    let bar = progress_bar(total, "writing", progress)?;
    for map in &processed.spritemaps {
        if let Some(b) = &bar {
            b.set_message(file_label(&map.image));
        }
        write_spritemap(map, &FsImages)
            .with_context(|| format!("write spritemap {}", map.image.display()))?;
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    for (sheet, output, rewritten) in &processed.stylesheets {
        if let Some(b) = &bar {
            b.set_message(file_label(output));
        }
        write_stylesheet(output, rewritten)
            .with_context(|| format!("write {}", output.display()))?;
        info!(source = %sheet.path.display(), output = %output.display(), rewrites = rewritten.rewrites, "stylesheet written");
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(())
}

fn print_packed_size(map: &PackedSpriteMap) {
    let stats = &map.layout.stats;
    println!(
        "{}: {}x{} ({} sprites, occupancy {:.2}%, {} steps)",
        map.image.display(),
        map.layout.width,
        map.layout.height,
        stats.num_sprites,
        stats.occupancy * 100.0,
        stats.steps
    );
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    padding: Option<(u32, u32)>,
    anneal_steps: Option<u64>,
    seed: Option<u64>,
    skyline: Option<String>,
    mapping: Option<String>,
    output_image: Option<PathBuf>,
    root: Option<PathBuf>,
    base_url: Option<String>,
    css_suffix: Option<String>,
    output_dir: Option<PathBuf>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn into_spritemap_config(self, mut cfg: SpritemapConfig) -> anyhow::Result<SpritemapConfig> {
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = self.anneal_steps {
            cfg.anneal_steps = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
        if let Some(v) = self.skyline {
            cfg.skyline_heuristic = parse_skyline(&v)?;
        }
        if let Some(v) = self.output_image {
            cfg.output_image = Some(v);
            cfg.mapping = MappingMode::Fixed;
        }
        if let Some(v) = self.mapping {
            cfg.mapping = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown mapping mode: {}", v))?;
        }
        if let Some(v) = self.root {
            cfg.root = Some(v);
        }
        if let Some(v) = self.base_url {
            cfg.base_url = Some(v);
        }
        if let Some(v) = self.css_suffix {
            cfg.css_suffix = v;
        }
        if let Some(v) = self.output_dir {
            cfg.output_dir = Some(v);
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        Ok(cfg)
    }
}
