//! Simulated-annealing bin packing.
//!
//! The search state is a packing order plus a bin width. A shelf packing of the
//! sorted sprites is the feasible baseline; every step perturbs the state, re-packs it
//! with the skyline packer and accepts or rejects the result by canvas area.
//!
//! The cooling schedule only depends on the step index while `step < budget`, so a run
//! with a larger budget replays a smaller run exactly before going further. Together
//! with best-seen tracking this makes the canvas area non-increasing in the budget.

use crate::config::{SkylineHeuristic, SpritemapConfig};
use crate::error::{Result, SpriteError};
use crate::model::{PackStats, PackedLayout, Placement, SpriteRect};
use crate::packer::shelf::ShelfPacker;
use crate::packer::skyline::SkylinePacker;
use crate::packer::{Packer, canvas_size};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

/// Temperature at step 0, as a relative area increase.
pub const INITIAL_TEMPERATURE: f64 = 0.05;
/// Geometric cooling factor applied per step.
pub const COOLING_RATE: f64 = 0.9995;

/// Temperature at `step` of a run with `budget` steps: geometric cooling, zero once
/// the budget is reached.
pub fn temperature(step: u64, budget: u64) -> f64 {
    if step >= budget {
        return 0.0;
    }
    INITIAL_TEMPERATURE * COOLING_RATE.powf(step as f64)
}

/// Probability of moving from a state of `current_area` to one of `candidate_area`.
pub fn acceptance_probability(current_area: u64, candidate_area: u64, temperature: f64) -> f64 {
    if candidate_area <= current_area {
        return 1.0;
    }
    if temperature <= 0.0 || current_area == 0 {
        return 0.0;
    }
    let increase = (candidate_area - current_area) as f64 / current_area as f64;
    (-increase / temperature).exp()
}

/// A perturbation of the search state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Exchange two positions of the packing order.
    Swap(usize, usize),
    /// Take the sprite at `from` out of the order and reinsert it at `to`.
    Shift { from: usize, to: usize },
    /// Pack into a bin of another width.
    Resize(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct State {
    order: Vec<usize>,
    bin_width: u32,
}

impl State {
    fn apply(&self, mv: Move) -> State {
        let mut next = self.clone();
        match mv {
            Move::Swap(a, b) => next.order.swap(a, b),
            Move::Shift { from, to } => {
                let item = next.order.remove(from);
                next.order.insert(to, item);
            }
            Move::Resize(w) => next.bin_width = w,
        }
        next
    }
}

/// Bounds of the bin width: the widest padded sprite and all sprites in one row.
#[derive(Debug, Clone, Copy)]
struct WidthRange {
    min: u32,
    max: u32,
}

fn propose(state: &State, widths: WidthRange, rng: &mut StdRng) -> Move {
    let n = state.order.len();
    let can_resize = widths.max > widths.min;
    let kind = match (n >= 2, can_resize) {
        (true, true) => rng.gen_range(0..3),
        (true, false) => rng.gen_range(0..2),
        (false, _) => 2,
    };
    match kind {
        0 => {
            let a = rng.gen_range(0..n);
            let b = (a + rng.gen_range(1..n)) % n;
            Move::Swap(a, b)
        }
        1 => {
            let from = rng.gen_range(0..n);
            let to = rng.gen_range(0..n);
            Move::Shift { from, to }
        }
        _ if !can_resize => Move::Resize(state.bin_width),
        _ => {
            let span = ((widths.max - widths.min) / 8).max(1);
            let delta = rng.gen_range(1..=span);
            let w = if rng.gen_bool(0.5) {
                state.bin_width.saturating_sub(delta).max(widths.min)
            } else {
                state.bin_width.saturating_add(delta).min(widths.max)
            };
            Move::Resize(w)
        }
    }
}

fn pack_order<P: Packer<usize>>(
    mut packer: P,
    rects: &[(u32, u32)],
    order: &[usize],
) -> Result<Vec<Placement<usize>>> {
    order
        .iter()
        .map(|&i| {
            let (w, h) = rects[i];
            packer.pack(i, w, h).ok_or_else(|| {
                SpriteError::InvalidInput(format!("sprite {}x{} wider than the bin", w, h))
            })
        })
        .collect()
}

struct Evaluated {
    placements: Vec<Placement<usize>>,
    width: u32,
    height: u32,
}

impl Evaluated {
    fn new(placements: Vec<Placement<usize>>) -> Self {
        let (width, height) = canvas_size(&placements);
        Self {
            placements,
            width,
            height,
        }
    }

    fn area(&self) -> u64 {
        (self.width as u64) * (self.height as u64)
    }
}

/// Packs one spritemap.
///
/// Runs exactly `cfg.anneal_steps` steps and returns the smallest canvas seen; with
/// zero steps the shelf baseline is returned. Sizes must be non-zero and keys unique.
#[instrument(skip_all, fields(sprites = rects.len(), steps = cfg.anneal_steps))]
pub fn pack_sprites<K: Clone + Ord>(
    rects: &[SpriteRect<K>],
    cfg: &SpritemapConfig,
) -> Result<PackedLayout<K>> {
    if rects.is_empty() {
        return Err(SpriteError::Empty);
    }
    if let Some(r) = rects.iter().find(|r| r.w == 0 || r.h == 0) {
        return Err(SpriteError::InvalidInput(format!(
            "zero-sized sprite ({}x{})",
            r.w, r.h
        )));
    }
    let (pad_x, pad_y) = cfg.padding;
    let sizes: Vec<(u32, u32)> = rects.iter().map(|r| (r.w, r.h)).collect();

    let widths = WidthRange {
        min: sizes.iter().map(|(w, _)| w + pad_x).max().unwrap_or(1),
        max: sizes.iter().map(|(w, _)| w + pad_x).sum(),
    };
    let padded_area: u64 = sizes
        .iter()
        .map(|(w, h)| ((w + pad_x) as u64) * ((h + pad_y) as u64))
        .sum();
    let square_side = (padded_area as f64).sqrt().ceil() as u32;

    let mut order: Vec<usize> = (0..rects.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&rects[a], &rects[b]);
        rb.h.cmp(&ra.h)
            .then_with(|| rb.w.cmp(&ra.w))
            .then_with(|| ra.key.cmp(&rb.key))
    });
    let mut current = State {
        order,
        bin_width: square_side.clamp(widths.min, widths.max),
    };

    let baseline = Evaluated::new(pack_order(
        ShelfPacker::new(current.bin_width, cfg.padding),
        &sizes,
        &current.order,
    )?);
    let mut current_area = baseline.area();
    let mut best = baseline;
    debug!(
        width = best.width,
        height = best.height,
        "baseline shelf packing"
    );

    let heuristic: SkylineHeuristic = cfg.skyline_heuristic.clone();
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut stats = PackStats::default();
    let budget = cfg.anneal_steps;
    for step in 0..budget {
        let mv = propose(&current, widths, &mut rng);
        let candidate = current.apply(mv);
        let evaluated = Evaluated::new(pack_order(
            SkylinePacker::new(candidate.bin_width, cfg.padding, heuristic.clone()),
            &sizes,
            &candidate.order,
        )?);
        let area = evaluated.area();
        let p = acceptance_probability(current_area, area, temperature(step, budget));
        let roll: f64 = rng.r#gen();
        if roll < p {
            current = candidate;
            current_area = area;
            stats.accepted += 1;
            if area < best.area() {
                best = evaluated;
                stats.improved += 1;
            }
        }
    }

    let placements: Vec<Placement<K>> = best
        .placements
        .into_iter()
        .map(|p| Placement {
            key: rects[p.key].key.clone(),
            frame: p.frame,
        })
        .collect();
    let stats = PackStats {
        steps: budget,
        accepted: stats.accepted,
        improved: stats.improved,
        ..PackStats::measure(&placements, best.width, best.height)
    };
    debug!(
        width = best.width,
        height = best.height,
        occupancy = stats.occupancy,
        "annealing finished"
    );
    Ok(PackedLayout {
        width: best.width,
        height: best.height,
        placements,
        stats,
    })
}
