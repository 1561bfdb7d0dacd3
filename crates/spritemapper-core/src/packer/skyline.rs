use super::{Packer, placement};
use crate::config::SkylineHeuristic;
use crate::model::{Placement, Rect};

/// Height of the bin; spritemaps grow downwards until the canvas is trimmed.
const BIN_HEIGHT: u32 = u32::MAX / 2;

#[derive(Clone, Copy, Debug)]
struct SkylineNode {
    x: u32,
    y: u32,
    w: u32,
}

impl SkylineNode {
    #[inline]
    fn left(&self) -> u32 {
        self.x
    }
    #[inline]
    fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
}

pub struct SkylinePacker {
    border: Rect,
    padding: (u32, u32),
    skylines: Vec<SkylineNode>,
    heuristic: SkylineHeuristic,
}

impl SkylinePacker {
    pub fn new(bin_width: u32, padding: (u32, u32), heuristic: SkylineHeuristic) -> Self {
        Self {
            border: Rect::new(0, 0, bin_width, BIN_HEIGHT),
            padding,
            skylines: vec![SkylineNode {
                x: 0,
                y: 0,
                w: bin_width,
            }],
            heuristic,
        }
    }

    fn can_put(&self, mut i: usize, w: u32, h: u32) -> Option<Rect> {
        let mut rect = Rect::new(self.skylines[i].x, 0, w, h);
        let mut width_left = rect.w;
        loop {
            rect.y = rect.y.max(self.skylines[i].y);
            if !self.border.contains(&rect) {
                return None;
            }
            if self.skylines[i].w >= width_left {
                return Some(rect);
            }
            width_left -= self.skylines[i].w;
            i += 1;
            if i >= self.skylines.len() {
                return None;
            }
        }
    }

    fn find_skyline(&self, w: u32, h: u32) -> Option<(usize, Rect)> {
        match self.heuristic {
            SkylineHeuristic::BottomLeft => self.find_bottom_left(w, h),
            SkylineHeuristic::MinWaste => self.find_min_waste(w, h),
        }
    }

    fn find_bottom_left(&self, w: u32, h: u32) -> Option<(usize, Rect)> {
        let mut best_bottom = u32::MAX;
        let mut best_width = u32::MAX;
        let mut best: Option<(usize, Rect)> = None;

        for i in 0..self.skylines.len() {
            if let Some(r) = self.can_put(i, w, h) {
                if r.bottom() < best_bottom
                    || (r.bottom() == best_bottom && self.skylines[i].w < best_width)
                {
                    best_bottom = r.bottom();
                    best_width = self.skylines[i].w;
                    best = Some((i, r));
                }
            }
        }
        best
    }

    fn wasted_area_for(&self, start: usize, r: &Rect) -> u64 {
        let mut area: u64 = 0;
        let mut width_left = r.w;
        let mut i = start;
        while width_left > 0 && i < self.skylines.len() {
            let seg = &self.skylines[i];
            let use_w = width_left.min(seg.w);
            if seg.y < r.y {
                area += ((r.y - seg.y) as u64) * (use_w as u64);
            }
            width_left -= use_w;
            i += 1;
        }
        area
    }

    fn find_min_waste(&self, w: u32, h: u32) -> Option<(usize, Rect)> {
        let mut best_waste = u64::MAX;
        let mut best_bottom = u32::MAX;
        let mut best: Option<(usize, Rect)> = None;
        for i in 0..self.skylines.len() {
            if let Some(r) = self.can_put(i, w, h) {
                let waste = self.wasted_area_for(i, &r);
                if waste < best_waste || (waste == best_waste && r.bottom() < best_bottom) {
                    best_waste = waste;
                    best_bottom = r.bottom();
                    best = Some((i, r));
                }
            }
        }
        best
    }

    fn split(&mut self, index: usize, rect: &Rect) {
        let skyline = SkylineNode {
            x: rect.x,
            y: rect.bottom() + 1,
            w: rect.w,
        };
        debug_assert!(skyline.right() <= self.border.right());

        self.skylines.insert(index, skyline);

        let i = index + 1;
        while i < self.skylines.len() {
            if self.skylines[i - 1].left() <= self.skylines[i].left()
                && self.skylines[i].left() <= self.skylines[i - 1].right()
            {
                let shrink = self.skylines[i - 1].right() - self.skylines[i].left() + 1;
                if self.skylines[i].w <= shrink {
                    self.skylines.remove(i);
                } else {
                    self.skylines[i].x += shrink;
                    self.skylines[i].w -= shrink;
                    break;
                }
            } else {
                break;
            }
        }
    }

    fn merge(&mut self) {
        let mut i = 1;
        while i < self.skylines.len() {
            if self.skylines[i - 1].y == self.skylines[i].y {
                let w = self.skylines[i].w;
                self.skylines[i - 1].w += w;
                self.skylines.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl<K> Packer<K> for SkylinePacker {
    fn can_pack(&self, w: u32, h: u32) -> bool {
        self.find_skyline(w + self.padding.0, h + self.padding.1)
            .is_some()
    }

    fn pack(&mut self, key: K, w: u32, h: u32) -> Option<Placement<K>> {
        let (i, slot) = self.find_skyline(w + self.padding.0, h + self.padding.1)?;
        self.split(i, &slot);
        self.merge();
        Some(placement(key, &slot, w, h))
    }
}
