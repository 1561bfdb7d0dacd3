use super::{Packer, placement};
use crate::model::{Placement, Rect};

/// Naive row packing: sprites go left to right, a new shelf starts below the
/// tallest sprite of the current one when the next sprite does not fit.
pub struct ShelfPacker {
    bin_width: u32,
    padding: (u32, u32),
    x: u32,
    y: u32,
    shelf_h: u32,
}

impl ShelfPacker {
    pub fn new(bin_width: u32, padding: (u32, u32)) -> Self {
        Self {
            bin_width,
            padding,
            x: 0,
            y: 0,
            shelf_h: 0,
        }
    }
}

impl<K> Packer<K> for ShelfPacker {
    fn can_pack(&self, w: u32, _h: u32) -> bool {
        w + self.padding.0 <= self.bin_width
    }

    fn pack(&mut self, key: K, w: u32, h: u32) -> Option<Placement<K>> {
        let pw = w + self.padding.0;
        let ph = h + self.padding.1;
        if pw > self.bin_width {
            return None;
        }
        if self.x > 0 && self.x + pw > self.bin_width {
            self.y += self.shelf_h;
            self.x = 0;
            self.shelf_h = 0;
        }
        let slot = Rect::new(self.x, self.y, pw, ph);
        self.x += pw;
        self.shelf_h = self.shelf_h.max(ph);
        Some(placement(key, &slot, w, h))
    }
}
