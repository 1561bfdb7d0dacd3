use crate::model::{Placement, Rect};

pub mod shelf;
pub mod skyline;

/// A packer places sprites into a bin of fixed width and unbounded height.
///
/// Implementations must ensure the padded boxes (`w + pad_x`, `h + pad_y`) never
/// overlap. `pack` returns `None` only when the padded sprite is wider than the bin.
pub trait Packer<K> {
    fn can_pack(&self, w: u32, h: u32) -> bool;
    fn pack(&mut self, key: K, w: u32, h: u32) -> Option<Placement<K>>;
}

/// Tight canvas size around the placed sprites; trailing padding is not included.
pub fn canvas_size<K>(placements: &[Placement<K>]) -> (u32, u32) {
    placements.iter().fold((0, 0), |(w, h), p| {
        (w.max(p.frame.x + p.frame.w), h.max(p.frame.y + p.frame.h))
    })
}

/// Shared by the packers: the slot reserved for a sprite and the sprite inside it.
pub(crate) fn placement<K>(key: K, slot: &Rect, w: u32, h: u32) -> Placement<K> {
    Placement {
        key,
        frame: Rect::new(slot.x, slot.y, w, h),
    }
}
