use spritemapper_core::config::SkylineHeuristic;
use spritemapper_core::model::Placement;
use spritemapper_core::packer::shelf::ShelfPacker;
use spritemapper_core::packer::skyline::SkylinePacker;
use spritemapper_core::packer::{Packer, canvas_size};

fn disjoint(placements: &[Placement<usize>], padding: (u32, u32)) -> bool {
    for i in 0..placements.len() {
        for j in (i + 1)..placements.len() {
            if placements[i]
                .padded(padding)
                .intersects(&placements[j].padded(padding))
            {
                return false;
            }
        }
    }
    true
}

fn pack_all<P: Packer<usize>>(mut packer: P, sizes: &[(u32, u32)]) -> Vec<Placement<usize>> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| packer.pack(i, w, h).expect("fits"))
        .collect()
}

const SIZES: &[(u32, u32)] = &[(30, 10), (12, 12), (5, 25), (40, 3), (8, 8), (8, 8), (19, 7)];

#[test]
fn shelf_rows_wrap_at_the_bin_width() {
    let p = pack_all(ShelfPacker::new(20, (1, 1)), &[(9, 4), (9, 6), (9, 2)]);
    assert_eq!(p[0].position(), (0, 0));
    assert_eq!(p[1].position(), (10, 0));
    assert_eq!(p[2].position(), (0, 7));
    assert_eq!(canvas_size(&p), (19, 9));
}

#[test]
fn shelf_rejects_sprites_wider_than_the_bin() {
    let mut shelf = ShelfPacker::new(10, (1, 0));
    assert!(Packer::<usize>::can_pack(&shelf, 9, 50));
    assert!(!Packer::<usize>::can_pack(&shelf, 10, 1));
    assert!(shelf.pack(0usize, 10, 1).is_none());
}

#[test]
fn skyline_placements_never_overlap() {
    for heuristic in [SkylineHeuristic::BottomLeft, SkylineHeuristic::MinWaste] {
        for padding in [(0, 0), (2, 1)] {
            let p = pack_all(SkylinePacker::new(48, padding, heuristic.clone()), SIZES);
            assert!(disjoint(&p, padding));
            let (w, _) = canvas_size(&p);
            assert!(w <= 48);
        }
    }
}

#[test]
fn skyline_fills_gaps_beside_tall_sprites() {
    let p = pack_all(
        SkylinePacker::new(20, (0, 0), SkylineHeuristic::BottomLeft),
        &[(10, 20), (10, 5), (10, 5)],
    );
    assert_eq!(p[1].position(), (10, 0));
    assert_eq!(p[2].position(), (10, 5));
    assert_eq!(canvas_size(&p), (20, 20));
}

#[test]
fn skyline_rejects_sprites_wider_than_the_bin() {
    let mut sky = SkylinePacker::new(16, (1, 1), SkylineHeuristic::BottomLeft);
    assert!(sky.pack(0usize, 16, 2).is_none());
    assert!(sky.pack(1usize, 15, 2).is_some());
}
