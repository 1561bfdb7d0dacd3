use std::path::{Path, PathBuf};

use spritemapper_core::css::parse_stylesheet;
use spritemapper_core::error::{Result, SpriteError};
use spritemapper_core::mapper::FixedMapper;
use spritemapper_core::model::{PackStats, PackedLayout, PackedSpriteMap, Placement, Rect};
use spritemapper_core::paths::UrlResolver;
use spritemapper_core::position::BackgroundPosition;
use spritemapper_core::rewrite::{
    Lookup, PlacementIndex, RewrittenSheet, SpriteReplacer, rewrite_declaration,
    rewrite_stylesheet,
};
use spritemapper_core::sprite::SpriteRef;

/// `a.png` 20x20 at (0,0) and `b.png` 10x10 at (22,0) in a 32x20 canvas (padding 2).
fn sheet() -> PackedSpriteMap {
    let place = |key: &str, x, y, w, h| Placement {
        key: PathBuf::from(key),
        frame: Rect::new(x, y, w, h),
    };
    PackedSpriteMap {
        image: PathBuf::from("sheet.png"),
        layout: PackedLayout {
            width: 32,
            height: 20,
            placements: vec![place("a.png", 0, 0, 20, 20), place("b.png", 22, 0, 10, 10)],
            stats: PackStats::default(),
        },
    }
}

fn rewrite_with(css: &str, index: &PlacementIndex, base_url: Option<&str>) -> Result<RewrittenSheet> {
    let mapper = FixedMapper::new("sheet.png");
    let source = Path::new("site.css");
    let replacer = SpriteReplacer::new(
        index,
        &mapper,
        source,
        UrlResolver::for_stylesheet(source, None),
        Path::new(""),
        base_url,
    );
    rewrite_stylesheet(parse_stylesheet(css), replacer)
}

fn rewrite(css: &str) -> Result<RewrittenSheet> {
    rewrite_with(css, &PlacementIndex::from_spritemaps([&sheet()]), None)
}

fn text(out: &RewrittenSheet) -> String {
    spritemapper_core::css::to_css_string(&out.events)
}

#[test]
fn end_to_end_offsets_are_declared_minus_placement() {
    let css = ".a { background: url('a.png'); }\n.b { background: url('b.png') 2px 2px; }\n";
    let out = rewrite(css).unwrap();
    assert_eq!(
        text(&out),
        ".a { background: url('sheet.png') no-repeat 0px 0px; }\n.b { background: url('sheet.png') no-repeat -20px 2px; }\n"
    );
    assert_eq!(out.rewrites, 2);
}

#[test]
fn rewrite_declaration_formats_one_declaration() {
    let placement = Placement {
        key: PathBuf::from("b.png"),
        frame: Rect::new(22, 0, 10, 10),
    };
    let b = SpriteRef::new("b.png", "site.css", BackgroundPosition::from_pixels(2, 2));
    assert_eq!(
        rewrite_declaration(&b, &placement, "img\\sheet.png").unwrap(),
        "background: url('img/sheet.png') no-repeat -20px 2px"
    );

    let at_origin = Placement {
        key: PathBuf::from("a.png"),
        frame: Rect::new(0, 0, 20, 20),
    };
    let merged = SpriteRef::new("a.png", "site.css", BackgroundPosition::from_pixels(6, 14));
    assert_eq!(
        rewrite_declaration(&merged, &at_origin, "sheet.png").unwrap(),
        "background: url('sheet.png') no-repeat 6px 14px"
    );

    let pct = SpriteRef::new("a.png", "site.css", BackgroundPosition::parse("50% 50%", true));
    assert!(matches!(
        rewrite_declaration(&pct, &at_origin, "sheet.png"),
        Err(SpriteError::UnsupportedUnit(_))
    ));
}

#[test]
fn longhand_is_folded_into_the_rewrite() {
    let css = ".m { background: url('b.png') 10px 20px; background-position: 4px 6px; }";
    let out = rewrite(css).unwrap();
    // (10 - 4, 20 - 6) = (6, 14), then shifted by the placement (22, 0)
    assert_eq!(
        text(&out),
        ".m { background: url('sheet.png') no-repeat -16px 14px; }"
    );
}

#[test]
fn longhand_without_background_passes_through() {
    let css = ".p { background-position: 1px 2px; }\n.q { background: red; background-position: 0 0 }";
    let out = rewrite(css).unwrap();
    assert_eq!(text(&out), css);
    assert_eq!(out.rewrites, 0);
}

#[test]
fn unsupported_positions_leave_the_block_unmodified() {
    for css in [
        ".u { background: url('a.png') 50% 50%; }",
        ".u { background: url('a.png') 1em 2px; }",
        ".u { background: url('a.png') 10px 20px; background-position: center top; }",
        ".u { background: url('a.png') no-repeat 10px 20px 5px; }",
    ] {
        let out = rewrite(css).unwrap();
        assert_eq!(text(&out), css);
        assert_eq!(out.rewrites, 0);
    }
}

#[test]
fn dropped_maps_and_skipped_sprites_pass_through() {
    let css = ".a { background: url('a.png') 1px 2px; background-position: 1px 1px; }";
    let out = rewrite_with(css, &PlacementIndex::new(), None).unwrap();
    assert_eq!(text(&out), css);

    let mut index = PlacementIndex::from_spritemaps([&sheet()]);
    index.skip("a.png");
    assert_eq!(index.lookup(Path::new("sheet.png"), Path::new("a.png")), Lookup::Skipped);
    let out = rewrite_with(css, &index, None).unwrap();
    assert_eq!(text(&out), css);
    assert_eq!(out.rewrites, 0);
}

#[test]
fn missing_placement_in_a_packed_map_is_fatal() {
    let css = ".a { background: url('a.png'); }\n.c {\n  background: url('c.png');\n}\n";
    let err = rewrite(css).unwrap_err();
    match err {
        SpriteError::PlacementNotFound {
            source_css,
            line,
            path,
        } => {
            assert_eq!(source_css, PathBuf::from("site.css"));
            assert_eq!(line, 3);
            assert_eq!(path, PathBuf::from("c.png"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn same_path_gets_the_same_placement_everywhere() {
    let css = ".x { background: url(b.png); }\n.y { background-image: url('./b.png'); }\n";
    let out = rewrite(css).unwrap();
    assert_eq!(
        text(&out),
        ".x { background: url('sheet.png') no-repeat -22px 0px; }\n.y { background: url('sheet.png') no-repeat -22px 0px; }\n"
    );
}

#[test]
fn later_background_in_a_block_is_rewritten_too() {
    let css = ".t { background: url('a.png'); color: red; background: url('b.png'); }";
    let out = rewrite(css).unwrap();
    assert_eq!(
        text(&out),
        ".t { background: url('sheet.png') no-repeat 0px 0px; color: red; background: url('sheet.png') no-repeat -22px 0px; }"
    );
    assert_eq!(out.rewrites, 2);
}

#[test]
fn base_url_replaces_relative_spritemap_url() {
    let css = ".a { background: url('a.png') }";
    let out = rewrite_with(css, &PlacementIndex::from_spritemaps([&sheet()]), Some("/static/")).unwrap();
    assert_eq!(
        text(&out),
        ".a { background: url('/static/sheet.png') no-repeat 0px 0px}"
    );
}

#[test]
fn unrelated_rules_are_untouched() {
    let css = "@media print {\n  .a { background: url('a.png'); }\n  .z { color: blue }\n}\n/* done */\n";
    let out = rewrite(css).unwrap();
    assert_eq!(
        text(&out),
        "@media print {\n  .a { background: url('sheet.png') no-repeat 0px 0px; }\n  .z { color: blue }\n}\n/* done */\n"
    );
}

#[test]
fn important_survives_the_rewrite() {
    let css = ".a { background: url('a.png') !important; }\n.b { background: url(b.png) 2px 2px ! IMPORTANT }\n";
    let out = rewrite(css).unwrap();
    assert_eq!(out.rewrites, 2);
    assert_eq!(
        text(&out),
        ".a { background: url('sheet.png') no-repeat 0px 0px !important; }\n.b { background: url('sheet.png') no-repeat -20px 2px !important}\n"
    );
}

#[test]
fn offsets_out_of_range_are_left_alone() {
    let sprite = SpriteRef::new(
        "b.png",
        "site.css",
        BackgroundPosition::parse("-9223372036854775808px 0px", true),
    );
    let b = sheet().layout.placements[1].clone();
    assert!(matches!(
        rewrite_declaration(&sprite, &b, "sheet.png"),
        Err(SpriteError::UnsupportedUnit(_))
    ));

    let css = ".b { background: url(b.png) -9223372036854775808px 0px; }";
    let out = rewrite(css).unwrap();
    assert_eq!(out.rewrites, 0);
    assert_eq!(text(&out), css);
}
