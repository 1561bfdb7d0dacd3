use image::{Rgba, RgbaImage};
use spritemapper_core::{RunOptions, SpritemapConfig, run};
use std::fs;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

fn write_site(root: &std::path::Path) {
    fs::create_dir_all(root.join("img")).unwrap();
    RgbaImage::from_pixel(20, 20, RED).save(root.join("img/a.png")).unwrap();
    RgbaImage::from_pixel(10, 10, GREEN).save(root.join("img/b.png")).unwrap();
    fs::write(
        root.join("site.css"),
        ".a { background: url(img/a.png); }\n.b { background: url('img/b.png') 2px 2px; }\n.x { background: url(img/missing.png); }\n",
    )
    .unwrap();
}

#[test]
fn writes_spritemap_and_rewritten_stylesheet() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());
    let cfg = SpritemapConfig::builder().padding(2, 2).anneal_steps(100).build();

    let report = run(&[dir.path().join("site.css")], &cfg, &RunOptions::default()).unwrap();

    assert_eq!(report.spritemaps.len(), 1);
    let map = &report.spritemaps[0];
    assert_eq!(map.image, dir.path().join("img.png"));
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("img/missing.png"));
    assert_eq!(report.rewrites(), 2);

    let sheet = image::open(&map.image).unwrap().to_rgba8();
    assert_eq!(sheet.dimensions(), (map.layout.width, map.layout.height));
    let a = map.layout.get(&dir.path().join("img/a.png")).unwrap();
    let b = map.layout.get(&dir.path().join("img/b.png")).unwrap();
    assert_eq!(*sheet.get_pixel(a.frame.x, a.frame.y), RED);
    assert_eq!(*sheet.get_pixel(b.frame.x + 9, b.frame.y + 9), GREEN);

    let out = fs::read_to_string(dir.path().join("site-sprite.css")).unwrap();
    assert!(out.contains("url('img.png') no-repeat"));
    assert!(out.contains(".x { background: url(img/missing.png); }"));
    // the source is left alone
    let src = fs::read_to_string(dir.path().join("site.css")).unwrap();
    assert!(src.contains("url(img/a.png)"));
}

#[test]
fn second_run_on_the_output_rewrites_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());
    let cfg = SpritemapConfig::builder().anneal_steps(20).build();
    run(&[dir.path().join("site.css")], &cfg, &RunOptions::default()).unwrap();

    let report = run(&[dir.path().join("site-sprite.css")], &cfg, &RunOptions::default()).unwrap();
    assert_eq!(report.rewrites(), 0);
    assert!(report.spritemaps.is_empty());
    let once = fs::read_to_string(dir.path().join("site-sprite.css")).unwrap();
    let twice = fs::read_to_string(dir.path().join("site-sprite-sprite.css")).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());
    let cfg = SpritemapConfig::builder().anneal_steps(10).build();
    let report = run(
        &[dir.path().join("site.css")],
        &cfg,
        &RunOptions { dry_run: true },
    )
    .unwrap();
    assert_eq!(report.rewrites(), 2);
    assert!(!dir.path().join("img.png").exists());
    assert!(!dir.path().join("site-sprite.css").exists());
}

#[test]
fn missing_stylesheet_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&[dir.path().join("nope.css")], &SpritemapConfig::default(), &RunOptions::default())
        .unwrap_err();
    assert!(matches!(err, spritemapper_core::SpriteError::Io(_)));
}
