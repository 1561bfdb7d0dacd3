use crate::config::SpritemapConfig;
use crate::model::PackedSpriteMap;
use crate::paths::to_url;
use serde_json::{Value, json};

/// Describe packed spritemaps as JSON.
/// Shape: `{ spritemaps: [ { image, width, height, sprites: [ {path, x, y, w, h} ] } ], meta }`.
pub fn to_json(maps: &[PackedSpriteMap], cfg: &SpritemapConfig) -> Value {
    let spritemaps: Vec<Value> = maps
        .iter()
        .map(|m| {
            let sprites: Vec<Value> = m
                .layout
                .placements
                .iter()
                .map(|p| {
                    json!({
                        "path": to_url(&p.key),
                        "x": p.frame.x,
                        "y": p.frame.y,
                        "w": p.frame.w,
                        "h": p.frame.h,
                    })
                })
                .collect();
            json!({
                "image": to_url(&m.image),
                "width": m.layout.width,
                "height": m.layout.height,
                "occupancy": m.layout.stats.occupancy,
                "sprites": sprites,
            })
        })
        .collect();
    json!({
        "spritemaps": spritemaps,
        "meta": {
            "app": "spritemapper",
            "version": env!("CARGO_PKG_VERSION"),
            "padding": [cfg.padding.0, cfg.padding.1],
            "anneal_steps": cfg.anneal_steps,
            "seed": cfg.seed,
        },
    })
}
