use std::{cell::Cell, io::Cursor};

use super::*;
use crate::assets::source::MemoryItemSource;

struct CountingSource {
    calls: Cell<usize>,
}

impl ItemSource for CountingSource {
    fn load(&self, item: &SourceItem, _max_dim: u32) -> CompositorResult<PixelBuffer> {
        self.calls.set(self.calls.get() + 1);
        Err(CompositorError::NotFound {
            path: item.path.clone(),
        })
    }
}

fn small_config() -> CompositorConfig {
    CompositorConfig {
        canvas_width: 128,
        canvas_height: 128,
        max_source_dim: 64,
        merge_radius: 3,
        ..CompositorConfig::default()
    }
}

fn garment_png(color: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(40, 40, |x, y| {
        if (6..34).contains(&x) && (6..34).contains(&y) {
            image::Rgba(color)
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn empty_request_fails_before_loading_anything() {
    let source = CountingSource {
        calls: Cell::new(0),
    };
    let compositor = Compositor::with_source(small_config(), source);
    let err = compositor.compose(&BTreeMap::new()).unwrap_err();
    assert!(matches!(err, CompositorError::NoItemsProvided));
    assert_eq!(compositor.source.calls.get(), 0);
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = CompositorConfig {
        canvas_width: 0,
        ..small_config()
    };
    let compositor = Compositor::with_source(cfg, MemoryItemSource::new(1 << 20));
    let items = items_from_pairs([(Category::Top, "top.png")]);
    assert!(matches!(
        compositor.compose(&items).unwrap_err(),
        CompositorError::Validation(_)
    ));
}

#[test]
fn every_item_missing_is_all_items_failed() {
    let source = CountingSource {
        calls: Cell::new(0),
    };
    let compositor = Compositor::with_source(small_config(), source);
    let items = items_from_pairs([(Category::Top, "a.png"), (Category::Shoes, "b.png")]);
    let err = compositor.compose(&items).unwrap_err();
    assert!(matches!(err, CompositorError::AllItemsFailed { attempted: 2 }));
    assert_eq!(compositor.source.calls.get(), 2);
}

#[test]
fn compose_produces_canonical_canvas_and_report() {
    let mut source = MemoryItemSource::new(1 << 24);
    source.insert("top.png", garment_png([200, 30, 30, 255]));
    source.insert("shoes.png", garment_png([20, 20, 20, 255]));
    let compositor = Compositor::with_source(small_config(), source);

    let items = items_from_pairs([
        (Category::Shoes, "shoes.png"),
        (Category::Top, "top.png"),
        (Category::Bottom, "missing.png"),
    ]);
    let out = compositor.compose(&items).unwrap();

    assert_eq!((out.image.width(), out.image.height()), (128, 128));
    assert_eq!(out.report.drawn_count(), 2);
    assert_eq!(out.report.skipped_count(), 1);
    assert_eq!(out.report.skipped[0].category, Category::Bottom);

    let drawn: Vec<Category> = out.report.drawn.iter().map(|d| d.category).collect();
    assert_eq!(drawn, vec![Category::Shoes, Category::Top]);
    for d in &out.report.drawn {
        assert!(d.removal.removed);
        assert!(d.feathered);
    }

    // Cropping removes the empty margin left by the band layout.
    let bounds = crate::render::crop::opaque_bounds(&out.image).unwrap();
    assert!(bounds.width == 128 || bounds.height == 128);
}

#[test]
fn identical_inputs_give_identical_pixels() {
    let mut source = MemoryItemSource::new(1 << 24);
    source.insert("dress.png", garment_png([40, 90, 160, 255]));
    let compositor = Compositor::with_source(small_config(), source);
    let items = items_from_pairs([(Category::Dress, "dress.png")]);

    let a = compositor.compose(&items).unwrap();
    let b = compositor.compose(&items).unwrap();
    assert_eq!(a.image, b.image);
    assert_eq!(a.report, b.report);
}

#[test]
fn photo_without_background_is_not_feathered() {
    let solid = image::RgbaImage::from_pixel(40, 40, image::Rgba([200, 30, 30, 255]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(solid)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let mut source = MemoryItemSource::new(1 << 24);
    source.insert("top.png", png);
    let compositor = Compositor::with_source(small_config(), source);
    let out = compositor
        .compose(&items_from_pairs([(Category::Top, "top.png")]))
        .unwrap();

    let drawn = &out.report.drawn[0];
    assert_eq!(drawn.removal.cleared_pixels, 0);
    assert!(!drawn.removal.removed);
    assert!(!drawn.feathered);
}
