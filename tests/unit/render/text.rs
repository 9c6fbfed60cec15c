use std::sync::Arc;

use super::*;
use crate::fonts::FontBytes;
use crate::foundation::core::Rgba8Premul;

struct NoFonts;

impl FontSource for NoFonts {
    fn font(&self, _family: &str) -> Option<FontBytes> {
        None
    }
}

struct GarbageFonts;

impl FontSource for GarbageFonts {
    fn font(&self, _family: &str) -> Option<FontBytes> {
        Some(Arc::from(&b"definitely not a font"[..]))
    }
}

fn canvas() -> Raster {
    Raster::filled(200, 100, Rgba8Premul::from_straight_rgba(10, 20, 30, 255)).unwrap()
}

fn layer(content: &str, style: TextStyle) -> TextLayer {
    TextLayer {
        content: content.to_owned(),
        position: Point::new(100.0, 60.0),
        style,
    }
}

#[test]
fn no_layers_returns_image_unchanged() {
    let img = canvas();
    let out = add_text(
        AddTextOptions {
            image: img.clone(),
            layers: vec![],
        },
        &NoFonts,
    )
    .unwrap();
    assert_eq!(out, img);
}

#[test]
fn unknown_family_falls_back_without_error() {
    let img = canvas();
    let out = add_text(
        AddTextOptions {
            image: img.clone(),
            layers: vec![layer("Hello", TextStyle::new("Nope-Regular", 24.0, "#ffffff"))],
        },
        &NoFonts,
    )
    .unwrap();
    assert_eq!(out.size(), img.size());
    assert_eq!(out.pixel(0, 0), img.pixel(0, 0));
    assert_eq!(out.pixel(199, 99), img.pixel(199, 99));
}

#[test]
fn unparseable_font_bytes_fall_back_without_error() {
    let out = add_text(
        AddTextOptions {
            image: canvas(),
            layers: vec![layer("Hi", TextStyle::new("Broken", 20.0, "#fff"))],
        },
        &GarbageFonts,
    )
    .unwrap();
    assert_eq!((out.width, out.height), (200, 100));
}

#[test]
fn unicode_content_is_accepted() {
    let mut style = TextStyle::new("Any", 18.0, "#ffcc00");
    style.align = TextAlign::Center;
    style.text_transform = crate::scene::model::TextTransform::Uppercase;
    let out = add_text(
        AddTextOptions {
            image: canvas(),
            layers: vec![layer("Ünïcödé ✓ 日本語 🏆 straße", style)],
        },
        &NoFonts,
    )
    .unwrap();
    assert_eq!(out.size(), canvas().size());
}

#[test]
fn invalid_color_is_invalid_input() {
    let err = add_text(
        AddTextOptions {
            image: canvas(),
            layers: vec![layer("x", TextStyle::new("Any", 12.0, "blue"))],
        },
        &NoFonts,
    )
    .unwrap_err();
    assert!(matches!(err, PosterError::InvalidInput(_)));
}

#[test]
fn non_positive_size_is_invalid_input() {
    let err = add_text(
        AddTextOptions {
            image: canvas(),
            layers: vec![layer("x", TextStyle::new("Any", 0.0, "#000"))],
        },
        &NoFonts,
    )
    .unwrap_err();
    assert!(matches!(err, PosterError::InvalidInput(_)));
}

#[test]
fn fit_font_size_shrinks_with_floor() {
    assert_eq!(fit_font_size(80.0, 100.0, 40.0), 40.0);
    assert_eq!(fit_font_size(200.0, 100.0, 40.0), 20.0);
    assert_eq!(fit_font_size(160.0, 100.0, 40.0), 25.0);
    assert_eq!(fit_font_size(1000.0, 100.0, 40.0), 20.0);
    assert_eq!(fit_font_size(0.0, 100.0, 40.0), 40.0);
}

#[test]
fn line_offset_follows_alignment() {
    assert_eq!(line_offset(TextAlign::Left, 120.0), 0.0);
    assert_eq!(line_offset(TextAlign::Center, 120.0), -60.0);
    assert_eq!(line_offset(TextAlign::Right, 120.0), -120.0);
}

const DEJAVU: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/fonts/DejaVuSans.ttf"
));

struct Fixture;

impl FontSource for Fixture {
    fn font(&self, _family: &str) -> Option<FontBytes> {
        Some(Arc::from(DEJAVU))
    }
}

const BG: [u8; 4] = [0, 0, 0, 255];

/// Inclusive `(x0, y0, x1, y1)` of every pixel that differs from the background.
fn ink_bounds(img: &Raster) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..img.height {
        for x in 0..img.width {
            if img.pixel(x, y) == Some(BG) {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds
}

fn draw(width: u32, height: u32, layer: TextLayer) -> Raster {
    add_text(
        AddTextOptions {
            image: Raster::filled(width, height, Rgba8Premul::from_straight_rgba(0, 0, 0, 255))
                .unwrap(),
            layers: vec![layer],
        },
        &Fixture,
    )
    .unwrap()
}

fn styled(overflow: TextOverflow, max_width: Option<f32>, size: f32) -> TextStyle {
    let mut style = TextStyle::new("DejaVu", size, "#ffffff");
    style.overflow = overflow;
    style.max_width = max_width;
    style
}

#[test]
fn registered_font_draws_ink_above_baseline() {
    let img = draw(400, 200, TextLayer {
        content: "Champion".to_owned(),
        position: Point::new(20.0, 80.0),
        style: styled(TextOverflow::Visible, None, 40.0),
    });
    let (x0, y0, x1, y1) = ink_bounds(&img).expect("glyphs drawn");
    assert!((18..=26).contains(&x0), "left edge {x0}");
    assert!(x1 > x0 + 100, "ink span {x0}..{x1}");
    // Cap height of a 40px face sits well above the baseline; only descenders go below it.
    assert!(y0 < 55, "top {y0}");
    assert!(y1 <= 80 + 12, "bottom {y1}");
}

#[test]
fn center_aligned_ink_is_centered_on_anchor() {
    let mut style = styled(TextOverflow::Visible, None, 40.0);
    style.align = TextAlign::Center;
    let img = draw(400, 200, TextLayer {
        content: "Gold Medal".to_owned(),
        position: Point::new(200.0, 100.0),
        style,
    });
    let (x0, _, x1, _) = ink_bounds(&img).expect("glyphs drawn");
    let mid = (x0 + x1) as f32 / 2.0;
    assert!((mid - 200.0).abs() <= 6.0, "ink {x0}..{x1} centered at {mid}");
}

#[test]
fn right_aligned_ink_ends_at_anchor() {
    let mut style = styled(TextOverflow::Visible, None, 32.0);
    style.align = TextAlign::Right;
    let img = draw(400, 200, TextLayer {
        content: "June 2025".to_owned(),
        position: Point::new(380.0, 100.0),
        style,
    });
    let (x0, _, x1, _) = ink_bounds(&img).expect("glyphs drawn");
    assert!((372..=380).contains(&x1), "right edge {x1}");
    assert!(x0 < 300, "left edge {x0}");
}

#[test]
fn wrap_breaks_onto_several_lines() {
    let content = "Gold Medal World Championship";
    let one_line = draw(600, 240, TextLayer {
        content: content.to_owned(),
        position: Point::new(20.0, 40.0),
        style: styled(TextOverflow::Visible, Some(100.0), 24.0),
    });
    let wrapped = draw(600, 240, TextLayer {
        content: content.to_owned(),
        position: Point::new(20.0, 40.0),
        style: styled(TextOverflow::Wrap, Some(100.0), 24.0),
    });

    let (_, vy0, vx1, vy1) = ink_bounds(&one_line).expect("glyphs drawn");
    let (_, wy0, wx1, wy1) = ink_bounds(&wrapped).expect("glyphs drawn");
    assert!(vy1 - vy0 < 40, "single line spans {vy0}..{vy1}");
    assert!(wy1 - wy0 > 48, "wrapped text spans {wy0}..{wy1}");
    assert!(wx1 < vx1, "wrapped right edge {wx1} vs {vx1}");
}

#[test]
fn shrink_to_fit_narrows_ink_down_to_half() {
    let content = "World Championship 2025";
    let visible = draw(800, 120, TextLayer {
        content: content.to_owned(),
        position: Point::new(10.0, 70.0),
        style: styled(TextOverflow::Visible, Some(200.0), 40.0),
    });
    let shrunk = draw(800, 120, TextLayer {
        content: content.to_owned(),
        position: Point::new(10.0, 70.0),
        style: styled(TextOverflow::ShrinkToFit, Some(200.0), 40.0),
    });

    let (vx0, _, vx1, _) = ink_bounds(&visible).expect("glyphs drawn");
    let (sx0, _, sx1, _) = ink_bounds(&shrunk).expect("glyphs drawn");
    let (full, fitted) = ((vx1 - vx0) as f32, (sx1 - sx0) as f32);
    assert!(full > 200.0, "unconstrained width {full}");
    // The line needs more than a 50% cut, so the floor holds it at half width.
    assert!(fitted < full * 0.6, "{fitted} vs {full}");
    assert!(fitted > full * 0.4, "{fitted} vs {full}");
}

#[test]
fn font_blob_is_registered_once_per_family() {
    let first: FontBytes = Arc::from(DEJAVU);
    let copy: FontBytes = Arc::from(DEJAVU);
    let family = "registered-once-check";

    let mut library = FontLibrary::lock();
    let a = library.family_name(family, &first);
    let b = library.family_name(family, &first);
    let c = library.family_name(family, &copy);
    assert_eq!(a.as_deref(), Some("DejaVu Sans"));
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(library.families[family].len(), 1);
}

#[test]
fn engines_share_one_collection() {
    let family = "shared-collection-check";
    let first = TextLayoutEngine::new().font_stack(family, &Fixture);
    let second = TextLayoutEngine::new().font_stack(family, &Fixture);
    assert!(first.starts_with("\"DejaVu Sans\""), "{first}");
    assert_eq!(first, second);
    assert_eq!(FontLibrary::lock().families[family].len(), 1);
}
