use std::io::Cursor;

use super::*;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::PosterError;

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Arc<[u8]> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner().into()
}

fn black(width: u32, height: u32) -> Raster {
    Raster::filled(width, height, Rgba8Premul::from_straight_rgba(0, 0, 0, 255)).unwrap()
}

#[test]
fn layer_lands_at_top_left() {
    let layer = ImageLayer::new(png(10, 5, [255, 0, 0, 255]), Point::new(4.0, 6.0), Size::new(10, 5));
    let out = composite_image(CompositeOptions {
        background: black(20, 20),
        layers: vec![layer],
    })
    .unwrap();
    assert_eq!(out.pixel(4, 6), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(13, 10), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(3, 6), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(14, 10), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(4, 11), Some([0, 0, 0, 255]));
}

#[test]
fn center_origin_matches_converted_top_left() {
    let mut layer = ImageLayer::new(png(4, 4, [0, 0, 255, 255]), Point::new(10.0, 10.0), Size::new(4, 4));
    layer.origin = LayerOrigin::Center;
    let out = composite_image(CompositeOptions {
        background: black(20, 20),
        layers: vec![layer],
    })
    .unwrap();
    assert_eq!(out.pixel(8, 8), Some([0, 0, 255, 255]));
    assert_eq!(out.pixel(11, 11), Some([0, 0, 255, 255]));
    assert_eq!(out.pixel(7, 8), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(12, 12), Some([0, 0, 0, 255]));
}

#[test]
fn circle_mask_keeps_corners_of_background() {
    let mut layer = ImageLayer::new(png(40, 40, [255, 255, 255, 255]), Point::ORIGIN, Size::new(40, 40));
    layer.mask = Mask::Circle;
    let out = composite_image(CompositeOptions {
        background: black(40, 40),
        layers: vec![layer],
    })
    .unwrap();
    assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(39, 0), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(20, 20), Some([255, 255, 255, 255]));
}

#[test]
fn shadow_is_visible_outside_the_box() {
    let mut layer = ImageLayer::new(png(10, 10, [255, 255, 255, 255]), Point::new(20.0, 20.0), Size::new(10, 10));
    layer.shadow = Some(Shadow {
        blur: 4.0,
        offset_x: 6.0,
        offset_y: 6.0,
        color: "#ff0000".to_owned(),
    });
    let bg = Raster::filled(50, 50, Rgba8Premul::from_straight_rgba(0, 0, 0, 255)).unwrap();
    let out = composite_image(CompositeOptions {
        background: bg,
        layers: vec![layer],
    })
    .unwrap();
    let beyond = out.pixel(32, 32).unwrap();
    assert!(beyond[0] > 40, "shadow should tint pixels past the box: {beyond:?}");
    assert_eq!(out.pixel(2, 2), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(25, 25), Some([255, 255, 255, 255]));
}

#[test]
fn border_is_drawn_inside_box() {
    let mut layer = ImageLayer::new(png(20, 20, [0, 0, 255, 255]), Point::new(5.0, 5.0), Size::new(20, 20));
    layer.border = Some(Border {
        width: 4.0,
        color: "#00ff00".to_owned(),
    });
    let out = composite_image(CompositeOptions {
        background: black(30, 30),
        layers: vec![layer],
    })
    .unwrap();
    let edge = out.pixel(6, 15).unwrap();
    assert!(edge[1] > 250 && edge[2] < 5);
    assert_eq!(out.pixel(15, 15), Some([0, 0, 255, 255]));
    assert_eq!(out.pixel(4, 15), Some([0, 0, 0, 255]));
}

#[test]
fn layers_outside_canvas_are_clipped() {
    let layers = vec![
        ImageLayer::new(png(4, 4, [255, 0, 0, 255]), Point::new(-2.0, -2.0), Size::new(4, 4)),
        ImageLayer::new(png(4, 4, [0, 255, 0, 255]), Point::new(100.0, 100.0), Size::new(4, 4)),
    ];
    let out = composite_image(CompositeOptions {
        background: black(10, 10),
        layers,
    })
    .unwrap();
    assert_eq!(out.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(1, 1), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(2, 2), Some([0, 0, 0, 255]));
}

#[test]
fn later_layers_draw_on_top() {
    let layers = vec![
        ImageLayer::new(png(4, 4, [255, 0, 0, 255]), Point::ORIGIN, Size::new(4, 4)),
        ImageLayer::new(png(4, 4, [0, 255, 0, 255]), Point::new(2.0, 2.0), Size::new(4, 4)),
    ];
    let out = composite_image(CompositeOptions {
        background: black(8, 8),
        layers,
    })
    .unwrap();
    assert_eq!(out.pixel(1, 1), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(3, 3), Some([0, 255, 0, 255]));
}

#[test]
fn undecodable_layer_is_invalid_input() {
    let layer = ImageLayer::new(&b"not an image"[..], Point::ORIGIN, Size::new(4, 4));
    let err = composite_image(CompositeOptions {
        background: black(8, 8),
        layers: vec![layer],
    })
    .unwrap_err();
    assert!(matches!(err, PosterError::InvalidInput(_)));
}

#[test]
fn oversized_shadow_blur_is_invalid_input() {
    let mut layer = ImageLayer::new(png(10, 10, [255, 255, 255, 255]), Point::ORIGIN, Size::new(10, 10));
    layer.shadow = Some(Shadow {
        blur: 3.0e9,
        offset_x: 0.0,
        offset_y: 0.0,
        color: "#000000".to_owned(),
    });
    let err = composite_image(CompositeOptions {
        background: black(20, 20),
        layers: vec![layer],
    })
    .unwrap_err();
    assert!(matches!(err, PosterError::InvalidInput(ref m) if m.contains("blur")), "{err:?}");
}

#[test]
fn extreme_shadow_offset_is_clipped() {
    let mut layer = ImageLayer::new(png(10, 10, [255, 255, 255, 255]), Point::new(5.0, 5.0), Size::new(10, 10));
    layer.shadow = Some(Shadow {
        blur: 2.0,
        offset_x: 1.0e300,
        offset_y: -1.0e300,
        color: "#ff0000".to_owned(),
    });
    let out = composite_image(CompositeOptions {
        background: black(20, 20),
        layers: vec![layer],
    })
    .unwrap();
    assert_eq!(out.pixel(10, 10), Some([255, 255, 255, 255]));
    assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn oversized_layer_is_invalid_input() {
    let layer = ImageLayer::new(
        png(4, 4, [0, 0, 0, 255]),
        Point::ORIGIN,
        Size::new(u32::MAX, u32::MAX),
    );
    let err = composite_image(CompositeOptions {
        background: black(8, 8),
        layers: vec![layer],
    })
    .unwrap_err();
    assert!(matches!(err, PosterError::InvalidInput(_)));
}
