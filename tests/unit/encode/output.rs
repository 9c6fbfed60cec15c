use super::*;
use crate::foundation::core::Rgba8Premul;

fn opaque(width: u32, height: u32) -> Raster {
    Raster::filled(width, height, Rgba8Premul::from_straight_rgba(200, 40, 40, 255)).unwrap()
}

fn resize(width: Option<u32>, height: Option<u32>, fit: FitMode) -> ResizeOptions {
    ResizeOptions { width, height, fit }
}

#[test]
fn defaults_are_png_quality_85() {
    let opts = OutputOptions::default();
    assert_eq!(opts.format, OutputFormat::Png);
    assert_eq!(opts.quality, 85);
    assert!(opts.resize.is_none());
    assert_eq!(OutputFormat::Jpeg.as_str(), "jpeg");
}

#[test]
fn png_metadata_comes_from_encoded_bytes() {
    let out = encode_raster(&opaque(12, 7), &OutputOptions::png()).unwrap();
    assert_eq!(&out.bytes[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(out.metadata.width, 12);
    assert_eq!(out.metadata.height, 7);
    assert_eq!(out.metadata.format, "png");
    assert_eq!(out.metadata.size, out.bytes.len());
}

#[test]
fn png_round_trips_straight_alpha() {
    let raster = Raster::filled(2, 2, Rgba8Premul::from_straight_rgba(255, 0, 0, 128)).unwrap();
    let out = encode_raster(&raster, &OutputOptions::png()).unwrap();
    let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
    let px = decoded.get_pixel(0, 0).0;
    assert_eq!(px[3], 128);
    assert!(px[0] >= 253);
}

#[test]
fn jpeg_flattens_over_black() {
    let raster = Raster::filled(8, 8, Rgba8Premul::from_straight_rgba(255, 255, 255, 0)).unwrap();
    let out = encode_raster(&raster, &OutputOptions::jpeg(90)).unwrap();
    assert_eq!(out.metadata.format, "jpeg");
    assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
    assert!(decoded.get_pixel(4, 4).0.iter().all(|&c| c < 8));
}

#[test]
fn single_dimension_keeps_aspect() {
    let source = Size::new(1080, 1350);
    assert_eq!(
        target_size(source, &resize(Some(540), None, FitMode::Contain)),
        Some(Size::new(540, 675))
    );
    assert_eq!(
        target_size(source, &resize(None, Some(675), FitMode::Cover)),
        Some(Size::new(540, 675))
    );
    assert_eq!(target_size(source, &resize(None, None, FitMode::Fill)), None);

    let out = encode_raster(
        &opaque(108, 135),
        &OutputOptions::png().with_resize(resize(Some(54), None, FitMode::Contain)),
    )
    .unwrap();
    assert_eq!((out.metadata.width, out.metadata.height), (54, 68));
}

#[test]
fn contain_letterboxes_cover_and_fill_fill_the_box() {
    let src = opaque(20, 10);
    for fit in [FitMode::Contain, FitMode::Cover, FitMode::Fill] {
        let out = encode_raster(
            &src,
            &OutputOptions::png().with_resize(resize(Some(10), Some(10), fit)),
        )
        .unwrap();
        assert_eq!((out.metadata.width, out.metadata.height), (10, 10));
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
        let top = decoded.get_pixel(5, 0).0[3];
        let middle = decoded.get_pixel(5, 5).0[3];
        assert_eq!(middle, 255);
        match fit {
            FitMode::Contain => assert_eq!(top, 0),
            FitMode::Cover | FitMode::Fill => assert_eq!(top, 255),
        }
    }
}

#[test]
fn invalid_options_are_rejected() {
    let raster = opaque(4, 4);
    for quality in [0u8, 101] {
        let err = encode_raster(&raster, &OutputOptions::jpeg(quality)).unwrap_err();
        assert!(matches!(err, PosterError::InvalidInput(_)));
    }
    let err = encode_raster(
        &raster,
        &OutputOptions::png().with_resize(resize(Some(0), None, FitMode::Contain)),
    )
    .unwrap_err();
    assert!(matches!(err, PosterError::InvalidInput(_)));
}

#[test]
fn oversized_resize_is_invalid_input() {
    let raster = opaque(4, 4);
    let huge = OutputOptions::png().with_resize(resize(Some(u32::MAX), Some(u32::MAX), FitMode::Fill));
    assert!(matches!(
        encode_raster(&raster, &huge),
        Err(PosterError::InvalidInput(_))
    ));

    let edge = OutputOptions::png().with_resize(resize(Some(MAX_RASTER_SIDE), None, FitMode::Contain));
    assert!(edge.validate().is_ok());

    // A legal width whose aspect-derived height exceeds the bound.
    let tall = Size::new(1, 4);
    assert!(edge.validate_for(Size::new(4, 1)).is_ok());
    assert!(matches!(
        edge.validate_for(tall),
        Err(PosterError::InvalidInput(ref m)) if m.contains("resized output")
    ));
}

#[test]
fn options_deserialize_from_json() {
    let opts: OutputOptions =
        serde_json::from_str(r#"{"format":"jpeg","quality":70,"resize":{"width":540,"fit":"cover"}}"#)
            .unwrap();
    assert_eq!(opts.format, OutputFormat::Jpeg);
    assert_eq!(opts.quality, 70);
    assert_eq!(opts.resize, Some(resize(Some(540), None, FitMode::Cover)));

    let defaults: OutputOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, OutputOptions::default());
}
