use std::io::Cursor;

use anyhow::Context as _;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::assets::decode::image_metadata;
use crate::foundation::core::{MAX_RASTER_SIDE, Raster, Size};
use crate::foundation::error::{PosterError, PosterResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Encoded container format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless, keeps alpha.
    #[default]
    Png,
    /// Lossy; alpha is flattened over black.
    Jpeg,
}

impl OutputFormat {
    /// Lower-case name, matching [`OutputMetadata::format`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

/// How the rendered poster is scaled into a resize box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale to fit inside the box, letterboxing onto transparency.
    #[default]
    Contain,
    /// Scale to cover the box, center-cropping the excess.
    Cover,
    /// Stretch to the box, ignoring aspect ratio.
    Fill,
}

/// Final resize. With one dimension the other follows the aspect ratio and `fit` is moot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeOptions {
    /// Target width.
    pub width: Option<u32>,
    /// Target height.
    pub height: Option<u32>,
    /// Strategy when both dimensions are given.
    pub fit: FitMode,
}

/// Output encoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Container format.
    pub format: OutputFormat,
    /// JPEG quality, `1..=100`; ignored for PNG.
    pub quality: u8,
    /// Optional resize applied before encoding.
    pub resize: Option<ResizeOptions>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: DEFAULT_JPEG_QUALITY,
            resize: None,
        }
    }
}

impl OutputOptions {
    /// PNG with no resize.
    pub fn png() -> Self {
        Self::default()
    }

    /// JPEG at `quality`.
    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality,
            resize: None,
        }
    }

    /// Same options with a resize step.
    pub fn with_resize(mut self, resize: ResizeOptions) -> Self {
        self.resize = Some(resize);
        self
    }

    /// Reject out-of-range quality and resize sides that are zero or above
    /// [`MAX_RASTER_SIDE`].
    pub fn validate(&self) -> PosterResult<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(PosterError::invalid_input(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if let Some(resize) = &self.resize {
            for side in [resize.width, resize.height].into_iter().flatten() {
                if side == 0 {
                    return Err(PosterError::invalid_input(
                        "resize dimensions must be greater than zero",
                    ));
                }
                if side > MAX_RASTER_SIDE {
                    return Err(PosterError::invalid_input(format!(
                        "resize dimensions must be at most {MAX_RASTER_SIDE}, got {side}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// [`OutputOptions::validate`], plus a bound on the side derived from `source`'s aspect
    /// ratio when only one resize side is given.
    pub fn validate_for(&self, source: Size) -> PosterResult<()> {
        self.validate()?;
        if let Some(target) = self.resize.and_then(|r| target_size(source, &r)) {
            target.check_drawable("resized output")?;
        }
        Ok(())
    }
}

/// Facts read back from the encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputMetadata {
    /// Encoded width in pixels.
    pub width: u32,
    /// Encoded height in pixels.
    pub height: u32,
    /// `png` or `jpeg`.
    pub format: String,
    /// Encoded length in bytes.
    pub size: usize,
}

/// A finished poster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeResult {
    /// Encoded image.
    pub bytes: Vec<u8>,
    /// Metadata of `bytes`.
    pub metadata: OutputMetadata,
}

/// Resize (optionally) and encode a premultiplied raster.
pub fn encode_raster(raster: &Raster, opts: &OutputOptions) -> PosterResult<ComposeResult> {
    opts.validate_for(raster.size())?;
    let resized = match &opts.resize {
        Some(resize) => resize_raster(raster, resize)?,
        None => raster.clone(),
    };

    let bytes = match opts.format {
        OutputFormat::Png => encode_png(resized)?,
        OutputFormat::Jpeg => encode_jpeg(&resized, opts.quality)?,
    };

    let sniffed = image_metadata(&bytes)
        .map_err(|e| PosterError::image_processing(format!("encoded output is unreadable: {e}")))?;
    let metadata = OutputMetadata {
        width: sniffed.width,
        height: sniffed.height,
        format: sniffed.format,
        size: bytes.len(),
    };
    tracing::debug!(
        width = metadata.width,
        height = metadata.height,
        format = %metadata.format,
        size = metadata.size,
        "encoded output"
    );
    Ok(ComposeResult { bytes, metadata })
}

/// Target box for `resize` applied to a `source`-sized image.
pub(crate) fn target_size(source: Size, resize: &ResizeOptions) -> Option<Size> {
    let scaled = |num: u32, target: u32, den: u32| -> u32 {
        let v = (f64::from(num) * f64::from(target) / f64::from(den.max(1))).round();
        (v as u32).max(1)
    };
    match (resize.width, resize.height) {
        (Some(w), Some(h)) => Some(Size::new(w, h)),
        (Some(w), None) => Some(Size::new(w, scaled(source.height, w, source.width))),
        (None, Some(h)) => Some(Size::new(scaled(source.width, h, source.height), h)),
        (None, None) => None,
    }
}

// Resampling runs on premultiplied bytes so transparent edges do not bleed color.
fn resize_raster(raster: &Raster, resize: &ResizeOptions) -> PosterResult<Raster> {
    let Some(target) = target_size(raster.size(), resize) else {
        return Ok(raster.clone());
    };
    if target == raster.size() {
        return Ok(raster.clone());
    }

    let src = image::RgbaImage::from_raw(raster.width, raster.height, raster.data.clone())
        .context("raster buffer does not match its dimensions")?;
    let src = image::DynamicImage::ImageRgba8(src);
    let filter = FilterType::Lanczos3;

    let both = resize.width.is_some() && resize.height.is_some();
    let out = match (both, resize.fit) {
        (true, FitMode::Cover) => src.resize_to_fill(target.width, target.height, filter),
        (true, FitMode::Contain) => {
            let fitted = src.resize(target.width, target.height, filter).to_rgba8();
            let mut boxed = image::RgbaImage::new(target.width, target.height);
            let x = (target.width - fitted.width()) / 2;
            let y = (target.height - fitted.height()) / 2;
            image::imageops::replace(&mut boxed, &fitted, i64::from(x), i64::from(y));
            image::DynamicImage::ImageRgba8(boxed)
        }
        _ => src.resize_exact(target.width, target.height, filter),
    };

    let out = out.to_rgba8();
    let (width, height) = out.dimensions();
    Raster::from_premul_bytes(width, height, out.into_raw())
}

fn encode_png(raster: Raster) -> PosterResult<Vec<u8>> {
    let Raster {
        width,
        height,
        mut data,
    } = raster;
    unpremultiply_rgba8_in_place(&mut data);
    let img = image::RgbaImage::from_raw(width, height, data)
        .context("raster buffer does not match its dimensions")?;

    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| PosterError::image_processing(format!("png encode failed: {e}")))?;
    Ok(out.into_inner())
}

fn encode_jpeg(raster: &Raster, quality: u8) -> PosterResult<Vec<u8>> {
    // Premultiplied color is already the pixel composited over black.
    let rgb: Vec<u8> = raster
        .data
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let img = image::RgbImage::from_raw(raster.width, raster.height, rgb)
        .context("raster buffer does not match its dimensions")?;

    let mut out = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(encoder)
        .map_err(|e| PosterError::image_processing(format!("jpeg encode failed: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/output.rs"]
mod tests;
