use std::io::Cursor;

use crate::foundation::core::{Raster, Size};
use crate::foundation::error::{PosterError, PosterResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Dimensions and container format of an encoded image.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ImageMetadata {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Lower-case format name (`png`, `jpeg`, `webp`, ...).
    pub format: String,
}

/// Decode any supported raster format. Undecodable bytes are caller input errors.
pub fn decode_image(bytes: &[u8]) -> PosterResult<image::DynamicImage> {
    if bytes.is_empty() {
        return Err(PosterError::invalid_input("image buffer is empty"));
    }
    image::load_from_memory(bytes)
        .map_err(|e| PosterError::invalid_input(format!("failed to decode image: {e}")))
}

/// Read dimensions and format without keeping the decoded pixels around.
pub fn image_metadata(bytes: &[u8]) -> PosterResult<ImageMetadata> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PosterError::invalid_input(format!("failed to read image header: {e}")))?;
    let format = reader
        .format()
        .ok_or_else(|| PosterError::invalid_input("unrecognized image format"))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| PosterError::invalid_input(format!("failed to read image header: {e}")))?;
    Ok(ImageMetadata {
        width,
        height,
        format: format_name(format).to_owned(),
    })
}

pub(crate) fn format_name(format: image::ImageFormat) -> &'static str {
    match format {
        image::ImageFormat::Png => "png",
        image::ImageFormat::Jpeg => "jpeg",
        image::ImageFormat::Gif => "gif",
        image::ImageFormat::WebP => "webp",
        image::ImageFormat::Bmp => "bmp",
        image::ImageFormat::Tiff => "tiff",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    }
}

/// Scale and center-crop `img` so it covers `target` exactly, then premultiply.
pub(crate) fn cover_to_raster(img: &image::DynamicImage, target: Size) -> PosterResult<Raster> {
    target.check_drawable("image layer")?;
    let fitted = if img.width() == target.width && img.height() == target.height {
        img.clone()
    } else {
        img.resize_to_fill(
            target.width,
            target.height,
            image::imageops::FilterType::Lanczos3,
        )
    };
    to_premul_raster(&fitted)
}

pub(crate) fn to_premul_raster(img: &image::DynamicImage) -> PosterResult<Raster> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    Raster::from_premul_bytes(width, height, data)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
