use std::sync::Arc;

use crate::assets::color::Color;
use crate::assets::decode::{cover_to_raster, decode_image};
use crate::foundation::core::{Point, Raster, Size};
use crate::foundation::error::PosterResult;
use crate::foundation::math::mul_div255_u8;
use crate::render::blur::{blur_params, blur_raster, blur_surface};
use crate::render::composite::{apply_coverage, blit_over};
use crate::render::shape::{border_raster, mask_coverage};
use crate::scene::model::{Border, Mask, Shadow};

/// Which point of the layer box `ImageLayer::position` refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayerOrigin {
    /// `position` is the top-left corner.
    #[default]
    TopLeft,
    /// `position` is the center of the box.
    Center,
}

/// One photo placed by [`composite_image`].
#[derive(Debug, Clone)]
pub struct ImageLayer {
    /// Encoded image bytes (any format `image` decodes).
    pub image: Arc<[u8]>,
    /// Placement point, interpreted through `origin`.
    pub position: Point,
    /// How `position` maps onto the layer box.
    pub origin: LayerOrigin,
    /// Target box; the image is cover-fitted into it.
    pub size: Size,
    /// Alpha clip.
    pub mask: Mask,
    /// Stroke along the mask boundary.
    pub border: Option<Border>,
    /// Shadow drawn behind the masked image.
    pub shadow: Option<Shadow>,
}

impl ImageLayer {
    /// Unmasked layer with its top-left corner at `position`.
    pub fn new(image: impl Into<Arc<[u8]>>, position: Point, size: Size) -> Self {
        Self {
            image: image.into(),
            position,
            origin: LayerOrigin::TopLeft,
            size,
            mask: Mask::None,
            border: None,
            shadow: None,
        }
    }

    fn top_left(&self) -> (i64, i64) {
        let p = match self.origin {
            LayerOrigin::TopLeft => self.position,
            LayerOrigin::Center => {
                crate::scene::position::center_to_top_left(self.position, self.size)
            }
        };
        (p.x.round() as i64, p.y.round() as i64)
    }
}

/// Inputs for [`composite_image`].
#[derive(Debug, Clone)]
pub struct CompositeOptions {
    /// Raster the layers are drawn onto.
    pub background: Raster,
    /// Layers, bottom first.
    pub layers: Vec<ImageLayer>,
}

/// Draw every layer onto the background in order.
pub fn composite_image(opts: CompositeOptions) -> PosterResult<Raster> {
    let CompositeOptions {
        mut background,
        layers,
    } = opts;
    for (index, layer) in layers.iter().enumerate() {
        tracing::debug!(
            index,
            width = layer.size.width,
            height = layer.size.height,
            "compositing image layer"
        );
        let decoded = decode_image(&layer.image)?;
        draw_layer(&mut background, layer, &decoded)?;
    }
    Ok(background)
}

/// [`composite_image`] for layers that all show `decoded`; their `image` bytes are not read.
pub(crate) fn composite_decoded(
    mut background: Raster,
    layers: &[ImageLayer],
    decoded: &image::DynamicImage,
) -> PosterResult<Raster> {
    for layer in layers {
        draw_layer(&mut background, layer, decoded)?;
    }
    Ok(background)
}

fn draw_layer(
    dst: &mut Raster,
    layer: &ImageLayer,
    decoded: &image::DynamicImage,
) -> PosterResult<()> {
    let mut photo = cover_to_raster(decoded, layer.size)?;
    let coverage = mask_coverage(&layer.mask, layer.size)?;
    if let Some(coverage) = &coverage {
        apply_coverage(&mut photo, coverage)?;
    }

    let (x, y) = layer.top_left();
    if let Some(shadow) = &layer.shadow {
        draw_shadow(dst, shadow, layer.size, coverage.as_deref(), x, y)?;
    }
    blit_over(dst, &photo, x, y);
    if let Some(border) = &layer.border {
        let ring = border_raster(&layer.mask, layer.size, border)?;
        blit_over(dst, &ring, x, y);
    }
    Ok(())
}

fn draw_shadow(
    dst: &mut Raster,
    shadow: &Shadow,
    size: Size,
    coverage: Option<&[u8]>,
    x: i64,
    y: i64,
) -> PosterResult<()> {
    let color = Color::parse_hex(&shadow.color)?.to_premul();
    let (radius, sigma) = blur_params(shadow.blur)?;
    let pad = radius as usize;

    // Silhouette of the masked box, padded so the blur can spread past its edges.
    let mut silhouette = blur_surface(size, radius)?;
    let row_len = (silhouette.width as usize) * 4;
    let px = color.to_array();
    let w = size.width as usize;
    for sy in 0..size.height as usize {
        let row = &mut silhouette.data[(sy + pad) * row_len..][..row_len];
        for sx in 0..w {
            let c = coverage.map_or(255, |cov| cov[sy * w + sx]);
            if c == 0 {
                continue;
            }
            let dst_px = &mut row[(sx + pad) * 4..][..4];
            for (d, s) in dst_px.iter_mut().zip(px) {
                *d = mul_div255_u8(u16::from(s), u16::from(c));
            }
        }
    }

    let blurred = blur_raster(&silhouette, radius, sigma)?;
    let ox = x.saturating_sub(i64::from(radius)).saturating_add(shadow.offset_x.round() as i64);
    let oy = y.saturating_sub(i64::from(radius)).saturating_add(shadow.offset_y.round() as i64);
    blit_over(dst, &blurred, ox, oy);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
