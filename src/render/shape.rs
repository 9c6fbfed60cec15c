use vello_cpu::kurbo::{BezPath, Ellipse, Rect, RoundedRect, Shape, Stroke};

use crate::assets::color::Color;
use crate::foundation::core::{Raster, Size};
use crate::foundation::error::{PosterError, PosterResult};
use crate::scene::model::{Border, Mask};

const TOLERANCE: f64 = 0.1;

/// Draw into a fresh transparent `width x height` surface and read it back as a raster.
pub(crate) fn rasterize(
    width: u32,
    height: u32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) -> PosterResult<Raster> {
    let w: u16 = width.try_into().map_err(|_| {
        PosterError::Other(anyhow::anyhow!("surface width {width} exceeds u16"))
    })?;
    let h: u16 = height.try_into().map_err(|_| {
        PosterError::Other(anyhow::anyhow!("surface height {height} exceeds u16"))
    })?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    draw(&mut ctx);
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    Raster::from_premul_bytes(width, height, pixmap.data_as_u8_slice().to_vec())
}

/// Outline of `mask` over a `size` box, pulled in by `inset` on every side.
pub(crate) fn mask_path(mask: &Mask, size: Size, inset: f64) -> BezPath {
    let w = f64::from(size.width);
    let h = f64::from(size.height);
    let inner = Rect::new(inset, inset, (w - inset).max(inset), (h - inset).max(inset));
    match mask {
        Mask::None => inner.to_path(TOLERANCE),
        Mask::Circle => Ellipse::from_rect(inner).to_path(TOLERANCE),
        Mask::RoundedRect { radius } => {
            let max_r = inner.width().min(inner.height()) / 2.0;
            let r = (radius - inset).clamp(0.0, max_r);
            RoundedRect::from_rect(inner, r).to_path(TOLERANCE)
        }
    }
}

/// Per-pixel coverage (0..=255) of `mask` over a `size` box; `None` means fully covered.
pub(crate) fn mask_coverage(mask: &Mask, size: Size) -> PosterResult<Option<Vec<u8>>> {
    if matches!(mask, Mask::None) {
        return Ok(None);
    }
    let path = mask_path(mask, size, 0.0);
    let surface = rasterize(size.width, size.height, |ctx| {
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        ctx.fill_path(&path);
    })?;
    Ok(Some(surface.data.chunks_exact(4).map(|px| px[3]).collect()))
}

/// Stroke of `border` following `mask`, kept entirely inside the `size` box.
pub(crate) fn border_raster(mask: &Mask, size: Size, border: &Border) -> PosterResult<Raster> {
    let color = Color::parse_hex(&border.color)?;
    if !(border.width.is_finite() && border.width > 0.0) {
        return Raster::transparent(size.width, size.height);
    }
    // A stroke wider than half the shorter side already covers the whole mask.
    let half_short = f64::from(size.width.min(size.height)) / 2.0;
    let width = border.width.min(half_short);
    let path = mask_path(mask, size, width / 2.0);
    rasterize(size.width, size.height, |ctx| {
        ctx.set_stroke(Stroke::new(width));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        ctx.stroke_path(&path);
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/shape.rs"]
mod tests;
