use rayon::prelude::*;

use crate::foundation::core::Raster;
use crate::foundation::error::{PosterError, PosterResult};
use crate::foundation::math::mul_div255_u8;

/// Source-over of one premultiplied pixel onto another, in place.
pub(crate) fn src_over(dst: &mut [u8], src: &[u8]) {
    match src[3] {
        0 => {}
        255 => dst[..4].copy_from_slice(&src[..4]),
        sa => {
            let keep = 255 - u16::from(sa);
            for (d, &s) in dst[..4].iter_mut().zip(&src[..4]) {
                *d = s.saturating_add(mul_div255_u8(u16::from(*d), keep));
            }
        }
    }
}

/// Draw a same-sized overlay (text, borders) onto `dst`.
pub(crate) fn overlay(dst: &mut Raster, src: &Raster) -> PosterResult<()> {
    if dst.size() != src.size() {
        return Err(PosterError::Other(anyhow::anyhow!(
            "overlay is {}x{}, target is {}x{}",
            src.width,
            src.height,
            dst.width,
            dst.height
        )));
    }
    dst.data
        .par_chunks_mut(4)
        .zip(src.data.par_chunks(4))
        .for_each(|(d, s)| src_over(d, s));
    Ok(())
}

/// Blend `src` over `dst` with its top-left corner at `(x, y)`.
///
/// Only the intersection with `dst` is touched; a fully outside `src` is a no-op.
pub(crate) fn blit_over(dst: &mut Raster, src: &Raster, x: i64, y: i64) {
    let dw = i64::from(dst.width);
    let dh = i64::from(dst.height);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(i64::from(src.width)).min(dw);
    let y1 = y.saturating_add(i64::from(src.height)).min(dh);
    if x0 >= x1 || y0 >= y1 || dst.width == 0 {
        return;
    }

    let dst_row_len = (dst.width as usize) * 4;
    let src_row_len = (src.width as usize) * 4;
    let span = ((x1 - x0) as usize) * 4;
    let sx = ((x0 - x) as usize) * 4;
    let dx = (x0 as usize) * 4;

    dst.data
        .par_chunks_mut(dst_row_len)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .for_each(|(row_y, row)| {
            let sy = (row_y as i64 - y) as usize;
            let src_row = &src.data[sy * src_row_len + sx..][..span];
            for (d, s) in row[dx..dx + span]
                .chunks_exact_mut(4)
                .zip(src_row.chunks_exact(4))
            {
                src_over(d, s);
            }
        });
}

/// Scale every pixel by the matching coverage byte (`255` keeps the pixel, `0` clears it).
pub(crate) fn apply_coverage(raster: &mut Raster, coverage: &[u8]) -> PosterResult<()> {
    if coverage.len() != raster.size().area() {
        return Err(PosterError::Other(anyhow::anyhow!(
            "coverage mask expects {} entries, got {}",
            raster.size().area(),
            coverage.len()
        )));
    }
    raster
        .data
        .par_chunks_mut(4)
        .zip(coverage.par_iter())
        .for_each(|(px, &c)| match c {
            255 => {}
            0 => px.fill(0),
            c => {
                for v in px.iter_mut() {
                    *v = mul_div255_u8(u16::from(*v), u16::from(c));
                }
            }
        });
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
