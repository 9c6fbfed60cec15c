use rayon::prelude::*;

use crate::assets::color::Color;
use crate::foundation::core::{Raster, Rgba8Premul, Size};
use crate::foundation::error::{PosterError, PosterResult};
use crate::foundation::math::lerp_u8;
use crate::scene::model::{Fill, GradientDirection};

/// Inputs for [`create_canvas`].
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasOptions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Solid or gradient fill.
    pub fill: Fill,
}

/// Build the base raster for a poster.
pub fn create_canvas(opts: &CanvasOptions) -> PosterResult<Raster> {
    Size::new(opts.width, opts.height).check_drawable("canvas")?;
    match resolve_fill(&opts.fill)? {
        ResolvedFill::Solid(color) => Raster::filled(opts.width, opts.height, color.to_premul()),
        ResolvedFill::Gradient { direction, stops } => {
            gradient_raster(opts.width, opts.height, direction, &stops)
        }
    }
}

/// Validate a fill without rendering it.
pub(crate) fn check_fill(fill: &Fill) -> PosterResult<()> {
    resolve_fill(fill).map(|_| ())
}

enum ResolvedFill {
    Solid(Color),
    Gradient {
        direction: GradientDirection,
        stops: Vec<ResolvedStop>,
    },
}

#[derive(Clone, Copy, Debug)]
struct ResolvedStop {
    position: f32,
    color: Color,
}

fn resolve_fill(fill: &Fill) -> PosterResult<ResolvedFill> {
    match fill {
        Fill::Solid { color } => Ok(ResolvedFill::Solid(Color::parse_hex(color)?)),
        Fill::Gradient { direction, stops } => {
            if stops.is_empty() {
                return Err(PosterError::invalid_input(
                    "gradient requires at least one color stop",
                ));
            }
            let mut resolved = Vec::with_capacity(stops.len());
            for stop in stops {
                if !(stop.position.is_finite() && (0.0..=100.0).contains(&stop.position)) {
                    return Err(PosterError::invalid_input(format!(
                        "gradient stop position {} is outside 0..=100",
                        stop.position
                    )));
                }
                resolved.push(ResolvedStop {
                    position: stop.position as f32,
                    color: Color::parse_hex(&stop.color)?,
                });
            }
            // Stable: equal positions keep declaration order, giving a hard edge.
            resolved.sort_by(|a, b| a.position.total_cmp(&b.position));
            Ok(ResolvedFill::Gradient {
                direction: *direction,
                stops: resolved,
            })
        }
    }
}

fn gradient_raster(
    width: u32,
    height: u32,
    direction: GradientDirection,
    stops: &[ResolvedStop],
) -> PosterResult<Raster> {
    let mut out = Raster::transparent(width, height)?;
    let row_len = (width as usize) * 4;
    let w1 = (width.max(1) - 1) as f32;
    let h1 = (height.max(1) - 1) as f32;
    let frac = |v: u32, max: f32| if max <= 0.0 { 0.0 } else { v as f32 / max };

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let radius = (cx * cx + cy * cy).sqrt().max(f32::EPSILON);

    out.data
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            match direction {
                GradientDirection::ToBottom => {
                    let px = sample(stops, frac(y, h1)).to_array();
                    for dst in row.chunks_exact_mut(4) {
                        dst.copy_from_slice(&px);
                    }
                }
                GradientDirection::ToRight => {
                    for (x, dst) in row.chunks_exact_mut(4).enumerate() {
                        dst.copy_from_slice(&sample(stops, frac(x as u32, w1)).to_array());
                    }
                }
                GradientDirection::ToBottomRight => {
                    let ty = frac(y, h1);
                    for (x, dst) in row.chunks_exact_mut(4).enumerate() {
                        let t = (frac(x as u32, w1) + ty) / 2.0;
                        dst.copy_from_slice(&sample(stops, t).to_array());
                    }
                }
                GradientDirection::Radial => {
                    let dy = y as f32 + 0.5 - cy;
                    for (x, dst) in row.chunks_exact_mut(4).enumerate() {
                        let dx = x as f32 + 0.5 - cx;
                        let t = (dx * dx + dy * dy).sqrt() / radius;
                        dst.copy_from_slice(&sample(stops, t).to_array());
                    }
                }
            }
        });
    Ok(out)
}

/// Color at `t` (0..=1 along the axis); stops must be sorted and non-empty.
fn sample(stops: &[ResolvedStop], t: f32) -> Rgba8Premul {
    let p = t.clamp(0.0, 1.0) * 100.0;
    let first = stops[0];
    let last = stops[stops.len() - 1];
    if p <= first.position {
        return first.color.to_premul();
    }
    if p >= last.position {
        return last.color.to_premul();
    }

    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if p > b.position {
            continue;
        }
        let span = b.position - a.position;
        if span <= 0.0 {
            return b.color.to_premul();
        }
        let local = (p - a.position) / span;
        let c = Color::rgba(
            lerp_u8(a.color.r, b.color.r, local),
            lerp_u8(a.color.g, b.color.g, local),
            lerp_u8(a.color.b, b.color.b, local),
            lerp_u8(a.color.a, b.color.a, local),
        );
        return c.to_premul();
    }
    last.color.to_premul()
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
