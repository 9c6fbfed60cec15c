use rayon::prelude::*;

use crate::foundation::core::{Raster, Size};
use crate::foundation::error::{PosterError, PosterResult};

/// Largest shadow blur accepted, in pixels.
pub(crate) const MAX_BLUR: f64 = 256.0;

const Q16_ONE: u32 = 1 << 16;

/// Kernel radius and sigma for a CSS-style blur amount.
///
/// `0` disables the blur. Negative, non-finite or larger than [`MAX_BLUR`] amounts are rejected.
pub(crate) fn blur_params(blur: f64) -> PosterResult<(u32, f32)> {
    if !(blur.is_finite() && (0.0..=MAX_BLUR).contains(&blur)) {
        return Err(PosterError::invalid_input(format!(
            "shadow blur must be between 0 and {MAX_BLUR}, got {blur}"
        )));
    }
    if blur == 0.0 {
        return Ok((0, 0.0));
    }
    let radius = blur.ceil() as u32;
    let sigma = ((blur / 2.0) as f32).max(0.5);
    Ok((radius, sigma))
}

/// Transparent surface for a `size` silhouette with `radius` pixels of room on every side.
pub(crate) fn blur_surface(size: Size, radius: u32) -> PosterResult<Raster> {
    let padded = size.padded(radius).ok_or_else(|| {
        PosterError::invalid_input(format!(
            "shadow surface for {}x{} with blur {radius} overflows",
            size.width, size.height
        ))
    })?;
    padded.check_drawable("shadow surface")?;
    Raster::transparent(padded.width, padded.height)
}

/// Separable gaussian blur of a premultiplied raster; edges clamp.
pub(crate) fn blur_raster(src: &Raster, radius: u32, sigma: f32) -> PosterResult<Raster> {
    if radius == 0 || src.size().is_empty() {
        return Ok(src.clone());
    }

    let kernel = Kernel::gaussian(radius, sigma)?;
    let mut across = vec![0u8; src.data.len()];
    kernel.convolve(&src.data, &mut across, src.size(), Axis::X);
    let mut out = vec![0u8; src.data.len()];
    kernel.convolve(&across, &mut out, src.size(), Axis::Y);
    Raster::from_premul_bytes(src.width, src.height, out)
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Symmetric gaussian taps in Q16 fixed point, summing to exactly one.
struct Kernel {
    taps: Vec<u32>,
    radius: i64,
}

impl Kernel {
    fn gaussian(radius: u32, sigma: f32) -> PosterResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(PosterError::invalid_input("blur sigma must be > 0"));
        }
        let r = i64::from(radius);
        let two_sigma_sq = 2.0 * f64::from(sigma).powi(2);
        let raw: Vec<f64> = (-r..=r)
            .map(|i| (-((i * i) as f64) / two_sigma_sq).exp())
            .collect();
        let total: f64 = raw.iter().sum();

        let mut taps: Vec<u32> = raw
            .iter()
            .map(|w| ((w / total) * f64::from(Q16_ONE)).round() as u32)
            .collect();
        let sum: u32 = taps.iter().sum();
        let center = &mut taps[radius as usize];
        *center = (*center + Q16_ONE).saturating_sub(sum);
        Ok(Self { taps, radius: r })
    }

    fn convolve(&self, src: &[u8], dst: &mut [u8], size: Size, axis: Axis) {
        let w = i64::from(size.width);
        let h = i64::from(size.height);
        let row_len = (size.width as usize) * 4;
        dst.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, out_row)| {
                let y = y as i64;
                for x in 0..w {
                    let mut acc = [0u64; 4];
                    for (k, &tap) in self.taps.iter().enumerate() {
                        let d = k as i64 - self.radius;
                        let (sx, sy) = match axis {
                            Axis::X => ((x + d).clamp(0, w - 1), y),
                            Axis::Y => (x, (y + d).clamp(0, h - 1)),
                        };
                        let at = ((sy * w + sx) as usize) * 4;
                        for (a, &v) in acc.iter_mut().zip(&src[at..at + 4]) {
                            *a += u64::from(tap) * u64::from(v);
                        }
                    }
                    let at = (x as usize) * 4;
                    for (o, a) in out_row[at..at + 4].iter_mut().zip(acc) {
                        *o = ((a + u64::from(Q16_ONE / 2)) >> 16).min(255) as u8;
                    }
                }
            });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
