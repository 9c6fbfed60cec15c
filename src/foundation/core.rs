use crate::foundation::error::{PosterError, PosterResult};

pub use kurbo::{Point, Vec2};

/// Largest width or height of any raster the pipeline allocates: canvases, photo layers,
/// shadow surfaces and resized output.
pub const MAX_RASTER_SIDE: u32 = 16_384;

/// Pixel dimensions of a canvas, photo slot or output box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Construct a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn area(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Grow by `pad` pixels on every side; `None` on overflow.
    pub fn padded(self, pad: u32) -> Option<Self> {
        let grow = pad.checked_mul(2)?;
        Some(Self::new(
            self.width.checked_add(grow)?,
            self.height.checked_add(grow)?,
        ))
    }

    /// Reject empty sizes and sides above [`MAX_RASTER_SIDE`]; `what` names the surface in the
    /// error.
    pub fn check_drawable(self, what: &str) -> PosterResult<()> {
        if self.is_empty() {
            return Err(PosterError::invalid_input(format!(
                "{what} must have non-zero width and height"
            )));
        }
        if self.width > MAX_RASTER_SIDE || self.height > MAX_RASTER_SIDE {
            return Err(PosterError::invalid_input(format!(
                "{what} is {}x{}; each side must be at most {MAX_RASTER_SIDE}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Pixel bytes in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// An in-memory raster: tightly packed, row-major, premultiplied RGBA8.
///
/// Every stage of the composition pipeline consumes and produces a `Raster`; straight alpha only
/// appears at the encode boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl Raster {
    /// Allocate a fully transparent raster.
    pub fn transparent(width: u32, height: u32) -> PosterResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Allocate a raster filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgba8Premul) -> PosterResult<Self> {
        let mut out = Self::transparent(width, height)?;
        let px = color.to_array();
        for dst in out.data.chunks_exact_mut(4) {
            dst.copy_from_slice(&px);
        }
        Ok(out)
    }

    /// Wrap existing premultiplied bytes, checking the length.
    pub fn from_premul_bytes(width: u32, height: u32, data: Vec<u8>) -> PosterResult<Self> {
        if data.len() != byte_len(width, height)? {
            return Err(PosterError::Other(anyhow::anyhow!(
                "raster expects {width}x{height}x4 bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Raster dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Read one pixel; `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }
}

fn byte_len(width: u32, height: u32) -> PosterResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| PosterError::Other(anyhow::anyhow!("raster size overflow")))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
