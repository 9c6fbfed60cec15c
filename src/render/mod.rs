//! Raster stages: canvas synthesis, photo compositing and text drawing.
//!
//! Every stage takes and returns a premultiplied [`Raster`](crate::Raster). Shapes and glyphs are
//! rasterized with `vello_cpu`; pixel blending and blur run on plain byte buffers.

pub(crate) mod blur;
/// Solid and gradient background synthesis.
pub mod canvas;
pub(crate) mod composite;
/// Photo layers with masks, borders and shadows.
pub mod compositor;
pub(crate) mod shape;
/// Styled text layers.
pub mod text;
