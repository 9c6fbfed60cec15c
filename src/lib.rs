//! posterkit renders finished poster images from declarative templates.
//!
//! A template fixes the canvas size, the background fill, one or more photo slots and a set of
//! styled text fields. A composition request supplies a photo and the text values; the
//! pipeline is:
//!
//! - look up the template and validate the request ([`TemplateCatalog`], [`validate`])
//! - build the background ([`create_canvas`])
//! - place the photo into each slot with mask, border and shadow ([`composite_image`])
//! - draw the text fields with fonts from the [`FontRegistry`] ([`add_text`])
//! - resize and encode ([`encode_raster`])
//!
//! [`PosterComposer`] runs all of it and reports progress to an optional
//! [`ProgressObserver`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub mod assets;
pub mod compose;
pub mod encode;
pub mod fonts;
pub mod render;
pub mod scene;

pub use crate::foundation::core::{MAX_RASTER_SIDE, Point, Raster, Rgba8Premul, Size, Vec2};
pub use crate::foundation::error::{PosterError, PosterResult};

pub use crate::assets::color::Color;
pub use crate::assets::decode::{ImageMetadata, decode_image, image_metadata};
pub use crate::compose::{
    ComposeRequest, ComposeStage, PosterComposer, ProgressObserver, compose_poster,
};
pub use crate::encode::{
    ComposeResult, FitMode, OutputFormat, OutputMetadata, OutputOptions, ResizeOptions,
    encode_raster,
};
pub use crate::fonts::{FontRegistry, FontSource};
pub use crate::render::canvas::{CanvasOptions, create_canvas};
pub use crate::render::compositor::{CompositeOptions, ImageLayer, LayerOrigin, composite_image};
pub use crate::render::text::{AddTextOptions, TextLayer, add_text};
pub use crate::scene::catalog::{TemplateCatalog, validate};
pub use crate::scene::model::{
    Anchor, Border, Fill, GradientDirection, GradientStop, Mask, PhotoSlot, Position,
    PosterTemplate, Shadow, TextAlign, TextField, TextOverflow, TextStyle, TextTransform,
};
pub use crate::scene::position::{center_to_top_left, resolve};
