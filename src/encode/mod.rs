//! Output stage: optional resize, then PNG or JPEG encoding.

mod output;

pub use output::{
    ComposeResult, DEFAULT_JPEG_QUALITY, FitMode, OutputFormat, OutputMetadata, OutputOptions,
    ResizeOptions, encode_raster,
};
