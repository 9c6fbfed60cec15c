//! Process-wide font registry.
//!
//! Populate it once at start-up with [`init_bundled_fonts`] (and any [`register_font`] calls),
//! then hand [`shared`] to the composer as a read-only [`FontSource`].

mod registry;

pub use registry::{
    DEFAULT_FONT, FONTS_DIR_ENV, FontBytes, FontRegistry, FontSource, bundled_fonts_dir,
    clear_fonts, default_font, get_font, init_bundled_fonts, is_font_registered,
    list_bundled_fonts, list_fonts, register_font, shared,
};
