//! Input asset handling: hex colors and photo decoding.

/// Hex color parsing.
pub mod color;
/// Photo decoding and format probing.
pub mod decode;
