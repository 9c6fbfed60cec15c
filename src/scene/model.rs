use serde::{Deserialize, Serialize};

use crate::foundation::core::{Point, Size, Vec2};

/// Declarative poster layout: canvas, background, photo slots and text fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterTemplate {
    /// Catalog key, e.g. `classic`.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Output canvas dimensions.
    pub canvas: Size,
    /// Base fill.
    pub background: Fill,
    /// Regions the user photo is composited into, in paint order.
    pub photo_slots: Vec<PhotoSlot>,
    /// Text fields, in paint order.
    #[serde(default)]
    pub text_fields: Vec<TextField>,
}

/// Canvas fill: one solid color or a multi-stop gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Fill {
    /// Single hex color covering the canvas.
    Solid {
        /// Hex color.
        color: String,
    },
    /// Gradient interpolated across ordered color stops.
    Gradient {
        /// Gradient axis.
        direction: GradientDirection,
        /// Color stops at percentage positions.
        stops: Vec<GradientStop>,
    },
}

/// Gradient axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientDirection {
    /// Top edge to bottom edge.
    ToBottom,
    /// Left edge to right edge.
    ToRight,
    /// Top-left corner to bottom-right corner.
    ToBottomRight,
    /// Canvas center outwards to the corners.
    Radial,
}

/// One gradient color stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Hex color.
    pub color: String,
    /// Percentage along the gradient axis, `0..=100`.
    pub position: f64,
}

/// Region of the template where the user photo is composited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSlot {
    /// Slot id, unique within the template.
    pub id: String,
    /// Center of the slot.
    pub position: Position,
    /// Slot box; the photo is cover-fitted into it.
    pub size: Size,
    /// Alpha clip applied to the photo.
    #[serde(default)]
    pub mask: Mask,
    /// Stroke drawn along the mask boundary.
    #[serde(default)]
    pub border: Option<Border>,
    /// Drop shadow drawn behind the masked photo.
    #[serde(default)]
    pub shadow: Option<Shadow>,
}

/// Alpha clip shape for an image layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Mask {
    /// No clipping.
    #[default]
    None,
    /// Circle (ellipse for non-square boxes) inscribed in the layer box.
    Circle,
    /// Rectangle with rounded corners.
    RoundedRect {
        /// Corner radius in pixels.
        radius: f64,
    },
}

/// Stroke along a layer's mask boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    /// Stroke width in pixels.
    pub width: f64,
    /// Hex color.
    pub color: String,
}

/// Blurred, offset, colored silhouette drawn behind a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    /// Blur radius in pixels.
    pub blur: f64,
    /// Horizontal offset in pixels.
    #[serde(default)]
    pub offset_x: f64,
    /// Vertical offset in pixels.
    #[serde(default)]
    pub offset_y: f64,
    /// Hex color; its alpha scales the silhouette.
    pub color: String,
}

/// Named reference point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    /// Canvas center.
    Center,
    /// Middle of the top edge.
    TopCenter,
    /// Middle of the bottom edge.
    BottomCenter,
    /// Middle of the left edge.
    LeftCenter,
    /// Middle of the right edge.
    RightCenter,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

/// Template position: an absolute pixel point or a canvas anchor.
///
/// JSON forms: `{"x": 540, "y": 300}`, `"center"`, or
/// `{"anchor": "bottom-center", "offset": {"x": 0, "y": -120}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    /// Absolute pixel point.
    Pixel(Point),
    /// Named anchor.
    Anchor(Anchor),
    /// Named anchor shifted by a pixel offset.
    Offset {
        /// Base anchor.
        anchor: Anchor,
        /// Shift applied after resolving the anchor.
        #[serde(default)]
        offset: Vec2,
    },
}

/// Named text slot filled from the request data map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    /// Key looked up in the request data.
    pub id: String,
    /// Text anchor point; see [`TextStyle::align`].
    pub position: Position,
    /// Text styling.
    pub style: TextStyle,
}

/// Text styling for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    /// Registered font family; unknown families fall back to the default font.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Hex color.
    pub color: String,
    /// Horizontal alignment around the anchor x.
    #[serde(default)]
    pub align: TextAlign,
    /// Case transform applied before layout.
    #[serde(default)]
    pub text_transform: TextTransform,
    /// Extra advance between glyphs, in pixels.
    #[serde(default)]
    pub letter_spacing: f32,
    /// Width budget used by the overflow policy.
    #[serde(default)]
    pub max_width: Option<f32>,
    /// What happens when a line exceeds `max_width`.
    #[serde(default)]
    pub overflow: TextOverflow,
}

impl TextStyle {
    /// Minimal style with defaults for everything but family, size and color.
    pub fn new(font_family: impl Into<String>, font_size: f32, color: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
            color: color.into(),
            align: TextAlign::default(),
            text_transform: TextTransform::default(),
            letter_spacing: 0.0,
            max_width: None,
            overflow: TextOverflow::default(),
        }
    }
}

/// Which point of each line sits on the anchor x.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    /// Line starts at the anchor.
    #[default]
    Left,
    /// Line is centered on the anchor.
    Center,
    /// Line ends at the anchor.
    Right,
}

/// Case transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextTransform {
    /// Content as given.
    #[default]
    None,
    /// Unicode upper-casing.
    Uppercase,
    /// Unicode lower-casing.
    Lowercase,
}

impl TextTransform {
    /// Apply the transform.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::None => text.to_owned(),
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
        }
    }
}

/// Overflow policy for text wider than `max_width`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextOverflow {
    /// Draw as laid out; only the canvas edge clips.
    #[default]
    Visible,
    /// Reduce the font size (down to half) until the single line fits.
    ShrinkToFit,
    /// Break lines at `max_width`.
    Wrap,
}
