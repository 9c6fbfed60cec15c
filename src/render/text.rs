use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use parley::fontique::{Blob, Collection, CollectionOptions, SourceCache};
use parley::layout::PositionedLayoutItem;
use parley::style::{FontStack, StyleProperty};

use crate::assets::color::Color;
use crate::fonts::{DEFAULT_FONT, FontBytes, FontSource};
use crate::foundation::core::{Point, Raster};
use crate::foundation::error::{PosterError, PosterResult};
use crate::render::composite::overlay;
use crate::render::shape::rasterize;
use crate::scene::model::{TextAlign, TextOverflow, TextStyle};

/// Smallest shrink-to-fit size, as a fraction of the declared size.
const MIN_SHRINK_RATIO: f32 = 0.5;

/// One string drawn by [`add_text`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    /// Text to draw, before the style's case transform.
    pub content: String,
    /// Anchor: x follows `style.align`, y is the first baseline.
    pub position: Point,
    /// Styling.
    pub style: TextStyle,
}

/// Inputs for [`add_text`].
#[derive(Debug, Clone)]
pub struct AddTextOptions {
    /// Raster the text is drawn onto.
    pub image: Raster,
    /// Layers, bottom first.
    pub layers: Vec<TextLayer>,
}

/// Draw every text layer onto the image.
///
/// Families missing from `fonts` (or whose bytes do not parse) fall back to the system
/// `sans-serif` with a warning. If no system font exists either, the layer draws nothing.
pub fn add_text(opts: AddTextOptions, fonts: &dyn FontSource) -> PosterResult<Raster> {
    let AddTextOptions { mut image, layers } = opts;
    if layers.is_empty() || image.size().is_empty() {
        return Ok(image);
    }

    let mut engine = TextLayoutEngine::new();
    let mut runs = Vec::<PlacedRun>::new();
    for layer in &layers {
        engine.place_layer(layer, fonts, &mut runs)?;
    }
    if runs.is_empty() {
        return Ok(image);
    }

    let ink = rasterize(image.width, image.height, |ctx| {
        for run in &runs {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                run.brush.r,
                run.brush.g,
                run.brush.b,
                run.brush.a,
            ));
            ctx.glyph_run(&run.font)
                .font_size(run.font_size)
                .fill_glyphs(run.glyphs.iter().copied());
        }
    })?;
    overlay(&mut image, &ink)?;
    Ok(image)
}

/// Font size that makes a line measured at `size` fit `max_width`, floored at half of `size`.
pub(crate) fn fit_font_size(measured_width: f32, max_width: f32, size: f32) -> f32 {
    if measured_width <= max_width || measured_width <= 0.0 {
        return size;
    }
    (size * max_width / measured_width).max(size * MIN_SHRINK_RATIO)
}

/// Horizontal shift applied to a line of `advance` width for `align`.
pub(crate) fn line_offset(align: TextAlign, advance: f32) -> f32 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -advance / 2.0,
        TextAlign::Right => -advance,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

struct PlacedRun {
    font: parley::FontData,
    font_size: f32,
    brush: TextBrushRgba8,
    glyphs: Vec<vello_cpu::Glyph>,
}

/// Process-wide font state shared by every text pass.
///
/// The system collection is scanned once, and each distinct font blob handed over by a
/// [`FontSource`] is registered once. The collection runs in fontique's shared mode, so cloned
/// contexts see registrations made after they were cloned.
struct FontLibrary {
    font_ctx: parley::FontContext,
    // requested family -> (bytes registered for it, parley family name; `None` if unparseable)
    families: HashMap<String, Vec<(FontBytes, Option<String>)>>,
}

static FONT_LIBRARY: LazyLock<Mutex<FontLibrary>> =
    LazyLock::new(|| Mutex::new(FontLibrary::new()));

impl FontLibrary {
    fn new() -> Self {
        tracing::debug!("loading system font collection");
        Self {
            font_ctx: parley::FontContext {
                collection: Collection::new(CollectionOptions {
                    shared: true,
                    system_fonts: true,
                }),
                source_cache: SourceCache::new_shared(),
            },
            families: HashMap::new(),
        }
    }

    // Registration is a single insert per blob, so a poisoned library is still usable.
    fn lock() -> MutexGuard<'static, FontLibrary> {
        FONT_LIBRARY.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parley family name for `bytes` registered under `family`, registering on first sight.
    fn family_name(&mut self, family: &str, bytes: &FontBytes) -> Option<String> {
        let known = self.families.entry(family.to_owned()).or_default();
        if let Some((_, name)) = known
            .iter()
            .find(|(seen, _)| Arc::ptr_eq(seen, bytes) || seen[..] == bytes[..])
        {
            return name.clone();
        }

        let blob = Blob::new(Arc::new(Arc::clone(bytes)));
        let registered = self.font_ctx.collection.register_fonts(blob, None);
        let name = registered.first().and_then(|(id, _)| {
            self.font_ctx
                .collection
                .family_name(*id)
                .map(str::to_owned)
        });
        tracing::debug!(family, resolved = ?name, "font registered for layout");
        known.push((Arc::clone(bytes), name.clone()));
        name
    }
}

/// Parley contexts for one text pass plus the families it has resolved.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    // requested family -> parley family name; `None` when unavailable.
    families: HashMap<String, Option<String>>,
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: FontLibrary::lock().font_ctx.clone(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// CSS font stack for `family`.
    fn font_stack(&mut self, family: &str, fonts: &dyn FontSource) -> String {
        if !self.families.contains_key(family) {
            let resolved = match fonts.font(family) {
                Some(bytes) => {
                    let name = FontLibrary::lock().family_name(family, &bytes);
                    if name.is_none() {
                        tracing::warn!(
                            family,
                            fallback = DEFAULT_FONT,
                            "font data could not be parsed; using fallback"
                        );
                    }
                    name
                }
                None => {
                    tracing::warn!(
                        family,
                        fallback = DEFAULT_FONT,
                        "font not registered; using fallback"
                    );
                    None
                }
            };
            self.families.insert(family.to_owned(), resolved);
        }

        match self.families.get(family).and_then(Option::as_deref) {
            Some(name) => format!("\"{name}\", {DEFAULT_FONT}"),
            None => DEFAULT_FONT.to_owned(),
        }
    }

    /// Shape and lay out `text` with one uniform style.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        stack: &str,
        size_px: f32,
        letter_spacing: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> PosterResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PosterError::invalid_input(
                "font size must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(StyleProperty::FontStack(FontStack::Source(Cow::Owned(
            stack.to_owned(),
        ))));
        builder.push_default(StyleProperty::FontSize(size_px));
        builder.push_default(StyleProperty::LetterSpacing(letter_spacing));
        builder.push_default(StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }

    fn place_layer(
        &mut self,
        layer: &TextLayer,
        fonts: &dyn FontSource,
        out: &mut Vec<PlacedRun>,
    ) -> PosterResult<()> {
        let style = &layer.style;
        let color = Color::parse_hex(&style.color)?;
        let brush = TextBrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let text = style.text_transform.apply(&layer.content);
        if text.is_empty() {
            return Ok(());
        }

        let stack = self.font_stack(&style.font_family, fonts);
        let max_width = style.max_width.filter(|w| w.is_finite() && *w > 0.0);
        let wrap_width = match style.overflow {
            TextOverflow::Wrap => max_width,
            TextOverflow::Visible | TextOverflow::ShrinkToFit => None,
        };

        let mut layout = self.layout(
            &text,
            &stack,
            style.font_size,
            style.letter_spacing,
            brush,
            wrap_width,
        )?;
        if let (TextOverflow::ShrinkToFit, Some(limit)) = (style.overflow, max_width) {
            let fitted = fit_font_size(widest_line(&layout), limit, style.font_size);
            if fitted < style.font_size {
                tracing::debug!(
                    from = style.font_size,
                    to = fitted,
                    "shrinking text to fit max width"
                );
                layout = self.layout(&text, &stack, fitted, style.letter_spacing, brush, None)?;
            }
        }

        let Some(first_baseline) = layout.lines().next().map(|l| l.metrics().baseline) else {
            return Ok(());
        };
        let origin_y = layer.position.y as f32 - first_baseline;
        for line in layout.lines() {
            let origin_x = layer.position.x as f32 + line_offset(style.align, line.metrics().advance);
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs: Vec<vello_cpu::Glyph> = run
                    .positioned_glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: origin_x + g.x,
                        y: origin_y + g.y,
                    })
                    .collect();
                if glyphs.is_empty() {
                    continue;
                }
                out.push(PlacedRun {
                    font: run.run().font().clone(),
                    font_size: run.run().font_size(),
                    brush: run.style().brush,
                    glyphs,
                });
            }
        }
        Ok(())
    }
}

fn widest_line(layout: &parley::Layout<TextBrushRgba8>) -> f32 {
    layout
        .lines()
        .map(|l| l.metrics().advance)
        .fold(0.0f32, f32::max)
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
