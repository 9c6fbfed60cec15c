use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assets::decode::decode_image;
use crate::compose::progress::{ComposeStage, ProgressObserver, report};
use crate::encode::{ComposeResult, OutputOptions, encode_raster};
use crate::fonts::{self, FontSource};
use crate::foundation::error::{PosterError, PosterResult};
use crate::render::canvas::{CanvasOptions, create_canvas};
use crate::render::compositor::{ImageLayer, LayerOrigin, composite_decoded};
use crate::render::text::{AddTextOptions, TextLayer, add_text};
use crate::scene::catalog::{TemplateCatalog, validate};
use crate::scene::position::{center_to_top_left, resolve};

/// One composition job.
#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    /// Template id in the catalog.
    pub template_id: String,
    /// Encoded user photo.
    pub photo: Arc<[u8]>,
    /// Text values keyed by text field id.
    pub data: BTreeMap<String, String>,
    /// Output encoding; PNG without resize when `None`.
    pub output: Option<OutputOptions>,
}

impl ComposeRequest {
    /// Request with no text data and default output.
    pub fn new(template_id: impl Into<String>, photo: impl Into<Arc<[u8]>>) -> Self {
        Self {
            template_id: template_id.into(),
            photo: photo.into(),
            data: BTreeMap::new(),
            output: None,
        }
    }

    /// Set one text value.
    pub fn with_field(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(id.into(), value.into());
        self
    }

    /// Set the output options.
    pub fn with_output(mut self, output: OutputOptions) -> Self {
        self.output = Some(output);
        self
    }
}

/// Runs the poster pipeline against a template catalog and a font source.
///
/// Holds no per-request state; share one instance across threads.
pub struct PosterComposer {
    catalog: TemplateCatalog,
    fonts: Arc<dyn FontSource>,
}

impl std::fmt::Debug for PosterComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosterComposer")
            .field("templates", &self.catalog.ids())
            .finish_non_exhaustive()
    }
}

impl PosterComposer {
    /// Composer over `catalog`, reading fonts from `fonts`.
    pub fn new(catalog: TemplateCatalog, fonts: Arc<dyn FontSource>) -> Self {
        Self { catalog, fonts }
    }

    /// Built-in templates and the process-wide font registry.
    pub fn builtin() -> PosterResult<Self> {
        Ok(Self::new(TemplateCatalog::builtin()?, fonts::shared()))
    }

    /// Templates this composer draws from.
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Render and encode one poster.
    ///
    /// Errors are always one of the typed variants; internal failures surface as
    /// [`PosterError::ImageProcessing`].
    #[tracing::instrument(skip_all, fields(template_id = %request.template_id))]
    pub fn compose(
        &self,
        request: &ComposeRequest,
        progress: Option<&mut dyn ProgressObserver>,
    ) -> PosterResult<ComposeResult> {
        let mut progress = progress;
        match self.run(request, &mut progress) {
            Ok(result) => Ok(result),
            Err(error) if error.is_typed() => Err(error),
            Err(error) => {
                tracing::error!(error = %format!("{error:#}"), "composition failed");
                Err(PosterError::image_processing(format!(
                    "Failed to compose poster: {error:#}"
                )))
            }
        }
    }

    fn run(
        &self,
        request: &ComposeRequest,
        progress: &mut Option<&mut dyn ProgressObserver>,
    ) -> PosterResult<ComposeResult> {
        report(progress, ComposeStage::LoadingTemplate);
        let template = self.catalog.lookup(&request.template_id)?;

        validate(&template, &request.data)?;
        let photo = decode_image(&request.photo)?;
        if photo.width() == 0 || photo.height() == 0 {
            return Err(PosterError::invalid_input("photo has zero width or height"));
        }
        let output = request.output.unwrap_or_default();
        output.validate_for(template.canvas)?;

        report(progress, ComposeStage::CreatingBackground);
        let canvas = create_canvas(&CanvasOptions {
            width: template.canvas.width,
            height: template.canvas.height,
            fill: template.background.clone(),
        })?;

        report(progress, ComposeStage::ProcessingPhoto);
        let layers: Vec<ImageLayer> = template
            .photo_slots
            .iter()
            .map(|slot| {
                let center = resolve(slot.position, template.canvas);
                ImageLayer {
                    image: Arc::clone(&request.photo),
                    position: center_to_top_left(center, slot.size),
                    origin: LayerOrigin::TopLeft,
                    size: slot.size,
                    mask: slot.mask,
                    border: slot.border.clone(),
                    shadow: slot.shadow.clone(),
                }
            })
            .collect();

        report(progress, ComposeStage::CompositingPhoto);
        let composed = composite_decoded(canvas, &layers, &photo)?;

        report(progress, ComposeStage::RenderingText);
        let text_layers = template
            .text_fields
            .iter()
            .filter_map(|field| {
                let content = request.data.get(&field.id)?;
                Some(TextLayer {
                    content: content.clone(),
                    position: resolve(field.position, template.canvas),
                    style: field.style.clone(),
                })
            })
            .collect();
        let with_text = add_text(
            AddTextOptions {
                image: composed,
                layers: text_layers,
            },
            self.fonts.as_ref(),
        )?;

        report(progress, ComposeStage::EncodingOutput);
        let result = encode_raster(&with_text, &output)?;

        report(progress, ComposeStage::Complete);
        Ok(result)
    }
}

/// [`PosterComposer::compose`] with the built-in templates and the process-wide font registry.
pub fn compose_poster(
    request: &ComposeRequest,
    progress: Option<&mut dyn ProgressObserver>,
) -> PosterResult<ComposeResult> {
    let composer = PosterComposer::builtin().map_err(|e| {
        PosterError::image_processing(format!("Failed to compose poster: {e}"))
    })?;
    composer.compose(request, progress)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/poster.rs"]
mod tests;
