/// Convenience result type used across posterkit.
pub type PosterResult<T> = Result<T, PosterError>;

/// Error taxonomy exposed by the composition engine.
///
/// `Other` only travels between internal raster helpers. The composition entry point rewraps it
/// into [`PosterError::ImageProcessing`] so callers only ever observe the four typed variants.
#[derive(thiserror::Error, Debug)]
pub enum PosterError {
    /// No template with the requested id exists in the catalog.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Caller-supplied data, photo bytes, fill or mask specs are malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Explicit font registration failed.
    #[error("failed to load font '{name}': {reason}")]
    FontLoad {
        /// Family name the caller tried to register.
        name: String,
        /// Human-readable cause.
        reason: String,
    },

    /// Raster or encode failure.
    #[error("image processing error: {0}")]
    ImageProcessing(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PosterError {
    /// Build a [`PosterError::TemplateNotFound`] value.
    pub fn template_not_found(id: impl Into<String>) -> Self {
        Self::TemplateNotFound(id.into())
    }

    /// Build a [`PosterError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`PosterError::FontLoad`] value.
    pub fn font_load(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FontLoad {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`PosterError::ImageProcessing`] value.
    pub fn image_processing(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Return `true` for the typed variants that must cross the composition boundary unchanged.
    pub fn is_typed(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
