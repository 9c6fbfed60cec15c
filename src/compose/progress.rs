use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;

/// Pipeline stage reported to a [`ProgressObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComposeStage {
    /// Template lookup.
    LoadingTemplate,
    /// Canvas synthesis.
    CreatingBackground,
    /// Photo slot placement.
    ProcessingPhoto,
    /// Photo compositing.
    CompositingPhoto,
    /// Text drawing.
    RenderingText,
    /// Resize and encode.
    EncodingOutput,
    /// Done.
    Complete,
}

impl ComposeStage {
    /// Every stage in pipeline order.
    pub const ALL: [Self; 7] = [
        Self::LoadingTemplate,
        Self::CreatingBackground,
        Self::ProcessingPhoto,
        Self::CompositingPhoto,
        Self::RenderingText,
        Self::EncodingOutput,
        Self::Complete,
    ];

    /// Kebab-case stage name.
    pub fn name(self) -> &'static str {
        match self {
            Self::LoadingTemplate => "loading-template",
            Self::CreatingBackground => "creating-background",
            Self::ProcessingPhoto => "processing-photo",
            Self::CompositingPhoto => "compositing-photo",
            Self::RenderingText => "rendering-text",
            Self::EncodingOutput => "encoding-output",
            Self::Complete => "complete",
        }
    }

    /// Progress percentage reported when the stage starts.
    pub fn percent(self) -> u8 {
        match self {
            Self::LoadingTemplate => 0,
            Self::CreatingBackground => 10,
            Self::ProcessingPhoto => 30,
            Self::CompositingPhoto => 50,
            Self::RenderingText => 70,
            Self::EncodingOutput => 90,
            Self::Complete => 100,
        }
    }
}

impl fmt::Display for ComposeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives stage notifications during composition.
///
/// A returned error or a panic is logged and composition continues.
/// Closures `FnMut(ComposeStage, u8)` implement this trait directly.
pub trait ProgressObserver {
    /// Called once per stage, in pipeline order.
    fn on_progress(&mut self, stage: ComposeStage, percent: u8) -> anyhow::Result<()>;
}

impl<F> ProgressObserver for F
where
    F: FnMut(ComposeStage, u8),
{
    fn on_progress(&mut self, stage: ComposeStage, percent: u8) -> anyhow::Result<()> {
        self(stage, percent);
        Ok(())
    }
}

/// Forward `stage` to the observer, containing any failure.
pub(crate) fn report(observer: &mut Option<&mut dyn ProgressObserver>, stage: ComposeStage) {
    let percent = stage.percent();
    tracing::debug!(stage = stage.name(), percent, "compose stage");
    let Some(observer) = observer.as_deref_mut() else {
        return;
    };

    match catch_unwind(AssertUnwindSafe(|| observer.on_progress(stage, percent))) {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            tracing::warn!(stage = stage.name(), %error, "progress observer failed");
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            tracing::warn!(stage = stage.name(), panic = %message, "progress observer panicked");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/progress.rs"]
mod tests;
