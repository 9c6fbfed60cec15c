//! The composition pipeline: template lookup through encoded output.

mod poster;
mod progress;

pub use poster::{ComposeRequest, PosterComposer, compose_poster};
pub use progress::{ComposeStage, ProgressObserver};
