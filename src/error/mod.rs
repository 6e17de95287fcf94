use crate::generation::GenerationError;
use crate::pipeline::PipelineError;
use crate::snapshot::SnapshotError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("restore canvas is not ready")]
    CanvasNotReady,
    #[error("no image loaded")]
    NoImage,
}

impl AppError {
    /// Text shown in the session's error slot.
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
