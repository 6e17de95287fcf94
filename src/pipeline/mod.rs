//! Deterministic snapshot transforms: crop extraction and tonal adjustment.
//!
//! Every step either fully produces a new snapshot or returns an error; the
//! source snapshot is never touched.

mod adjust;
pub mod blend;
mod crop;

pub use adjust::{
    apply_adjustments, render_preview, AdjustmentField, AdjustmentVector, PreviewFilter,
    ADJUSTMENT_MAX, ADJUSTMENT_MIN,
};
pub use crop::{extract_crop, natural_crop_rect, NaturalRect};

use crate::snapshot::SnapshotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("crop rectangle has no area")]
    EmptyCrop,
    #[error("image has no displayable area")]
    EmptyImage,
    #[error("adjustments cannot be applied yet: {fields:?}")]
    UnbakedAdjustments { fields: Vec<AdjustmentField> },
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
