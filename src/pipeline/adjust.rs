use image::RgbaImage;

use super::blend::{self, BlendMode};
use super::{PipelineError, PipelineResult};
use crate::geometry::Color;
use crate::snapshot::ImageSnapshot;

pub const ADJUSTMENT_MIN: i32 = -100;
pub const ADJUSTMENT_MAX: i32 = 100;

const WARM_TINT: Color = Color::new(255, 165, 0);
const COOL_TINT: Color = Color::new(0, 100, 255);
const MAGENTA_TINT: Color = Color::new(255, 0, 255);
const GREEN_TINT: Color = Color::new(0, 255, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentField {
    Temperature,
    Tint,
    Exposure,
    Contrast,
    Highlights,
    Shadows,
    Whites,
    Blacks,
    Clarity,
    Vibrance,
    Saturation,
}

impl AdjustmentField {
    pub const ALL: [AdjustmentField; 11] = [
        Self::Temperature,
        Self::Tint,
        Self::Exposure,
        Self::Contrast,
        Self::Highlights,
        Self::Shadows,
        Self::Whites,
        Self::Blacks,
        Self::Clarity,
        Self::Vibrance,
        Self::Saturation,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Tint => "Tint",
            Self::Exposure => "Exposure",
            Self::Contrast => "Contrast",
            Self::Highlights => "Highlights",
            Self::Shadows => "Shadows",
            Self::Whites => "Whites",
            Self::Blacks => "Blacks",
            Self::Clarity => "Clarity",
            Self::Vibrance => "Vibrance",
            Self::Saturation => "Saturation",
        }
    }

    /// Whether committing applies this field to pixels.
    ///
    /// Unbaked fields only influence the live preview.
    pub const fn is_baked(self) -> bool {
        matches!(
            self,
            Self::Temperature | Self::Tint | Self::Exposure | Self::Contrast | Self::Saturation
        )
    }
}

/// Signed tonal parameters, each in `-100..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdjustmentVector {
    pub temperature: i32,
    pub tint: i32,
    pub exposure: i32,
    pub contrast: i32,
    pub highlights: i32,
    pub shadows: i32,
    pub whites: i32,
    pub blacks: i32,
    pub clarity: i32,
    pub vibrance: i32,
    pub saturation: i32,
}

impl AdjustmentVector {
    pub const ZERO: Self = Self {
        temperature: 0,
        tint: 0,
        exposure: 0,
        contrast: 0,
        highlights: 0,
        shadows: 0,
        whites: 0,
        blacks: 0,
        clarity: 0,
        vibrance: 0,
        saturation: 0,
    };

    pub fn get(&self, field: AdjustmentField) -> i32 {
        *self.slot(field)
    }

    pub fn set(&mut self, field: AdjustmentField, value: i32) {
        *self.slot_mut(field) = value.clamp(ADJUSTMENT_MIN, ADJUSTMENT_MAX);
    }

    pub fn reset(&mut self, field: AdjustmentField) {
        *self.slot_mut(field) = 0;
    }

    pub fn reset_all(&mut self) {
        *self = Self::ZERO;
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Non-zero fields that committing would not apply.
    pub fn unbaked_changes(&self) -> Vec<AdjustmentField> {
        AdjustmentField::ALL
            .into_iter()
            .filter(|field| !field.is_baked() && self.get(*field) != 0)
            .collect()
    }

    fn slot(&self, field: AdjustmentField) -> &i32 {
        match field {
            AdjustmentField::Temperature => &self.temperature,
            AdjustmentField::Tint => &self.tint,
            AdjustmentField::Exposure => &self.exposure,
            AdjustmentField::Contrast => &self.contrast,
            AdjustmentField::Highlights => &self.highlights,
            AdjustmentField::Shadows => &self.shadows,
            AdjustmentField::Whites => &self.whites,
            AdjustmentField::Blacks => &self.blacks,
            AdjustmentField::Clarity => &self.clarity,
            AdjustmentField::Vibrance => &self.vibrance,
            AdjustmentField::Saturation => &self.saturation,
        }
    }

    fn slot_mut(&mut self, field: AdjustmentField) -> &mut i32 {
        match field {
            AdjustmentField::Temperature => &mut self.temperature,
            AdjustmentField::Tint => &mut self.tint,
            AdjustmentField::Exposure => &mut self.exposure,
            AdjustmentField::Contrast => &mut self.contrast,
            AdjustmentField::Highlights => &mut self.highlights,
            AdjustmentField::Shadows => &mut self.shadows,
            AdjustmentField::Whites => &mut self.whites,
            AdjustmentField::Blacks => &mut self.blacks,
            AdjustmentField::Clarity => &mut self.clarity,
            AdjustmentField::Vibrance => &mut self.vibrance,
            AdjustmentField::Saturation => &mut self.saturation,
        }
    }
}

/// Filter factors for the live preview.
///
/// Highlights and shadows nudge brightness and vibrance folds into
/// saturation. Whites, blacks and clarity have no preview approximation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewFilter {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl PreviewFilter {
    pub fn from_vector(vector: &AdjustmentVector) -> Self {
        let exposure = 1.0 + percent(vector.exposure);
        let tone_nudge = 1.0 + (vector.highlights + vector.shadows) as f32 / 400.0;
        Self {
            brightness: exposure * tone_nudge,
            contrast: 1.0 + percent(vector.contrast),
            saturation: 1.0 + (vector.saturation as f32 + vector.vibrance as f32 / 2.0) / 100.0,
        }
    }

    fn committed(vector: &AdjustmentVector) -> Self {
        Self {
            brightness: 1.0 + percent(vector.exposure),
            contrast: 1.0 + percent(vector.contrast),
            saturation: 1.0 + percent(vector.saturation),
        }
    }
}

fn percent(value: i32) -> f32 {
    value as f32 / 100.0
}

fn apply_kernels(pixels: &mut RgbaImage, filter: PreviewFilter, vector: &AdjustmentVector) {
    blend::scale_brightness(pixels, filter.brightness);
    blend::scale_contrast(pixels, filter.contrast);
    blend::scale_saturation(pixels, filter.saturation);

    match vector.temperature.signum() {
        1 => blend::blend_color(
            pixels,
            BlendMode::Overlay,
            WARM_TINT,
            vector.temperature as f32 / 200.0,
        ),
        -1 => blend::blend_color(
            pixels,
            BlendMode::Overlay,
            COOL_TINT,
            -vector.temperature as f32 / 200.0,
        ),
        _ => {}
    }

    match vector.tint.signum() {
        1 => blend::blend_color(
            pixels,
            BlendMode::ColorDodge,
            MAGENTA_TINT,
            vector.tint as f32 / 400.0,
        ),
        -1 => blend::blend_color(
            pixels,
            BlendMode::ColorDodge,
            GREEN_TINT,
            -vector.tint as f32 / 400.0,
        ),
        _ => {}
    }
}

/// Bakes exposure, contrast, saturation, temperature and tint into a new snapshot.
///
/// Callers must not commit while [`AdjustmentVector::unbaked_changes`] is non-empty;
/// such vectors are rejected with [`PipelineError::UnbakedAdjustments`].
pub fn apply_adjustments(
    source: &ImageSnapshot,
    vector: &AdjustmentVector,
) -> PipelineResult<ImageSnapshot> {
    let unbaked = vector.unbaked_changes();
    if !unbaked.is_empty() {
        return Err(PipelineError::UnbakedAdjustments { fields: unbaked });
    }
    let mut pixels = source.decode()?;
    apply_kernels(&mut pixels, PreviewFilter::committed(vector), vector);
    tracing::debug!(?vector, "adjustments baked");
    Ok(ImageSnapshot::from_pixels(&pixels)?)
}

/// Renders the live preview approximation without producing a snapshot.
pub fn render_preview(source: &RgbaImage, vector: &AdjustmentVector) -> RgbaImage {
    let mut pixels = source.clone();
    apply_kernels(&mut pixels, PreviewFilter::from_vector(vector), vector);
    pixels
}
