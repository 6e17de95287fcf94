pub const BRUSH_MIN_SIZE: u32 = 1;
pub const BRUSH_MAX_SIZE: u32 = 500;
pub const BRUSH_MIN_OPACITY: u8 = 10;
pub const BRUSH_MAX_OPACITY: u8 = 100;

/// Restore brush parameters, independent of any single stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushState {
    size: u32,
    opacity: u8,
}

impl Default for BrushState {
    fn default() -> Self {
        Self {
            size: 40,
            opacity: BRUSH_MAX_OPACITY,
        }
    }
}

impl BrushState {
    pub fn new(size: u32, opacity: u8) -> Self {
        let mut brush = Self::default();
        brush.set_size(size);
        brush.set_opacity(opacity);
        brush
    }

    /// Stroke width in natural pixels.
    pub const fn size(&self) -> u32 {
        self.size
    }

    pub const fn opacity_percent(&self) -> u8 {
        self.opacity
    }

    pub fn alpha(&self) -> f32 {
        f32::from(self.opacity) / 100.0
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size.clamp(BRUSH_MIN_SIZE, BRUSH_MAX_SIZE);
    }

    pub fn set_opacity(&mut self, opacity: u8) {
        self.opacity = opacity.clamp(BRUSH_MIN_OPACITY, BRUSH_MAX_OPACITY);
    }
}
