//! Mask-based restore compositor.
//!
//! Painting reveals the original image through the edited one. Neither source
//! is ever modified; only the mask accumulates strokes, and the composite is
//! rebuilt from the three buffers after every stroke.

mod brush;
mod mask;

pub use brush::{
    BrushState, BRUSH_MAX_OPACITY, BRUSH_MAX_SIZE, BRUSH_MIN_OPACITY, BRUSH_MIN_SIZE,
};
pub use mask::{DirtyRect, MaskSurface};

use image::{imageops, Rgba, RgbaImage};

use crate::geometry::{DisplayPoint, ImageSize};
use crate::mapper::CanvasScale;
use crate::snapshot::{ImageSnapshot, SnapshotResult};

/// The buffers owned by one restore session.
///
/// Everything is dropped together when the session ends.
#[derive(Debug)]
pub struct MaskCompositor {
    current: RgbaImage,
    previous: RgbaImage,
    mask: MaskSurface,
    composite: RgbaImage,
}

impl MaskCompositor {
    /// Decodes both sources at the current snapshot's size and starts from an empty mask.
    pub fn begin_session(
        current: &ImageSnapshot,
        previous: &ImageSnapshot,
    ) -> SnapshotResult<Self> {
        let current = current.decode()?;
        let mut previous = previous.decode()?;
        if previous.dimensions() != current.dimensions() {
            previous = imageops::resize(
                &previous,
                current.width(),
                current.height(),
                imageops::FilterType::Triangle,
            );
        }
        let size = ImageSize::new(current.width(), current.height());
        tracing::debug!(width = size.width, height = size.height, "restore session started");

        Ok(Self {
            composite: current.clone(),
            current,
            previous,
            mask: MaskSurface::transparent(size),
        })
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.current.width(), self.current.height())
    }

    pub fn mask(&self) -> &MaskSurface {
        &self.mask
    }

    pub fn composite(&self) -> &RgbaImage {
        &self.composite
    }

    pub fn has_strokes(&self) -> bool {
        !self.mask.is_transparent()
    }

    /// Paints one segment given in displayed canvas units, then recomposes the touched area.
    pub fn paint_stroke(
        &mut self,
        from: DisplayPoint,
        to: DisplayPoint,
        brush: &BrushState,
        scale: CanvasScale,
    ) -> Option<DirtyRect> {
        let from = scale.to_backing(from);
        let to = scale.to_backing(to);
        let dirty = self
            .mask
            .stroke_segment(from, to, f64::from(brush.size()), brush.alpha())?;
        self.recompose_region(dirty);
        Some(dirty)
    }

    /// Rebuilds the whole composite from `current`, `previous` and the mask.
    pub fn recompose(&mut self) {
        let size = self.size();
        self.recompose_region(DirtyRect {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        });
    }

    fn recompose_region(&mut self, region: DirtyRect) {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                let weight = self.mask.alpha_at(x, y);
                let current = *self.current.get_pixel(x, y);
                let composed = if weight == 0 {
                    current
                } else {
                    reveal_over(current, *self.previous.get_pixel(x, y), weight)
                };
                self.composite.put_pixel(x, y, composed);
            }
        }
    }

    /// Serializes the composite into a new snapshot, consuming the session.
    pub fn end_session(self) -> SnapshotResult<ImageSnapshot> {
        let snapshot = ImageSnapshot::from_pixels(&self.composite)?;
        tracing::debug!(snapshot = %snapshot.id(), "restore session ended");
        Ok(snapshot)
    }

    #[cfg(test)]
    fn fill_mask(&mut self, value: u8) {
        self.mask.fill(value);
    }
}

/// Clips `previous` to the mask weight and draws it source-over onto `current`.
fn reveal_over(current: Rgba<u8>, previous: Rgba<u8>, weight: u8) -> Rgba<u8> {
    let top_alpha = f32::from(previous[3]) / 255.0 * (f32::from(weight) / 255.0);
    let bottom_alpha = f32::from(current[3]) / 255.0;
    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0_u8; 4];
    for channel in 0..3 {
        let top = f32::from(previous[channel]) * top_alpha;
        let bottom = f32::from(current[channel]) * bottom_alpha * (1.0 - top_alpha);
        out[channel] = ((top + bottom) / out_alpha).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DisplaySize;
    use crate::snapshot::solid_snapshot;

    fn gradient_snapshot(width: u32, height: u32) -> ImageSnapshot {
        let pixels = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 20) as u8, (y * 20) as u8, 90, 255])
        });
        ImageSnapshot::from_pixels(&pixels).expect("gradient should encode")
    }

    fn session() -> (MaskCompositor, RgbaImage, RgbaImage) {
        let current = gradient_snapshot(10, 8);
        let previous = solid_snapshot(10, 8, [250, 10, 10, 255]);
        let compositor =
            MaskCompositor::begin_session(&current, &previous).expect("session should start");
        let current_pixels = current.decode().expect("decode current");
        let previous_pixels = previous.decode().expect("decode previous");
        (compositor, current_pixels, previous_pixels)
    }

    #[test]
    fn begin_session_renders_current_image_with_empty_mask() {
        let (compositor, current, _) = session();
        assert!(compositor.mask().is_transparent());
        assert!(!compositor.has_strokes());
        assert_eq!(compositor.composite(), &current);
    }

    #[test]
    fn transparent_mask_recomposes_to_current() {
        let (mut compositor, current, _) = session();
        compositor.recompose();
        assert_eq!(compositor.composite(), &current);
    }

    #[test]
    fn opaque_mask_recomposes_to_previous() {
        let (mut compositor, _, previous) = session();
        compositor.fill_mask(255);
        compositor.recompose();
        assert_eq!(compositor.composite(), &previous);
    }

    #[test]
    fn partial_mask_interpolates_linearly() {
        let current = solid_snapshot(2, 2, [0, 0, 0, 255]);
        let previous = solid_snapshot(2, 2, [200, 100, 50, 255]);
        let mut compositor =
            MaskCompositor::begin_session(&current, &previous).expect("session should start");
        compositor.fill_mask(51);
        compositor.recompose();
        assert_eq!(compositor.composite().get_pixel(0, 0), &Rgba([40, 20, 10, 255]));
    }

    #[test]
    fn stroke_reveals_previous_only_under_the_brush() {
        let (mut compositor, current, previous) = session();
        let brush = BrushState::new(2, 100);
        compositor
            .paint_stroke(
                DisplayPoint::new(1.5, 1.5),
                DisplayPoint::new(1.5, 1.5),
                &brush,
                CanvasScale::IDENTITY,
            )
            .expect("stroke should land");

        assert_eq!(compositor.composite().get_pixel(1, 1), previous.get_pixel(1, 1));
        assert_eq!(compositor.composite().get_pixel(8, 6), current.get_pixel(8, 6));
    }

    #[test]
    fn stroke_points_are_scaled_from_display_to_backing_pixels() {
        let (mut compositor, _, previous) = session();
        let scale = CanvasScale::new(compositor.size(), DisplaySize::new(5.0, 4.0))
            .expect("scale should exist");
        let brush = BrushState::new(2, 100);
        compositor.paint_stroke(
            DisplayPoint::new(4.25, 3.25),
            DisplayPoint::new(4.25, 3.25),
            &brush,
            scale,
        );

        assert_eq!(compositor.composite().get_pixel(8, 6), previous.get_pixel(8, 6));
        assert_eq!(compositor.mask().alpha_at(1, 1), 0);
    }

    #[test]
    fn previous_is_resized_to_current_dimensions() {
        let current = solid_snapshot(6, 4, [0, 0, 0, 255]);
        let previous = solid_snapshot(12, 8, [30, 60, 90, 255]);
        let mut compositor =
            MaskCompositor::begin_session(&current, &previous).expect("session should start");
        compositor.fill_mask(255);
        compositor.recompose();

        assert_eq!(compositor.composite().dimensions(), (6, 4));
        assert_eq!(compositor.composite().get_pixel(3, 2), &Rgba([30, 60, 90, 255]));
    }

    #[test]
    fn end_session_produces_snapshot_of_composite() {
        let (mut compositor, _, previous) = session();
        compositor.fill_mask(255);
        compositor.recompose();
        let snapshot = compositor.end_session().expect("snapshot should encode");
        assert_eq!(snapshot.decode().expect("decode"), previous);
    }
}
