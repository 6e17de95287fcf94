use image::{GrayImage, Luma};

use crate::geometry::{DisplayPoint, ImageSize};

/// Inclusive-exclusive pixel bounds touched by a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 8-bit alpha accumulator for restore strokes.
///
/// Strokes are composited with source-over, so coverage only ever grows and
/// repeated passes approach (never exceed) full opacity.
#[derive(Debug, Clone)]
pub struct MaskSurface {
    alpha: GrayImage,
}

impl MaskSurface {
    pub fn transparent(size: ImageSize) -> Self {
        Self {
            alpha: GrayImage::new(size.width, size.height),
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.alpha.width(), self.alpha.height())
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha.get_pixel(x, y)[0]
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha.as_raw().iter().all(|&value| value == 0)
    }

    pub fn clear(&mut self) {
        self.alpha.fill(0);
    }

    pub(super) fn fill(&mut self, value: u8) {
        self.alpha.fill(value);
    }

    /// Draws a round-capped segment of `width` pixels with the given source alpha.
    ///
    /// Returns the touched region, or `None` when the segment misses the surface.
    pub fn stroke_segment(
        &mut self,
        from: DisplayPoint,
        to: DisplayPoint,
        width: f64,
        alpha: f32,
    ) -> Option<DirtyRect> {
        if !(from.is_finite() && to.is_finite() && width.is_finite()) {
            return None;
        }
        let radius = (width / 2.0).max(0.5);
        let dirty = segment_bounds(from, to, radius, self.size())?;
        let alpha = alpha.clamp(0.0, 1.0);

        for y in dirty.y..dirty.y + dirty.height {
            for x in dirty.x..dirty.x + dirty.width {
                let center = DisplayPoint::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let distance = distance_to_segment(center, from, to);
                let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let source = alpha * coverage as f32;
                let pixel = self.alpha.get_pixel_mut(x, y);
                let destination = f32::from(pixel[0]) / 255.0;
                let accumulated = source + destination * (1.0 - source);
                *pixel = Luma([(accumulated * 255.0).round().clamp(0.0, 255.0) as u8]);
            }
        }
        Some(dirty)
    }
}

fn segment_bounds(
    from: DisplayPoint,
    to: DisplayPoint,
    radius: f64,
    size: ImageSize,
) -> Option<DirtyRect> {
    if size.is_empty() {
        return None;
    }
    let pad = radius + 1.0;
    let left = (from.x.min(to.x) - pad).floor().max(0.0);
    let top = (from.y.min(to.y) - pad).floor().max(0.0);
    let right = (from.x.max(to.x) + pad).ceil().min(f64::from(size.width));
    let bottom = (from.y.max(to.y) + pad).ceil().min(f64::from(size.height));
    if right <= left || bottom <= top {
        return None;
    }
    Some(DirtyRect {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

fn distance_to_segment(point: DisplayPoint, from: DisplayPoint, to: DisplayPoint) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_squared = dx * dx + dy * dy;
    let t = if length_squared > 0.0 {
        (((point.x - from.x) * dx + (point.y - from.y) * dy) / length_squared).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let nearest_x = from.x + t * dx;
    let nearest_y = from.y + t * dy;
    (point.x - nearest_x).hypot(point.y - nearest_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mask_is_fully_transparent() {
        let mask = MaskSurface::transparent(ImageSize::new(8, 8));
        assert!(mask.is_transparent());
    }

    #[test]
    fn stroke_covers_segment_and_leaves_far_pixels_untouched() {
        let mut mask = MaskSurface::transparent(ImageSize::new(40, 20));
        let dirty = mask
            .stroke_segment(
                DisplayPoint::new(5.0, 10.0),
                DisplayPoint::new(30.0, 10.0),
                6.0,
                1.0,
            )
            .expect("segment should hit surface");

        assert_eq!(mask.alpha_at(15, 10), 255);
        assert_eq!(mask.alpha_at(5, 9), 255);
        assert_eq!(mask.alpha_at(15, 0), 0);
        assert_eq!(mask.alpha_at(39, 10), 0);
        assert!(dirty.x <= 5 && dirty.x + dirty.width >= 31);
    }

    #[test]
    fn zero_length_segment_paints_a_round_dot() {
        let mut mask = MaskSurface::transparent(ImageSize::new(20, 20));
        let point = DisplayPoint::new(10.0, 10.0);
        mask.stroke_segment(point, point, 8.0, 1.0);

        assert_eq!(mask.alpha_at(10, 10), 255);
        assert_eq!(mask.alpha_at(10, 7), 255);
        assert_eq!(mask.alpha_at(16, 16), 0);
    }

    #[test]
    fn overlapping_strokes_accumulate_towards_but_never_past_full() {
        let mut mask = MaskSurface::transparent(ImageSize::new(10, 10));
        let from = DisplayPoint::new(0.0, 5.0);
        let to = DisplayPoint::new(10.0, 5.0);

        mask.stroke_segment(from, to, 6.0, 0.6);
        assert_eq!(mask.alpha_at(5, 5), 153);
        mask.stroke_segment(from, to, 6.0, 0.6);
        assert_eq!(mask.alpha_at(5, 5), 214);

        for _ in 0..20 {
            mask.stroke_segment(from, to, 6.0, 0.6);
        }
        assert_eq!(mask.alpha_at(5, 5), 255);
    }

    #[test]
    fn segment_outside_surface_is_ignored() {
        let mut mask = MaskSurface::transparent(ImageSize::new(10, 10));
        let dirty = mask.stroke_segment(
            DisplayPoint::new(100.0, 100.0),
            DisplayPoint::new(120.0, 100.0),
            4.0,
            1.0,
        );
        assert!(dirty.is_none());
        assert!(mask.is_transparent());
    }

    #[test]
    fn non_finite_segment_leaves_painted_pixels_alone() {
        let mut mask = MaskSurface::transparent(ImageSize::new(10, 10));
        let center = DisplayPoint::new(5.5, 5.5);
        mask.stroke_segment(center, center, 20.0, 1.0);
        assert_eq!(mask.alpha_at(5, 5), 255);

        let dirty = mask.stroke_segment(DisplayPoint::new(f64::NAN, 5.0), center, 4.0, 1.0);
        assert!(dirty.is_none());
        let dirty = mask.stroke_segment(center, center, f64::INFINITY, 1.0);
        assert!(dirty.is_none());
        assert_eq!(mask.alpha_at(5, 5), 255);
    }
}
