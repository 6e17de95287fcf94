//! Pointer-to-pixel mapping for letterboxed ("contain") image elements.

use crate::geometry::{DisplayPoint, DisplaySize, ImageSize, NaturalPoint};

/// Where a contain-fitted image actually lands inside its element box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainFit {
    pub fn contains(&self, point: DisplayPoint) -> bool {
        point.x >= self.offset_x
            && point.x <= self.offset_x + self.width
            && point.y >= self.offset_y
            && point.y <= self.offset_y + self.height
    }
}

pub fn contain_fit(natural: ImageSize, client: DisplaySize) -> Option<ContainFit> {
    if natural.is_empty() || client.is_empty() {
        return None;
    }

    let rendered_aspect = f64::from(natural.width) / f64::from(natural.height);
    let client_aspect = client.width / client.height;

    let fit = if rendered_aspect > client_aspect {
        let height = client.width / rendered_aspect;
        ContainFit {
            offset_x: 0.0,
            offset_y: (client.height - height) / 2.0,
            width: client.width,
            height,
        }
    } else {
        let width = client.height * rendered_aspect;
        ContainFit {
            offset_x: (client.width - width) / 2.0,
            offset_y: 0.0,
            width,
            height: client.height,
        }
    };
    Some(fit)
}

/// Maps a pointer position (relative to the element) into natural pixels.
///
/// Returns `None` when the pointer lands in a letterbox band.
pub fn pointer_to_natural(
    natural: ImageSize,
    client: DisplaySize,
    pointer: DisplayPoint,
) -> Option<NaturalPoint> {
    let fit = contain_fit(natural, client)?;
    if !fit.contains(pointer) {
        return None;
    }

    let scale_x = f64::from(natural.width) / fit.width;
    let scale_y = f64::from(natural.height) / fit.height;
    let x = ((pointer.x - fit.offset_x) * scale_x).round();
    let y = ((pointer.y - fit.offset_y) * scale_y).round();
    // The far edge of the rendered box rounds to `width`/`height`, one past the last pixel.
    let max_x = f64::from(natural.width - 1);
    let max_y = f64::from(natural.height - 1);
    Some(NaturalPoint::new(
        x.clamp(0.0, max_x) as u32,
        y.clamp(0.0, max_y) as u32,
    ))
}

/// Inverse of [`pointer_to_natural`], used to place the hotspot marker.
pub fn natural_to_display(
    natural: ImageSize,
    client: DisplaySize,
    point: NaturalPoint,
) -> Option<DisplayPoint> {
    let fit = contain_fit(natural, client)?;
    let x = fit.offset_x + f64::from(point.x) * fit.width / f64::from(natural.width);
    let y = fit.offset_y + f64::from(point.y) * fit.height / f64::from(natural.height);
    Some(DisplayPoint::new(x, y))
}

/// Ratio between a canvas backing store and its displayed size.
///
/// The restore canvas always matches the image aspect, so no letterboxing applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasScale {
    pub x: f64,
    pub y: f64,
}

impl CanvasScale {
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };

    pub fn new(backing: ImageSize, displayed: DisplaySize) -> Option<Self> {
        if backing.is_empty() || displayed.is_empty() {
            return None;
        }
        let x = f64::from(backing.width) / displayed.width;
        let y = f64::from(backing.height) / displayed.height;
        if !(x.is_finite() && y.is_finite()) || x <= 0.0 || y <= 0.0 {
            return None;
        }
        Some(Self { x, y })
    }

    pub fn to_backing(&self, point: DisplayPoint) -> DisplayPoint {
        DisplayPoint::new(point.x * self.x, point.y * self.y)
    }

    /// On-screen diameter of a brush whose size is given in backing-store pixels.
    pub fn brush_cursor_diameter(&self, brush_size: f64) -> f64 {
        brush_size / self.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDE: ImageSize = ImageSize::new(1000, 500);
    const SQUARE_BOX: DisplaySize = DisplaySize::new(400.0, 400.0);

    #[test]
    fn wide_image_in_square_box_is_letterboxed_vertically() {
        let fit = contain_fit(WIDE, SQUARE_BOX).expect("fit should exist");
        assert_eq!(
            fit,
            ContainFit {
                offset_x: 0.0,
                offset_y: 100.0,
                width: 400.0,
                height: 200.0,
            }
        );
    }

    #[test]
    fn tall_image_in_square_box_is_pillarboxed() {
        let fit = contain_fit(ImageSize::new(500, 1000), SQUARE_BOX).expect("fit should exist");
        assert_eq!(fit.offset_x, 100.0);
        assert_eq!(fit.offset_y, 0.0);
        assert_eq!(fit.width, 200.0);
        assert_eq!(fit.height, 400.0);
    }

    #[test]
    fn pointer_inside_image_maps_to_natural_pixels() {
        let point = pointer_to_natural(WIDE, SQUARE_BOX, DisplayPoint::new(200.0, 100.0));
        assert_eq!(point, Some(NaturalPoint::new(500, 0)));

        let point = pointer_to_natural(WIDE, SQUARE_BOX, DisplayPoint::new(100.0, 200.0));
        assert_eq!(point, Some(NaturalPoint::new(250, 250)));
    }

    #[test]
    fn pointer_in_letterbox_band_is_outside_image() {
        assert_eq!(
            pointer_to_natural(WIDE, SQUARE_BOX, DisplayPoint::new(0.0, 0.0)),
            None
        );
        assert_eq!(
            pointer_to_natural(WIDE, SQUARE_BOX, DisplayPoint::new(200.0, 350.0)),
            None
        );
    }

    #[test]
    fn far_edge_clamps_to_last_pixel() {
        let point = pointer_to_natural(WIDE, SQUARE_BOX, DisplayPoint::new(400.0, 300.0));
        assert_eq!(point, Some(NaturalPoint::new(999, 499)));
    }

    #[test]
    fn empty_dimensions_produce_no_mapping() {
        assert!(contain_fit(ImageSize::new(0, 10), SQUARE_BOX).is_none());
        assert!(contain_fit(WIDE, DisplaySize::new(0.0, 10.0)).is_none());
    }

    #[test]
    fn natural_to_display_inverts_pointer_mapping() {
        let marker = natural_to_display(WIDE, SQUARE_BOX, NaturalPoint::new(500, 250))
            .expect("marker should map");
        assert_eq!(marker, DisplayPoint::new(200.0, 200.0));
        assert_eq!(
            pointer_to_natural(WIDE, SQUARE_BOX, marker),
            Some(NaturalPoint::new(500, 250))
        );
    }

    #[test]
    fn canvas_scale_maps_display_points_and_cursor_size() {
        let scale = CanvasScale::new(ImageSize::new(1000, 500), DisplaySize::new(500.0, 250.0))
            .expect("scale should exist");
        assert_eq!(
            scale.to_backing(DisplayPoint::new(10.0, 20.0)),
            DisplayPoint::new(20.0, 40.0)
        );
        assert_eq!(scale.brush_cursor_diameter(40.0), 20.0);
    }

    #[test]
    fn canvas_scale_rejects_degenerate_display_sizes() {
        let backing = ImageSize::new(1000, 500);
        let tiny = f64::MIN_POSITIVE / 4.0;
        assert!(CanvasScale::new(backing, DisplaySize::new(tiny, 250.0)).is_none());
        assert!(CanvasScale::new(backing, DisplaySize::new(f64::INFINITY, 250.0)).is_none());
        assert!(CanvasScale::new(backing, DisplaySize::new(500.0, f64::NAN)).is_none());
    }
}
