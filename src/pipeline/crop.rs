use image::imageops;

use super::{PipelineError, PipelineResult};
use crate::geometry::{DisplayRect, DisplaySize, ImageSize};
use crate::snapshot::ImageSnapshot;

/// A crop rectangle resolved into natural pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Scales a rect drawn over the displayed image into the natural pixel grid,
/// clamped to the image bounds.
pub fn natural_crop_rect(
    displayed_rect: DisplayRect,
    displayed_size: DisplaySize,
    natural_size: ImageSize,
) -> PipelineResult<NaturalRect> {
    if !displayed_rect.has_area() {
        return Err(PipelineError::EmptyCrop);
    }
    if displayed_size.is_empty() || natural_size.is_empty() {
        return Err(PipelineError::EmptyImage);
    }

    let sx = f64::from(natural_size.width) / displayed_size.width;
    let sy = f64::from(natural_size.height) / displayed_size.height;
    let max_x = f64::from(natural_size.width);
    let max_y = f64::from(natural_size.height);

    let left = (displayed_rect.x * sx).round().clamp(0.0, max_x);
    let top = (displayed_rect.y * sy).round().clamp(0.0, max_y);
    let right = ((displayed_rect.x + displayed_rect.width) * sx)
        .round()
        .clamp(0.0, max_x);
    let bottom = ((displayed_rect.y + displayed_rect.height) * sy)
        .round()
        .clamp(0.0, max_y);
    if right <= left || bottom <= top {
        return Err(PipelineError::EmptyCrop);
    }

    Ok(NaturalRect {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

pub fn extract_crop(
    source: &ImageSnapshot,
    displayed_rect: DisplayRect,
    displayed_size: DisplaySize,
    natural_size: ImageSize,
) -> PipelineResult<ImageSnapshot> {
    let rect = natural_crop_rect(displayed_rect, displayed_size, natural_size)?;
    let pixels = source.decode()?;
    let cropped = imageops::crop_imm(&pixels, rect.x, rect.y, rect.width, rect.height).to_image();
    if cropped.width() == 0 || cropped.height() == 0 {
        return Err(PipelineError::EmptyCrop);
    }
    tracing::debug!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        "crop extracted"
    );
    Ok(ImageSnapshot::from_pixels(&cropped)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn coordinate_snapshot(width: u32, height: u32) -> ImageSnapshot {
        let pixels = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, (x / 256) as u8, 255])
        });
        ImageSnapshot::from_pixels(&pixels).expect("encode should work")
    }

    #[test]
    fn displayed_rect_scales_into_natural_pixels() {
        let rect = natural_crop_rect(
            DisplayRect::new(10.0, 10.0, 100.0, 50.0),
            DisplaySize::new(500.0, 500.0),
            ImageSize::new(1000, 1000),
        )
        .expect("rect should resolve");
        assert_eq!(
            rect,
            NaturalRect {
                x: 20,
                y: 20,
                width: 200,
                height: 100,
            }
        );
    }

    #[test]
    fn extract_crop_copies_the_natural_sub_rectangle() {
        let source = coordinate_snapshot(1000, 1000);
        let cropped = extract_crop(
            &source,
            DisplayRect::new(10.0, 10.0, 100.0, 50.0),
            DisplaySize::new(500.0, 500.0),
            ImageSize::new(1000, 1000),
        )
        .expect("crop should succeed");

        assert_eq!(cropped.size(), ImageSize::new(200, 100));
        let pixels = cropped.decode().expect("decode");
        assert_eq!(pixels.get_pixel(0, 0), &Rgba([20, 20, 0, 255]));
        assert_eq!(pixels.get_pixel(199, 99), &Rgba([219, 119, 0, 255]));
    }

    #[test]
    fn empty_rect_is_unavailable() {
        let err = natural_crop_rect(
            DisplayRect::new(10.0, 10.0, 0.0, 50.0),
            DisplaySize::new(500.0, 500.0),
            ImageSize::new(1000, 1000),
        )
        .expect_err("zero width must fail");
        assert!(matches!(err, PipelineError::EmptyCrop));
    }

    #[test]
    fn rect_is_clamped_to_image_bounds() {
        let rect = natural_crop_rect(
            DisplayRect::new(450.0, -20.0, 100.0, 100.0),
            DisplaySize::new(500.0, 500.0),
            ImageSize::new(1000, 1000),
        )
        .expect("rect should resolve");
        assert_eq!(
            rect,
            NaturalRect {
                x: 900,
                y: 0,
                width: 100,
                height: 160,
            }
        );
    }

    #[test]
    fn rect_entirely_outside_image_is_unavailable() {
        let err = natural_crop_rect(
            DisplayRect::new(600.0, 600.0, 50.0, 50.0),
            DisplaySize::new(500.0, 500.0),
            ImageSize::new(1000, 1000),
        )
        .expect_err("outside rect must fail");
        assert!(matches!(err, PipelineError::EmptyCrop));
    }
}
