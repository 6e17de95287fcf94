//! Per-channel blend formulas and the color kernels shared by commit and preview.

use image::{Rgba, RgbaImage};

use crate::geometry::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Overlay,
    ColorDodge,
}

impl BlendMode {
    pub fn channel(self, base: f32, blend: f32) -> f32 {
        match self {
            Self::Overlay => overlay_channel(base, blend),
            Self::ColorDodge => color_dodge_channel(base, blend),
        }
    }
}

pub fn overlay_channel(base: f32, blend: f32) -> f32 {
    if base <= 127.0 {
        2.0 * base * blend / 255.0
    } else {
        255.0 - 2.0 * (255.0 - base) * (255.0 - blend) / 255.0
    }
}

pub fn color_dodge_channel(base: f32, blend: f32) -> f32 {
    if base <= 0.0 {
        return 0.0;
    }
    if blend >= 255.0 {
        return 255.0;
    }
    (base / (1.0 - blend / 255.0)).min(255.0)
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Blends a flat color over every pixel, mixing the blended result back in at `alpha`.
pub fn blend_color(pixels: &mut RgbaImage, mode: BlendMode, color: Color, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let color = color.channels().map(f32::from);
    for pixel in pixels.pixels_mut() {
        for (channel, blend) in color.iter().enumerate() {
            let base = f32::from(pixel[channel]);
            let blended = mode.channel(base, *blend);
            pixel[channel] = to_channel(base + (blended - base) * alpha);
        }
    }
}

pub fn scale_brightness(pixels: &mut RgbaImage, factor: f32) {
    if factor == 1.0 {
        return;
    }
    let factor = factor.max(0.0);
    for pixel in pixels.pixels_mut() {
        for channel in 0..3 {
            pixel[channel] = to_channel(f32::from(pixel[channel]) * factor);
        }
    }
}

/// Scales channel distance from mid-gray.
pub fn scale_contrast(pixels: &mut RgbaImage, factor: f32) {
    if factor == 1.0 {
        return;
    }
    let factor = factor.max(0.0);
    for pixel in pixels.pixels_mut() {
        for channel in 0..3 {
            let value = f32::from(pixel[channel]);
            pixel[channel] = to_channel((value - 127.5) * factor + 127.5);
        }
    }
}

/// Saturation via the luminance-preserving matrix used by CSS `saturate()`.
pub fn scale_saturation(pixels: &mut RgbaImage, factor: f32) {
    if factor == 1.0 {
        return;
    }
    let s = factor.max(0.0);
    let matrix = [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ];
    for pixel in pixels.pixels_mut() {
        let Rgba([r, g, b, _]) = *pixel;
        let rgb = [f32::from(r), f32::from(g), f32::from(b)];
        for (channel, row) in matrix.iter().enumerate() {
            let value = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2];
            pixel[channel] = to_channel(value);
        }
    }
}
