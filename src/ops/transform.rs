// ============================================================================
// TRANSFORM OPERATIONS: resampling for region bitmaps and backgrounds
// ============================================================================

use image::{RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Interpolation method for resize operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl Interpolation {
    pub fn label(&self) -> &'static str {
        match self {
            Interpolation::Nearest => "Nearest",
            Interpolation::Bilinear => "Bilinear",
            Interpolation::Bicubic => "Bicubic",
            Interpolation::Lanczos3 => "Lanczos3",
        }
    }

    pub fn all() -> &'static [Interpolation] {
        &[
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Bicubic,
            Interpolation::Lanczos3,
        ]
    }

    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Bicubic => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

// ---------------------------------------------------------------------------
//  Resampling
// ---------------------------------------------------------------------------

/// Resize `src` to exactly `target`. Zero target dimensions are bumped to 1.
pub fn resample(src: &RgbaImage, target: Size, interp: Interpolation) -> RgbaImage {
    let (w, h) = (target.width.max(1), target.height.max(1));
    if src.width() == w && src.height() == h {
        return src.clone();
    }
    imageops::resize(src, w, h, interp.to_filter())
}

/// Pixel size of `natural` scaled by `scale`, rounded, at least 1×1.
pub fn scaled_pixel_size(natural: Size, scale: f32) -> Size {
    let dim = |n: u32| ((n as f32 * scale).round() as u32).max(1);
    Size::new(dim(natural.width), dim(natural.height))
}

/// Cover-fit `src` into `target`: scale so both axes fill, times `oversize`,
/// then crop the centre shifted by `offset` (in target pixels, clamped so the
/// crop never leaves the scaled image).
pub fn cover_resize(
    src: &RgbaImage,
    target: Size,
    oversize: f32,
    offset: (f32, f32),
    interp: Interpolation,
) -> RgbaImage {
    let (tw, th) = (target.width.max(1), target.height.max(1));
    let (sw, sh) = (src.width().max(1) as f32, src.height().max(1) as f32);

    let scale = (tw as f32 / sw).max(th as f32 / sh) * oversize.max(1.0);
    let scaled = scaled_pixel_size(Size::new(src.width(), src.height()), scale);
    let scaled_w = scaled.width.max(tw);
    let scaled_h = scaled.height.max(th);
    let resized = resample(src, Size::new(scaled_w, scaled_h), interp);

    // Centre crop, then shift.
    let max_x = (scaled_w - tw) as f32;
    let max_y = (scaled_h - th) as f32;
    let x = (max_x / 2.0 - offset.0).round().clamp(0.0, max_x) as u32;
    let y = (max_y / 2.0 - offset.1).round().clamp(0.0, max_y) as u32;

    imageops::crop_imm(&resized, x, y, tw, th).to_image()
}
