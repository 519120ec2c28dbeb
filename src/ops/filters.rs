// ============================================================================
// IMAGE FILTERS: Gaussian blur, brightness, blurred backdrop
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::geometry::{Size, Vec2};
use crate::ops::transform::{Interpolation, cover_resize, resample};

/// Parameters of a blurred, darkened cover backdrop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackdropParams {
    /// Gaussian standard deviation in output pixels.
    pub sigma: f32,
    /// RGB multiplier applied after blurring (1.0 = unchanged).
    pub brightness: f32,
    /// Extra cover scale so blurred edges stay off-canvas.
    pub oversize: f32,
    /// Work at `1/downsample` resolution. 1 disables.
    pub downsample: u32,
    /// Static shift of the crop, in output pixels.
    pub offset: Vec2,
}

/// Cover-fit `src` into `target`, then blur and darken it.
///
/// The blur runs at `target / downsample` and is upscaled at the end.
pub fn blurred_backdrop(src: &RgbaImage, target: Size, params: &BackdropParams) -> RgbaImage {
    let ds = params.downsample.max(1);
    let work = Size::new(
        (target.width / ds).max(1),
        (target.height / ds).max(1),
    );
    let inv = 1.0 / ds as f32;

    let mut small = cover_resize(
        src,
        work,
        params.oversize,
        (params.offset.x * inv, params.offset.y * inv),
        Interpolation::Bilinear,
    );
    if params.sigma > 0.0 {
        small = gaussian_blur(&small, params.sigma * inv);
    }
    adjust_brightness(&mut small, params.brightness);

    if work == target {
        small
    } else {
        resample(&small, target, Interpolation::Bilinear)
    }
}

/// Multiply RGB by `factor`, leaving alpha alone.
pub fn adjust_brightness(img: &mut RgbaImage, factor: f32) {
    if (factor - 1.0).abs() < f32::EPSILON {
        return;
    }
    let factor = factor.max(0.0);
    let stride = img.width() as usize * 4;
    if stride == 0 {
        return;
    }
    img.par_chunks_mut(stride).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            for c in &mut px[..3] {
                *c = (*c as f32 * factor).round().clamp(0.0, 255.0) as u8;
            }
        }
    });
}

fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let mut kernel = vec![0.0f32; len];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        let v = (-x * x / s2).exp();
        *k = v;
        sum += v;
    }
    let inv = 1.0 / sum;
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Rayon-parallelized separable Gaussian blur operating on raw f32 buffers.
/// Edges are clamped.
pub fn gaussian_blur(src: &RgbaImage, sigma: f32) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 || sigma <= 0.0 {
        return src.clone();
    }

    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;
    let buf_in: Vec<f32> = src.as_raw().iter().map(|&b| b as f32).collect();
    let pixel_count = w * h * 4;

    // --- Horizontal pass (parallel by row) ---
    let mut buf_h = vec![0.0f32; pixel_count];
    buf_h.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        let row_in = &buf_in[y * w * 4..(y + 1) * w * 4];
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius as isize).clamp(0, w as isize - 1) as usize;
                let px = &row_in[sx * 4..sx * 4 + 4];
                for c in 0..4 {
                    acc[c] += px[c] * kv;
                }
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
        }
    });

    // --- Vertical pass (parallel by row) ---
    let mut buf_v = vec![0.0f32; pixel_count];
    buf_v.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius as isize).clamp(0, h as isize - 1) as usize;
                let idx = sy * w * 4 + x * 4;
                for c in 0..4 {
                    acc[c] += buf_h[idx + c] * kv;
                }
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
        }
    });

    let dst_raw: Vec<u8> = buf_v
        .iter()
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}
