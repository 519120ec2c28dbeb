// ============================================================================
// SURFACE: the render target the compositor draws into
// ============================================================================
//
// The compositor never touches a window, canvas element or GPU texture; it
// draws through this trait. `RasterSurface` is the CPU implementation backed
// by an `RgbaImage`, used for both preview frames and export.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::geometry::{PixelRect, RectF, Size};

pub trait Surface {
    fn size(&self) -> Size;

    /// Overwrite every pixel with `color`.
    fn fill(&mut self, color: Rgba<u8>);

    /// Source-over `image` with its top-left at `(x, y)`, touching only
    /// pixels inside `clip`.
    fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32, clip: PixelRect);

    /// Source-over a solid rectangle. `corner_radius > 0` rounds the corners
    /// with anti-aliased edges.
    fn fill_rect(&mut self, rect: RectF, color: Rgba<u8>, corner_radius: f32);

    /// Blend `color` into one pixel at `coverage` (0.0..=1.0). Out-of-bounds
    /// coordinates are ignored.
    fn blend_coverage(&mut self, x: i32, y: i32, color: Rgba<u8>, coverage: f32);
}

/// CPU surface over a flat RGBA buffer.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    image: RgbaImage,
}

impl RasterSurface {
    pub fn new(size: Size) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    fn fill(&mut self, color: Rgba<u8>) {
        for px in self.image.pixels_mut() {
            *px = color;
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32, clip: PixelRect) {
        let clip = clip.clamp_to(self.image.width(), self.image.height());
        // Intersect clip with the image's own footprint.
        let x0 = (clip.x as i64).max(x as i64);
        let y0 = (clip.y as i64).max(y as i64);
        let x1 = ((clip.x + clip.width) as i64).min(x as i64 + image.width() as i64);
        let y1 = ((clip.y + clip.height) as i64).min(y as i64 + image.height() as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let dst_w = self.image.width() as usize;
        let src_w = image.width() as usize;
        let src_raw = image.as_raw();
        let (x0, x1) = (x0 as usize, x1 as usize);
        let (y0, y1) = (y0 as usize, y1 as usize);

        self.image
            .par_chunks_mut(dst_w * 4)
            .enumerate()
            .skip(y0)
            .take(y1 - y0)
            .for_each(|(dy, row)| {
                let sy = (dy as i64 - y as i64) as usize;
                let src_row = &src_raw[sy * src_w * 4..(sy + 1) * src_w * 4];
                for dx in x0..x1 {
                    let sx = (dx as i64 - x as i64) as usize;
                    let s = &src_row[sx * 4..sx * 4 + 4];
                    let d = &mut row[dx * 4..dx * 4 + 4];
                    let out = blend_over(
                        Rgba([d[0], d[1], d[2], d[3]]),
                        Rgba([s[0], s[1], s[2], s[3]]),
                        1.0,
                    );
                    d.copy_from_slice(&out.0);
                }
            });
    }

    fn fill_rect(&mut self, rect: RectF, color: Rgba<u8>, corner_radius: f32) {
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let x0 = rect.x.floor().max(0.0) as u32;
        let y0 = rect.y.floor().max(0.0) as u32;
        let x1 = rect.right().ceil().min(w).max(0.0) as u32;
        let y1 = rect.bottom().ceil().min(h).max(0.0) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let radius = corner_radius
            .max(0.0)
            .min(rect.width * 0.5)
            .min(rect.height * 0.5);
        let stride = self.image.width() as usize * 4;

        self.image
            .par_chunks_mut(stride)
            .enumerate()
            .skip(y0 as usize)
            .take((y1 - y0) as usize)
            .for_each(|(py, row)| {
                for px in x0..x1 {
                    let coverage = rect_coverage(&rect, radius, px as f32 + 0.5, py as f32 + 0.5);
                    if coverage <= 0.0 {
                        continue;
                    }
                    let i = px as usize * 4;
                    let d = &mut row[i..i + 4];
                    let out = blend_over(Rgba([d[0], d[1], d[2], d[3]]), color, coverage);
                    d.copy_from_slice(&out.0);
                }
            });
    }

    fn blend_coverage(&mut self, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
        if x < 0 || y < 0 || x as u32 >= self.image.width() || y as u32 >= self.image.height() {
            return;
        }
        if coverage <= 0.0 {
            return;
        }
        let base = *self.image.get_pixel(x as u32, y as u32);
        self.image
            .put_pixel(x as u32, y as u32, blend_over(base, color, coverage.min(1.0)));
    }
}

/// Fraction of the pixel centred at `(cx, cy)` covered by `rect` with
/// rounded corners of `radius`. Edges are anti-aliased over one pixel.
fn rect_coverage(rect: &RectF, radius: f32, cx: f32, cy: f32) -> f32 {
    let axis = |c: f32, lo: f32, hi: f32| (c - lo + 0.5).min(hi - c + 0.5).clamp(0.0, 1.0);
    let edge = axis(cx, rect.x, rect.right()) * axis(cy, rect.y, rect.bottom());
    if radius <= 0.0 || edge <= 0.0 {
        return edge;
    }

    // Distance from the nearest corner centre when inside a corner box.
    let ix = if cx < rect.x + radius {
        rect.x + radius - cx
    } else if cx > rect.right() - radius {
        cx - (rect.right() - radius)
    } else {
        0.0
    };
    let iy = if cy < rect.y + radius {
        rect.y + radius - cy
    } else if cy > rect.bottom() - radius {
        cy - (rect.bottom() - radius)
    } else {
        0.0
    };
    if ix == 0.0 || iy == 0.0 {
        return edge;
    }
    let dist = (ix * ix + iy * iy).sqrt();
    edge * (radius - dist + 0.5).clamp(0.0, 1.0)
}

/// Normal-mode source-over of `top` onto `base`, with `top`'s alpha scaled by
/// `opacity`.
pub fn blend_over(base: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }
    if opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let opacity = opacity.min(1.0);
    let base_a = base[3] as f32 / 255.0;
    let top_a = (top[3] as f32 / 255.0) * opacity;

    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |b: u8, t: u8| {
        let v = (t as f32 / 255.0 * top_a + b as f32 / 255.0 * base_a * (1.0 - top_a)) / out_a;
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(base[0], top[0]),
        channel(base[1], top[1]),
        channel(base[2], top[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
