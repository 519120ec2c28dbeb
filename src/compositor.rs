// ============================================================================
// COMPOSITOR: background, clipped region blits and text overlay
// ============================================================================
//
// Draw order per frame:
//   1. background (flat colour or cached blurred backdrop)
//   2. every region in layout order, clipped to its rectangle
//   3. optional text overlay (highlight rect, then glyphs)
//
// Output depends only on the inputs; the only state kept between frames is
// the backdrop cache.

use std::sync::Arc;

use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};

use crate::canvas::{CanvasLayout, Region, RegionSlot};
use crate::config::{BackgroundConfig, BackgroundKind, CompositorConfig, WHITE};
use crate::geometry::{PixelRect, Size};
use crate::ops::filters::{BackdropParams, blurred_backdrop};
use crate::ops::text::{GlyphFont, TextOverlay, draw_overlay, layout_overlay};
use crate::ops::transform::Interpolation;
use crate::surface::{RasterSurface, Surface};

/// Background treatment resolved for one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Background {
    Flat(Rgba<u8>),
    Blurred {
        source: RegionSlot,
        params: BackdropParams,
    },
}

/// Everything the cached backdrop depends on. Pan offsets are not part of it.
#[derive(Clone, Debug, PartialEq)]
struct BackdropKey {
    source: RegionSlot,
    image_version: u64,
    canvas: Size,
    params: BackdropParams,
}

pub struct Compositor {
    background: BackgroundConfig,
    interpolation: Interpolation,
    text_area_width: f32,
    backdrop: Option<(BackdropKey, Arc<RgbaImage>)>,
    backdrop_builds: u64,
}

impl Compositor {
    pub fn new(config: &CompositorConfig) -> Self {
        Self {
            background: config.background.clone(),
            interpolation: config.interpolation,
            text_area_width: config.text.area_width,
            backdrop: None,
            backdrop_builds: 0,
        }
    }

    pub fn background(&self) -> &BackgroundConfig {
        &self.background
    }

    pub fn set_background(&mut self, background: BackgroundConfig) {
        self.background = background;
    }

    pub fn set_white_background(&mut self, white: bool) {
        self.background.white = white;
    }

    /// How many times the blurred backdrop has been rebuilt.
    pub fn backdrop_builds(&self) -> u64 {
        self.backdrop_builds
    }

    /// Pick the background for the current region contents.
    pub fn resolve_background(&self, layout: &CanvasLayout, regions: &[Region]) -> Background {
        let bg = &self.background;
        let fallback = Background::Flat(Rgba(bg.color));
        match bg.kind {
            BackgroundKind::Flat if bg.white => Background::Flat(Rgba(WHITE)),
            BackgroundKind::Flat => fallback,
            BackgroundKind::Blurred => {
                let Some(source) = bg.source.or_else(|| layout.slots().first().copied()) else {
                    return fallback;
                };
                let loaded = regions
                    .iter()
                    .any(|r| r.slot() == source && !r.is_empty());
                if !loaded {
                    fallback
                } else if bg.white {
                    Background::Flat(Rgba(WHITE))
                } else {
                    Background::Blurred {
                        source,
                        params: BackdropParams {
                            sigma: bg.blur_sigma,
                            brightness: bg.brightness,
                            oversize: bg.oversize,
                            downsample: bg.downsample,
                            offset: bg.offset,
                        },
                    }
                }
            }
        }
    }

    fn backdrop(
        &mut self,
        source: RegionSlot,
        params: BackdropParams,
        canvas: Size,
        regions: &[Region],
    ) -> Option<Arc<RgbaImage>> {
        let region = regions.iter().find(|r| r.slot() == source)?;
        let key = BackdropKey {
            source,
            image_version: region.image_version(),
            canvas,
            params,
        };
        if let Some((cached_key, img)) = &self.backdrop {
            if *cached_key == key {
                return Some(Arc::clone(img));
            }
        }

        let image = region.image()?;
        let built = Arc::new(blurred_backdrop(image, canvas, &params));
        self.backdrop_builds += 1;
        log::debug!(
            "compositor: rebuilt backdrop from {source} (image version {})",
            key.image_version
        );
        self.backdrop = Some((key, Arc::clone(&built)));
        Some(built)
    }

    /// Draw a full frame into `surface`.
    pub fn render_into<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        layout: &CanvasLayout,
        regions: &mut [Region],
        text: Option<(&TextOverlay, &FontArc)>,
    ) {
        let canvas = layout.canvas();
        let full = PixelRect::new(0, 0, canvas.width, canvas.height);

        // 1. Background
        match self.resolve_background(layout, regions) {
            Background::Flat(color) => surface.fill(color),
            Background::Blurred { source, params } => {
                surface.fill(Rgba(self.background.color));
                if let Some(backdrop) = self.backdrop(source, params, canvas, regions) {
                    surface.draw_image(&backdrop, 0, 0, full);
                }
            }
        }

        // 2. Regions, in layout order
        for slot in layout.slots() {
            let Some(region) = regions.iter_mut().find(|r| r.slot() == *slot) else {
                continue;
            };
            let (Some(rect), Some(scaled)) = (region.draw_rect(), region.scaled_image(self.interpolation))
            else {
                continue;
            };
            surface.draw_image(
                &scaled,
                rect.x.round() as i32,
                rect.y.round() as i32,
                region.rect(),
            );
        }

        // 3. Text overlay
        if let Some((overlay, font)) = text {
            let style = &overlay.style;
            let glyphs = GlyphFont::new(font.clone(), style.font_size);
            if let Some(text_layout) =
                layout_overlay(&overlay.content, style, canvas, self.text_area_width, &glyphs)
            {
                draw_overlay(surface, &glyphs, &text_layout, style);
            }
        }
    }

    /// Draw a full frame into a fresh raster.
    pub fn render(
        &mut self,
        layout: &CanvasLayout,
        regions: &mut [Region],
        text: Option<(&TextOverlay, &FontArc)>,
    ) -> RgbaImage {
        let mut surface = RasterSurface::new(layout.canvas());
        self.render_into(&mut surface, layout, regions, text);
        surface.into_image()
    }
}
