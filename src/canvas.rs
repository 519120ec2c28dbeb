// ============================================================================
// CANVAS: region slots, layout bands and per-region image state
// ============================================================================
//
// A canvas is a fixed pixel size split into one or more regions. Each region
// owns at most one source bitmap plus the transform that places it: fit mode,
// scale, pan offset and the bound that offset is clamped to.

use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result};
use crate::geometry::{self, FitMode, PixelRect, RectF, RegionGeometry, ScaleParams, Size, Vec2};
use crate::ops::transform::{Interpolation, resample, scaled_pixel_size};

/// Longest edge a region is allowed to resample its bitmap to.
pub const MAX_SCALED_EDGE: u32 = 16384;

// ---------------------------------------------------------------------------
//  Slots & layout
// ---------------------------------------------------------------------------

/// Identifies a region within a canvas layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSlot {
    Whole,
    Top,
    Bottom,
}

impl RegionSlot {
    pub fn name(&self) -> &'static str {
        match self {
            RegionSlot::Whole => "whole",
            RegionSlot::Top => "top",
            RegionSlot::Bottom => "bottom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "whole" | "main" => Some(RegionSlot::Whole),
            "top" => Some(RegionSlot::Top),
            "bottom" => Some(RegionSlot::Bottom),
            _ => None,
        }
    }
}

impl std::fmt::Display for RegionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the canvas is divided into regions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// One region covering the whole canvas.
    #[default]
    Single,
    /// Two horizontal bands: `Top` gets `height / 2`, `Bottom` the rest.
    SplitHorizontal,
}

/// Maps region slots to canvas rectangles. Slot order is draw order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CanvasLayout {
    canvas: Size,
    kind: LayoutKind,
}

impl CanvasLayout {
    pub fn new(canvas: Size, kind: LayoutKind) -> Self {
        Self { canvas, kind }
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Slots in fixed declaration (and draw) order.
    pub fn slots(&self) -> &'static [RegionSlot] {
        match self.kind {
            LayoutKind::Single => &[RegionSlot::Whole],
            LayoutKind::SplitHorizontal => &[RegionSlot::Top, RegionSlot::Bottom],
        }
    }

    pub fn contains(&self, slot: RegionSlot) -> bool {
        self.slots().contains(&slot)
    }

    pub fn rect(&self, slot: RegionSlot) -> Result<PixelRect> {
        let Size { width, height } = self.canvas;
        let half = height / 2;
        match (self.kind, slot) {
            (LayoutKind::Single, RegionSlot::Whole) => Ok(PixelRect::new(0, 0, width, height)),
            (LayoutKind::SplitHorizontal, RegionSlot::Top) => Ok(PixelRect::new(0, 0, width, half)),
            (LayoutKind::SplitHorizontal, RegionSlot::Bottom) => {
                Ok(PixelRect::new(0, half, width, height - half))
            }
            _ => Err(CompositorError::UnknownRegion(slot)),
        }
    }

    /// Slot under a point in canvas pixel space, chosen by Y band.
    pub fn slot_at(&self, point: Vec2) -> Option<RegionSlot> {
        let bounds = PixelRect::new(0, 0, self.canvas.width, self.canvas.height).to_rect_f();
        if !bounds.contains(point) {
            return None;
        }
        match self.kind {
            LayoutKind::Single => Some(RegionSlot::Whole),
            LayoutKind::SplitHorizontal => {
                if point.y < (self.canvas.height / 2) as f32 {
                    Some(RegionSlot::Top)
                } else {
                    Some(RegionSlot::Bottom)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
//  Region
// ---------------------------------------------------------------------------

/// Observable lifecycle of a region. Loading is atomic, so a region goes
/// straight from `Empty` to `Positioned`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegionState {
    Empty,
    Positioned,
}

/// Loaded bitmap plus its solved transform.
#[derive(Clone, Debug)]
struct Placed {
    image: Arc<RgbaImage>,
    natural: Size,
    geometry: RegionGeometry,
    source_name: Option<String>,
}

/// One independently positioned image slot.
#[derive(Clone, Debug)]
pub struct Region {
    slot: RegionSlot,
    rect: PixelRect,
    fit_mode: FitMode,
    params: ScaleParams,
    placed: Option<Placed>,
    offset: Vec2,
    /// Bumped on every load, load request and removal. In-flight decodes
    /// carrying an older value are discarded.
    generation: u64,
    /// Bumped only when the installed bitmap changes (load or removal).
    image_version: u64,
    /// Bitmap resampled to the current scaled size. Not touched by panning.
    scaled_cache: Option<(Size, Interpolation, Arc<RgbaImage>)>,
}

impl Region {
    pub fn new(slot: RegionSlot, rect: PixelRect, fit_mode: FitMode, params: ScaleParams) -> Self {
        Self {
            slot,
            rect,
            fit_mode,
            params,
            placed: None,
            offset: Vec2::ZERO,
            generation: 0,
            image_version: 0,
            scaled_cache: None,
        }
    }

    pub fn slot(&self) -> RegionSlot {
        self.slot
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn state(&self) -> RegionState {
        if self.placed.is_some() {
            RegionState::Positioned
        } else {
            RegionState::Empty
        }
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_none()
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn custom_width(&self) -> f32 {
        self.params.custom_width
    }

    pub fn params(&self) -> &ScaleParams {
        &self.params
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image_version(&self) -> u64 {
        self.image_version
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.placed.as_ref().map(|p| &p.image)
    }

    pub fn natural_size(&self) -> Option<Size> {
        self.placed.as_ref().map(|p| p.natural)
    }

    pub fn geometry(&self) -> Option<RegionGeometry> {
        self.placed.as_ref().map(|p| p.geometry)
    }

    pub fn scale(&self) -> Option<f32> {
        self.geometry().map(|g| g.scale)
    }

    pub fn max_offset(&self) -> Vec2 {
        self.geometry().map(|g| g.max_offset).unwrap_or(Vec2::ZERO)
    }

    pub fn can_pan(&self) -> bool {
        self.geometry().is_some_and(|g| g.can_pan())
    }

    /// File name the bitmap was loaded from, if the caller supplied one.
    pub fn source_name(&self) -> Option<&str> {
        self.placed.as_ref().and_then(|p| p.source_name.as_deref())
    }

    /// Where the scaled bitmap lands on the canvas.
    pub fn draw_rect(&self) -> Option<RectF> {
        let g = self.geometry()?;
        Some(geometry::placement(self.rect.to_rect_f(), g.scaled_size, self.offset))
    }

    // -- transitions --------------------------------------------------------

    /// Install `image`, solve its transform and zero the offset. Nothing is
    /// mutated unless every check passes.
    pub fn load(&mut self, image: Arc<RgbaImage>, source_name: Option<String>) -> Result<()> {
        let natural = Size::new(image.width(), image.height());
        let geometry = self.solve_for(self.fit_mode, &self.params, natural)?;

        self.placed = Some(Placed {
            image,
            natural,
            geometry,
            source_name,
        });
        self.offset = Vec2::ZERO;
        self.scaled_cache = None;
        self.generation += 1;
        self.image_version += 1;
        log::debug!(
            "region {}: loaded {natural} at scale {:.4}",
            self.slot,
            geometry.scale
        );
        Ok(())
    }

    /// Start an asynchronous load. Results tagged with an older generation
    /// must be dropped.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Check that `mode` would solve for the current image without committing.
    pub fn check_fit_mode(&self, mode: FitMode) -> Result<()> {
        match self.natural_size() {
            Some(natural) => self.solve_for(mode, &self.params, natural).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn set_fit_mode(&mut self, mode: FitMode) -> Result<()> {
        let params = self.params;
        self.resolve(mode, params)
    }

    pub fn set_custom_width(&mut self, width: f32) -> Result<()> {
        if !(width > 0.0) || !width.is_finite() {
            return Err(CompositorError::invalid_parameter("custom width", width));
        }
        let params = ScaleParams {
            custom_width: width,
            ..self.params
        };
        self.resolve(self.fit_mode, params)
    }

    /// Add `(dx, dy)` to the offset and clamp. Returns the settled offset.
    /// No-op on an empty region.
    pub fn drag(&mut self, dx: f32, dy: f32) -> Vec2 {
        if let Some(g) = self.geometry() {
            self.offset = geometry::clamp_offset(self.offset + Vec2::new(dx, dy), g.max_offset);
        }
        self.offset
    }

    /// Re-solve from the current mode and zero the offset.
    pub fn reset(&mut self) -> Result<()> {
        self.resolve(self.fit_mode, self.params)
    }

    pub fn remove(&mut self) {
        if self.placed.take().is_some() {
            log::debug!("region {}: removed", self.slot);
        }
        self.offset = Vec2::ZERO;
        self.scaled_cache = None;
        self.generation += 1;
        self.image_version += 1;
    }

    fn solve_for(&self, mode: FitMode, params: &ScaleParams, natural: Size) -> Result<RegionGeometry> {
        let g = geometry::solve(mode, self.rect.size(), natural, params)?;
        let px = scaled_pixel_size(natural, g.scale);
        // Natural size is drawn straight from the source and never resampled.
        if px != natural && (px.width > MAX_SCALED_EDGE || px.height > MAX_SCALED_EDGE) {
            return Err(CompositorError::invalid_parameter("scaled size", px));
        }
        Ok(g)
    }

    /// Commit `mode`/`params` and re-solve. Offset returns to zero.
    fn resolve(&mut self, mode: FitMode, params: ScaleParams) -> Result<()> {
        let geometry = match self.natural_size() {
            Some(natural) => Some(self.solve_for(mode, &params, natural)?),
            None => None,
        };
        if let (Some(placed), Some(geometry)) = (&mut self.placed, geometry) {
            placed.geometry = geometry;
        }
        self.fit_mode = mode;
        self.params = params;
        self.offset = Vec2::ZERO;
        Ok(())
    }

    /// Bitmap at the current scaled pixel size, rebuilt lazily when scale or
    /// image changes.
    pub fn scaled_image(&mut self, interp: Interpolation) -> Option<Arc<RgbaImage>> {
        let placed = self.placed.as_ref()?;
        let target = scaled_pixel_size(placed.natural, placed.geometry.scale);

        if let Some((size, cached_interp, img)) = &self.scaled_cache {
            if *size == target && *cached_interp == interp {
                return Some(Arc::clone(img));
            }
        }

        let img = if target == placed.natural {
            Arc::clone(&placed.image)
        } else {
            Arc::new(resample(&placed.image, target, interp))
        };
        self.scaled_cache = Some((target, interp, Arc::clone(&img)));
        Some(img)
    }
}
