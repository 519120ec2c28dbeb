// ============================================================================
// GEOMETRY: scale laws, pan bounds and draw placement for a single region
// ============================================================================
//
// Everything here is pure: no pixels, no state. Region state (canvas.rs) and
// the pan controller (pan.rs) call into these functions whenever mode, image
// or region size changes.

use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result};

/// Width × height in whole pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 2-D vector in canvas pixel space. Used for offsets, bounds and scaled sizes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle with fractional coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

/// Integer rectangle in canvas pixels. Used for clip regions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn to_rect_f(self) -> RectF {
        RectF::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }

    /// Clamp this rect to `(0, 0, max_w, max_h)`. May collapse to zero size.
    pub fn clamp_to(self, max_w: u32, max_h: u32) -> Self {
        let x = self.x.min(max_w);
        let y = self.y.min(max_h);
        Self {
            x,
            y,
            width: self.width.min(max_w - x),
            height: self.height.min(max_h - y),
        }
    }
}

// ---------------------------------------------------------------------------
//  Fit modes
// ---------------------------------------------------------------------------

/// Scale law applied to a bitmap inside its region.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Whole image visible, letterboxed on one axis. Never pannable.
    #[default]
    Fit,
    /// Image fills the region; overflow on one axis is cropped and pannable.
    Cover,
    /// Natural size, centred. Pannable on any axis where the image is larger.
    Center,
    /// Scaled so its width equals a caller-supplied pixel width.
    CustomWidth,
    /// Square and portrait images match the auto target by width,
    /// landscape images match it by height.
    Auto,
}

impl FitMode {
    pub fn all() -> &'static [FitMode] {
        &[
            FitMode::Fit,
            FitMode::Cover,
            FitMode::Center,
            FitMode::CustomWidth,
            FitMode::Auto,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FitMode::Fit => "fit",
            FitMode::Cover => "cover",
            FitMode::Center => "center",
            FitMode::CustomWidth => "custom",
            FitMode::Auto => "auto",
        }
    }

    /// Parse a form-control value. Unknown names are rejected instead of
    /// silently drawing nothing.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fit" => Some(FitMode::Fit),
            "cover" => Some(FitMode::Cover),
            "center" | "centre" => Some(FitMode::Center),
            "custom" | "custom_width" => Some(FitMode::CustomWidth),
            "auto" => Some(FitMode::Auto),
            _ => None,
        }
    }
}

/// Parameters of the scale laws that are content conventions, not geometry.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    /// Target width for [`FitMode::CustomWidth`].
    pub custom_width: f32,
    /// Target dimension for [`FitMode::Auto`].
    pub auto_target: f32,
    /// Keep images that exactly match the region size draggable in every
    /// mode except [`FitMode::Fit`].
    pub exact_size_pan: bool,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            custom_width: 1080.0,
            auto_target: 1080.0,
            exact_size_pan: true,
        }
    }
}

// ---------------------------------------------------------------------------
//  Scale / bounds / placement
// ---------------------------------------------------------------------------

/// Scale factor for `natural` inside `region` under `mode`.
pub fn compute_scale(
    mode: FitMode,
    region: Size,
    natural: Size,
    params: &ScaleParams,
) -> Result<f32> {
    if natural.is_empty() {
        return Err(CompositorError::invalid_image(format!(
            "source has a zero dimension ({natural})"
        )));
    }
    if region.is_empty() {
        return Err(CompositorError::invalid_parameter("region size", region));
    }

    let (rw, rh) = (region.width as f32, region.height as f32);
    let (nw, nh) = (natural.width as f32, natural.height as f32);

    let scale = match mode {
        FitMode::Fit => (rw / nw).min(rh / nh),
        FitMode::Cover => (rw / nw).max(rh / nh),
        FitMode::Center => 1.0,
        FitMode::CustomWidth => {
            if !(params.custom_width > 0.0) || !params.custom_width.is_finite() {
                return Err(CompositorError::invalid_parameter(
                    "custom width",
                    params.custom_width,
                ));
            }
            params.custom_width / nw
        }
        FitMode::Auto => {
            if !(params.auto_target > 0.0) || !params.auto_target.is_finite() {
                return Err(CompositorError::invalid_parameter(
                    "auto target",
                    params.auto_target,
                ));
            }
            if natural.width <= natural.height {
                params.auto_target / nw
            } else {
                params.auto_target / nh
            }
        }
    };
    Ok(scale)
}

/// Half the overflow of the scaled image on each axis. Zero for `Fit`.
pub fn compute_max_offset(scale: f32, region: Size, natural: Size, mode: FitMode) -> Vec2 {
    match mode {
        FitMode::Fit => Vec2::ZERO,
        FitMode::Cover | FitMode::Center | FitMode::CustomWidth | FitMode::Auto => {
            let overflow = |n: u32, r: u32| ((n as f32 * scale - r as f32) / 2.0).max(0.0);
            Vec2::new(
                overflow(natural.width, region.width),
                overflow(natural.height, region.height),
            )
        }
    }
}

/// Per-axis clamp of `offset` to `[-max, max]`.
pub fn clamp_offset(offset: Vec2, max_offset: Vec2) -> Vec2 {
    Vec2::new(
        offset.x.clamp(-max_offset.x, max_offset.x),
        offset.y.clamp(-max_offset.y, max_offset.y),
    )
}

/// Everything the renderer and pan controller need for one region.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RegionGeometry {
    pub scale: f32,
    /// `natural * scale`, unrounded.
    pub scaled_size: Vec2,
    pub max_offset: Vec2,
}

impl RegionGeometry {
    pub fn can_pan(&self) -> bool {
        self.max_offset.x > 0.0 || self.max_offset.y > 0.0
    }
}

/// Resolve scale and bounds for `natural` in `region`, including the
/// exact-size carve-out (treated as Cover at scale 1 with a bound of one full
/// region dimension per axis).
pub fn solve(
    mode: FitMode,
    region: Size,
    natural: Size,
    params: &ScaleParams,
) -> Result<RegionGeometry> {
    if natural.is_empty() {
        return Err(CompositorError::invalid_image(format!(
            "source has a zero dimension ({natural})"
        )));
    }

    let scale = compute_scale(mode, region, natural, params)?;

    // CustomWidth only takes the carve-out when the requested width is the
    // natural width.
    let exact = match mode {
        FitMode::Fit => false,
        FitMode::CustomWidth => scale == 1.0,
        _ => true,
    };
    if params.exact_size_pan && natural == region && exact {
        return Ok(RegionGeometry {
            scale: 1.0,
            scaled_size: natural.to_vec2(),
            max_offset: region.to_vec2(),
        });
    }

    Ok(RegionGeometry {
        scale,
        scaled_size: Vec2::new(natural.width as f32 * scale, natural.height as f32 * scale),
        max_offset: compute_max_offset(scale, region, natural, mode),
    })
}

/// Draw rectangle for a scaled image centred in `region` and shifted by `offset`.
pub fn placement(region: RectF, scaled_size: Vec2, offset: Vec2) -> RectF {
    RectF::new(
        region.x + (region.width - scaled_size.x) / 2.0 + offset.x,
        region.y + (region.height - scaled_size.y) / 2.0 + offset.y,
        scaled_size.x,
        scaled_size.y,
    )
}
