// ============================================================================
// CONFIG: compositor settings and the two canvas presets
// ============================================================================
//
// Everything here is plain data with `Default` impls. Hosts build a config in
// code (usually from a `Preset`) and hand it to `Project::new`; nothing is
// read from disk.

use serde::{Deserialize, Serialize};

use crate::canvas::{LayoutKind, RegionSlot};
use crate::geometry::{FitMode, ScaleParams, Size, Vec2};
use crate::io::SaveFormat;
use crate::ops::text::TextStyle;
use crate::ops::transform::Interpolation;

pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const BLACK: [u8; 4] = [0, 0, 0, 255];
/// Neutral grey shown by the resizer before anything is loaded.
pub const EMPTY_GREY: [u8; 4] = [0xe5, 0xe7, 0xeb, 255];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundKind {
    /// Solid `color`.
    #[default]
    Flat,
    /// Blurred, darkened cover of the `source` region's image.
    Blurred,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub kind: BackgroundKind,
    /// Flat fill, and the fallback when a blurred source region is empty.
    pub color: [u8; 4],
    /// Overrides everything with plain white while a source is loaded.
    pub white: bool,
    /// Region whose image feeds the blurred backdrop. `None` uses the first
    /// slot of the layout.
    pub source: Option<RegionSlot>,
    pub blur_sigma: f32,
    pub brightness: f32,
    pub oversize: f32,
    pub downsample: u32,
    /// Static crop shift. Never follows the foreground pan.
    pub offset: Vec2,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            kind: BackgroundKind::Flat,
            color: BLACK,
            white: false,
            source: None,
            blur_sigma: 48.0,
            brightness: 0.75,
            oversize: 1.1,
            downsample: 4,
            offset: Vec2::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAreaConfig {
    /// Width of the centred text column, highlight included.
    pub area_width: f32,
    /// Tried in order; the system sans-serif is the last resort.
    pub font_families: Vec<String>,
    /// Style applied by `Project::set_text_content`.
    pub style: TextStyle,
}

impl Default for TextAreaConfig {
    fn default() -> Self {
        Self {
            area_width: 824.0,
            font_families: vec![
                "Inter".to_string(),
                "Helvetica".to_string(),
                "Arial".to_string(),
                "DejaVu Sans".to_string(),
                "Liberation Sans".to_string(),
            ],
            style: TextStyle::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: SaveFormat,
    /// 1..=100, clamped when encoding.
    pub jpeg_quality: u8,
    /// Appended to the input file stem.
    pub suffix: String,
    /// Used, without extension, when no input name is known.
    pub fallback_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: SaveFormat::Png,
            jpeg_quality: 90,
            suffix: "_out".to_string(),
            fallback_name: "output".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    /// Pointer moves smaller than this (canvas px, both axes) update the
    /// offset without asking for a redraw.
    pub redraw_threshold: f32,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            redraw_threshold: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    pub canvas: Size,
    pub layout: LayoutKind,
    pub default_fit_mode: FitMode,
    pub custom_width_default: f32,
    pub auto_target: f32,
    pub exact_size_pan: bool,
    pub interpolation: Interpolation,
    pub background: BackgroundConfig,
    pub text: TextAreaConfig,
    pub export: ExportConfig,
    pub pan: PanConfig,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Preset::Resizer.config()
    }
}

impl CompositorConfig {
    pub fn scale_params(&self) -> ScaleParams {
        ScaleParams {
            custom_width: self.custom_width_default,
            auto_target: self.auto_target,
            exact_size_pan: self.exact_size_pan,
        }
    }
}

/// The two canvas shapes the compositor ships with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// 1920×1080, one region, blurred backdrop, JPEG out.
    Resizer,
    /// 1080×1920, top and bottom halves, black backdrop, PNG out.
    StorySplit,
}

impl Preset {
    pub fn config(self) -> CompositorConfig {
        match self {
            Preset::Resizer => CompositorConfig {
                canvas: Size::new(1920, 1080),
                layout: LayoutKind::Single,
                default_fit_mode: FitMode::Fit,
                custom_width_default: 1080.0,
                auto_target: 1080.0,
                exact_size_pan: true,
                interpolation: Interpolation::Bilinear,
                background: BackgroundConfig {
                    kind: BackgroundKind::Blurred,
                    color: EMPTY_GREY,
                    ..BackgroundConfig::default()
                },
                text: TextAreaConfig::default(),
                export: ExportConfig {
                    format: SaveFormat::Jpeg,
                    jpeg_quality: 90,
                    suffix: "_ol".to_string(),
                    fallback_name: "resized-1920x1080_ol".to_string(),
                },
                pan: PanConfig::default(),
            },
            Preset::StorySplit => CompositorConfig {
                canvas: Size::new(1080, 1920),
                layout: LayoutKind::SplitHorizontal,
                default_fit_mode: FitMode::Cover,
                custom_width_default: 1080.0,
                auto_target: 1080.0,
                exact_size_pan: true,
                interpolation: Interpolation::Bilinear,
                background: BackgroundConfig::default(),
                text: TextAreaConfig::default(),
                export: ExportConfig {
                    format: SaveFormat::Png,
                    jpeg_quality: 90,
                    suffix: "_story".to_string(),
                    fallback_name: "story-split".to_string(),
                },
                pan: PanConfig::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_tool_defaults() {
        let resizer = Preset::Resizer.config();
        assert_eq!(resizer.canvas, Size::new(1920, 1080));
        assert_eq!(resizer.default_fit_mode, FitMode::Fit);
        assert_eq!(resizer.background.kind, BackgroundKind::Blurred);
        assert_eq!(resizer.export.format, SaveFormat::Jpeg);

        let story = Preset::StorySplit.config();
        assert_eq!(story.canvas, Size::new(1080, 1920));
        assert_eq!(story.layout, LayoutKind::SplitHorizontal);
        assert_eq!(story.default_fit_mode, FitMode::Cover);
        assert_eq!(story.background.color, BLACK);
        assert_eq!(story.text.area_width, 824.0);
    }

    #[test]
    fn scale_params_carry_config_values() {
        let mut cfg = Preset::Resizer.config();
        cfg.auto_target = 720.0;
        let p = cfg.scale_params();
        assert_eq!(p.auto_target, 720.0);
        assert_eq!(p.custom_width, 1080.0);
    }
}
