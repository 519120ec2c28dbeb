// ============================================================================
// TEXT: overlay wrapping, highlight layout and glyph rasterization
// ============================================================================

use ab_glyph::{Font, FontArc, GlyphId, Point, ScaleFont, point};
use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result};
use crate::geometry::{RectF, Size, Vec2};
use crate::surface::Surface;

/// Share of `highlight_padding` added above and below the text block.
const HIGHLIGHT_PAD_FACTOR: f32 = 0.6;

/// Visual parameters of the overlay. Defaults match the story-split tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_size: f32,
    /// CSS-style weight (400 regular, 700 bold).
    pub font_weight: u16,
    /// Line pitch as a multiple of `font_size`.
    pub line_height: f32,
    pub color: [u8; 4],
    pub highlight_color: [u8; 4],
    /// 0.0..=1.0, multiplied into `highlight_color`'s alpha.
    pub highlight_opacity: f32,
    pub highlight_padding: f32,
    /// 0 draws square corners.
    pub highlight_radius: f32,
    /// Shift of the block centre from the canvas centre, positive is down.
    pub vertical_offset: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 48.0,
            font_weight: 700,
            line_height: 1.2,
            color: [0, 0, 0, 255],
            highlight_color: [255, 255, 255, 255],
            highlight_opacity: 0.5,
            highlight_padding: 48.0,
            highlight_radius: 0.0,
            vertical_offset: 0.0,
        }
    }
}

/// Text drawn over the canvas, at most one per project.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub content: String,
    pub style: TextStyle,
}

impl TextOverlay {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: TextStyle::default(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Check ranges that would otherwise produce an invisible or inverted block.
    pub fn validate(&self) -> Result<()> {
        let s = &self.style;
        if !(s.font_size > 0.0) || !s.font_size.is_finite() {
            return Err(CompositorError::invalid_parameter("font size", s.font_size));
        }
        if !(s.line_height > 0.0) || !s.line_height.is_finite() {
            return Err(CompositorError::invalid_parameter("line height", s.line_height));
        }
        if !(0.0..=1.0).contains(&s.highlight_opacity) {
            return Err(CompositorError::invalid_parameter(
                "highlight opacity",
                s.highlight_opacity,
            ));
        }
        if !(s.highlight_padding >= 0.0) {
            return Err(CompositorError::invalid_parameter(
                "highlight padding",
                s.highlight_padding,
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
//  Measuring
// ---------------------------------------------------------------------------

/// Horizontal extent of a run of text, in canvas pixels.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> f32;
}

impl<F: Fn(&str) -> f32> TextMeasure for F {
    fn measure(&self, text: &str) -> f32 {
        self(text)
    }
}

/// A font at a fixed pixel size. Measuring and drawing both go through this
/// so wrapped widths match what lands on the canvas.
#[derive(Clone, Debug)]
pub struct GlyphFont {
    font: FontArc,
    px: f32,
}

impl GlyphFont {
    pub fn new(font: FontArc, px: f32) -> Self {
        Self { font, px }
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn px(&self) -> f32 {
        self.px
    }

    pub fn ascent(&self) -> f32 {
        self.font.as_scaled(self.px).ascent()
    }

    /// Glyphs of `text` with pen-x positions, kerning applied.
    fn positioned(&self, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(self.px);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor_x = 0.0f32;
        let mut last: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = last {
                cursor_x += scaled.kern(prev, id);
            }
            glyphs.push((id, cursor_x));
            cursor_x += scaled.h_advance(id);
            last = Some(id);
        }
        (glyphs, cursor_x)
    }
}

impl TextMeasure for GlyphFont {
    fn measure(&self, text: &str) -> f32 {
        self.positioned(text).1
    }
}

// ---------------------------------------------------------------------------
//  Wrapping & layout
// ---------------------------------------------------------------------------

/// Greedy word wrap. Words never split, so a word wider than `max_width` sits
/// alone on its own line. `\n` is a hard break; empty paragraphs give empty
/// lines.
pub fn wrap<M: TextMeasure + ?Sized>(text: &str, max_width: f32, measure: &M) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure.measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

pub fn measure_lines<M: TextMeasure + ?Sized>(lines: &[String], measure: &M) -> Vec<f32> {
    lines.iter().map(|l| measure.measure(l)).collect()
}

/// Resolved overlay geometry for one render.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub widths: Vec<f32>,
    pub line_height: f32,
    pub block_height: f32,
    pub highlight: RectF,
    /// Top-left of each line's glyph box.
    pub origins: Vec<Vec2>,
}

/// Wrap and place `content` in a centred area `area_width` wide. Returns `None`
/// when the content is blank after trimming.
pub fn layout_overlay<M: TextMeasure + ?Sized>(
    content: &str,
    style: &TextStyle,
    canvas: Size,
    area_width: f32,
    measure: &M,
) -> Option<TextLayout> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    let pad = style.highlight_padding;
    let lines = wrap(content, (area_width - 2.0 * pad).max(0.0), measure);
    let widths = measure_lines(&lines, measure);
    let line_height = style.font_size * style.line_height;
    let block_height = lines.len() as f32 * line_height;

    let area_x = (canvas.width as f32 - area_width) / 2.0;
    let center_y = canvas.height as f32 / 2.0 + style.vertical_offset;
    let highlight = RectF::new(
        area_x,
        center_y - block_height / 2.0 - pad * HIGHLIGHT_PAD_FACTOR,
        area_width,
        block_height + pad * HIGHLIGHT_PAD_FACTOR * 2.0,
    );

    let text_top = highlight.y + pad * HIGHLIGHT_PAD_FACTOR;
    let origins = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            Vec2::new(
                area_x + (area_width - w) / 2.0,
                text_top + i as f32 * line_height,
            )
        })
        .collect();

    Some(TextLayout {
        lines,
        widths,
        line_height,
        block_height,
        highlight,
        origins,
    })
}

// ---------------------------------------------------------------------------
//  Drawing
// ---------------------------------------------------------------------------

/// Blend glyph coverage for every laid-out line into `surface`.
pub fn rasterize_lines<S: Surface + ?Sized>(
    surface: &mut S,
    font: &GlyphFont,
    layout: &TextLayout,
    color: Rgba<u8>,
) {
    let ascent = font.ascent();
    for (line, origin) in layout.lines.iter().zip(&layout.origins) {
        let (glyphs, _) = font.positioned(line);
        for (id, x) in glyphs {
            let glyph = id.with_scale_and_position(
                font.px,
                point(origin.x + x, origin.y + ascent),
            );
            let Some(outlined) = font.font.outline_glyph(glyph) else {
                continue;
            };
            let (bx, by) = pixel_origin(outlined.px_bounds().min);
            outlined.draw(|gx, gy, coverage| {
                surface.blend_coverage(bx + gx as i32, by + gy as i32, color, coverage);
            });
        }
    }
}

/// Integer pixel holding `min`; floors so glyphs left of or above the
/// surface keep their alignment.
fn pixel_origin(min: Point) -> (i32, i32) {
    (min.x.floor() as i32, min.y.floor() as i32)
}

/// Highlight rectangle, then glyphs.
pub fn draw_overlay<S: Surface + ?Sized>(
    surface: &mut S,
    font: &GlyphFont,
    layout: &TextLayout,
    style: &TextStyle,
) {
    let [r, g, b, a] = style.highlight_color;
    let alpha = (a as f32 * style.highlight_opacity.clamp(0.0, 1.0)).round() as u8;
    if alpha > 0 {
        surface.fill_rect(layout.highlight, Rgba([r, g, b, alpha]), style.highlight_radius);
    }
    rasterize_lines(surface, font, layout, Rgba(style.color));
}

// ---------------------------------------------------------------------------
//  Font resolution
// ---------------------------------------------------------------------------

/// Load a font by family name and CSS weight from the system.
pub fn load_system_font(family: &str, weight: u16) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Weight};
    use font_kit::source::SystemSource;

    let mut props = Properties::new();
    props.weight = Weight(weight as f32);

    let name = match family.to_ascii_lowercase().as_str() {
        "sans-serif" => FamilyName::SansSerif,
        "serif" => FamilyName::Serif,
        "monospace" => FamilyName::Monospace,
        _ => FamilyName::Title(family.to_string()),
    };

    let handle = SystemSource::new()
        .select_best_match(&[name], &props)
        .ok()?;
    let font_data = handle.load().ok()?;
    let bytes: Vec<u8> = (*font_data.copy_font_data()?).clone();
    FontArc::try_from_vec(bytes).ok()
}

/// First family in `families` that resolves, falling back to the system
/// sans-serif.
pub fn resolve_font(families: &[String], weight: u16) -> Result<FontArc> {
    for family in families {
        if let Some(font) = load_system_font(family, weight) {
            log::debug!("text: using font '{family}' at weight {weight}");
            return Ok(font);
        }
    }
    if let Some(font) = load_system_font("sans-serif", weight) {
        log::warn!("text: none of {families:?} found, using system sans-serif");
        return Ok(font);
    }
    Err(CompositorError::Font {
        families: families.join(", "),
    })
}
