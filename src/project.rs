use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use image::RgbaImage;
use uuid::Uuid;

use crate::canvas::{CanvasLayout, Region, RegionSlot, RegionState};
use crate::compositor::Compositor;
use crate::config::{BackgroundConfig, CompositorConfig, Preset};
use crate::error::{CompositorError, Result};
use crate::geometry::{FitMode, Vec2};
use crate::io::{self, SaveFormat};
use crate::loader::{LoadResult, LoadSource, LoadTicket, Loader};
use crate::ops::text::{TextOverlay, resolve_font};
use crate::pan::{DragUpdate, PanController};

/// What happened to a finished background decode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Installed into its region.
    Applied,
    /// The region was reloaded or removed after the request; result dropped.
    Stale,
}

#[derive(Debug)]
pub struct LoadReport {
    pub ticket: LoadTicket,
    pub outcome: Result<LoadOutcome>,
}

/// An encoded frame ready to hand to the user.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub file_name: String,
    pub format: SaveFormat,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
enum OverlayFont {
    /// Supplied by the host; kept regardless of weight.
    Injected(FontArc),
    /// Looked up from the configured families at this weight.
    System(FontArc, u16),
}

impl OverlayFont {
    fn font(&self) -> &FontArc {
        match self {
            OverlayFont::Injected(f) | OverlayFont::System(f, _) => f,
        }
    }
}

/// Single compositing session: one canvas, its regions, pan state and
/// overlay. Owned by one thread.
pub struct Project {
    pub id: Uuid,
    config: CompositorConfig,
    layout: CanvasLayout,
    regions: Vec<Region>,
    pan: PanController,
    compositor: Compositor,
    loader: Loader,
    text: Option<TextOverlay>,
    font: Option<OverlayFont>,
    frame: Option<RgbaImage>,
    frame_pending: bool,
    /// Changed since the last export.
    pub is_dirty: bool,
}

impl Project {
    pub fn new(config: CompositorConfig) -> Self {
        let layout = CanvasLayout::new(config.canvas, config.layout);
        let params = config.scale_params();
        let regions = layout
            .slots()
            .iter()
            .filter_map(|&slot| {
                let rect = layout.rect(slot).ok()?;
                Some(Region::new(slot, rect, config.default_fit_mode, params))
            })
            .collect();

        log::info!(
            "project: new {} canvas, {:?} layout",
            config.canvas,
            config.layout
        );

        Self {
            id: Uuid::new_v4(),
            pan: PanController::new(config.canvas, config.pan),
            compositor: Compositor::new(&config),
            loader: Loader::new(),
            layout,
            regions,
            config,
            text: None,
            font: None,
            frame: None,
            frame_pending: true,
            is_dirty: false,
        }
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self::new(preset.config())
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn layout(&self) -> &CanvasLayout {
        &self.layout
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, slot: RegionSlot) -> Result<&Region> {
        self.regions
            .iter()
            .find(|r| r.slot() == slot)
            .ok_or(CompositorError::UnknownRegion(slot))
    }

    fn region_mut(&mut self, slot: RegionSlot) -> Result<&mut Region> {
        self.regions
            .iter_mut()
            .find(|r| r.slot() == slot)
            .ok_or(CompositorError::UnknownRegion(slot))
    }

    pub fn region_state(&self, slot: RegionSlot) -> Result<RegionState> {
        Ok(self.region(slot)?.state())
    }

    // -- region operations --------------------------------------------------

    pub fn load_image(&mut self, slot: RegionSlot, image: RgbaImage) -> Result<()> {
        self.load_image_named(slot, image, None)
    }

    /// Like `load_image`, remembering `name` for export naming.
    pub fn load_image_named(
        &mut self,
        slot: RegionSlot,
        image: RgbaImage,
        name: Option<String>,
    ) -> Result<()> {
        self.region_mut(slot)?.load(image.into(), name)?;
        self.changed();
        Ok(())
    }

    /// Decode `path` on the calling thread and load it.
    pub fn open(&mut self, slot: RegionSlot, path: &Path) -> Result<()> {
        self.region(slot)?;
        let source = io::open_image(path)?;
        self.load_image_named(slot, source.image, source.name)
    }

    pub fn set_fit_mode(&mut self, slot: RegionSlot, mode: FitMode) -> Result<()> {
        self.region_mut(slot)?.set_fit_mode(mode)?;
        self.changed();
        Ok(())
    }

    /// Set the mode of every region at once.
    /// Set the mode of every region at once. Nothing changes unless every
    /// region accepts the mode.
    pub fn set_fit_mode_all(&mut self, mode: FitMode) -> Result<()> {
        for region in &self.regions {
            region.check_fit_mode(mode)?;
        }
        for region in &mut self.regions {
            region.set_fit_mode(mode)?;
        }
        self.changed();
        Ok(())
    }

    pub fn set_custom_width(&mut self, slot: RegionSlot, width: f32) -> Result<()> {
        self.region_mut(slot)?.set_custom_width(width)?;
        self.changed();
        Ok(())
    }

    /// Pan `slot` by a canvas-space delta. Returns the clamped offset.
    pub fn drag(&mut self, slot: RegionSlot, dx: f32, dy: f32) -> Result<Vec2> {
        let region = self.region_mut(slot)?;
        let before = region.offset();
        let offset = region.drag(dx, dy);
        if offset != before {
            self.is_dirty = true;
            self.request_frame();
        }
        Ok(offset)
    }

    pub fn reset(&mut self, slot: RegionSlot) -> Result<()> {
        self.region_mut(slot)?.reset()?;
        self.changed();
        Ok(())
    }

    pub fn remove(&mut self, slot: RegionSlot) -> Result<()> {
        if self.pan.active_slot() == Some(slot) {
            self.pan.cancel_drag();
        }
        self.region_mut(slot)?.remove();
        self.changed();
        Ok(())
    }

    /// Empty every region and drop the overlay.
    pub fn clear(&mut self) {
        self.pan.cancel_drag();
        for region in &mut self.regions {
            region.remove();
        }
        self.text = None;
        self.changed();
    }

    // -- overlay & background -------------------------------------------------

    /// Install `overlay`. Resolves a system font for its weight unless one was
    /// injected with [`Project::set_font`].
    pub fn set_text(&mut self, overlay: TextOverlay) -> Result<()> {
        overlay.validate()?;
        if !overlay.is_blank() {
            self.ensure_font(overlay.style.font_weight)?;
        }
        self.text = Some(overlay);
        self.changed();
        Ok(())
    }

    /// `set_text` with the configured default style.
    pub fn set_text_content(&mut self, content: &str) -> Result<()> {
        self.set_text(TextOverlay {
            content: content.to_string(),
            style: self.config.text.style.clone(),
        })
    }

    pub fn clear_text(&mut self) {
        if self.text.take().is_some() {
            self.changed();
        }
    }

    pub fn text(&self) -> Option<&TextOverlay> {
        self.text.as_ref()
    }

    pub fn set_font(&mut self, font: FontArc) {
        self.font = Some(OverlayFont::Injected(font));
        if self.text.is_some() {
            self.changed();
        }
    }

    fn ensure_font(&mut self, weight: u16) -> Result<()> {
        match &self.font {
            Some(OverlayFont::Injected(_)) => return Ok(()),
            Some(OverlayFont::System(_, w)) if *w == weight => return Ok(()),
            _ => {}
        }
        let font = resolve_font(&self.config.text.font_families, weight)?;
        self.font = Some(OverlayFont::System(font, weight));
        Ok(())
    }

    pub fn set_white_background(&mut self, white: bool) {
        self.compositor.set_white_background(white);
        self.changed();
    }

    pub fn set_background(&mut self, background: BackgroundConfig) {
        self.compositor.set_background(background);
        self.changed();
    }

    // -- pointer ----------------------------------------------------------------

    /// On-screen size the canvas is displayed at, for pointer scaling.
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        self.pan.set_display_size(width, height);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<RegionSlot> {
        self.pan.begin_drag(Vec2::new(x, y), &self.layout, &self.regions)
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> DragUpdate {
        let update = self.pan.update_drag(Vec2::new(x, y), &mut self.regions);
        if update.slot.is_some() {
            self.is_dirty = true;
        }
        if update.redraw {
            self.request_frame();
        }
        update
    }

    pub fn pointer_up(&mut self) {
        if self.pan.end_drag() {
            self.request_frame();
        }
    }

    pub fn pointer_cancel(&mut self) {
        if self.pan.cancel_drag() {
            self.request_frame();
        }
    }

    // -- async loads --------------------------------------------------------------

    /// Start decoding `source` in the background for `slot`. Any earlier
    /// request for the same slot becomes stale.
    pub fn begin_load(&mut self, slot: RegionSlot, source: LoadSource) -> Result<LoadTicket> {
        let generation = self.region_mut(slot)?.begin_load();
        let ticket = LoadTicket { slot, generation };
        log::debug!("project: load requested for {slot} (generation {generation})");
        self.loader.spawn(ticket, source);
        Ok(ticket)
    }

    /// Apply every finished decode without blocking.
    pub fn poll_loads(&mut self) -> Vec<LoadReport> {
        let results = self.loader.drain();
        results.into_iter().map(|r| self.apply_load(r)).collect()
    }

    /// Block for the next finished decode and apply it.
    pub fn wait_load(&mut self) -> Option<LoadReport> {
        let result = self.loader.wait()?;
        Some(self.apply_load(result))
    }

    pub fn loads_in_flight(&self) -> usize {
        self.loader.in_flight()
    }

    fn apply_load(&mut self, result: LoadResult) -> LoadReport {
        let LoadResult { ticket, result } = result;
        let current = self.region(ticket.slot).map(|r| r.generation());
        let outcome = match current {
            Ok(generation) if generation != ticket.generation => {
                log::debug!(
                    "project: dropped stale load for {} (generation {} != {})",
                    ticket.slot,
                    ticket.generation,
                    generation
                );
                Ok(LoadOutcome::Stale)
            }
            Ok(_) => result
                .and_then(|src| self.load_image_named(ticket.slot, src.image, src.name))
                .map(|()| LoadOutcome::Applied),
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            log::warn!("project: load for {} failed: {e}", ticket.slot);
        }
        LoadReport { ticket, outcome }
    }

    // -- frames -------------------------------------------------------------------

    /// Ask for a repaint on the next `frame()` call. Repeated requests
    /// collapse into one.
    pub fn request_frame(&mut self) {
        self.frame_pending = true;
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Latest frame, rendering first if one was requested.
    pub fn frame(&mut self) -> &RgbaImage {
        if self.frame_pending || self.frame.is_none() {
            self.render_now();
        }
        self.frame.get_or_insert_with(RgbaImage::default)
    }

    /// Render immediately and keep the result as the current frame.
    pub fn render_now(&mut self) -> &RgbaImage {
        let frame = self.render();
        self.frame_pending = false;
        self.frame.insert(frame)
    }

    /// Render a fresh frame without touching the stored one.
    pub fn render(&mut self) -> RgbaImage {
        let text = match (&self.text, &self.font) {
            (Some(overlay), Some(font)) => Some((overlay, font.font())),
            _ => None,
        };
        self.compositor.render(&self.layout, &mut self.regions, text)
    }

    /// State change that renders synchronously.
    fn changed(&mut self) {
        self.is_dirty = true;
        self.render_now();
    }

    // -- export -------------------------------------------------------------------

    /// Name for the next export, from the first region with a known source name.
    pub fn export_file_name(&self, format: SaveFormat) -> String {
        let source = self.regions.iter().find_map(|r| r.source_name());
        io::export_file_name(source, format, &self.config.export)
    }

    /// Encode the canvas in the configured format.
    pub fn export(&mut self) -> Result<ExportedImage> {
        self.export_as(self.config.export.format)
    }

    pub fn export_as(&mut self, format: SaveFormat) -> Result<ExportedImage> {
        let frame = self.render();
        let bytes = io::encode(&frame, format, self.config.export.jpeg_quality)?;
        let file_name = self.export_file_name(format);
        log::info!("project: exported {file_name} ({} bytes)", bytes.len());
        self.is_dirty = false;
        Ok(ExportedImage {
            file_name,
            format,
            bytes,
        })
    }

    /// Export and write into `dir`. Returns the written path.
    pub fn export_to(&mut self, dir: &Path) -> Result<PathBuf> {
        let exported = self.export()?;
        io::write_export_in(dir, &exported.file_name, &exported.bytes)
    }
}
