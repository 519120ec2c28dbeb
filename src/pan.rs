// ============================================================================
// PAN: pointer-drag state machine for region offsets
// ============================================================================

use crate::canvas::{CanvasLayout, Region, RegionSlot};
use crate::config::PanConfig;
use crate::geometry::{Size, Vec2};

/// Result of one pointer move.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DragUpdate {
    /// Region being dragged, `None` when no drag is active.
    pub slot: Option<RegionSlot>,
    /// Settled offset of that region.
    pub offset: Vec2,
    /// Whether the move was large enough to be worth a frame.
    pub redraw: bool,
}

#[derive(Copy, Clone, Debug)]
struct ActiveDrag {
    slot: RegionSlot,
    /// Last pointer position, display space.
    last: Vec2,
    /// Canvas-space movement not yet shown.
    unpainted: Vec2,
}

/// Tracks at most one drag at a time. Pointer coordinates are in display
/// space (relative to the on-screen canvas's top-left) and are scaled to
/// canvas pixels by `canvas / display`.
#[derive(Clone, Debug)]
pub struct PanController {
    canvas: Size,
    display: Vec2,
    config: PanConfig,
    active: Option<ActiveDrag>,
}

impl PanController {
    pub fn new(canvas: Size, config: PanConfig) -> Self {
        Self {
            canvas,
            display: canvas.to_vec2(),
            config,
            active: None,
        }
    }

    /// Size the canvas is currently shown at. Non-positive sizes are ignored.
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            self.display = Vec2::new(width, height);
        }
    }

    pub fn display_size(&self) -> Vec2 {
        self.display
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_slot(&self) -> Option<RegionSlot> {
        self.active.map(|a| a.slot)
    }

    fn display_scale(&self) -> Vec2 {
        Vec2::new(
            self.canvas.width as f32 / self.display.x,
            self.canvas.height as f32 / self.display.y,
        )
    }

    /// Display-space point to canvas pixels.
    pub fn to_canvas(&self, pointer: Vec2) -> Vec2 {
        let s = self.display_scale();
        Vec2::new(pointer.x * s.x, pointer.y * s.y)
    }

    /// Start dragging the region under `pointer`. Returns the slot, or `None`
    /// if a drag is already active, the point is off-canvas, or that region is
    /// empty or cannot move.
    pub fn begin_drag(
        &mut self,
        pointer: Vec2,
        layout: &CanvasLayout,
        regions: &[Region],
    ) -> Option<RegionSlot> {
        if self.active.is_some() {
            return None;
        }
        let slot = layout.slot_at(self.to_canvas(pointer))?;
        let region = regions.iter().find(|r| r.slot() == slot)?;
        if !region.can_pan() {
            return None;
        }
        self.active = Some(ActiveDrag {
            slot,
            last: pointer,
            unpainted: Vec2::ZERO,
        });
        log::trace!("pan: drag start on {slot}");
        Some(slot)
    }

    /// Apply pointer movement to the active region.
    pub fn update_drag(&mut self, pointer: Vec2, regions: &mut [Region]) -> DragUpdate {
        let Some(active) = self.active.as_mut() else {
            return DragUpdate::default();
        };
        let Some(region) = regions.iter_mut().find(|r| r.slot() == active.slot) else {
            return DragUpdate::default();
        };

        let s = Vec2::new(
            self.canvas.width as f32 / self.display.x,
            self.canvas.height as f32 / self.display.y,
        );
        let raw = pointer - active.last;
        let delta = Vec2::new(raw.x * s.x, raw.y * s.y);
        active.last = pointer;

        let before = region.offset();
        let offset = region.drag(delta.x, delta.y);
        active.unpainted += offset - before;

        let threshold = self.config.redraw_threshold;
        let redraw = active.unpainted.x.abs() >= threshold || active.unpainted.y.abs() >= threshold;
        if redraw {
            active.unpainted = Vec2::ZERO;
        }

        DragUpdate {
            slot: Some(active.slot),
            offset,
            redraw,
        }
    }

    /// Finish the drag. Returns `true` if movement is still unpainted.
    pub fn end_drag(&mut self) -> bool {
        match self.active.take() {
            Some(a) => a.unpainted != Vec2::ZERO,
            None => false,
        }
    }

    /// Abandon the drag (pointer lost or left the surface). The offset
    /// reached so far is kept.
    pub fn cancel_drag(&mut self) -> bool {
        self.end_drag()
    }
}
