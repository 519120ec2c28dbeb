//! Headless region-cover image compositor.
//!
//! A fixed-size canvas is split into regions (one whole-canvas region, or a
//! top/bottom split). Each region holds at most one bitmap placed by a
//! [`FitMode`], pannable within bounds the geometry engine derives. Frames
//! are a background (flat or blurred cover), the clipped region bitmaps and an
//! optional highlighted text overlay, exported as PNG or JPEG.
//!
//! ```no_run
//! use coverframe::{FitMode, Preset, Project, RegionSlot};
//!
//! let mut project = Project::from_preset(Preset::Resizer);
//! project.open(RegionSlot::Whole, "photo.jpg".as_ref())?;
//! project.set_fit_mode(RegionSlot::Whole, FitMode::Cover)?;
//! project.drag(RegionSlot::Whole, 0.0, -40.0)?;
//! let out = project.export()?;
//! std::fs::write(&out.file_name, &out.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![allow(clippy::type_complexity)]

pub mod canvas;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod loader;
pub mod logger;
pub mod ops;
pub mod pan;
pub mod project;
pub mod surface;

pub use canvas::{CanvasLayout, LayoutKind, Region, RegionSlot, RegionState};
pub use compositor::{Background, Compositor};
pub use config::{
    BackgroundConfig, BackgroundKind, CompositorConfig, ExportConfig, PanConfig, Preset,
    TextAreaConfig,
};
pub use error::{CompositorError, Result};
pub use geometry::{FitMode, PixelRect, RectF, RegionGeometry, ScaleParams, Size, Vec2};
pub use io::SaveFormat;
pub use loader::{LoadSource, LoadTicket};
pub use ops::text::{TextMeasure, TextOverlay, TextStyle};
pub use pan::{DragUpdate, PanController};
pub use project::{ExportedImage, LoadOutcome, LoadReport, Project};
pub use surface::{RasterSurface, Surface};
