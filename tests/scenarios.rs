mod common;

use common::*;
use coverframe::loader::LoadSource;
use coverframe::{
    CompositorError, FitMode, LoadOutcome, Preset, Project, RegionSlot, RegionState, SaveFormat,
    TextOverlay, Vec2,
};

// ---------------------------------------------------------------------------
//  Resizer
// ---------------------------------------------------------------------------

#[test]
fn fit_letterboxes_and_ignores_drags() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(300, 200, RED)).unwrap();

    let region = p.region(RegionSlot::Whole).unwrap();
    assert!(approx(region.scale().unwrap(), 0.54));
    assert_eq!(region.max_offset(), Vec2::ZERO);

    assert_eq!(p.drag(RegionSlot::Whole, 40.0, -25.0).unwrap(), Vec2::ZERO);

    // 162 px wide image centred on a 192 px canvas: 15 px bars.
    let frame = p.frame().clone();
    assert_eq!(*frame.get_pixel(96, 54), RED);
    let bar = frame.get_pixel(5, 54);
    assert!(bar[0] < 230, "bar should show the darkened backdrop, got {bar:?}");
}

#[test]
fn cover_pans_only_the_overflowing_axis() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(300, 200, RED)).unwrap();
    p.set_fit_mode(RegionSlot::Whole, FitMode::Cover).unwrap();

    let region = p.region(RegionSlot::Whole).unwrap();
    assert!(approx(region.scale().unwrap(), 0.64));
    assert_eq!(region.max_offset().x, 0.0);
    assert!(approx(region.max_offset().y, 10.0));

    let offset = p.drag(RegionSlot::Whole, 30.0, 50.0).unwrap();
    assert_eq!(offset.x, 0.0);
    assert!(approx(offset.y, 10.0));
}

#[test]
fn mode_switch_resets_offset() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(400, 100, RED)).unwrap();
    p.set_fit_mode(RegionSlot::Whole, FitMode::Center).unwrap();
    p.drag(RegionSlot::Whole, -60.0, 0.0).unwrap();
    assert!(p.region(RegionSlot::Whole).unwrap().offset().x < 0.0);

    p.set_fit_mode(RegionSlot::Whole, FitMode::Cover).unwrap();
    let region = p.region(RegionSlot::Whole).unwrap();
    assert_eq!(region.offset(), Vec2::ZERO);
    // 400x100 under Cover on 192x108: height-driven, wide overflow.
    assert!(approx(region.scale().unwrap(), 1.08));
    assert!(region.max_offset().x > 0.0);
}

#[test]
fn reset_then_zero_sum_drags_returns_home() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(600, 600, RED)).unwrap();
    p.set_fit_mode(RegionSlot::Whole, FitMode::Center).unwrap();
    p.drag(RegionSlot::Whole, 17.0, 3.0).unwrap();
    p.reset(RegionSlot::Whole).unwrap();

    for (dx, dy) in [(12.0, -4.0), (-30.0, 8.0), (18.0, -4.0)] {
        p.drag(RegionSlot::Whole, dx, dy).unwrap();
    }
    assert_eq!(p.region(RegionSlot::Whole).unwrap().offset(), Vec2::ZERO);
}

#[test]
fn exact_canvas_size_stays_draggable() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(192, 108, RED)).unwrap();
    p.set_fit_mode(RegionSlot::Whole, FitMode::Center).unwrap();
    let region = p.region(RegionSlot::Whole).unwrap();
    assert_eq!(region.max_offset(), Vec2::new(192.0, 108.0));

    let offset = p.drag(RegionSlot::Whole, 500.0, -20.0).unwrap();
    assert_eq!(offset, Vec2::new(192.0, -20.0));
}

#[test]
fn custom_width_and_auto_modes() {
    let mut config = small(Preset::Resizer);
    config.custom_width_default = 96.0;
    config.auto_target = 54.0;
    let mut p = Project::new(config);
    p.load_image(RegionSlot::Whole, solid(192, 384, RED)).unwrap();

    p.set_fit_mode(RegionSlot::Whole, FitMode::CustomWidth).unwrap();
    assert!(approx(p.region(RegionSlot::Whole).unwrap().scale().unwrap(), 0.5));

    p.set_custom_width(RegionSlot::Whole, 48.0).unwrap();
    assert!(approx(p.region(RegionSlot::Whole).unwrap().scale().unwrap(), 0.25));

    let err = p.set_custom_width(RegionSlot::Whole, 0.0).unwrap_err();
    assert!(matches!(err, CompositorError::InvalidParameter { .. }));
    assert_eq!(p.region(RegionSlot::Whole).unwrap().custom_width(), 48.0);

    // Portrait: width matched to the auto target.
    p.set_fit_mode(RegionSlot::Whole, FitMode::Auto).unwrap();
    assert!(approx(p.region(RegionSlot::Whole).unwrap().scale().unwrap(), 54.0 / 192.0));
}

#[test]
fn zero_dimension_load_leaves_project_unchanged() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(300, 200, RED)).unwrap();
    let err = p
        .load_image(RegionSlot::Whole, image::RgbaImage::new(0, 50))
        .unwrap_err();
    assert!(matches!(err, CompositorError::InvalidImage { .. }));
    let region = p.region(RegionSlot::Whole).unwrap();
    assert_eq!(region.natural_size().unwrap().width, 300);
}

#[test]
fn unknown_region_is_an_error() {
    let mut p = Project::new(small(Preset::Resizer));
    assert!(matches!(
        p.drag(RegionSlot::Top, 1.0, 1.0),
        Err(CompositorError::UnknownRegion(RegionSlot::Top))
    ));
}

#[test]
fn empty_project_exports_background_only() {
    let mut p = Project::from_preset(Preset::Resizer);
    let out = p.export().unwrap();
    assert_eq!(out.file_name, "resized-1920x1080_ol.jpg");
    assert_eq!(out.format, SaveFormat::Jpeg);

    let decoded = coverframe::io::decode_image(&out.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (1920, 1080));
    // #e5e7eb survives JPEG within a few levels.
    let px = decoded.get_pixel(960, 540);
    assert!((px[0] as i32 - 0xe5).abs() <= 3);
    assert!((px[2] as i32 - 0xeb).abs() <= 3);
}

#[test]
fn export_name_follows_loaded_file() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image_named(RegionSlot::Whole, solid(20, 20, RED), Some("beach.png".into()))
        .unwrap();
    assert_eq!(p.export_file_name(SaveFormat::Jpeg), "beach_ol.jpg");
    p.remove(RegionSlot::Whole).unwrap();
    assert_eq!(p.export_file_name(SaveFormat::Jpeg), "resized-1920x1080_ol.jpg");
}

#[test]
fn white_background_toggle() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(100, 200, RED)).unwrap();
    p.set_white_background(true);
    let frame = p.frame().clone();
    assert_eq!(*frame.get_pixel(0, 54), image::Rgba([255, 255, 255, 255]));
    assert_eq!(*frame.get_pixel(96, 54), RED);
}

#[test]
fn export_to_writes_file() {
    let dir = std::env::temp_dir().join(format!("coverframe-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();

    let mut p = Project::new(small(Preset::StorySplit));
    let path = p.export_to(&dir).unwrap();
    assert_eq!(path.file_name().unwrap(), "story-split.png");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(
        coverframe::io::decode_image(&bytes).unwrap().dimensions(),
        (108, 192)
    );
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn center_accepts_panorama_wider_than_resample_cap() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(17000, 10, RED)).unwrap();
    p.set_fit_mode(RegionSlot::Whole, FitMode::Center).unwrap();

    let region = p.region(RegionSlot::Whole).unwrap();
    assert_eq!(region.scale(), Some(1.0));
    assert!(approx(region.max_offset().x, (17000.0 - 192.0) / 2.0));
    assert_eq!(*p.frame().get_pixel(96, 54), RED);
}

#[test]
fn failed_export_leaves_project_untouched() {
    let mut p = Project::new(small(Preset::Resizer));
    p.load_image(RegionSlot::Whole, solid(300, 200, RED)).unwrap();
    p.set_fit_mode(RegionSlot::Whole, FitMode::Cover).unwrap();
    p.drag(RegionSlot::Whole, 0.0, 5.0).unwrap();
    p.set_text(TextOverlay::new("  ")).unwrap();

    let root = std::env::temp_dir().join(format!("coverframe-{}", uuid::Uuid::new_v4()));
    let missing = root.join("not-there");
    let err = p.export_to(&missing).unwrap_err();
    assert!(matches!(err, CompositorError::Io(_)));

    let region = p.region(RegionSlot::Whole).unwrap();
    assert_eq!(region.fit_mode(), FitMode::Cover);
    assert_eq!(region.offset(), Vec2::new(0.0, 5.0));
    assert_eq!(region.source_name(), None);
    assert_eq!(p.text(), Some(&TextOverlay::new("  ")));

    std::fs::create_dir_all(&root).unwrap();
    let path = p.export_to(&root).unwrap();
    assert!(path.exists());
    std::fs::remove_dir_all(&root).unwrap();
}

// ---------------------------------------------------------------------------
//  Story split
// ---------------------------------------------------------------------------

#[test]
fn pointer_drag_in_bottom_band_moves_only_bottom() {
    let mut p = Project::new(small(Preset::StorySplit));
    // Both halves are 108x96; wide images overflow horizontally under Cover.
    p.load_image(RegionSlot::Top, solid(400, 200, RED)).unwrap();
    p.load_image(RegionSlot::Bottom, solid(400, 200, BLUE)).unwrap();

    // Displayed at double size.
    p.set_display_size(216.0, 384.0);
    assert_eq!(p.pointer_down(100.0, 300.0), Some(RegionSlot::Bottom));
    let update = p.pointer_move(80.0, 300.0);
    assert!(update.redraw);
    assert!(p.frame_pending());
    p.pointer_up();

    assert!(approx(p.region(RegionSlot::Bottom).unwrap().offset().x, -10.0));
    assert_eq!(p.region(RegionSlot::Top).unwrap().offset(), Vec2::ZERO);

    let frame = p.frame().clone();
    assert!(!p.frame_pending());
    assert_eq!(*frame.get_pixel(54, 10), RED);
    assert_eq!(*frame.get_pixel(54, 150), BLUE);
}

#[test]
fn fit_mode_all_is_all_or_nothing() {
    let mut p = Project::new(small(Preset::StorySplit));
    p.load_image(RegionSlot::Top, solid(100, 100, RED)).unwrap();
    p.load_image(RegionSlot::Bottom, solid(10, 10, BLUE)).unwrap();
    // Cover ignores the custom width, so the huge value is stored.
    p.set_custom_width(RegionSlot::Bottom, 1.0e6).unwrap();

    let err = p.set_fit_mode_all(FitMode::CustomWidth).unwrap_err();
    assert!(matches!(err, CompositorError::InvalidParameter { .. }));
    assert_eq!(p.region(RegionSlot::Top).unwrap().fit_mode(), FitMode::Cover);
    assert_eq!(p.region(RegionSlot::Bottom).unwrap().fit_mode(), FitMode::Cover);

    p.set_fit_mode_all(FitMode::Fit).unwrap();
    assert_eq!(p.region(RegionSlot::Top).unwrap().fit_mode(), FitMode::Fit);
    assert_eq!(p.region(RegionSlot::Bottom).unwrap().fit_mode(), FitMode::Fit);
}

#[test]
fn pointer_on_empty_half_does_nothing() {
    let mut p = Project::new(small(Preset::StorySplit));
    p.load_image(RegionSlot::Top, solid(400, 200, RED)).unwrap();
    assert_eq!(p.pointer_down(50.0, 150.0), None);
    let update = p.pointer_move(10.0, 150.0);
    assert!(update.slot.is_none());
    assert_eq!(p.region_state(RegionSlot::Bottom).unwrap(), RegionState::Empty);
}

#[test]
fn empty_half_shows_background() {
    let mut p = Project::new(small(Preset::StorySplit));
    p.load_image(RegionSlot::Top, solid(400, 200, RED)).unwrap();
    let frame = p.frame().clone();
    assert_eq!(*frame.get_pixel(54, 10), RED);
    assert_eq!(*frame.get_pixel(54, 150), image::Rgba([0, 0, 0, 255]));
}

// ---------------------------------------------------------------------------
//  Async loads
// ---------------------------------------------------------------------------

#[test]
fn older_load_is_stale_newer_is_applied() {
    let mut p = Project::new(small(Preset::StorySplit));
    let first = p
        .begin_load(
            RegionSlot::Top,
            LoadSource::Bytes {
                data: png(10, 10, RED),
                name: Some("first.png".into()),
            },
        )
        .unwrap();
    let second = p
        .begin_load(
            RegionSlot::Top,
            LoadSource::Bytes {
                data: png(20, 20, BLUE),
                name: Some("second.png".into()),
            },
        )
        .unwrap();
    assert!(second.generation > first.generation);

    let mut reports = Vec::new();
    while let Some(report) = p.wait_load() {
        reports.push(report);
    }
    assert_eq!(reports.len(), 2);
    for report in &reports {
        let outcome = report.outcome.as_ref().unwrap();
        if report.ticket == first {
            assert_eq!(*outcome, LoadOutcome::Stale);
        } else {
            assert_eq!(*outcome, LoadOutcome::Applied);
        }
    }
    let region = p.region(RegionSlot::Top).unwrap();
    assert_eq!(region.source_name(), Some("second.png"));
    assert_eq!(region.natural_size().unwrap().width, 20);
}

#[test]
fn remove_during_load_makes_result_stale() {
    let mut p = Project::new(small(Preset::StorySplit));
    p.begin_load(
        RegionSlot::Bottom,
        LoadSource::Bytes {
            data: png(10, 10, RED),
            name: None,
        },
    )
    .unwrap();
    p.remove(RegionSlot::Bottom).unwrap();

    let report = p.wait_load().unwrap();
    assert_eq!(*report.outcome.as_ref().unwrap(), LoadOutcome::Stale);
    assert_eq!(p.region_state(RegionSlot::Bottom).unwrap(), RegionState::Empty);
}

#[test]
fn failed_decode_is_reported() {
    let mut p = Project::new(small(Preset::Resizer));
    p.begin_load(
        RegionSlot::Whole,
        LoadSource::Bytes {
            data: b"nope".to_vec(),
            name: None,
        },
    )
    .unwrap();
    let report = p.wait_load().unwrap();
    assert!(matches!(
        report.outcome,
        Err(CompositorError::InvalidImage { .. })
    ));
    assert_eq!(p.loads_in_flight(), 0);
}
