use std::sync::Arc;

use coverframe::geometry::{self, FitMode, PixelRect, ScaleParams, Size, Vec2};
use coverframe::{Region, RegionSlot};
use image::{Rgba, RgbaImage};
use proptest::prelude::*;

fn region(mode: FitMode, custom_width: f32) -> Region {
    Region::new(
        RegionSlot::Whole,
        PixelRect::new(0, 0, 16, 9),
        mode,
        ScaleParams {
            custom_width,
            auto_target: 32.0,
            ..ScaleParams::default()
        },
    )
}

fn bitmap(w: u32, h: u32) -> Arc<RgbaImage> {
    Arc::new(RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255])))
}

fn within(offset: Vec2, max: Vec2) -> bool {
    offset.x.abs() <= max.x && offset.y.abs() <= max.y
}

fn any_mode() -> impl Strategy<Value = FitMode> {
    prop::sample::select(FitMode::all().to_vec())
}

proptest! {
    #[test]
    fn offset_never_leaves_bounds(
        mode in any_mode(),
        w in 1u32..64,
        h in 1u32..64,
        custom_width in 1.0f32..200.0,
        drags in prop::collection::vec((-80.0f32..80.0, -80.0f32..80.0), 0..12),
    ) {
        let mut r = region(mode, custom_width);
        r.load(bitmap(w, h), None).unwrap();
        let max = r.max_offset();
        prop_assert!(max.x >= 0.0 && max.y >= 0.0);

        for (dx, dy) in drags {
            let offset = r.drag(dx, dy);
            prop_assert!(within(offset, max), "{offset:?} outside {max:?}");
        }
    }

    #[test]
    fn fit_is_never_pannable(w in 1u32..5000, h in 1u32..5000) {
        let g = geometry::solve(FitMode::Fit, Size::new(1920, 1080), Size::new(w, h), &ScaleParams::default()).unwrap();
        prop_assert_eq!(g.max_offset, Vec2::ZERO);
        prop_assert!(g.scaled_size.x <= 1920.0 + 1e-2 && g.scaled_size.y <= 1080.0 + 1e-2);
    }

    #[test]
    fn cover_driving_axis_fills_region(w in 1u32..5000, h in 1u32..5000) {
        let region = Size::new(1920, 1080);
        let params = ScaleParams { exact_size_pan: false, ..ScaleParams::default() };
        let g = geometry::solve(FitMode::Cover, region, Size::new(w, h), &params).unwrap();
        let fills_x = g.scaled_size.x >= 1920.0 - 1e-2;
        let fills_y = g.scaled_size.y >= 1080.0 - 1e-2;
        prop_assert!(fills_x && fills_y);
        prop_assert!(g.max_offset.x >= 0.0 && g.max_offset.y >= 0.0);
    }

    #[test]
    fn zero_sum_drags_return_to_origin(
        drags in prop::collection::vec((-3i32..=3, -3i32..=3), 0..6),
    ) {
        // 64x64 centred in 16x9 gives bounds of (24, 27.5); six steps of at
        // most 3 px never reach them.
        let mut r = region(FitMode::Center, 1080.0);
        r.load(bitmap(64, 64), None).unwrap();
        r.reset().unwrap();

        for (dx, dy) in &drags {
            r.drag(*dx as f32, *dy as f32);
        }
        for (dx, dy) in drags.iter().rev() {
            r.drag(-*dx as f32, -*dy as f32);
        }
        prop_assert_eq!(r.offset(), Vec2::ZERO);
    }
}
