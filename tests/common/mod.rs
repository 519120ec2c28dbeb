#![allow(dead_code)]

use coverframe::{CompositorConfig, Preset, Size};
use coverframe::ops::transform::Interpolation;
use image::{Rgba, RgbaImage};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Preset scaled down by 10 so pixel tests stay fast.
pub fn small(preset: Preset) -> CompositorConfig {
    let mut config = preset.config();
    config.canvas = Size::new(config.canvas.width / 10, config.canvas.height / 10);
    config.interpolation = Interpolation::Nearest;
    config
}

pub fn solid(w: u32, h: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(w, h, color)
}

pub fn png(w: u32, h: u32, color: Rgba<u8>) -> Vec<u8> {
    coverframe::io::encode_png(&solid(w, h, color)).unwrap()
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
