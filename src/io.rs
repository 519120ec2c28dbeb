// ============================================================================
// IO: decode sources, encode frames, name and write exports
// ============================================================================

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::error::{CompositorError, Result};

/// Output encodings. The compositor only ever writes these two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveFormat {
    Png,
    Jpeg,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            SaveFormat::Png => "image/png",
            SaveFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            _ => None,
        }
    }
}

/// A decoded bitmap plus the file name it came from, if any.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub image: RgbaImage,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
//  Decode
// ---------------------------------------------------------------------------

/// Decode any supported raster format to RGBA8. Undecodable input and
/// zero-dimension images are `InvalidImage`.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| CompositorError::invalid_image(e.to_string()))?
        .to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(CompositorError::invalid_image(format!(
            "decoded image is {}x{}",
            img.width(),
            img.height()
        )));
    }
    Ok(img)
}

/// Read and decode a file, remembering its name for export naming.
pub fn open_image(path: &Path) -> Result<SourceImage> {
    let bytes = std::fs::read(path)?;
    let image = decode_image(&bytes)?;
    let name = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
    log::info!(
        "io: decoded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(SourceImage { image, name })
}

// ---------------------------------------------------------------------------
//  Encode
// ---------------------------------------------------------------------------

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8,
    )?;
    Ok(out)
}

/// Alpha is dropped; `quality` is clamped to 1..=100.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder.encode(
        rgb_image.as_raw(),
        rgb_image.width(),
        rgb_image.height(),
        ColorType::Rgb8,
    )?;
    Ok(out)
}

pub fn encode(image: &RgbaImage, format: SaveFormat, quality: u8) -> Result<Vec<u8>> {
    match format {
        SaveFormat::Png => encode_png(image),
        SaveFormat::Jpeg => encode_jpeg(image, quality),
    }
}

// ---------------------------------------------------------------------------
//  Export naming & writing
// ---------------------------------------------------------------------------

/// `<stem><suffix>.<ext>` when the input name has a usable stem, otherwise
/// `<fallback_name>.<ext>`.
pub fn export_file_name(source_name: Option<&str>, format: SaveFormat, export: &ExportConfig) -> String {
    let stem = source_name
        .and_then(|n| Path::new(n).file_stem())
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match stem {
        Some(stem) => format!("{stem}{}.{}", export.suffix, format.extension()),
        None => format!("{}.{}", export.fallback_name, format.extension()),
    }
}

/// Write `bytes` to `path`, creating or truncating it.
pub fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    log::info!("io: wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Join `dir` and `file_name`, writing the export there.
pub fn write_export_in(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    write_export(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use image::Rgba;

    #[test]
    fn resizer_names_from_stem_or_fallback() {
        let export = Preset::Resizer.config().export;
        assert_eq!(
            export_file_name(Some("holiday.photo.png"), SaveFormat::Jpeg, &export),
            "holiday.photo_ol.jpg"
        );
        assert_eq!(
            export_file_name(None, SaveFormat::Jpeg, &export),
            "resized-1920x1080_ol.jpg"
        );
    }

    #[test]
    fn story_split_fallback_name() {
        let export = Preset::StorySplit.config().export;
        assert_eq!(export_file_name(None, SaveFormat::Png, &export), "story-split.png");
    }

    #[test]
    fn png_round_trip_keeps_pixels() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 200, 30, 128]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(decode_image(&bytes).unwrap(), img);
    }

    #[test]
    fn jpeg_has_soi_marker_and_size() {
        let img = RgbaImage::from_pixel(16, 8, Rgba([200, 50, 50, 255]));
        let bytes = encode_jpeg(&img, 0).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(decode_image(&bytes).unwrap().dimensions(), (16, 8));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(SaveFormat::from_extension("JPEG"), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_extension("png").map(|f| f.mime()), Some("image/png"));
        assert_eq!(SaveFormat::from_extension("gif"), None);
    }

    #[test]
    fn garbage_is_invalid_image() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CompositorError::InvalidImage { .. }));
    }
}
