//! CLI command implementations

pub mod exposure;
pub mod filter;
pub mod regions;
pub mod remap;

use anyhow::{bail, Context, Result};
use chromap_core::{ColorImage, Plane, Rect};
use image::{DynamicImage, ImageFormat};
use std::path::Path;

/// Load image from path as float RGBA.
///
/// Integer formats are normalized to [0, 1]; no transfer function is undone.
pub fn load_image(path: &Path) -> Result<ColorImage> {
    let img = image::open(path).with_context(|| format!("Failed to load: {}", path.display()))?;
    let (width, height) = (img.width(), img.height());
    let data = img.into_rgba32f().into_raw();
    ColorImage::from_data(Rect::from_size(width, height), data)
        .with_context(|| format!("Bad pixel data in: {}", path.display()))
}

/// Save image to path.
///
/// EXR keeps float samples; other formats are quantized (PNG/TIFF to 16 bit,
/// JPEG to 8 bit RGB).
pub fn save_image(path: &Path, image: &ColorImage) -> Result<()> {
    let window = image.window();
    let buf = image::Rgba32FImage::from_raw(window.width, window.height, image.data().to_vec())
        .context("Image buffer does not match its dimensions")?;
    let float = DynamicImage::ImageRgba32F(buf);

    let format = ImageFormat::from_path(path)
        .with_context(|| format!("Unknown output format: {}", path.display()))?;
    let encoded = match format {
        ImageFormat::OpenExr => float,
        ImageFormat::Hdr => DynamicImage::ImageRgb32F(float.to_rgb32f()),
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(float.to_rgb8()),
        ImageFormat::Png | ImageFormat::Tiff => DynamicImage::ImageRgba16(float.to_rgba16()),
        _ => DynamicImage::ImageRgba8(float.to_rgba8()),
    };

    encoded
        .save_with_format(path, format)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Broadcasts a single-channel plane to opaque gray RGBA.
pub fn plane_to_gray(plane: &Plane) -> ColorImage {
    plane.map_channels(|[v]| [v, v, v, 1.0])
}

/// Parses `r,g,b` or `r,g,b,a` (alpha defaults to 1).
pub fn parse_color(s: &str) -> Result<[f32; 4]> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid color: '{s}'"))?;
    match parts[..] {
        [r, g, b] => Ok([r, g, b, 1.0]),
        [r, g, b, a] => Ok([r, g, b, a]),
        _ => bail!("Expected r,g,b or r,g,b,a but got '{s}'"),
    }
}
