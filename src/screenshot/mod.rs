//! Screenshot capture using xcap
//!
//! This module captures the primary monitor (or a region of it) with the xcap
//! crate and encodes the result as PNG. Regions are given in logical
//! coordinates and scaled to physical pixels before cropping, so a halved
//! capture on a 2x display lines up 1:1 with the cursor coordinate space.

use async_trait::async_trait;
use image::{ImageEncoder, RgbaImage, imageops::FilterType};

use crate::core::error::ActionResult;
use crate::core::geometry::Region;

/// Source of screen pixels
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Capture the whole screen, or just `region` when given
    async fn capture(&self, region: Option<Region>) -> anyhow::Result<RgbaImage>;
}

/// Captures the primary monitor
pub struct MonitorCapture;

#[async_trait]
impl ScreenCapture for MonitorCapture {
    async fn capture(&self, region: Option<Region>) -> anyhow::Result<RgbaImage> {
        // xcap is not async, so we run it in a blocking task
        tokio::task::spawn_blocking(move || capture_blocking(region)).await?
    }
}

fn capture_blocking(region: Option<Region>) -> anyhow::Result<RgbaImage> {
    let monitors = xcap::Monitor::all()?;
    let primary = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);
    let monitor = monitors
        .into_iter()
        .nth(primary)
        .ok_or_else(|| anyhow::anyhow!("No monitors found"))?;

    let full_image = monitor.capture_image()?;

    match region {
        None => Ok(full_image),
        Some(region) => {
            let scale = monitor.scale_factor().unwrap_or(1.0);
            tracing::debug!("Cropping {:?} at scale {}", region, scale);
            crop(&full_image, region.scaled(scale))
        }
    }
}

/// Crop to a pixel region, clamped to the image bounds
pub fn crop(image: &RgbaImage, region: Region) -> anyhow::Result<RgbaImage> {
    // Whatever hangs off the top or left edge is cut from the size too
    let x = region.x.max(0);
    let y = region.y.max(0);
    let width = region.width.saturating_sub(x.abs_diff(region.x));
    let height = region.height.saturating_sub(y.abs_diff(region.y));

    let cropped = image::imageops::crop_imm(image, x as u32, y as u32, width, height).to_image();

    if cropped.width() == 0 || cropped.height() == 0 {
        anyhow::bail!("Capture region {:?} lies outside the screen", region);
    }
    Ok(cropped)
}

/// Halve both dimensions (floor), never going below one pixel
pub fn halve(image: &RgbaImage) -> RgbaImage {
    let width = (image.width() / 2).max(1);
    let height = (image.height() / 2).max(1);
    image::imageops::resize(image, width, height, FilterType::CatmullRom)
}

/// Optionally halve, then encode as PNG
pub fn encode_png(image: &RgbaImage, reduce_resolution: bool) -> ActionResult<Vec<u8>> {
    let reduced;
    let image = if reduce_resolution {
        reduced = halve(image);
        &reduced
    } else {
        image
    };

    let mut buffer = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buffer);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;

    Ok(buffer)
}
