//! Map of the classification, one pixel per region

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use thiserror::Error;

use crate::classify::Classification;
use crate::config::TrimSettings;
use crate::tile::TileCoord;

/// Default name of the rendered map.
pub const MAP_FILE: &str = "world.png";

pub const SPAWN_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const INHABITED_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const CONNECTED_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);
pub const UNINHABITED_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("border radius {0} is too large to render")]
    TooLarge(u32),
    #[error("failed to write map: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode map: {0}")]
    Encode(#[from] image::ImageError),
}

/// Largest map rendered, in pixels (4 GiB of RGBA).
pub const MAX_MAP_PIXELS: u64 = 1 << 30;

/// Side length of the square map.
pub fn map_size(settings: &TrimSettings) -> Result<u32, RenderError> {
    let too_large = RenderError::TooLarge(settings.border_radius);
    let size = settings
        .border_radius
        .checked_mul(2)
        .and_then(|size| size.checked_add(1))
        .ok_or(too_large)?;
    let pixels = u64::from(size) * u64::from(size);
    let fits = pixels <= MAX_MAP_PIXELS
        && pixels
            .checked_mul(4)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .is_some();
    if fits {
        Ok(size)
    } else {
        Err(RenderError::TooLarge(settings.border_radius))
    }
}

/// Paints the area inside the border; regions outside it are left transparent.
pub fn render(result: &Classification, settings: &TrimSettings) -> Result<RgbaImage, RenderError> {
    let size = map_size(settings)?;
    let mut image = RgbaImage::new(size, size);
    let layers = [
        (&result.spawn, SPAWN_COLOR),
        (&result.inhabited, INHABITED_COLOR),
        (&result.connected, CONNECTED_COLOR),
        (&result.uninhabited, UNINHABITED_COLOR),
    ];
    for (tiles, color) in layers {
        for &tile in tiles {
            if let Some((px, py)) = pixel_for(tile, settings, size) {
                image.put_pixel(px, py, color);
            }
        }
    }
    Ok(image)
}

fn pixel_for(tile: TileCoord, settings: &TrimSettings, size: u32) -> Option<(u32, u32)> {
    let radius = i64::from(settings.border_radius);
    let px = i64::from(tile.x) - i64::from(settings.center.x) + radius;
    let py = i64::from(tile.z) - i64::from(settings.center.z) + radius;
    let px = u32::try_from(px).ok().filter(|&p| p < size)?;
    let py = u32::try_from(py).ok().filter(|&p| p < size)?;
    Some((px, py))
}

pub fn save_map(image: &RgbaImage, path: impl AsRef<Path>) -> Result<(), RenderError> {
    let output = BufWriter::new(File::create(path)?);
    let encoder = PngEncoder::new(output);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(())
}
