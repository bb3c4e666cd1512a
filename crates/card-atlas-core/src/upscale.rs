use image::{RgbaImage, imageops};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::compositing::{load_rgba, scaled_size};
use crate::error::{AtlasError, Result};

/// Nearest-neighbour upscale by an integer factor; keeps pixel art crisp.
pub fn upscale_pixel_art(img: &RgbaImage, factor: u32) -> Result<RgbaImage> {
    let (w, h) = scaled_size(img.dimensions(), factor)?;
    Ok(imageops::resize(img, w, h, imageops::FilterType::Nearest))
}

/// Upscales the image at `input` and writes it under `out_dir` with the same file name.
pub fn upscale_file(input: &Path, out_dir: &Path, factor: u32) -> Result<PathBuf> {
    if factor == 0 {
        return Err(AtlasError::InvalidInput("upscale factor must be at least 1".into()));
    }
    let file_name = input
        .file_name()
        .ok_or_else(|| AtlasError::InvalidInput(format!("{} has no file name", input.display())))?;
    let img = load_rgba(input)?;
    let out = upscale_pixel_art(&img, factor)?;
    fs::create_dir_all(out_dir)?;
    let out_path = out_dir.join(file_name);
    out.save(&out_path)?;
    info!(input = %input.display(), output = %out_path.display(), factor, "upscaled");
    Ok(out_path)
}
