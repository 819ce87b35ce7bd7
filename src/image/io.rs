//! I/O helpers for gray images and JSON reports.
//!
//! - `load_gray_image`: read a PNG/JPEG/BMP into an owned 8-bit gray buffer.
//! - `save_gray_image`: write an 8-bit gray buffer to disk.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::ImageU8;
use image::GrayImage;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert to 8-bit grayscale.
pub fn load_gray_image(path: &Path) -> Result<GrayImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8();
    Ok(img)
}

/// Borrow an owned gray image as the pipeline's input view.
pub fn as_view(img: &GrayImage) -> ImageU8<'_> {
    ImageU8 {
        w: img.width() as usize,
        h: img.height() as usize,
        stride: img.width() as usize,
        data: img.as_raw(),
    }
}

pub fn save_gray_image(img: &GrayImage, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    img.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
