use std::path::{Path, PathBuf};

use egui::ColorImage;
use image::RgbaImage;
use thiserror::Error;

/// Failure writing a rendered view to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Rendered image has invalid size {width}x{height}")]
    InvalidSize { width: usize, height: usize },
    #[error("Failed to create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write PNG {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Copy an egui image into an `image` buffer.
pub fn to_rgba_image(image: &ColorImage) -> Option<RgbaImage> {
    let [width, height] = image.size;
    let bytes: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|pixel| pixel.to_srgba_unmultiplied())
        .collect();
    RgbaImage::from_raw(u32::try_from(width).ok()?, u32::try_from(height).ok()?, bytes)
}

/// Write `image` to `path` as PNG, creating parent directories.
pub fn save_png(image: &ColorImage, path: &Path) -> Result<(), ExportError> {
    let [width, height] = image.size;
    let rgba = to_rgba_image(image).ok_or(ExportError::InvalidSize { width, height })?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    rgba.save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| ExportError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!("Saved boundary view to {}", path.display());
    Ok(())
}
