//! Garment masks produced by a separate segmentation service.
//!
//! The service writes a grayscale image the same size as the garment
//! photo; bright pixels are garment. Colour images are accepted and
//! converted to luma.

use std::path::Path;

use drape_pipeline::ExternalMask;

use crate::error::TryOnError;

/// Load a mask image and wrap it as a mask provider.
///
/// # Errors
///
/// Returns [`TryOnError::MissingFile`] if the file cannot be read and
/// [`TryOnError::Mask`] if it cannot be decoded.
pub fn read_mask(path: &Path, cleanup_radius: u8) -> Result<ExternalMask, TryOnError> {
    let bytes = std::fs::read(path).map_err(|source| TryOnError::MissingFile {
        path: path.to_owned(),
        source,
    })?;
    let mask = image::load_from_memory(&bytes)
        .map_err(|source| TryOnError::Mask {
            path: path.to_owned(),
            source,
        })?
        .to_luma8();
    log::debug!(
        "loaded {}x{} mask from {}",
        mask.width(),
        mask.height(),
        path.display()
    );
    Ok(ExternalMask::new(mask).with_cleanup_radius(cleanup_radius))
}
