//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) for the garment and
//! the body photograph. The garment keeps its original colour type so
//! the segmentation step can tell whether it carries an alpha channel;
//! the body is converted to RGBA straight away.

use image::{DynamicImage, RgbaImage};

use crate::types::PipelineError;

/// Decode raw image bytes, keeping the original colour type.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Decode raw image bytes into an RGBA raster.
///
/// Images without alpha become fully opaque.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    decode(bytes).map(|img| img.to_rgba8())
}
