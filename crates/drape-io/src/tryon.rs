//! File-based try-on: read inputs, run the pipeline, persist the PNG.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use drape_pipeline::{
    AlphaChannel, FixedLandmarks, LandmarkProvider, MaskProvider, NoLandmarks, TryOnConfig,
    TryOnReport,
};
use image::{ImageFormat, RgbaImage};
use serde::Serialize;

use crate::error::TryOnError;
use crate::landmarks_file::{read_landmarks, read_sidecar};
use crate::mask_file::read_mask;

/// Suffix for results produced by the full warp.
pub const WARPED_SUFFIX: &str = "_warped_tryon";

/// Suffix for results produced by the simple overlay fallback.
pub const OVERLAY_SUFFIX: &str = "_tryon";

/// One file-based try-on job.
#[derive(Debug, Clone, Default)]
pub struct TryOnRequest {
    /// Garment photo.
    pub garment: PathBuf,
    /// Photograph of the person.
    pub body: PathBuf,
    /// Landmark JSON. Defaults to the sidecar next to `body`.
    pub landmarks: Option<PathBuf>,
    /// Grayscale garment mask. Defaults to the garment's alpha channel.
    pub mask: Option<PathBuf>,
    /// Morphological cleanup radius for `mask`; 0 disables cleanup.
    pub mask_cleanup_radius: u8,
    /// Where to write the PNG. Defaults to [`default_output_path`].
    pub output: Option<PathBuf>,
    /// Pipeline configuration.
    pub config: TryOnConfig,
}

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeResult {
    /// Path of the written composite.
    pub result_path: PathBuf,
    #[serde(flatten)]
    pub report: TryOnReport,
}

/// `<body_stem>_warped_tryon.png`, or `<body_stem>_tryon.png` when the
/// overlay fallback produced the result, next to the body photo.
#[must_use]
pub fn default_output_path(body: &Path, overlay: bool) -> PathBuf {
    let stem = body
        .file_stem()
        .map_or_else(|| "body".into(), |s| s.to_string_lossy());
    let suffix = if overlay { OVERLAY_SUFFIX } else { WARPED_SUFFIX };
    body.with_file_name(format!("{stem}{suffix}.png"))
}

fn read_input(path: &Path) -> Result<Vec<u8>, TryOnError> {
    std::fs::read(path).map_err(|source| TryOnError::MissingFile {
        path: path.to_owned(),
        source,
    })
}

/// Encode `image` into a temporary file beside `path`, then rename it
/// into place. A failed write leaves nothing at `path`.
fn write_png(image: &RgbaImage, path: &Path) -> Result<(), image::ImageError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        image.write_to(&mut writer, ImageFormat::Png)?;
        writer.flush()?;
    }
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Run one try-on job end to end.
///
/// Nothing is written unless the pipeline succeeds. The result is
/// always encoded as PNG, whatever the output extension.
///
/// # Errors
///
/// Returns [`TryOnError::MissingFile`], [`TryOnError::Landmarks`] or
/// [`TryOnError::Mask`] if an input cannot be read,
/// [`TryOnError::Pipeline`] if the pipeline fails, and
/// [`TryOnError::Io`] if the result cannot be written.
pub fn run(request: &TryOnRequest) -> Result<CompositeResult, TryOnError> {
    let garment = read_input(&request.garment)?;
    let body = read_input(&request.body)?;

    let landmarks = match &request.landmarks {
        Some(path) => read_landmarks(path)?,
        None => read_sidecar(&request.body)?,
    };
    let poses: Box<dyn LandmarkProvider> = match landmarks {
        Some(found) => Box::new(FixedLandmarks(found)),
        None => Box::new(NoLandmarks),
    };
    let masks: Box<dyn MaskProvider> = match &request.mask {
        Some(path) => Box::new(read_mask(path, request.mask_cleanup_radius)?),
        None => Box::new(AlphaChannel),
    };

    let output = drape_pipeline::try_on(&garment, &body, &*masks, &*poses, &request.config)?;

    let result_path = request.output.clone().unwrap_or_else(|| {
        default_output_path(&request.body, output.report.overlay.is_some())
    });
    write_png(&output.composite, &result_path).map_err(|source| TryOnError::Io {
        path: result_path.clone(),
        source,
    })?;
    log::info!("wrote {}", result_path.display());

    Ok(CompositeResult {
        result_path,
        report: output.report,
    })
}
