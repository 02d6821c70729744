//! Body landmarks stored as JSON next to the photograph.
//!
//! The pose model runs out of process; its output is a JSON document
//! holding a [`BodyLandmarks`] object, or `null` when it found nobody.
//! By default the file sits beside the photograph as
//! `<stem>.landmarks.json`.

use std::path::{Path, PathBuf};

use drape_pipeline::BodyLandmarks;

use crate::error::TryOnError;

/// Suffix appended to the photograph's file stem.
pub const SIDECAR_SUFFIX: &str = ".landmarks.json";

/// Where the landmark sidecar for `body` is expected.
#[must_use]
pub fn sidecar_path(body: &Path) -> PathBuf {
    let stem = body
        .file_stem()
        .map_or_else(|| "body".into(), |s| s.to_string_lossy());
    body.with_file_name(format!("{stem}{SIDECAR_SUFFIX}"))
}

/// Parse landmark JSON. `null` means no body was found.
///
/// # Errors
///
/// Returns the `serde_json` error if `json` is not a landmark object
/// or `null`.
pub fn parse_landmarks(json: &str) -> Result<Option<BodyLandmarks>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Read landmarks from an explicitly named file.
///
/// # Errors
///
/// Returns [`TryOnError::MissingFile`] if the file cannot be read and
/// [`TryOnError::Landmarks`] if it is not valid landmark JSON.
pub fn read_landmarks(path: &Path) -> Result<Option<BodyLandmarks>, TryOnError> {
    let json = std::fs::read_to_string(path).map_err(|source| TryOnError::MissingFile {
        path: path.to_owned(),
        source,
    })?;
    parse_landmarks(&json).map_err(|source| TryOnError::Landmarks {
        path: path.to_owned(),
        source,
    })
}

/// Read the landmark sidecar for `body`, if one exists.
///
/// A missing sidecar is the same as a pose service that found nobody.
///
/// # Errors
///
/// Returns [`TryOnError::Landmarks`] if the sidecar exists but is not
/// valid landmark JSON, or [`TryOnError::MissingFile`] if it exists but
/// cannot be read.
pub fn read_sidecar(body: &Path) -> Result<Option<BodyLandmarks>, TryOnError> {
    let path = sidecar_path(body);
    if !path.exists() {
        log::debug!("no landmark sidecar at {}", path.display());
        return Ok(None);
    }
    read_landmarks(&path)
}
