//! drape-io: Filesystem shell around the drape pipeline.
//!
//! Reads the garment and body photos from disk, loads body landmarks
//! and optional garment masks produced by external services, runs
//! [`drape_pipeline::try_on`], and writes the composite as PNG.

pub mod error;
pub mod landmarks_file;
pub mod mask_file;
pub mod tryon;

pub use error::TryOnError;
pub use landmarks_file::{read_landmarks, read_sidecar, sidecar_path};
pub use mask_file::read_mask;
pub use tryon::{CompositeResult, TryOnRequest, default_output_path, run};
