//! Errors from the filesystem shell.

use std::path::PathBuf;

use drape_pipeline::PipelineError;

/// Everything that can stop a file-based try-on run.
#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    /// An input file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A landmark file is not valid landmark JSON.
    #[error("invalid landmark file {}: {source}", path.display())]
    Landmarks {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A mask file is not a decodable image.
    #[error("invalid mask file {}: {source}", path.display())]
    Mask {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The pipeline itself failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The result could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
