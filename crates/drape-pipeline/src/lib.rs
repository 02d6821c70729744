//! drape-pipeline: Pure garment warping pipeline (sans-IO).
//!
//! Fits a segmented garment image onto a photograph of a person:
//! segment -> garment anchors -> body landmarks -> target anchors ->
//! warp (piecewise affine or thin-plate spline) -> composite.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Filesystem interaction and
//! the command-line surface live in `drape-io` and `drape`. The
//! segmentation and pose models are reached only through the
//! [`MaskProvider`] and [`LandmarkProvider`] traits.

pub mod affine;
pub mod anchor;
pub mod composite;
pub mod decode;
pub mod keypoints;
pub mod landmarks;
pub mod mask;
pub mod overlay;
pub mod piecewise;
pub mod pipeline;
pub mod provider;
pub mod tps;
pub mod triangulate;
pub mod types;
pub mod warp;

pub use anchor::{ANCHOR_COUNT, AnchorName, AnchorPair, AnchorSet, Correspondences};
pub use keypoints::ControlPoints;
pub use landmarks::BodyLandmarks;
pub use pipeline::Pipeline;
pub use provider::{AlphaChannel, ExternalMask, FixedLandmarks, LandmarkProvider, MaskProvider, NoLandmarks};
pub use types::{
    BoundingBox, Dimensions, GarmentKind, OverlayPlacement, PipelineError, Point, TryOnConfig,
    TryOnOutput, TryOnReport,
};
pub use warp::{ResampleFilter, WarpEngine, WarpEngineKind, WarpFailurePolicy};

/// Run the full try-on pipeline.
///
/// Takes raw garment and body image bytes (PNG, JPEG, BMP, WebP), the
/// segmentation and pose services, and a configuration, then produces
/// the composite plus a [`TryOnReport`].
///
/// # Pipeline steps
///
/// 1. Validate the config and decode both images
/// 2. Segment the garment (`masks`) and derive its binary mask
/// 3. Place the garment anchors on the mask's bounding box
/// 4. Detect the body pose (`landmarks`)
/// 5. Place the same anchors on the body and pair them by name
/// 6. Warp the garment onto a body-sized canvas (pluggable engine,
///    with an optional overlay fallback)
/// 7. Composite the canvas over the body
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// if either image cannot be read.
/// Returns [`PipelineError::NoGarmentMask`] if the garment has no
/// usable silhouette.
/// Returns [`PipelineError::NoPoseDetected`] if no body is found.
/// Returns [`PipelineError::WarpComputation`] if the anchors do not
/// determine a warp and the config does not ask for the fallback.
pub fn try_on<M, L>(
    garment_bytes: &[u8],
    body_bytes: &[u8],
    masks: &M,
    landmarks: &L,
    config: &TryOnConfig,
) -> Result<TryOnOutput, PipelineError>
where
    M: MaskProvider + ?Sized,
    L: LandmarkProvider + ?Sized,
{
    let output = Pipeline::new(garment_bytes.to_vec(), body_bytes.to_vec(), config.clone())
        .decode()?
        .segment(masks)?
        .extract_anchors()?
        .detect_pose(landmarks)?
        .map_targets()
        .warp()?
        .composite()?
        .into_result();
    log::info!(
        "try-on complete: {} anchors matched, engine {:?}{}",
        output.report.matched_keypoint_count,
        output.report.engine,
        if output.report.overlay.is_some() {
            " (overlay fallback)"
        } else {
            ""
        }
    );
    Ok(output)
}
