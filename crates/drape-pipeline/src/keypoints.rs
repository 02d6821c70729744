//! Garment control points from a silhouette mask.
//!
//! Every anchor sits at a fixed fraction of the garment's bounding box.
//! The fractions describe a generic upper-body garment laid flat:
//! shoulders and neckline along the top edge, underarms at the widest
//! point a quarter of the way down, hem along the bottom edge.

use image::GrayImage;

use crate::anchor::{ANCHOR_COUNT, AnchorName, AnchorSet};
use crate::mask;
use crate::types::{BoundingBox, PipelineError, Point};

/// `(name, x_fraction, y_fraction)` of each anchor relative to the
/// garment bounding box.
pub const GARMENT_LAYOUT: [(AnchorName, f64, f64); ANCHOR_COUNT] = [
    (AnchorName::LeftShoulder, 0.15, 0.05),
    (AnchorName::NeckLeft, 0.35, 0.0),
    (AnchorName::NeckCenter, 0.50, 0.0),
    (AnchorName::NeckRight, 0.65, 0.0),
    (AnchorName::RightShoulder, 0.85, 0.05),
    (AnchorName::LeftUnderarm, 0.0, 0.25),
    (AnchorName::LeftChest, 0.25, 0.25),
    (AnchorName::CenterChest, 0.50, 0.25),
    (AnchorName::RightChest, 0.75, 0.25),
    (AnchorName::RightUnderarm, 1.0, 0.25),
    (AnchorName::LeftWaist, 0.1, 0.6),
    (AnchorName::CenterWaist, 0.5, 0.6),
    (AnchorName::RightWaist, 0.9, 0.6),
    (AnchorName::LeftHem, 0.15, 1.0),
    (AnchorName::CenterHem, 0.5, 1.0),
    (AnchorName::RightHem, 0.85, 1.0),
];

/// Anchors positioned on a garment raster, plus the box they were
/// derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoints {
    /// One point per [`AnchorName`]; always complete.
    pub anchors: AnchorSet,
    /// Tight bounding box of the silhouette.
    pub bbox: BoundingBox,
}

/// Lay out every anchor inside `bbox` using [`GARMENT_LAYOUT`].
#[must_use]
pub fn layout_in_box(bbox: BoundingBox) -> ControlPoints {
    let (w, h) = (bbox.width(), bbox.height());
    let (x0, y0) = (f64::from(bbox.x0), f64::from(bbox.y0));
    let anchors = GARMENT_LAYOUT
        .iter()
        .map(|&(name, fx, fy)| (name, Point::new(fx.mul_add(w, x0), fy.mul_add(h, y0))))
        .collect();
    ControlPoints { anchors, bbox }
}

/// Extract control points from a binary silhouette mask.
///
/// # Errors
///
/// Returns [`PipelineError::NoGarmentMask`] if the mask has no
/// foreground pixels.
pub fn extract_control_points(mask: &GrayImage) -> Result<ControlPoints, PipelineError> {
    let bbox = mask::bounding_box(mask).ok_or(PipelineError::NoGarmentMask)?;
    log::debug!(
        "garment bbox ({}, {})-({}, {})",
        bbox.x0,
        bbox.y0,
        bbox.x1,
        bbox.y1
    );
    Ok(layout_in_box(bbox))
}
