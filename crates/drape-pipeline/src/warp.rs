//! Garment warping: deform the garment raster onto the body canvas.
//!
//! This module defines the [`WarpEngine`] trait for pluggable warp
//! algorithms and the [`WarpEngineKind`] enum for selecting one at
//! runtime.
//!
//! # Strategy pattern
//!
//! Both engines consume the same matched anchor pairs and produce a
//! canvas-sized RGBA raster that is transparent wherever no garment
//! pixel landed. [`PiecewiseAffine`](WarpEngineKind::PiecewiseAffine)
//! is fast and exact at the anchors but shows seams along triangle
//! edges; [`ThinPlateSpline`](WarpEngineKind::ThinPlateSpline) is a
//! single smooth field, more expensive per pixel.

use image::RgbaImage;
use imageproc::geometric_transformations::Interpolation;
use serde::{Deserialize, Serialize};

use crate::anchor::Correspondences;
use crate::types::{Dimensions, PipelineError, TryOnConfig};

/// Selects which warp algorithm deforms the garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarpEngineKind {
    /// Delaunay-triangulate the garment anchors and map each triangle
    /// with its own affine transform.
    #[default]
    PiecewiseAffine,
    /// Fit one thin-plate spline to all anchors.
    ThinPlateSpline,
}

/// What the orchestrator does when the warp engine fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarpFailurePolicy {
    /// Abort with [`PipelineError::WarpComputation`].
    #[default]
    Fail,
    /// Scale and place the unwarped garment over the shoulders instead.
    FallbackToSimpleOverlay,
}

/// Pixel resampling used when reading the garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Nearest neighbour; copies pixels exactly.
    Nearest,
    /// Bilinear interpolation between the four nearest pixels.
    #[default]
    Bilinear,
}

impl From<ResampleFilter> for Interpolation {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => Self::Nearest,
            ResampleFilter::Bilinear => Self::Bilinear,
        }
    }
}

/// Trait for garment warp strategies.
///
/// Input: the segmented garment, matched (garment, body) anchor pairs,
/// and the body canvas size.
/// Output: a canvas-sized raster with untouched pixels fully
/// transparent.
pub trait WarpEngine {
    /// Warp `garment` so each pair's source lands on its target.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WarpComputation`] if the anchors do not
    /// determine a warp (fewer than three, non-finite, collinear).
    fn warp(
        &self,
        garment: &RgbaImage,
        pairs: &Correspondences,
        canvas: Dimensions,
        config: &TryOnConfig,
    ) -> Result<RgbaImage, PipelineError>;
}

impl WarpEngine for WarpEngineKind {
    fn warp(
        &self,
        garment: &RgbaImage,
        pairs: &Correspondences,
        canvas: Dimensions,
        config: &TryOnConfig,
    ) -> Result<RgbaImage, PipelineError> {
        check_pairs(pairs)?;
        match *self {
            Self::PiecewiseAffine => {
                crate::piecewise::warp_piecewise_affine(garment, pairs, canvas, config.resample)
            }
            Self::ThinPlateSpline => crate::tps::warp_thin_plate_spline(
                garment,
                pairs,
                canvas,
                config.resample,
                config.tps_regularization,
            ),
        }
    }
}

/// Preconditions shared by every engine.
fn check_pairs(pairs: &Correspondences) -> Result<(), PipelineError> {
    if pairs.len() < 3 {
        return Err(PipelineError::WarpComputation(format!(
            "need at least 3 matched anchors, got {}",
            pairs.len()
        )));
    }
    if let Some(bad) = pairs
        .pairs()
        .iter()
        .find(|p| !p.source.is_finite() || !p.target.is_finite())
    {
        return Err(PipelineError::WarpComputation(format!(
            "anchor {} has a non-finite coordinate",
            bad.name
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::anchor::{AnchorName, AnchorPair};
    use crate::types::Point;

    fn identity_pairs(points: &[(f64, f64)]) -> Correspondences {
        Correspondences::from_pairs(
            AnchorName::ALL
                .iter()
                .zip(points)
                .map(|(&name, &(x, y))| AnchorPair {
                    name,
                    source: Point::new(x, y),
                    target: Point::new(x, y),
                })
                .collect(),
        )
    }

    const ENGINES: [WarpEngineKind; 2] = [
        WarpEngineKind::PiecewiseAffine,
        WarpEngineKind::ThinPlateSpline,
    ];

    #[test]
    fn default_is_piecewise_affine() {
        assert_eq!(WarpEngineKind::default(), WarpEngineKind::PiecewiseAffine);
        assert_eq!(WarpFailurePolicy::default(), WarpFailurePolicy::Fail);
    }

    #[test]
    fn policy_serializes_as_snake_case() {
        let json = serde_json::to_string(&WarpFailurePolicy::FallbackToSimpleOverlay).unwrap();
        assert_eq!(json, "\"fallback_to_simple_overlay\"");
    }

    #[test]
    fn too_few_pairs_fail_for_every_engine() {
        let garment = RgbaImage::from_pixel(10, 10, Rgba([1, 1, 1, 255]));
        let pairs = identity_pairs(&[(0.0, 0.0), (9.0, 0.0)]);
        let canvas = Dimensions {
            width: 10,
            height: 10,
        };
        for engine in ENGINES {
            let result = engine.warp(&garment, &pairs, canvas, &TryOnConfig::default());
            assert!(
                matches!(result, Err(PipelineError::WarpComputation(_))),
                "{engine:?}"
            );
        }
    }

    #[test]
    fn collinear_anchors_fail_for_every_engine() {
        let garment = RgbaImage::from_pixel(40, 40, Rgba([1, 1, 1, 255]));
        let points: Vec<_> = (0..16).map(|i| (f64::from(i) * 2.0, 20.0)).collect();
        let pairs = identity_pairs(&points);
        let canvas = Dimensions {
            width: 40,
            height: 40,
        };
        for engine in ENGINES {
            let result = engine.warp(&garment, &pairs, canvas, &TryOnConfig::default());
            assert!(
                matches!(result, Err(PipelineError::WarpComputation(_))),
                "{engine:?}"
            );
        }
    }

    #[test]
    fn non_finite_target_fails() {
        let garment = RgbaImage::new(10, 10);
        let mut pairs = identity_pairs(&[(0.0, 0.0), (9.0, 0.0), (0.0, 9.0)]).pairs().to_vec();
        pairs[2].target = Point::new(f64::INFINITY, 0.0);
        let result = WarpEngineKind::ThinPlateSpline.warp(
            &garment,
            &Correspondences::from_pairs(pairs),
            Dimensions {
                width: 10,
                height: 10,
            },
            &TryOnConfig::default(),
        );
        assert!(matches!(result, Err(PipelineError::WarpComputation(_))));
    }
}
