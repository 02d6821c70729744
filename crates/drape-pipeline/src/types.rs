//! Shared types for the drape garment warping pipeline.

use serde::{Deserialize, Serialize};

use crate::warp::{ResampleFilter, WarpEngineKind, WarpFailurePolicy};

/// Re-export `GrayImage` so downstream crates can reference binary
/// masks without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference garment,
/// body, and composite rasters without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new(f64::midpoint(self.x, other.x), f64::midpoint(self.y, other.y))
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<geo::Coord<f64>> for Point {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing raster.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Tight bounding box of a garment silhouette.
///
/// `x1` and `y1` are the last foreground column and row (inclusive),
/// so a silhouette spanning columns 0..=200 has `width() == 200.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// First foreground column.
    pub x0: u32,
    /// First foreground row.
    pub y0: u32,
    /// Last foreground column (inclusive).
    pub x1: u32,
    /// Last foreground row (inclusive).
    pub y1: u32,
}

impl BoundingBox {
    /// Horizontal extent `x1 - x0`.
    #[must_use]
    pub fn width(&self) -> f64 {
        f64::from(self.x1 - self.x0)
    }

    /// Vertical extent `y1 - y0`.
    #[must_use]
    pub fn height(&self) -> f64 {
        f64::from(self.y1 - self.y0)
    }
}

/// Which part of the body a garment is worn on.
///
/// Only upper-body garments have an anchor layout; the other kinds are
/// accepted by the configuration so callers get a typed rejection
/// instead of a silently wrong fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentKind {
    /// Shirts, jackets, tops.
    #[default]
    UpperBody,
    /// Trousers, skirts.
    LowerBody,
    /// Footwear.
    Shoes,
}

/// Configuration for a single try-on run.
///
/// # Invariants
///
/// `tps_regularization`, `overlay_width_ratio`, and `overlay_lift_ratio`
/// must be finite; the first must be non-negative and
/// `overlay_width_ratio` must be positive. [`TryOnConfig::validate`]
/// checks these before any processing starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TryOnConfig {
    /// Which warp engine deforms the garment.
    pub engine: WarpEngineKind,

    /// What to do when the warp engine cannot produce a result.
    pub on_warp_failure: WarpFailurePolicy,

    /// Garment category. Only [`GarmentKind::UpperBody`] is supported.
    pub garment_kind: GarmentKind,

    /// Pixel resampling filter used by both warp engines.
    pub resample: ResampleFilter,

    /// Alpha values strictly greater than this count as garment.
    pub mask_threshold: u8,

    /// Smoothing term added to the thin-plate spline kernel diagonal.
    /// Zero interpolates the anchors exactly.
    pub tps_regularization: f64,

    /// Overlay fallback: garment width as a multiple of shoulder width.
    pub overlay_width_ratio: f64,

    /// Overlay fallback: how far above the shoulder line the garment
    /// starts, as a fraction of the scaled garment height.
    pub overlay_lift_ratio: f64,
}

impl TryOnConfig {
    /// Default warp engine.
    pub const DEFAULT_ENGINE: WarpEngineKind = WarpEngineKind::PiecewiseAffine;
    /// Default warp failure policy.
    pub const DEFAULT_ON_WARP_FAILURE: WarpFailurePolicy = WarpFailurePolicy::Fail;
    /// Default resampling filter.
    pub const DEFAULT_RESAMPLE: ResampleFilter = ResampleFilter::Bilinear;
    /// Default alpha threshold.
    pub const DEFAULT_MASK_THRESHOLD: u8 = 0;
    /// Default thin-plate spline regularization.
    pub const DEFAULT_TPS_REGULARIZATION: f64 = 0.0;
    /// Default overlay width ratio.
    pub const DEFAULT_OVERLAY_WIDTH_RATIO: f64 = 1.4;
    /// Default overlay lift ratio.
    pub const DEFAULT_OVERLAY_LIFT_RATIO: f64 = 0.15;

    /// Check the numeric invariants documented on the struct.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.tps_regularization.is_finite() || self.tps_regularization < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "tps_regularization must be finite and >= 0, got {}",
                self.tps_regularization
            )));
        }
        if !self.overlay_width_ratio.is_finite() || self.overlay_width_ratio <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "overlay_width_ratio must be finite and > 0, got {}",
                self.overlay_width_ratio
            )));
        }
        if !self.overlay_lift_ratio.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "overlay_lift_ratio must be finite, got {}",
                self.overlay_lift_ratio
            )));
        }
        if self.garment_kind != GarmentKind::UpperBody {
            return Err(PipelineError::InvalidConfig(format!(
                "garment kind {:?} is not supported; only upper-body garments can be fitted",
                self.garment_kind
            )));
        }
        Ok(())
    }
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            engine: Self::DEFAULT_ENGINE,
            on_warp_failure: Self::DEFAULT_ON_WARP_FAILURE,
            garment_kind: GarmentKind::default(),
            resample: Self::DEFAULT_RESAMPLE,
            mask_threshold: Self::DEFAULT_MASK_THRESHOLD,
            tps_regularization: Self::DEFAULT_TPS_REGULARIZATION,
            overlay_width_ratio: Self::DEFAULT_OVERLAY_WIDTH_RATIO,
            overlay_lift_ratio: Self::DEFAULT_OVERLAY_LIFT_RATIO,
        }
    }
}

/// Placement of the garment when the simple overlay fallback ran
/// instead of a warp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlacement {
    /// Uniform scale applied to the garment raster.
    pub scale: f64,
    /// Top-left corner of the scaled garment on the body canvas. May be
    /// negative when the garment overhangs the image edge.
    pub position: (i64, i64),
    /// Size of the scaled garment raster.
    pub garment_output_size: Dimensions,
}

/// Metadata describing how a composite was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryOnReport {
    /// Number of anchor names present in both the garment and body sets.
    pub matched_keypoint_count: usize,
    /// Whether the landmark service found a body. Always `true` in a
    /// successful report, since a missing body aborts the run.
    pub body_detected: bool,
    /// The engine that was asked to warp the garment.
    pub engine: WarpEngineKind,
    /// Present only when the warp failed and the overlay fallback ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayPlacement>,
    /// Size of the composite raster (equal to the body raster).
    pub dimensions: Dimensions,
}

/// Everything a completed try-on produces.
#[derive(Debug, Clone)]
pub struct TryOnOutput {
    /// The garment alone on a transparent body-sized canvas.
    pub warped: RgbaImage,
    /// The garment composited over the body photograph.
    pub composite: RgbaImage,
    /// How the composite was produced.
    pub report: TryOnReport,
}

/// Errors that can occur while fitting a garment.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// An input image's bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Configuration is invalid.
    #[error("invalid try-on configuration: {0}")]
    InvalidConfig(String),

    /// The garment has no alpha channel or its alpha is entirely
    /// transparent.
    #[error("garment image has no foreground mask")]
    NoGarmentMask,

    /// The landmark service found no body in the photograph.
    #[error("no body pose detected in the photograph")]
    NoPoseDetected,

    /// Triangulation or the global spline fit is ill-defined for the
    /// given anchors.
    #[error("warp computation failed: {0}")]
    WarpComputation(String),
}
