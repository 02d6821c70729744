//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::try_on`] which runs every stage in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use drape_pipeline::{AlphaChannel, BodyLandmarks, FixedLandmarks, Pipeline, PipelineError, TryOnConfig};
//! # fn run(garment: Vec<u8>, body: Vec<u8>, pose: BodyLandmarks) -> Result<(), PipelineError> {
//! let pipeline = Pipeline::new(garment, body, TryOnConfig::default())
//!     .decode()?
//!     .segment(&AlphaChannel)?
//!     .extract_anchors()?
//!     .detect_pose(&FixedLandmarks(pose))?
//!     .map_targets()
//!     .warp()?
//!     .composite()?;
//!
//! let output = pipeline.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying everything later stages
//! need. The caller can inspect the current stage's output via accessor
//! methods at any point.

use image::DynamicImage;

use crate::anchor::{AnchorSet, Correspondences};
use crate::keypoints::ControlPoints;
use crate::landmarks::BodyLandmarks;
use crate::provider::{LandmarkProvider, MaskProvider};
use crate::types::{
    Dimensions, GrayImage, OverlayPlacement, PipelineError, RgbaImage, TryOnConfig, TryOnOutput,
    TryOnReport,
};
use crate::warp::{WarpEngine, WarpFailurePolicy};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The garment and body bytes and the config are stored but not yet
/// touched. Call [`decode`](Self::decode) to advance.
#[must_use = "pipeline stages are consumed by advancing: call .decode() to continue"]
pub struct Pending {
    config: TryOnConfig,
    garment: Vec<u8>,
    body: Vec<u8>,
}

impl Pending {
    /// The raw garment bytes.
    #[must_use]
    pub fn garment_bytes(&self) -> &[u8] {
        &self.garment
    }

    /// The raw body photograph bytes.
    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Validate the config, decode both images, and advance to
    /// [`Decoded`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the config fails
    /// [`TryOnConfig::validate`], [`PipelineError::EmptyInput`] if
    /// either input is empty, and [`PipelineError::ImageDecode`] if
    /// either cannot be decoded.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        self.config.validate()?;
        let garment = crate::decode::decode(&self.garment)?;
        let body = crate::decode::decode_rgba(&self.body)?;
        log::debug!(
            "decoded garment {}x{} ({:?}), body {}x{}",
            garment.width(),
            garment.height(),
            garment.color(),
            body.width(),
            body.height()
        );
        Ok(Decoded {
            config: self.config,
            garment,
            body,
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding.
#[must_use = "pipeline stages are consumed by advancing: call .segment() to continue"]
pub struct Decoded {
    config: TryOnConfig,
    garment: DynamicImage,
    body: RgbaImage,
}

impl Decoded {
    /// The garment as decoded, in its original colour type.
    #[must_use]
    pub const fn garment(&self) -> &DynamicImage {
        &self.garment
    }

    /// The body photograph as RGBA.
    #[must_use]
    pub const fn body(&self) -> &RgbaImage {
        &self.body
    }

    /// Ask `masks` for the garment silhouette and derive the binary
    /// mask.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoGarmentMask`] if the provider cannot
    /// segment the garment.
    pub fn segment<M: MaskProvider + ?Sized>(self, masks: &M) -> Result<Segmented, PipelineError> {
        let garment = masks
            .segment(&self.garment)
            .ok_or(PipelineError::NoGarmentMask)?;
        let mask = crate::mask::alpha_mask(&garment, self.config.mask_threshold);
        Ok(Segmented {
            config: self.config,
            garment,
            mask,
            body: self.body,
        })
    }
}

// ───────────────────────── Stage 2: Segmented ────────────────────────

/// Pipeline state after segmentation.
#[must_use = "pipeline stages are consumed by advancing: call .extract_anchors() to continue"]
pub struct Segmented {
    config: TryOnConfig,
    garment: RgbaImage,
    mask: GrayImage,
    body: RgbaImage,
}

impl Segmented {
    /// The segmented garment (alpha is foreground weight).
    #[must_use]
    pub const fn garment(&self) -> &RgbaImage {
        &self.garment
    }

    /// The binary garment mask.
    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Place the garment control points.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoGarmentMask`] if the mask is empty.
    pub fn extract_anchors(self) -> Result<AnchorsExtracted, PipelineError> {
        let control = crate::keypoints::extract_control_points(&self.mask)?;
        Ok(AnchorsExtracted {
            config: self.config,
            garment: self.garment,
            mask: self.mask,
            control,
            body: self.body,
        })
    }
}

// ─────────────────────── Stage 3: AnchorsExtracted ───────────────────

/// Pipeline state after garment anchors are placed.
#[must_use = "pipeline stages are consumed by advancing: call .detect_pose() to continue"]
pub struct AnchorsExtracted {
    config: TryOnConfig,
    garment: RgbaImage,
    mask: GrayImage,
    control: ControlPoints,
    body: RgbaImage,
}

impl AnchorsExtracted {
    /// The garment control points and bounding box.
    #[must_use]
    pub const fn control_points(&self) -> &ControlPoints {
        &self.control
    }

    /// The binary garment mask.
    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Ask `landmarks` for the body pose.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoPoseDetected`] if the provider finds
    /// no body or reports a non-finite coordinate.
    pub fn detect_pose<L: LandmarkProvider + ?Sized>(
        self,
        landmarks: &L,
    ) -> Result<PoseDetected, PipelineError> {
        let pose = landmarks
            .detect(&self.body)
            .ok_or(PipelineError::NoPoseDetected)?;
        if !pose.is_finite() {
            log::warn!("landmark provider returned non-finite coordinates");
            return Err(PipelineError::NoPoseDetected);
        }
        log::debug!(
            "pose: shoulders ({:.1}, {:.1})-({:.1}, {:.1}), hips ({:.1}, {:.1})-({:.1}, {:.1})",
            pose.left_shoulder.x,
            pose.left_shoulder.y,
            pose.right_shoulder.x,
            pose.right_shoulder.y,
            pose.left_hip.x,
            pose.left_hip.y,
            pose.right_hip.x,
            pose.right_hip.y
        );
        Ok(PoseDetected {
            config: self.config,
            garment: self.garment,
            control: self.control,
            body: self.body,
            pose,
        })
    }
}

// ───────────────────────── Stage 4: PoseDetected ─────────────────────

/// Pipeline state after pose detection.
#[must_use = "pipeline stages are consumed by advancing: call .map_targets() to continue"]
pub struct PoseDetected {
    config: TryOnConfig,
    garment: RgbaImage,
    control: ControlPoints,
    body: RgbaImage,
    pose: BodyLandmarks,
}

impl PoseDetected {
    /// The detected body landmarks.
    #[must_use]
    pub const fn pose(&self) -> &BodyLandmarks {
        &self.pose
    }

    /// Position the anchors on the body and pair them with the garment
    /// anchors.
    pub fn map_targets(self) -> Targeted {
        let targets = crate::landmarks::map_targets(&self.pose);
        let pairs = Correspondences::between(&self.control.anchors, &targets);
        log::debug!("{} anchors matched between garment and body", pairs.len());
        Targeted {
            config: self.config,
            garment: self.garment,
            body: self.body,
            pose: self.pose,
            targets,
            pairs,
        }
    }
}

// ───────────────────────── Stage 5: Targeted ─────────────────────────

/// Pipeline state after target anchors are placed.
#[must_use = "pipeline stages are consumed by advancing: call .warp() to continue"]
pub struct Targeted {
    config: TryOnConfig,
    garment: RgbaImage,
    body: RgbaImage,
    pose: BodyLandmarks,
    targets: AnchorSet,
    pairs: Correspondences,
}

impl Targeted {
    /// Target anchors on the body canvas.
    #[must_use]
    pub const fn targets(&self) -> &AnchorSet {
        &self.targets
    }

    /// Matched (garment, body) anchor pairs in canonical order.
    #[must_use]
    pub const fn pairs(&self) -> &Correspondences {
        &self.pairs
    }

    /// Run the configured warp engine.
    ///
    /// If the engine fails and the config's failure policy is
    /// [`WarpFailurePolicy::FallbackToSimpleOverlay`], the garment is
    /// scaled and placed over the shoulders instead.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WarpComputation`] if the engine fails
    /// under [`WarpFailurePolicy::Fail`], or if the overlay fallback
    /// also cannot place the garment.
    pub fn warp(self) -> Result<Warped, PipelineError> {
        let canvas = Dimensions::of(&self.body);
        let (warped, overlay) =
            match self
                .config
                .engine
                .warp(&self.garment, &self.pairs, canvas, &self.config)
            {
                Ok(warped) => (warped, None),
                Err(err @ PipelineError::WarpComputation(_))
                    if self.config.on_warp_failure == WarpFailurePolicy::FallbackToSimpleOverlay =>
                {
                    log::warn!("{err}; falling back to simple overlay");
                    let (layer, placement) = crate::overlay::overlay_garment(
                        &self.garment,
                        &self.pose,
                        canvas,
                        &self.config,
                    )?;
                    (layer, Some(placement))
                }
                Err(err) => return Err(err),
            };
        Ok(Warped {
            config: self.config,
            body: self.body,
            matched: self.pairs.len(),
            warped,
            overlay,
        })
    }
}

// ───────────────────────── Stage 6: Warped ───────────────────────────

/// Pipeline state after the garment has been warped onto a body-sized
/// canvas.
#[must_use = "pipeline stages are consumed by advancing: call .composite() to continue"]
pub struct Warped {
    config: TryOnConfig,
    body: RgbaImage,
    matched: usize,
    warped: RgbaImage,
    overlay: Option<OverlayPlacement>,
}

impl Warped {
    /// The warped garment canvas (transparent where no garment landed).
    #[must_use]
    pub const fn warped(&self) -> &RgbaImage {
        &self.warped
    }

    /// Overlay placement, if the fallback produced the canvas.
    #[must_use]
    pub const fn overlay(&self) -> Option<&OverlayPlacement> {
        self.overlay.as_ref()
    }

    /// Composite the warped garment over the body.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the canvas and body
    /// sizes differ, which the warp stage never produces.
    pub fn composite(self) -> Result<Composited, PipelineError> {
        let composite = crate::composite::composite_over(&self.warped, &self.body)?;
        let report = TryOnReport {
            matched_keypoint_count: self.matched,
            body_detected: true,
            engine: self.config.engine,
            overlay: self.overlay,
            dimensions: Dimensions::of(&composite),
        };
        Ok(Composited {
            warped: self.warped,
            composite,
            report,
        })
    }
}

// ───────────────────────── Stage 7: Composited ───────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to extract the TryOnOutput"]
pub struct Composited {
    warped: RgbaImage,
    composite: RgbaImage,
    report: TryOnReport,
}

impl Composited {
    /// The composited image.
    #[must_use]
    pub const fn composite(&self) -> &RgbaImage {
        &self.composite
    }

    /// How the composite was produced.
    #[must_use]
    pub const fn report(&self) -> &TryOnReport {
        &self.report
    }

    /// Consume the pipeline and return the final output.
    #[must_use]
    pub fn into_result(self) -> TryOnOutput {
        TryOnOutput {
            warped: self.warped,
            composite: self.composite,
            report: self.report,
        }
    }
}

/// Entry point for the staged pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from garment and body bytes and a config.
    ///
    /// No processing is performed; call [`.decode()`](Pending::decode)
    /// to begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(garment_bytes: Vec<u8>, body_bytes: Vec<u8>, config: TryOnConfig) -> Pending {
        Pending {
            config,
            garment: garment_bytes,
            body: body_bytes,
        }
    }
}
