//! Seams to the external segmentation and pose models.
//!
//! The pipeline never talks to a model directly. Callers hand in an
//! already-initialised provider and the pipeline asks it for a garment
//! silhouette or a set of body landmarks; pooling and caching of the
//! underlying model are the provider's business.

use image::{DynamicImage, GrayImage, RgbaImage};

use crate::landmarks::BodyLandmarks;
use crate::mask;

/// A landmark-producing service.
pub trait LandmarkProvider {
    /// Detect body landmarks on `body`, or `None` if no person was
    /// found.
    fn detect(&self, body: &RgbaImage) -> Option<BodyLandmarks>;
}

/// A mask-producing service.
pub trait MaskProvider {
    /// Produce the segmented garment: an RGBA raster whose alpha is the
    /// foreground weight. `None` means the garment could not be
    /// segmented.
    fn segment(&self, garment: &DynamicImage) -> Option<RgbaImage>;
}

impl<T: LandmarkProvider + ?Sized> LandmarkProvider for &T {
    fn detect(&self, body: &RgbaImage) -> Option<BodyLandmarks> {
        (**self).detect(body)
    }
}

impl<T: MaskProvider + ?Sized> MaskProvider for &T {
    fn segment(&self, garment: &DynamicImage) -> Option<RgbaImage> {
        (**self).segment(garment)
    }
}

/// Landmarks known ahead of time (e.g. computed by an out-of-process
/// pose service and stored alongside the photograph).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLandmarks(pub BodyLandmarks);

impl LandmarkProvider for FixedLandmarks {
    fn detect(&self, _body: &RgbaImage) -> Option<BodyLandmarks> {
        Some(self.0)
    }
}

/// A landmark service that never finds anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoLandmarks;

impl LandmarkProvider for NoLandmarks {
    fn detect(&self, _body: &RgbaImage) -> Option<BodyLandmarks> {
        None
    }
}

/// Treat the garment file's own alpha channel as the segmentation.
///
/// Images without an alpha channel yield `None`: an opaque photograph
/// has no silhouette to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlphaChannel;

impl MaskProvider for AlphaChannel {
    fn segment(&self, garment: &DynamicImage) -> Option<RgbaImage> {
        if garment.color().has_alpha() {
            Some(garment.to_rgba8())
        } else {
            log::debug!("garment has no alpha channel ({:?})", garment.color());
            None
        }
    }
}

/// A silhouette produced elsewhere, installed as the garment's alpha.
#[derive(Debug, Clone)]
pub struct ExternalMask {
    mask: GrayImage,
    cleanup_radius: u8,
}

impl ExternalMask {
    /// Default morphology radius (a 5x5 square).
    pub const DEFAULT_CLEANUP_RADIUS: u8 = 2;

    /// Wrap `mask`, cleaning it with the default radius.
    #[must_use]
    pub const fn new(mask: GrayImage) -> Self {
        Self {
            mask,
            cleanup_radius: Self::DEFAULT_CLEANUP_RADIUS,
        }
    }

    /// Override the cleanup radius. Zero installs the mask as-is.
    #[must_use]
    pub fn with_cleanup_radius(mut self, radius: u8) -> Self {
        self.cleanup_radius = radius;
        self
    }

    /// The configured cleanup radius.
    #[must_use]
    pub const fn cleanup_radius(&self) -> u8 {
        self.cleanup_radius
    }
}

impl MaskProvider for ExternalMask {
    fn segment(&self, garment: &DynamicImage) -> Option<RgbaImage> {
        let cleaned = mask::clean_mask(&self.mask, self.cleanup_radius);
        let segmented = mask::apply_mask(&garment.to_rgba8(), &cleaned);
        if segmented.is_none() {
            log::warn!(
                "mask is {}x{} but garment is {}x{}; ignoring mask",
                self.mask.width(),
                self.mask.height(),
                garment.width(),
                garment.height()
            );
        }
        segmented
    }
}
