//! Garment silhouette masks.
//!
//! The garment raster's alpha channel is the segmentation result: alpha
//! above a threshold marks garment pixels. This module turns alpha into
//! a binary [`GrayImage`] mask, measures its tight bounding box, and
//! installs masks produced by an external segmentation service back
//! into a raster's alpha channel.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::distance_transform::Norm;

use crate::types::BoundingBox;

/// Foreground value in binary masks.
pub const FOREGROUND: u8 = 255;

/// Derive a binary mask from a raster's alpha channel.
///
/// Pixels whose alpha is strictly greater than `threshold` become
/// [`FOREGROUND`]; all others become 0.
#[must_use = "returns the binary mask"]
pub fn alpha_mask(image: &RgbaImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[3] > threshold {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Tight bounding box of the non-zero pixels of `mask`.
///
/// Returns `None` when the mask has no foreground pixels.
#[must_use]
pub fn bounding_box(mask: &GrayImage) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        bbox = Some(match bbox {
            None => BoundingBox {
                x0: x,
                y0: y,
                x1: x,
                y1: y,
            },
            Some(b) => BoundingBox {
                x0: b.x0.min(x),
                y0: b.y0.min(y),
                x1: b.x1.max(x),
                y1: b.y1.max(y),
            },
        });
    }
    bbox
}

/// Install `mask` as the alpha channel of `image`.
///
/// Colour channels are kept as-is; each pixel's alpha becomes the mask
/// value at the same position, so a soft mask yields soft edges.
/// Returns `None` when the two rasters differ in size.
#[must_use]
pub fn apply_mask(image: &RgbaImage, mask: &GrayImage) -> Option<RgbaImage> {
    if image.dimensions() != mask.dimensions() {
        return None;
    }
    Some(RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, _]) = *image.get_pixel(x, y);
        Rgba([r, g, b, mask.get_pixel(x, y)[0]])
    }))
}

/// Remove speckle and fill pinholes in a binary mask.
///
/// Runs a morphological close (fill gaps) followed by an open (drop
/// isolated pixels), both with a square structuring element of the
/// given radius. Radius 2 is a 5x5 square. Radius 0 returns the mask
/// unchanged.
#[must_use = "returns the cleaned mask"]
pub fn clean_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    let closed = imageproc::morphology::close(mask, Norm::LInf, radius);
    imageproc::morphology::open(&closed, Norm::LInf, radius)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rect_garment(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x0..=x1).contains(&x) && (y0..=y1).contains(&y) {
                Rgba([200, 10, 10, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn transparent_image_has_no_bounding_box() {
        let img = RgbaImage::new(8, 8);
        assert_eq!(bounding_box(&alpha_mask(&img, 0)), None);
    }

    #[test]
    fn bounding_box_is_inclusive() {
        let img = rect_garment(20, 30, 3, 4, 12, 25);
        let bbox = bounding_box(&alpha_mask(&img, 0)).unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                x0: 3,
                y0: 4,
                x1: 12,
                y1: 25
            }
        );
    }

    #[test]
    fn threshold_excludes_faint_alpha() {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(1, 1, Rgba([0, 0, 0, 10]));
        img.put_pixel(2, 2, Rgba([0, 0, 0, 200]));
        let mask = alpha_mask(&img, 127);
        assert_eq!(mask.get_pixel(1, 1)[0], 0);
        assert_eq!(mask.get_pixel(2, 2)[0], FOREGROUND);
    }

    #[test]
    fn apply_mask_replaces_alpha_only() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 255]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, Luma([128]));
        let out = apply_mask(&img, &mask).unwrap();
        assert_eq!(*out.get_pixel(0, 0), Rgba([1, 2, 3, 0]));
        assert_eq!(*out.get_pixel(1, 0), Rgba([1, 2, 3, 128]));
    }

    #[test]
    fn apply_mask_rejects_size_mismatch() {
        let img = RgbaImage::new(2, 2);
        let mask = GrayImage::new(3, 2);
        assert!(apply_mask(&img, &mask).is_none());
    }

    #[test]
    fn clean_mask_removes_isolated_speck() {
        let mut mask = GrayImage::new(40, 40);
        for y in 5..15 {
            for x in 5..15 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        mask.put_pixel(30, 30, Luma([FOREGROUND]));
        let cleaned = clean_mask(&mask, 2);
        assert_eq!(cleaned.get_pixel(30, 30)[0], 0);
        assert_eq!(cleaned.get_pixel(10, 10)[0], FOREGROUND);
    }

    #[test]
    fn clean_mask_fills_pinhole() {
        let mut mask = GrayImage::from_pixel(30, 30, Luma([0]));
        for y in 5..25 {
            for x in 5..25 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        mask.put_pixel(15, 15, Luma([0]));
        let cleaned = clean_mask(&mask, 2);
        assert_eq!(cleaned.get_pixel(15, 15)[0], FOREGROUND);
    }

    #[test]
    fn clean_mask_radius_zero_is_identity() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(2, 2, Luma([FOREGROUND]));
        assert_eq!(clean_mask(&mask, 0).as_raw(), mask.as_raw());
    }
}
