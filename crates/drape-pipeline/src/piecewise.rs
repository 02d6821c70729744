//! Piecewise-affine warp.
//!
//! The garment anchors are Delaunay-triangulated. Each triangle gets
//! its own affine map onto the matching body triangle; pixels are
//! resampled into the triangle's destination rectangle and copied onto
//! the canvas through a mask of exactly the destination triangle, so
//! neighbouring triangles do not paint over each other's edges.
//!
//! Triangles whose source or destination rectangle does not fit inside
//! its raster are skipped, as are triangles that collapse to zero area
//! on the body. Losing a sliver of coverage at the silhouette edge is
//! accepted; it is not an error.

use geo::BoundingRect;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, warp_into_with};

use crate::affine::Affine;
use crate::anchor::Correspondences;
use crate::triangulate::{Simplex, triangulate};
use crate::types::{Dimensions, PipelineError, Point};
use crate::warp::ResampleFilter;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Integer pixel rectangle enclosing a triangle.
///
/// Spans from the floor of the minimum coordinate to the floor of the
/// maximum coordinate, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Bounding rectangle of `tri`. Coordinates must be finite.
    ///
    /// Returns `None` when the rectangle is too large to describe in
    /// pixels; such a rectangle cannot fit any raster.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn enclosing(tri: [Point; 3]) -> Option<Self> {
        let rect = geo::Triangle::new(tri[0].into(), tri[1].into(), tri[2].into()).bounding_rect();
        let (min, max) = (rect.min(), rect.max());
        let x = min.x.floor() as i64;
        let y = min.y.floor() as i64;
        let span = |lo: i64, hi: f64| {
            (hi.floor() as i64)
                .checked_sub(lo)?
                .checked_add(1)
                .and_then(|n| u32::try_from(n).ok())
        };
        Some(Self {
            x,
            y,
            width: span(x, max.x)?,
            height: span(y, max.y)?,
        })
    }

    /// Whether the rectangle lies entirely inside a raster of `dims`.
    #[must_use]
    pub fn fits(&self, dims: Dimensions) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + i64::from(self.width) <= i64::from(dims.width)
            && self.y + i64::from(self.height) <= i64::from(dims.height)
    }

    /// Top-left corner as a point.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn origin(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// Warp `garment` onto a transparent canvas of size `canvas`.
///
/// # Errors
///
/// Returns [`PipelineError::WarpComputation`] if the source anchors
/// cannot be triangulated.
pub fn warp_piecewise_affine(
    garment: &RgbaImage,
    pairs: &Correspondences,
    canvas: Dimensions,
    resample: ResampleFilter,
) -> Result<RgbaImage, PipelineError> {
    let simplices = triangulate(pairs)?;
    let mut out = RgbaImage::new(canvas.width, canvas.height);
    let mut drawn = 0_usize;
    for simplex in &simplices {
        if warp_triangle(garment, pairs, *simplex, &mut out, resample.into()) {
            drawn += 1;
        }
    }
    log::debug!(
        "piecewise affine: drew {drawn} of {} triangles",
        simplices.len()
    );
    Ok(out)
}

/// Warp one triangle into `out`. Returns `false` if it was skipped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn warp_triangle(
    garment: &RgbaImage,
    pairs: &Correspondences,
    simplex: Simplex,
    out: &mut RgbaImage,
    interpolation: Interpolation,
) -> bool {
    let p = pairs.pairs();
    let src = simplex.map(|i| p[i].source);
    let dst = simplex.map(|i| p[i].target);

    let (Some(src_rect), Some(dst_rect)) = (PixelRect::enclosing(src), PixelRect::enclosing(dst))
    else {
        log::debug!("skipping triangle {simplex:?}: rectangle too large");
        return false;
    };
    if !src_rect.fits(Dimensions::of(garment)) || !dst_rect.fits(Dimensions::of(out)) {
        log::debug!("skipping triangle {simplex:?}: rectangle outside raster");
        return false;
    }

    let Some(inverse) = Affine::from_triangles(src, dst).and_then(|a| a.inverse()) else {
        log::debug!("skipping triangle {simplex:?}: degenerate");
        return false;
    };

    // One extra column and row where available so bilinear sampling can
    // reach the far edge of the triangle.
    let (sx, sy) = (src_rect.x as u32, src_rect.y as u32);
    let crop_w = (src_rect.width + 1).min(garment.width() - sx);
    let crop_h = (src_rect.height + 1).min(garment.height() - sy);
    let crop = image::imageops::crop_imm(garment, sx, sy, crop_w, crop_h).to_image();

    // destination-local pixel -> crop-local source position
    let local = inverse.rebased(dst_rect.origin(), src_rect.origin());
    let mut patch = RgbaImage::new(dst_rect.width, dst_rect.height);
    warp_into_with(
        &crop,
        |x, y| {
            let q = local.apply(Point::new(f64::from(x), f64::from(y)));
            (q.x as f32, q.y as f32)
        },
        interpolation,
        TRANSPARENT,
        &mut patch,
    );

    let Some(mask) = triangle_mask(dst, dst_rect) else {
        return false;
    };

    let (dx, dy) = (dst_rect.x as u32, dst_rect.y as u32);
    for (x, y, m) in mask.enumerate_pixels() {
        if m[0] != 0 {
            out.put_pixel(dx + x, dy + y, *patch.get_pixel(x, y));
        }
    }
    true
}

/// Filled mask of `tri` inside `rect`, in rectangle-local pixels.
///
/// Returns `None` when rounding collapses the triangle to fewer than
/// three distinct pixels.
#[allow(clippy::cast_possible_truncation)]
fn triangle_mask(tri: [Point; 3], rect: PixelRect) -> Option<GrayImage> {
    let origin = rect.origin();
    let poly: Vec<imageproc::point::Point<i32>> = tri
        .iter()
        .map(|p| {
            imageproc::point::Point::new(
                (p.x - origin.x).round() as i32,
                (p.y - origin.y).round() as i32,
            )
        })
        .collect();
    if poly[0] == poly[1] || poly[1] == poly[2] || poly[0] == poly[2] {
        return None;
    }
    let mut mask = GrayImage::new(rect.width, rect.height);
    imageproc::drawing::draw_polygon_mut(&mut mask, &poly, Luma([u8::MAX]));
    Some(mask)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::anchor::{AnchorName, AnchorPair};
    use crate::keypoints::layout_in_box;
    use crate::types::BoundingBox;

    /// Opaque garment with a distinct colour per pixel.
    #[allow(clippy::cast_possible_truncation)]
    fn patterned_garment(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    fn full_frame_pairs(width: u32, height: u32, shift: Point) -> Correspondences {
        let anchors = layout_in_box(BoundingBox {
            x0: 0,
            y0: 0,
            x1: width - 1,
            y1: height - 1,
        })
        .anchors;
        Correspondences::from_pairs(
            anchors
                .iter()
                .map(|(name, p)| AnchorPair {
                    name,
                    source: p,
                    target: Point::new(p.x + shift.x, p.y + shift.y),
                })
                .collect(),
        )
    }

    #[test]
    fn enclosing_rect_spans_floor_to_floor() {
        let rect = PixelRect::enclosing([
            Point::new(1.5, 2.2),
            Point::new(4.9, 2.0),
            Point::new(3.0, 7.0),
        ]);
        assert_eq!(
            rect.unwrap(),
            PixelRect {
                x: 1,
                y: 2,
                width: 4,
                height: 6
            }
        );
    }

    #[test]
    fn oversized_rect_is_not_representable() {
        let rect = PixelRect::enclosing([
            Point::new(0.0, 0.0),
            Point::new(4_294_967_301.0, 0.0),
            Point::new(0.0, 5.0),
        ]);
        assert_eq!(rect, None);
        let spread = PixelRect::enclosing([
            Point::new(-1e300, 0.0),
            Point::new(1e300, 0.0),
            Point::new(0.0, 5.0),
        ]);
        assert_eq!(spread, None);
    }

    #[test]
    fn far_away_target_triangle_is_skipped() {
        let garment = patterned_garment(40, 40);
        let pairs = Correspondences::from_pairs(vec![
            AnchorPair {
                name: AnchorName::LeftShoulder,
                source: Point::new(0.0, 0.0),
                target: Point::new(0.0, 0.0),
            },
            AnchorPair {
                name: AnchorName::RightShoulder,
                source: Point::new(39.0, 0.0),
                target: Point::new(4_294_967_301.0, 0.0),
            },
            AnchorPair {
                name: AnchorName::LeftHem,
                source: Point::new(0.0, 39.0),
                target: Point::new(0.0, 5.0),
            },
        ]);
        let canvas = Dimensions {
            width: 50,
            height: 50,
        };
        let out = warp_piecewise_affine(&garment, &pairs, canvas, ResampleFilter::Bilinear).unwrap();
        assert!(out.pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn rect_fit_is_strict_at_edges() {
        let dims = Dimensions {
            width: 10,
            height: 10,
        };
        let rect = PixelRect {
            x: 5,
            y: 0,
            width: 5,
            height: 10,
        };
        assert!(rect.fits(dims));
        assert!(!PixelRect { x: 6, ..rect }.fits(dims));
        assert!(!PixelRect { x: -1, ..rect }.fits(dims));
    }

    #[test]
    fn identity_warp_preserves_garment() {
        let garment = patterned_garment(64, 80);
        let pairs = full_frame_pairs(64, 80, Point::new(0.0, 0.0));
        let out = warp_piecewise_affine(
            &garment,
            &pairs,
            Dimensions::of(&garment),
            ResampleFilter::Nearest,
        )
        .unwrap();

        let mut covered = 0_u32;
        for (x, y, px) in out.enumerate_pixels() {
            if px[3] != 0 {
                covered += 1;
                assert_eq!(px, garment.get_pixel(x, y), "pixel ({x}, {y})");
            }
        }
        // The anchors' convex hull is most of the frame.
        assert!(covered > 64 * 80 / 2, "covered only {covered}");
    }

    #[test]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn translation_moves_pixels() {
        let garment = patterned_garment(40, 40);
        let pairs = full_frame_pairs(40, 40, Point::new(20.0, 10.0));
        let out = warp_piecewise_affine(
            &garment,
            &pairs,
            Dimensions {
                width: 80,
                height: 60,
            },
            ResampleFilter::Nearest,
        )
        .unwrap();
        let center = pairs.pairs()[AnchorName::CenterChest.index()];
        let (sx, sy) = (center.source.x.round() as u32, center.source.y.round() as u32);
        assert_eq!(out.get_pixel(sx + 20, sy + 10), garment.get_pixel(sx, sy));
    }

    #[test]
    fn triangles_leaving_the_canvas_are_dropped() {
        let garment = patterned_garment(40, 40);
        // Push the right half of the garment past the canvas edge.
        let pairs = full_frame_pairs(40, 40, Point::new(25.0, 0.0));
        let canvas = Dimensions {
            width: 50,
            height: 40,
        };
        let out = warp_piecewise_affine(&garment, &pairs, canvas, ResampleFilter::Bilinear).unwrap();
        assert_eq!(Dimensions::of(&out), canvas);
        assert!(out.pixels().any(|p| p[3] != 0));
        // Everything near the right edge came from dropped triangles.
        for y in 0..40 {
            assert_eq!(out.get_pixel(49, y)[3], 0);
        }
    }

    #[test]
    fn untouched_pixels_are_transparent() {
        let garment = patterned_garment(20, 20);
        let pairs = full_frame_pairs(20, 20, Point::new(0.0, 0.0));
        let out = warp_piecewise_affine(
            &garment,
            &pairs,
            Dimensions {
                width: 60,
                height: 60,
            },
            ResampleFilter::Bilinear,
        )
        .unwrap();
        for y in 30..60 {
            for x in 30..60 {
                assert_eq!(*out.get_pixel(x, y), TRANSPARENT);
            }
        }
    }

    #[test]
    fn missing_target_names_are_ignored() {
        let garment = patterned_garment(30, 30);
        let anchors = layout_in_box(BoundingBox {
            x0: 0,
            y0: 0,
            x1: 29,
            y1: 29,
        })
        .anchors;
        let mut targets = anchors;
        targets.remove(AnchorName::NeckLeft);
        let pairs = Correspondences::between(&anchors, &targets);
        assert_eq!(pairs.len(), 15);
        let out = warp_piecewise_affine(
            &garment,
            &pairs,
            Dimensions::of(&garment),
            ResampleFilter::Nearest,
        )
        .unwrap();
        assert!(out.pixels().any(|p| p[3] != 0));
    }

    #[test]
    fn collinear_sources_fail() {
        let garment = patterned_garment(30, 30);
        let pairs = Correspondences::from_pairs(
            AnchorName::ALL
                .iter()
                .zip(0_u32..)
                .map(|(&name, i)| AnchorPair {
                    name,
                    source: Point::new(f64::from(i), f64::from(i)),
                    target: Point::new(f64::from(i), 3.0),
                })
                .collect(),
        );
        let result = warp_piecewise_affine(
            &garment,
            &pairs,
            Dimensions::of(&garment),
            ResampleFilter::Nearest,
        );
        assert!(matches!(result, Err(PipelineError::WarpComputation(_))));
    }
}
