//! Thin-plate spline warp.
//!
//! One smooth interpolating field is fitted to all anchor pairs at
//! once. The spline maps canvas coordinates back to garment
//! coordinates, so every canvas pixel can be sampled directly from the
//! garment without holes.
//!
//! With kernel `U(r) = r^2 ln r`, centres `c_i` (the body targets), the
//! fitted map is
//!
//! ```text
//! f(p) = a0 + a1 * p.x + a2 * p.y + sum_i w_i * U(|p - c_i|)
//! ```
//!
//! solved per output axis from the usual `(n + 3)` square system. A
//! non-zero regularization adds `lambda` to the kernel diagonal and
//! trades exact interpolation for smoothness.

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::warp_into_with;
use nalgebra::DMatrix;

use crate::affine::{MIN_TRIANGLE_AREA, triangle_area};
use crate::anchor::Correspondences;
use crate::types::{Dimensions, PipelineError, Point};
use crate::warp::ResampleFilter;

/// Anchors closer than this (squared pixels) count as the same point.
const MIN_SEPARATION_SQUARED: f64 = 1e-12;

/// A fitted thin-plate spline from the plane to the plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinPlateSpline {
    centers: Vec<Point>,
    /// Kernel weight per centre, one column per output axis.
    weights: Vec<[f64; 2]>,
    /// Affine part: constant, x, and y coefficients per output axis.
    affine: [[f64; 2]; 3],
}

/// Radial basis `r^2 ln r`, written in terms of `r^2`.
fn kernel(r_squared: f64) -> f64 {
    if r_squared < MIN_SEPARATION_SQUARED {
        0.0
    } else {
        0.5 * r_squared * r_squared.ln()
    }
}

impl ThinPlateSpline {
    /// Fit a spline taking each `from[i]` to `to[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WarpComputation`] if the inputs differ
    /// in length, there are fewer than three points, two `from` points
    /// coincide, either side is collinear, or the system is singular.
    pub fn fit(from: &[Point], to: &[Point], regularization: f64) -> Result<Self, PipelineError> {
        let n = from.len();
        if n != to.len() {
            return Err(PipelineError::WarpComputation(format!(
                "spline needs paired points, got {n} and {}",
                to.len()
            )));
        }
        if n < 3 {
            return Err(PipelineError::WarpComputation(format!(
                "spline needs at least 3 points, got {n}"
            )));
        }
        check_distinct(from)?;
        check_spread(from, "body")?;
        check_spread(to, "garment")?;

        let size = n + 3;
        let mut system = DMatrix::<f64>::zeros(size, size);
        let mut rhs = DMatrix::<f64>::zeros(size, 2);
        for (i, &pi) in from.iter().enumerate() {
            for (j, &pj) in from.iter().enumerate() {
                system[(i, j)] = kernel(pi.distance_squared(pj));
            }
            system[(i, i)] += regularization;
            for (k, v) in [1.0, pi.x, pi.y].into_iter().enumerate() {
                system[(i, n + k)] = v;
                system[(n + k, i)] = v;
            }
            rhs[(i, 0)] = to[i].x;
            rhs[(i, 1)] = to[i].y;
        }

        let solution = system.lu().solve(&rhs).ok_or_else(|| {
            PipelineError::WarpComputation("thin-plate spline system is singular".to_owned())
        })?;
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::WarpComputation(
                "thin-plate spline solution is not finite".to_owned(),
            ));
        }

        let weights = (0..n)
            .map(|i| [solution[(i, 0)], solution[(i, 1)]])
            .collect();
        let affine = [0, 1, 2].map(|k| [solution[(n + k, 0)], solution[(n + k, 1)]]);
        Ok(Self {
            centers: from.to_vec(),
            weights,
            affine,
        })
    }

    /// Evaluate the spline at `p`.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        let [c, ax, ay] = self.affine;
        let mut x = ax[0].mul_add(p.x, ay[0].mul_add(p.y, c[0]));
        let mut y = ax[1].mul_add(p.x, ay[1].mul_add(p.y, c[1]));
        for (center, w) in self.centers.iter().zip(&self.weights) {
            let u = kernel(p.distance_squared(*center));
            x = w[0].mul_add(u, x);
            y = w[1].mul_add(u, y);
        }
        Point::new(x, y)
    }
}

fn check_distinct(points: &[Point]) -> Result<(), PipelineError> {
    for (i, a) in points.iter().enumerate() {
        if points[i + 1..]
            .iter()
            .any(|b| a.distance_squared(*b) < MIN_SEPARATION_SQUARED)
        {
            return Err(PipelineError::WarpComputation(format!(
                "two anchors coincide at ({}, {})",
                a.x, a.y
            )));
        }
    }
    Ok(())
}

/// Fails when every triple of `points` is collinear.
fn check_spread(points: &[Point], side: &str) -> Result<(), PipelineError> {
    for (i, &a) in points.iter().enumerate() {
        for (j, &b) in points.iter().enumerate().skip(i + 1) {
            if points[j + 1..]
                .iter()
                .any(|&c| triangle_area([a, b, c]) >= MIN_TRIANGLE_AREA)
            {
                return Ok(());
            }
        }
    }
    Err(PipelineError::WarpComputation(format!(
        "{side} anchors are collinear"
    )))
}

/// Warp `garment` onto a transparent canvas of size `canvas`.
///
/// # Errors
///
/// Returns [`PipelineError::WarpComputation`] if the spline cannot be
/// fitted.
#[allow(clippy::cast_possible_truncation)]
pub fn warp_thin_plate_spline(
    garment: &RgbaImage,
    pairs: &Correspondences,
    canvas: Dimensions,
    resample: ResampleFilter,
    regularization: f64,
) -> Result<RgbaImage, PipelineError> {
    let targets: Vec<Point> = pairs.targets().collect();
    let sources: Vec<Point> = pairs.sources().collect();
    let spline = ThinPlateSpline::fit(&targets, &sources, regularization)?;
    log::debug!(
        "thin-plate spline fitted to {} anchors (lambda = {regularization})",
        pairs.len()
    );

    let mut out = RgbaImage::new(canvas.width, canvas.height);
    warp_into_with(
        garment,
        |x, y| {
            let q = spline.apply(Point::new(f64::from(x), f64::from(y)));
            (q.x as f32, q.y as f32)
        },
        resample.into(),
        Rgba([0, 0, 0, 0]),
        &mut out,
    );
    Ok(out)
}
