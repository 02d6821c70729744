//! 2-D affine maps solved from triangle correspondences.

use geo::Area;
use nalgebra::{Matrix2x3, Matrix3, Vector3};

use crate::types::Point;

/// Triangles with less area than this (in square pixels) are treated as
/// degenerate.
pub const MIN_TRIANGLE_AREA: f64 = 1e-9;

/// An affine map `p' = M * [x, y, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine(Matrix2x3<f64>);

impl Affine {
    /// The identity map.
    #[must_use]
    pub fn identity() -> Self {
        Self(Matrix2x3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0))
    }

    /// The unique affine map taking each vertex of `src` to the same
    /// vertex of `dst`.
    ///
    /// Returns `None` if `src` is degenerate (collinear or coincident
    /// vertices), since the map is then not unique.
    #[must_use]
    pub fn from_triangles(src: [Point; 3], dst: [Point; 3]) -> Option<Self> {
        if triangle_area(src) < MIN_TRIANGLE_AREA {
            return None;
        }
        let s = Matrix3::new(
            src[0].x, src[1].x, src[2].x, //
            src[0].y, src[1].y, src[2].y, //
            1.0, 1.0, 1.0,
        );
        let d = Matrix2x3::new(
            dst[0].x, dst[1].x, dst[2].x, //
            dst[0].y, dst[1].y, dst[2].y,
        );
        let m = d * s.try_inverse()?;
        m.iter().all(|v| v.is_finite()).then_some(Self(m))
    }

    /// The inverse map, or `None` if this map collapses the plane.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let m = &self.0;
        let h = Matrix3::new(
            m[(0, 0)], m[(0, 1)], m[(0, 2)], //
            m[(1, 0)], m[(1, 1)], m[(1, 2)], //
            0.0, 0.0, 1.0,
        );
        let inv = h.try_inverse()?;
        let m = inv.fixed_view::<2, 3>(0, 0).into_owned();
        m.iter().all(|v| v.is_finite()).then_some(Self(m))
    }

    /// Map a point.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        let v = self.0 * Vector3::new(p.x, p.y, 1.0);
        Point::new(v.x, v.y)
    }

    /// Same map with both domain and range shifted: the result takes
    /// `p - from_origin` to `self.apply(p) - to_origin`.
    #[must_use]
    pub fn rebased(&self, from_origin: Point, to_origin: Point) -> Self {
        let shifted = self.apply(from_origin);
        let mut m = self.0;
        m[(0, 2)] = shifted.x - to_origin.x;
        m[(1, 2)] = shifted.y - to_origin.y;
        Self(m)
    }
}

/// Unsigned area of a triangle.
#[must_use]
pub fn triangle_area(tri: [Point; 3]) -> f64 {
    geo::Triangle::new(tri[0].into(), tri[1].into(), tri[2].into()).unsigned_area()
}
