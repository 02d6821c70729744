//! Delaunay triangulation of the garment anchors.
//!
//! Triangles are returned as index triples into the correspondence
//! array, so the same triple addresses the source triangle on the
//! garment and the destination triangle on the body.

use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::anchor::Correspondences;
use crate::types::{PipelineError, Point};

/// Index triple into a [`Correspondences`] array.
pub type Simplex = [usize; 3];

/// Triangulate the source side of `pairs`.
///
/// Coincident source points collapse onto the first pair that used the
/// position. Triangles come back in the triangulation's face order,
/// which is fixed for a given input.
///
/// # Errors
///
/// Returns [`PipelineError::WarpComputation`] if there are fewer than
/// three pairs, a coordinate cannot be triangulated (non-finite or out
/// of range), or the points are collinear so no triangle exists.
pub fn triangulate(pairs: &Correspondences) -> Result<Vec<Simplex>, PipelineError> {
    if pairs.len() < 3 {
        return Err(PipelineError::WarpComputation(format!(
            "need at least 3 matched anchors to triangulate, got {}",
            pairs.len()
        )));
    }

    let mut delaunay: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    // vertex index -> pair index
    let mut owner: Vec<usize> = Vec::with_capacity(pairs.len());
    for (i, pair) in pairs.pairs().iter().enumerate() {
        let Point { x, y } = pair.source;
        let handle = delaunay.insert(Point2::new(x, y)).map_err(|e| {
            PipelineError::WarpComputation(format!("cannot triangulate anchor {}: {e:?}", pair.name))
        })?;
        if handle.index() == owner.len() {
            owner.push(i);
        }
    }

    let simplices: Vec<Simplex> = delaunay
        .inner_faces()
        .map(|face| face.vertices().map(|v| owner[v.fix().index()]))
        .collect();

    if simplices.is_empty() {
        return Err(PipelineError::WarpComputation(format!(
            "{} anchors ({} distinct) are collinear; no triangles",
            pairs.len(),
            owner.len()
        )));
    }

    log::debug!(
        "triangulated {} anchors into {} triangles",
        owner.len(),
        simplices.len()
    );
    Ok(simplices)
}
