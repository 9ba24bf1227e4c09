//! Voronoi partition of a set of bus coordinates within an outline.
//!
//! The diagram is read off the Delaunay triangulation: the cell of a site is the
//! ring of circumcenters of the triangles around it. Four guard sites framing
//! the input keep every real site in the interior of the triangulation, so every
//! cell is bounded and the cells together cover the outline.

use super::clip::{intersect, repair, Clipped};
use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use gridreduce_core::{GridError, GridResult};
use spade::handles::FixedVertexHandle;
use spade::{DelaunayTriangulation, Point2, Triangulation};

/// Offset of the guard sites, in multiples of the framed span.
const GUARD_FACTOR: f64 = 3.0;

/// One clipped cell per input coordinate, in input order.
///
/// A single coordinate receives the whole outline. Duplicate coordinates share
/// a cell, and a coordinate outside the outline still receives a (possibly
/// empty) cell.
pub fn voronoi_partition(
    points: &[Coord<f64>],
    outline: &MultiPolygon<f64>,
) -> GridResult<Vec<Clipped>> {
    match points.len() {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![Clipped::from_multi_polygon(outline.clone())]),
        _ => {}
    }

    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let handle = triangulation
            .insert(Point2::new(p.x, p.y))
            .map_err(|e| GridError::geometry(format!("point {i}"), format!("{e:?}")))?;
        handles.push(handle);
    }
    for guard in guard_sites(points, outline) {
        triangulation
            .insert(guard)
            .map_err(|e| GridError::geometry("guard point", format!("{e:?}")))?;
    }

    tracing::debug!(
        "triangulated {} sites ({} distinct)",
        points.len(),
        triangulation.num_vertices() - 4
    );

    handles
        .iter()
        .enumerate()
        .map(|(i, &handle)| {
            let ring = cell_ring(&triangulation, handle);
            if ring.len() < 3 {
                return Err(GridError::geometry(
                    format!("point {i}"),
                    "Voronoi cell has fewer than 3 vertices",
                ));
            }
            let cell = Polygon::new(LineString::from(ring), Vec::new());
            let cell = repair(&format!("point {i}"), &cell)?;
            Ok(intersect(&cell, outline))
        })
        .collect()
}

/// Corners of a square frame around the points and the outline.
///
/// The frame uses the larger of the two spans on both axes so that no guard
/// cell reaches into the framed area, even for collinear points.
fn guard_sites(points: &[Coord<f64>], outline: &MultiPolygon<f64>) -> [Point2<f64>; 4] {
    let mut min = points[0];
    let mut max = points[0];
    let outline_corners = outline
        .bounding_rect()
        .map(|r| [r.min(), r.max()])
        .into_iter()
        .flatten();
    for c in points.iter().copied().chain(outline_corners) {
        min.x = min.x.min(c.x);
        min.y = min.y.min(c.y);
        max.x = max.x.max(c.x);
        max.y = max.y.max(c.y);
    }

    let mut span = (max.x - min.x).max(max.y - min.y);
    if span <= 0.0 {
        span = 1.0;
    }
    let d = GUARD_FACTOR * span;
    [
        Point2::new(min.x - d, min.y - d),
        Point2::new(min.x - d, max.y + d),
        Point2::new(max.x + d, min.y - d),
        Point2::new(max.x + d, max.y + d),
    ]
}

/// Circumcenters of the triangles around a site, ordered by angle.
fn cell_ring(
    triangulation: &DelaunayTriangulation<Point2<f64>>,
    handle: FixedVertexHandle,
) -> Vec<Coord<f64>> {
    let vertex = triangulation.vertex(handle);
    let site = vertex.position();

    let mut centers: Vec<Coord<f64>> = vertex
        .out_edges()
        .filter_map(|edge| edge.face().as_inner())
        .filter_map(|face| {
            let [a, b, c] = face.positions();
            circumcenter(a, b, c)
        })
        .collect();

    centers.sort_by(|a, b| {
        let angle_a = (a.y - site.y).atan2(a.x - site.x);
        let angle_b = (b.y - site.y).atan2(b.x - site.x);
        angle_a.total_cmp(&angle_b)
    });

    // Co-circular sites produce the same circumcenter twice
    let scale = centers
        .iter()
        .map(|c| c.x.abs().max(c.y.abs()))
        .fold(1.0, f64::max);
    let tol = 1e-12 * scale;
    centers.dedup_by(|a, b| (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol);
    if centers.len() > 1 {
        let (first, last) = (centers[0], centers[centers.len() - 1]);
        if (first.x - last.x).abs() <= tol && (first.y - last.y).abs() <= tol {
            centers.pop();
        }
    }
    centers
}

fn circumcenter(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Option<Coord<f64>> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < f64::EPSILON {
        return None;
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    Some(Coord {
        x: (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        y: (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    })
}
