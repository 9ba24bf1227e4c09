//! Polygon repair and intersection.
//!
//! Voronoi cells and outlines read from disk can both arrive invalid: repeated
//! vertices, collapsed rings, or rings that cross themselves. [`repair`] turns
//! such a polygon into a valid [`MultiPolygon`] covering the same area, and
//! [`intersect`] clips one areal geometry by another, reporting the three
//! possible outcomes through [`Clipped`].

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, BooleanOps, Coord, Line, LineString, MultiPolygon, Polygon};
use gridreduce_core::{GridError, GridResult};

/// Parts with less area than this are treated as slivers and dropped.
pub const AREA_EPSILON: f64 = 1e-12;

/// Result of clipping one areal geometry by another.
#[derive(Debug, Clone, PartialEq)]
pub enum Clipped {
    Empty,
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Clipped {
    /// Classify an overlay result, discarding zero-area parts.
    pub fn from_multi_polygon(mp: MultiPolygon<f64>) -> Self {
        let mut parts: Vec<Polygon<f64>> = mp
            .into_iter()
            .filter(|p| p.unsigned_area() > AREA_EPSILON)
            .collect();
        match parts.len() {
            0 => Clipped::Empty,
            1 => Clipped::Polygon(parts.remove(0)),
            _ => Clipped::MultiPolygon(MultiPolygon::new(parts)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Clipped::Empty)
    }

    pub fn area(&self) -> f64 {
        match self {
            Clipped::Empty => 0.0,
            Clipped::Polygon(p) => p.unsigned_area(),
            Clipped::MultiPolygon(mp) => mp.unsigned_area(),
        }
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        match self {
            Clipped::Empty => MultiPolygon::new(Vec::new()),
            Clipped::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
            Clipped::MultiPolygon(mp) => mp.clone(),
        }
    }
}

/// Repair a possibly invalid polygon.
///
/// Consecutive duplicate vertices are removed first. A ring that still crosses
/// itself is rebuilt by a zero-width overlay, which may split it into several
/// parts. `id` names the element in the error when nothing valid remains.
pub fn repair(id: &str, polygon: &Polygon<f64>) -> GridResult<MultiPolygon<f64>> {
    let exterior = dedup_ring(polygon.exterior());
    if exterior.0.len() < 3 {
        return Err(GridError::geometry(
            id,
            "ring has fewer than 3 distinct vertices",
        ));
    }
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .map(dedup_ring)
        .filter(|ring| ring.0.len() >= 3)
        .collect();
    let cleaned = Polygon::new(exterior, interiors);

    let repaired = if is_self_intersecting(&cleaned) {
        cleaned.union(&MultiPolygon::<f64>::new(Vec::new()))
    } else {
        MultiPolygon::new(vec![cleaned])
    };

    if repaired.unsigned_area() <= AREA_EPSILON {
        return Err(GridError::geometry(id, "polygon has zero area after repair"));
    }
    Ok(repaired)
}

/// Repair every part of a multipolygon (used for outlines).
///
/// Degenerate parts are dropped; it is an error only if no part survives.
pub fn repair_multi(id: &str, mp: &MultiPolygon<f64>) -> GridResult<MultiPolygon<f64>> {
    let mut parts = Vec::new();
    let mut last_err = None;
    for polygon in mp {
        match repair(id, polygon) {
            Ok(repaired) => parts.extend(repaired),
            Err(err) => {
                tracing::debug!("dropping degenerate part of '{}': {}", id, err);
                last_err = Some(err);
            }
        }
    }
    if parts.is_empty() {
        return Err(last_err.unwrap_or_else(|| GridError::geometry(id, "geometry is empty")));
    }
    Ok(MultiPolygon::new(parts))
}

/// Intersect two areal geometries.
pub fn intersect(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Clipped {
    if a.0.is_empty() || b.0.is_empty() {
        return Clipped::Empty;
    }
    Clipped::from_multi_polygon(a.intersection(b))
}

fn dedup_ring(ring: &LineString<f64>) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for &c in &ring.0 {
        if coords.last() != Some(&c) {
            coords.push(c);
        }
    }
    // Drop the closing vertex; Polygon::new closes the ring again
    while coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    LineString::new(coords)
}

fn is_self_intersecting(polygon: &Polygon<f64>) -> bool {
    let rings: Vec<Vec<Line<f64>>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.lines().collect())
        .collect();

    for (ri, ring) in rings.iter().enumerate() {
        let n = ring.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    continue;
                }
                if line_intersection(ring[i], ring[j]).is_some() {
                    return true;
                }
            }
            for other in rings.iter().skip(ri + 1) {
                for seg in other {
                    if let Some(LineIntersection::SinglePoint { is_proper: true, .. })
                    | Some(LineIntersection::Collinear { .. }) = line_intersection(ring[i], *seg)
                    {
                        return true;
                    }
                }
            }
        }
    }
    false
}
