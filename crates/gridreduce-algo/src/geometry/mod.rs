//! Planar geometry: polygon repair, clipping and Voronoi partitioning.

pub mod clip;
pub mod voronoi;

pub use clip::{intersect, repair, repair_multi, Clipped, AREA_EPSILON};
pub use voronoi::voronoi_partition;
