//! High-level workflow facades for the two pipeline stages.
//!
//! These facades chain the underlying algorithms in the order the pipeline
//! needs them and attach context to every failure.

pub mod bus_regions;
pub mod simplify;

pub use bus_regions::BusRegions;
pub use simplify::{Simplification, SimplifiedNetwork, SimplifyOptions};
