//! # gridreduce-algo: Spatial partitioning and topology reduction
//!
//! This crate turns a detailed transmission network into a substation-level
//! network and assigns every bus a georeferenced region.
//!
//! ## Spatial partitioning
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry::clip`] | Polygon repair and intersection ([`Clipped`] outcomes) |
//! | [`geometry::voronoi`] | One clipped Voronoi cell per bus coordinate |
//! | [`regions`] | Per-zone partitioning, offshore filtering, zone reassignment and pruning |
//!
//! Regions are built in one of two [`RegionMode`]s: per country (buses carry
//! their zone already) or per balancing authority (zones are assigned by
//! point-in-polygon, and buses outside every authority are pruned).
//!
//! ## Topology reduction
//!
//! | Module | Role |
//! |--------|------|
//! | [`voltage`] | Optional mapping of every line onto one voltage layer |
//! | [`busmap`] | Transformer contraction (union-find) and busmap composition |
//! | [`aggregate`] | Collapse onto substations with per-attribute [`AggregationRule`]s |
//! | [`lengths`] | Great-circle line lengths |
//!
//! ## Example
//!
//! ```ignore
//! use gridreduce_algo::workflows::Simplification;
//!
//! let result = Simplification::new(&network, &bus2sub, &substations)
//!     .with_options(SimplifyOptions { voltage_level: Some(345.0), ..Default::default() })
//!     .run()?;
//! println!("{}", result.network.stats());
//! ```

pub mod aggregate;
pub mod busmap;
pub mod geometry;
pub mod lengths;
pub mod regions;
pub mod voltage;
pub mod workflows;

pub use aggregate::{
    aggregate_to_substations, AggregationOptions, AggregationPolicy, AggregationRule, OnePort,
};
pub use busmap::{contract_transformers, remove_transformers, Busmap};
pub use geometry::{intersect, repair, repair_multi, voronoi_partition, Clipped};
pub use lengths::{assign_lengths, haversine_km, DEFAULT_LINE_LENGTH_FACTOR};
pub use regions::{
    assemble_regions, Outlines, Region, RegionMode, RegionOptions, RegionOutcome, RegionSet,
    ZoneMap,
};
pub use voltage::{harmonize_voltage, LineTypeCatalog};
pub use workflows::{BusRegions, Simplification, SimplifiedNetwork, SimplifyOptions};
