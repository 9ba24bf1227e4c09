//! # gridreduce-io: Network tables, outlines and region export
//!
//! ## Inputs
//!
//! | Source | Reader |
//! |--------|--------|
//! | Network directory (`buses.csv`, `lines.csv`, optional component tables) | [`tables::read_network`] |
//! | `bus2sub.csv` (`bus_id,sub_id`) | [`tables::read_bus2sub`] |
//! | `substations.csv` (`sub_id,lon,lat,interconnect`) | [`tables::read_substations`] |
//! | GeoJSON outlines (`properties.name` + Polygon/MultiPolygon) | [`geojson::read_outlines`] |
//!
//! Elements referencing unknown buses are skipped and reported through
//! [`gridreduce_core::Diagnostics`] rather than aborting the import.
//!
//! ## Outputs
//!
//! - [`geojson::write_regions`]: bus regions with `name`, `x`, `y`, `country`
//! - [`export::write_network`]: the same CSV schema the readers accept
//! - [`export::write_busmap`]: `bus_id,sub_id`
//!
//! Every writer sorts its rows by id, so identical inputs give byte-identical
//! files.
//!
//! ```rust,no_run
//! use gridreduce_io::tables::read_network;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let result = read_network(Path::new("networks/base"))?;
//!     println!("{}", result.network.stats());
//!     println!("{}", result.diagnostics.summary());
//!     Ok(())
//! }
//! ```

pub mod export;
pub mod geojson;
pub mod tables;

pub use export::{write_busmap, write_network};
pub use geojson::{read_outlines, write_regions, GeoJsonError};
pub use tables::{read_bus2sub, read_network, read_substations, ImportResult};
