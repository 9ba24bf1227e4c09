//! Bus region facade
//!
//! Builder-style entry point for partitioning a network into bus regions.

use crate::regions::{assemble_regions, Outlines, RegionOptions, RegionOutcome};
use anyhow::{Context, Result};
use gridreduce_core::Network;

/// Fluent builder for bus region assembly
pub struct BusRegions<'a> {
    network: &'a Network,
    onshore: &'a Outlines,
    offshore: Option<&'a Outlines>,
    options: RegionOptions,
}

impl<'a> BusRegions<'a> {
    pub fn new(network: &'a Network, onshore: &'a Outlines) -> Self {
        Self {
            network,
            onshore,
            offshore: None,
            options: RegionOptions::default(),
        }
    }

    /// Offshore outlines (country mode: keyed by country; authority mode: any name)
    pub fn with_offshore(mut self, offshore: &'a Outlines) -> Self {
        self.offshore = Some(offshore);
        self
    }

    pub fn with_options(mut self, options: RegionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(self) -> Result<RegionOutcome> {
        let empty = Outlines::new();
        let offshore = self.offshore.unwrap_or(&empty);
        assemble_regions(self.network, self.onshore, offshore, &self.options).with_context(
            || {
                format!(
                    "building bus regions ({:?} mode, {} onshore outlines)",
                    self.options.mode,
                    self.onshore.len()
                )
            },
        )
    }
}
