//! Run configuration.
//!
//! Every section and field is optional; missing values take the library
//! defaults. Command-line flags override what the file says.
//!
//! ```toml
//! [regions]
//! mode = "authority"
//! zones = ["CISO", "BPAT"]
//! offshore_buffer = 0.2
//!
//! [regions.zone_overrides]
//! "37584" = "CISO"
//!
//! [simplify]
//! voltage_level = 345.0
//!
//! [simplify.line_types]
//! "Al/St 240/40 4-bundle 345.0" = 2.58
//!
//! [aggregation]
//! use_ba_zones = true
//!
//! [aggregation.generators]
//! marginal_cost = "weighted_mean"
//! ```

use crate::cli::{RegionArgs, SimplifyArgs};
use anyhow::{Context, Result};
use gridreduce_algo::{AggregationOptions, AggregationPolicy, RegionOptions, SimplifyOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub regions: RegionOptions,
    #[serde(default)]
    pub simplify: SimplifyOptions,
    #[serde(default)]
    pub aggregation: AggregationOptions,
}

impl Config {
    /// Parse and validate a TOML config; aggregation rules are checked here so
    /// a bad rule table fails before any work starts.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("parsing config")?;
        config.policy()?;
        Ok(config)
    }

    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            Self::from_toml(&contents).with_context(|| format!("in {}", path.display()))?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn policy(&self) -> Result<AggregationPolicy> {
        AggregationPolicy::with_overrides(&self.aggregation).context("invalid [aggregation] rules")
    }

    pub fn apply_region_args(&mut self, args: &RegionArgs) {
        if let Some(mode) = args.mode {
            self.regions.mode = mode.into();
        }
        if !args.zones.is_empty() {
            self.regions.zones = args.zones.clone();
        }
    }

    pub fn apply_simplify_args(&mut self, args: &SimplifyArgs) {
        if let Some(level) = args.voltage_level {
            self.simplify.voltage_level = Some(level);
        }
        if args.use_ba_zones {
            self.aggregation.use_ba_zones = true;
        }
    }
}
