//! Network simplification facade
//!
//! Runs the full reduction: optional voltage harmonisation, transformer
//! contraction, busmap composition, substation aggregation and line lengths.

use crate::aggregate::{aggregate_to_substations, AggregationOptions, AggregationPolicy};
use crate::busmap::{contract_transformers, remove_transformers, Busmap};
use crate::lengths::assign_lengths;
use crate::voltage::{harmonize_voltage, LineTypeCatalog};
use anyhow::{Context, Result};
use gridreduce_core::{BusId, Diagnostics, Kilovolts, Network, SubstationTable};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::info;

/// The `[simplify]` section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplifyOptions {
    /// Voltage layer (kV) to map every line onto; buses at this level are
    /// preferred as transformer-contraction terminals
    #[serde(default)]
    pub voltage_level: Option<f64>,
    /// Nominal current (kA) per line type, used to re-rate harmonised lines
    #[serde(default)]
    pub line_types: LineTypeCatalog,
}

/// Result of a simplification run
#[derive(Debug, Clone)]
pub struct SimplifiedNetwork {
    pub network: Network,
    /// Original bus id -> substation id
    pub busmap: Busmap,
    pub diagnostics: Diagnostics,
}

/// Fluent builder for network simplification
pub struct Simplification<'a> {
    network: &'a Network,
    bus2sub: &'a Busmap,
    substations: &'a SubstationTable,
    options: SimplifyOptions,
    aggregation: AggregationOptions,
}

impl<'a> Simplification<'a> {
    pub fn new(
        network: &'a Network,
        bus2sub: &'a Busmap,
        substations: &'a SubstationTable,
    ) -> Self {
        Self {
            network,
            bus2sub,
            substations,
            options: SimplifyOptions::default(),
            aggregation: AggregationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SimplifyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationOptions) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn run(self) -> Result<SimplifiedNetwork> {
        let policy = AggregationPolicy::with_overrides(&self.aggregation)
            .context("invalid aggregation rules")?;
        let level = self.options.voltage_level.map(Kilovolts);

        // Terminal preference is decided on the original voltages
        let primaries = primary_buses(self.network, level);

        let network = match level {
            Some(level) => Cow::Owned(
                harmonize_voltage(self.network, level, &self.options.line_types)
                    .context("harmonising line voltages")?,
            ),
            None => Cow::Borrowed(self.network),
        };

        let stage1 = contract_transformers(&network, &primaries);
        let contracted =
            remove_transformers(&network, &stage1).context("removing transformers")?;
        let busmap = stage1
            .compose(self.bus2sub)
            .context("composing transformer and substation busmaps")?;

        let aggregated = aggregate_to_substations(
            &contracted,
            &busmap,
            self.substations,
            &self.aggregation,
            &policy,
        )
        .context("aggregating to substations")?;
        let network = assign_lengths(&aggregated, self.aggregation.line_length_factor)
            .context("assigning line lengths")?;

        let mut diagnostics = Diagnostics::new();
        network.validate_into(&mut diagnostics);
        info!("Simplified network: {}", network.stats());

        Ok(SimplifiedNetwork {
            network,
            busmap,
            diagnostics,
        })
    }
}

fn primary_buses(network: &Network, level: Option<Kilovolts>) -> HashSet<BusId> {
    let Some(level) = level else {
        return HashSet::new();
    };
    network
        .buses()
        .filter(|b| (b.v_nom - level).value().abs() < 1e-6)
        .map(|b| b.id.clone())
        .collect()
}
