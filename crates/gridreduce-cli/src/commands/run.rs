//! `gridreduce run`: regions, then simplification of the region-pruned network.

use crate::commands::{regions, simplify};
use anyhow::Result;
use gridreduce_cli::cli::{RegionArgs, SimplifyArgs};
use gridreduce_cli::Config;
use gridreduce_core::Diagnostics;
use std::path::Path;

pub fn handle(
    region_args: &RegionArgs,
    simplify_args: &SimplifyArgs,
    out: &Path,
    config: &Config,
) -> Result<Diagnostics> {
    let (outcome, mut diagnostics) = regions::build(region_args, config)?;
    regions::write_region_files(out, &outcome.regions, region_args.offshore.as_deref())?;
    diagnostics.merge(outcome.diagnostics);

    let result = simplify::simplify(&outcome.network, simplify_args, config)?;
    simplify::write_outputs(
        &out.join("network"),
        &out.join(simplify::BUSMAP_FILE),
        &result,
    )?;
    diagnostics.merge(result.diagnostics);
    Ok(diagnostics)
}
