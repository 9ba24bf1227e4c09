//! `gridreduce regions`: bus regions from a network and outlines.

use anyhow::{Context, Result};
use gridreduce_algo::{BusRegions, Outlines, RegionOutcome, RegionSet};
use gridreduce_cli::cli::RegionArgs;
use gridreduce_cli::Config;
use gridreduce_core::Diagnostics;
use gridreduce_io::{read_network, read_outlines, write_network, write_regions};
use std::fs;
use std::path::Path;
use tracing::info;

pub const ONSHORE_FILE: &str = "regions_onshore.geojson";
pub const OFFSHORE_FILE: &str = "regions_offshore.geojson";

pub fn handle(
    args: &RegionArgs,
    out: &Path,
    network_out: Option<&Path>,
    config: &Config,
) -> Result<Diagnostics> {
    let (outcome, mut diagnostics) = build(args, config)?;
    write_region_files(out, &outcome.regions, args.offshore.as_deref())?;
    if let Some(dir) = network_out {
        write_network(dir, &outcome.network)?;
    }
    diagnostics.merge(outcome.diagnostics);
    println!(
        "Wrote {} onshore and {} offshore regions to {}",
        outcome.regions.onshore.len(),
        outcome.regions.offshore.len(),
        out.display()
    );
    Ok(diagnostics)
}

/// Read the inputs and assemble regions. The returned diagnostics cover the
/// network import; the region diagnostics stay in the outcome.
pub fn build(args: &RegionArgs, config: &Config) -> Result<(RegionOutcome, Diagnostics)> {
    let mut config = config.clone();
    config.apply_region_args(args);

    let imported = read_network(&args.network)?;
    let onshore = read_outlines(&args.onshore)?;
    let offshore = match &args.offshore {
        Some(path) => read_outlines(path)?,
        None => Outlines::new(),
    };

    let outcome = BusRegions::new(&imported.network, &onshore)
        .with_offshore(&offshore)
        .with_options(config.regions)
        .run()?;
    Ok((outcome, imported.diagnostics))
}

/// Write both region files. Without offshore regions, the offshore input is
/// copied through unchanged (or an empty collection is written).
pub fn write_region_files(
    out: &Path,
    regions: &RegionSet,
    offshore_input: Option<&Path>,
) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    write_regions(&out.join(ONSHORE_FILE), &regions.onshore)?;

    let offshore_path = out.join(OFFSHORE_FILE);
    match offshore_input {
        Some(input) if regions.offshore.is_empty() => {
            info!("No offshore regions; copying {} unchanged", input.display());
            fs::copy(input, &offshore_path).with_context(|| {
                format!("copying {} to {}", input.display(), offshore_path.display())
            })?;
        }
        _ => write_regions(&offshore_path, &regions.offshore)?,
    }
    Ok(())
}
