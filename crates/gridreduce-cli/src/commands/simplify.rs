//! `gridreduce simplify`: one bus per substation.

use anyhow::Result;
use gridreduce_algo::{Busmap, Simplification, SimplifiedNetwork};
use gridreduce_cli::cli::SimplifyArgs;
use gridreduce_cli::Config;
use gridreduce_core::{Diagnostics, Network};
use gridreduce_io::{read_bus2sub, read_network, read_substations, write_busmap, write_network};
use std::path::Path;

pub const BUSMAP_FILE: &str = "busmap.csv";

pub fn handle(
    network_dir: &Path,
    args: &SimplifyArgs,
    out: &Path,
    config: &Config,
) -> Result<Diagnostics> {
    let imported = read_network(network_dir)?;
    let result = simplify(&imported.network, args, config)?;
    write_outputs(out, &out.join(BUSMAP_FILE), &result)?;

    let mut diagnostics = imported.diagnostics;
    diagnostics.merge(result.diagnostics);
    Ok(diagnostics)
}

pub fn simplify(
    network: &Network,
    args: &SimplifyArgs,
    config: &Config,
) -> Result<SimplifiedNetwork> {
    let mut config = config.clone();
    config.apply_simplify_args(args);

    let bus2sub = Busmap::from_pairs(read_bus2sub(&args.bus2sub)?);
    let substations = read_substations(&args.substations)?;

    Simplification::new(network, &bus2sub, &substations)
        .with_options(config.simplify)
        .with_aggregation(config.aggregation)
        .run()
}

pub fn write_outputs(out: &Path, busmap_path: &Path, result: &SimplifiedNetwork) -> Result<()> {
    write_network(out, &result.network)?;
    write_busmap(busmap_path, &result.busmap)?;
    println!(
        "Simplified network written to {}: {}",
        out.display(),
        result.network.stats()
    );
    Ok(())
}
