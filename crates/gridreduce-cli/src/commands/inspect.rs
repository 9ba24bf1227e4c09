//! `gridreduce inspect`: size, connectivity and input problems of a network.

use anyhow::{Context, Result};
use gridreduce_cli::InspectFormat;
use gridreduce_core::{graph_stats, Diagnostics};
use gridreduce_io::read_network;
use serde_json::json;
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;

pub fn handle(network_dir: &Path, format: InspectFormat) -> Result<Diagnostics> {
    let imported = read_network(network_dir)?;
    let network = &imported.network;
    let stats = network.stats();
    let graph = graph_stats(network);

    let mut diagnostics = imported.diagnostics;
    network.validate_into(&mut diagnostics);

    match format {
        InspectFormat::Plain => {
            let mut writer = TabWriter::new(io::stdout());
            writeln!(writer, "Network\t{}", network_dir.display())?;
            writeln!(writer, "  Buses\t{}", stats.num_buses)?;
            writeln!(
                writer,
                "  Lines\t{} ({:.1} MVA)",
                stats.num_lines, stats.total_line_capacity_mva
            )?;
            writeln!(writer, "  Transformers\t{}", stats.num_transformers)?;
            writeln!(writer, "  Links\t{}", stats.num_links)?;
            writeln!(
                writer,
                "  Generators\t{} ({:.1} MW)",
                stats.num_generators, stats.total_gen_capacity_mw
            )?;
            writeln!(
                writer,
                "  Loads\t{} ({:.1} MW)",
                stats.num_loads, stats.total_load_mw
            )?;
            writeln!(writer, "  Storage units\t{}", stats.num_storage_units)?;
            writeln!(writer, "  Islands\t{}", graph.islands)?;
            writeln!(
                writer,
                "  Degree [min/avg/max]\t{}/{:.2}/{}",
                graph.min_degree, graph.avg_degree, graph.max_degree
            )?;
            writer.flush()?;
        }
        InspectFormat::Json => {
            let report = json!({
                "buses": stats.num_buses,
                "lines": stats.num_lines,
                "transformers": stats.num_transformers,
                "links": stats.num_links,
                "generators": stats.num_generators,
                "loads": stats.num_loads,
                "storage_units": stats.num_storage_units,
                "total_line_capacity_mva": stats.total_line_capacity_mva,
                "total_gen_capacity_mw": stats.total_gen_capacity_mw,
                "total_load_mw": stats.total_load_mw,
                "islands": graph.islands,
                "diagnostics": &diagnostics,
            });
            serde_json::to_writer_pretty(io::stdout(), &report)
                .context("serializing inspection report")?;
            println!();
        }
    }
    Ok(diagnostics)
}
