//! Network and busmap export.
//!
//! Tables use the same schema [`crate::tables`] reads, and rows are sorted by
//! id so identical networks produce byte-identical files.

use crate::tables::{
    BusRow, BusmapRow, GeneratorRow, LineRow, LinkRow, LoadRow, StorageRow, TransformerRow,
    BUSES, GENERATORS, LINES, LINKS, LOADS, STORAGE_UNITS, TRANSFORMERS,
};
use anyhow::{Context, Result};
use gridreduce_algo::Busmap;
use gridreduce_core::{natural_cmp, Network};
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Serialize rows to a CSV file.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

fn sorted_rows<'a, E: 'a, R>(
    items: impl Iterator<Item = &'a E>,
    key: impl Fn(&R) -> &str,
) -> Vec<R>
where
    R: From<&'a E>,
{
    let mut rows: Vec<R> = items.map(R::from).collect();
    rows.sort_by(|a, b| natural_cmp(key(a), key(b)));
    rows
}

/// Write `network` to `dir` as CSV tables.
///
/// `buses.csv` and `lines.csv` are always written; the optional tables only
/// when the network has such elements.
pub fn write_network(dir: &Path, network: &Network) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let buses: Vec<BusRow> = sorted_rows(network.buses(), |r: &BusRow| r.bus_id.as_str());
    write_rows(&dir.join(BUSES), &buses)?;
    let lines: Vec<LineRow> = sorted_rows(network.lines(), |r: &LineRow| r.line_id.as_str());
    write_rows(&dir.join(LINES), &lines)?;

    let transformers: Vec<TransformerRow> =
        sorted_rows(network.transformers(), |r: &TransformerRow| r.transformer_id.as_str());
    write_optional(dir, TRANSFORMERS, &transformers)?;
    let links: Vec<LinkRow> = sorted_rows(network.links(), |r: &LinkRow| r.link_id.as_str());
    write_optional(dir, LINKS, &links)?;
    let loads: Vec<LoadRow> = sorted_rows(network.loads(), |r: &LoadRow| r.load_id.as_str());
    write_optional(dir, LOADS, &loads)?;
    let generators: Vec<GeneratorRow> =
        sorted_rows(network.generators(), |r: &GeneratorRow| r.generator_id.as_str());
    write_optional(dir, GENERATORS, &generators)?;
    let storage: Vec<StorageRow> =
        sorted_rows(network.storage_units(), |r: &StorageRow| r.storage_id.as_str());
    write_optional(dir, STORAGE_UNITS, &storage)?;

    info!("Wrote network to {}: {}", dir.display(), network.stats());
    Ok(())
}

fn write_optional<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    write_rows(&dir.join(name), rows)
}

/// Write a busmap as `bus_id,sub_id`, sorted by bus id.
pub fn write_busmap(path: &Path, busmap: &Busmap) -> Result<()> {
    let mut rows: Vec<BusmapRow> = busmap
        .iter()
        .map(|(bus, sub)| BusmapRow {
            bus_id: bus.to_string(),
            sub_id: sub.to_string(),
        })
        .collect();
    rows.sort_by(|a, b| natural_cmp(&a.bus_id, &b.bus_id));
    write_rows(path, &rows)?;
    info!("Wrote busmap with {} entries to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{read_bus2sub, read_network};
    use gridreduce_core::{Bus, BusId, Generator, Line, Load};
    use tempfile::tempdir;

    fn network() -> Network {
        let mut network = Network::new();
        for id in ["10", "9", "2"] {
            network
                .add_bus(Bus::new(id, 1.0, 2.0).with_v_nom(345.0).with_zone("US"))
                .unwrap();
        }
        network
            .add_line(Line::new("L2", "9", "10").with_s_nom(100.0).with_line_type("T"))
            .unwrap();
        network
            .add_line(Line::new("L1", "2", "9").with_s_nom(50.0))
            .unwrap();
        network
            .add_load(Load::new("D", "2").with_p_set(5.0))
            .unwrap();
        network
            .add_generator(Generator::new("G", "10", "wind").with_p_nom(7.0))
            .unwrap();
        network
    }

    #[test]
    fn test_rows_sorted_naturally() {
        let dir = tempdir().unwrap();
        write_network(dir.path(), &network()).unwrap();

        let buses = fs::read_to_string(dir.path().join(BUSES)).unwrap();
        let ids: Vec<&str> = buses
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["2", "9", "10"]);
        assert!(!dir.path().join(TRANSFORMERS).exists());
        assert!(dir.path().join(GENERATORS).exists());
    }

    #[test]
    fn test_export_reads_back() {
        let dir = tempdir().unwrap();
        let original = network();
        write_network(dir.path(), &original).unwrap();

        let read = read_network(dir.path()).unwrap();
        assert!(read.diagnostics.is_empty());
        let mut lines: Vec<Line> = read.network.lines().cloned().collect();
        lines.sort_by(|a, b| a.id.cmp(&b.id));
        let mut expected: Vec<Line> = original.lines().cloned().collect();
        expected.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(lines, expected);
        assert_eq!(
            read.network.generators().next().unwrap().p_nom_max.value(),
            f64::INFINITY
        );
    }

    #[test]
    fn test_identical_networks_identical_bytes() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        write_network(a.path(), &network()).unwrap();
        write_network(b.path(), &network()).unwrap();
        for table in [BUSES, LINES, LOADS, GENERATORS] {
            assert_eq!(
                fs::read(a.path().join(table)).unwrap(),
                fs::read(b.path().join(table)).unwrap()
            );
        }
    }

    #[test]
    fn test_busmap_written_sorted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("busmap.csv");
        let busmap = Busmap::from_pairs(
            [("10", "S1"), ("9", "S1"), ("1", "S2")]
                .into_iter()
                .map(|(b, s)| (BusId::new(b), BusId::new(s))),
        );
        write_busmap(&path, &busmap).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "bus_id,sub_id\n1,S2\n9,S1\n10,S1\n");
        assert_eq!(read_bus2sub(&path).unwrap().len(), 3);
    }
}
