//! CSV network tables.
//!
//! A network directory holds one CSV file per component kind, with headers.
//! `buses.csv` and `lines.csv` are required; the other tables are optional.
//! Columns other than the ids and endpoints may be omitted and take the same
//! defaults as the core constructors.

use anyhow::{anyhow, Context, Result};
use gridreduce_core::{
    Bus, BusId, Diagnostics, Generator, Kilometers, Kilovolts, Line, Link, Load, Megavars,
    MegavoltAmperes, Megawatts, Network, Ohms, StorageUnit, Substation, SubstationTable,
    Transformer, Zone,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

pub const BUSES: &str = "buses.csv";
pub const LINES: &str = "lines.csv";
pub const TRANSFORMERS: &str = "transformers.csv";
pub const LINKS: &str = "links.csv";
pub const LOADS: &str = "loads.csv";
pub const GENERATORS: &str = "generators.csv";
pub const STORAGE_UNITS: &str = "storage_units.csv";

/// A network read from disk, with the problems found along the way
#[derive(Debug)]
pub struct ImportResult {
    pub network: Network,
    pub diagnostics: Diagnostics,
}

/// Accepts `true`/`false` in any case, `1`/`0` and `yes`/`no`.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "t" => Ok(true),
        "false" | "0" | "no" | "f" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, got '{other}'"
        ))),
    }
}

fn yes() -> bool {
    true
}

fn one() -> f64 {
    1.0
}

fn infinite() -> f64 {
    f64::INFINITY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRow {
    pub bus_id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub v_nom: f64,
    #[serde(default)]
    pub zone: String,
    #[serde(default = "yes", deserialize_with = "deserialize_flag")]
    pub substation_lv: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub substation_off: bool,
    #[serde(default)]
    pub interconnect: Option<String>,
}

impl From<BusRow> for Bus {
    fn from(row: BusRow) -> Self {
        Bus {
            id: BusId::new(row.bus_id),
            x: row.x,
            y: row.y,
            v_nom: Kilovolts(row.v_nom),
            zone: Zone::new(row.zone),
            substation_lv: row.substation_lv,
            substation_off: row.substation_off,
            interconnect: row.interconnect.filter(|s| !s.is_empty()),
        }
    }
}

impl From<&Bus> for BusRow {
    fn from(bus: &Bus) -> Self {
        BusRow {
            bus_id: bus.id.to_string(),
            x: bus.x,
            y: bus.y,
            v_nom: bus.v_nom.value(),
            zone: bus.zone.to_string(),
            substation_lv: bus.substation_lv,
            substation_off: bus.substation_off,
            interconnect: bus.interconnect.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRow {
    pub line_id: String,
    pub bus0: String,
    pub bus1: String,
    #[serde(default)]
    pub s_nom: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub length: f64,
    #[serde(default = "one")]
    pub num_parallel: f64,
    #[serde(default)]
    pub v_nom: f64,
    #[serde(default)]
    pub line_type: Option<String>,
}

impl From<LineRow> for Line {
    fn from(row: LineRow) -> Self {
        Line {
            id: row.line_id.into(),
            bus0: row.bus0.into(),
            bus1: row.bus1.into(),
            s_nom: MegavoltAmperes(row.s_nom),
            r: Ohms(row.r),
            x: Ohms(row.x),
            length: Kilometers(row.length),
            num_parallel: row.num_parallel,
            v_nom: Kilovolts(row.v_nom),
            line_type: row.line_type.filter(|s| !s.is_empty()),
        }
    }
}

impl From<&Line> for LineRow {
    fn from(line: &Line) -> Self {
        LineRow {
            line_id: line.id.to_string(),
            bus0: line.bus0.to_string(),
            bus1: line.bus1.to_string(),
            s_nom: line.s_nom.value(),
            r: line.r.value(),
            x: line.x.value(),
            length: line.length.value(),
            num_parallel: line.num_parallel,
            v_nom: line.v_nom.value(),
            line_type: line.line_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerRow {
    pub transformer_id: String,
    pub bus0: String,
    pub bus1: String,
    #[serde(default)]
    pub s_nom: f64,
}

impl From<TransformerRow> for Transformer {
    fn from(row: TransformerRow) -> Self {
        Transformer {
            id: row.transformer_id.into(),
            bus0: row.bus0.into(),
            bus1: row.bus1.into(),
            s_nom: MegavoltAmperes(row.s_nom),
        }
    }
}

impl From<&Transformer> for TransformerRow {
    fn from(tx: &Transformer) -> Self {
        TransformerRow {
            transformer_id: tx.id.to_string(),
            bus0: tx.bus0.to_string(),
            bus1: tx.bus1.to_string(),
            s_nom: tx.s_nom.value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRow {
    pub link_id: String,
    pub bus0: String,
    pub bus1: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub length: f64,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link {
            id: row.link_id.into(),
            bus0: row.bus0.into(),
            bus1: row.bus1.into(),
            p_nom: Megawatts(row.p_nom),
            length: Kilometers(row.length),
        }
    }
}

impl From<&Link> for LinkRow {
    fn from(link: &Link) -> Self {
        LinkRow {
            link_id: link.id.to_string(),
            bus0: link.bus0.to_string(),
            bus1: link.bus1.to_string(),
            p_nom: link.p_nom.value(),
            length: link.length.value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRow {
    pub load_id: String,
    pub bus: String,
    #[serde(default)]
    pub p_set: f64,
    #[serde(default)]
    pub q_set: f64,
}

impl From<LoadRow> for Load {
    fn from(row: LoadRow) -> Self {
        Load {
            id: row.load_id.into(),
            bus: row.bus.into(),
            p_set: Megawatts(row.p_set),
            q_set: Megavars(row.q_set),
        }
    }
}

impl From<&Load> for LoadRow {
    fn from(load: &Load) -> Self {
        LoadRow {
            load_id: load.id.to_string(),
            bus: load.bus.to_string(),
            p_set: load.p_set.value(),
            q_set: load.q_set.value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorRow {
    pub generator_id: String,
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(default = "infinite")]
    pub p_nom_max: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub p_min_pu: f64,
    #[serde(default = "one")]
    pub p_max_pu: f64,
    #[serde(default = "one")]
    pub ramp_limit_up: f64,
    #[serde(default = "one")]
    pub ramp_limit_down: f64,
    #[serde(default = "one")]
    pub efficiency: f64,
}

impl From<GeneratorRow> for Generator {
    fn from(row: GeneratorRow) -> Self {
        Generator {
            id: row.generator_id.into(),
            bus: row.bus.into(),
            carrier: row.carrier,
            p_nom: Megawatts(row.p_nom),
            p_nom_min: Megawatts(row.p_nom_min),
            p_nom_max: Megawatts(row.p_nom_max),
            marginal_cost: row.marginal_cost,
            capital_cost: row.capital_cost,
            p_min_pu: row.p_min_pu,
            p_max_pu: row.p_max_pu,
            ramp_limit_up: row.ramp_limit_up,
            ramp_limit_down: row.ramp_limit_down,
            efficiency: row.efficiency,
        }
    }
}

impl From<&Generator> for GeneratorRow {
    fn from(g: &Generator) -> Self {
        GeneratorRow {
            generator_id: g.id.to_string(),
            bus: g.bus.to_string(),
            carrier: g.carrier.clone(),
            p_nom: g.p_nom.value(),
            p_nom_min: g.p_nom_min.value(),
            p_nom_max: g.p_nom_max.value(),
            marginal_cost: g.marginal_cost,
            capital_cost: g.capital_cost,
            p_min_pu: g.p_min_pu,
            p_max_pu: g.p_max_pu,
            ramp_limit_up: g.ramp_limit_up,
            ramp_limit_down: g.ramp_limit_down,
            efficiency: g.efficiency,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageRow {
    pub storage_id: String,
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default = "one")]
    pub max_hours: f64,
    #[serde(default = "one")]
    pub efficiency_store: f64,
    #[serde(default = "one")]
    pub efficiency_dispatch: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub capital_cost: f64,
}

impl From<StorageRow> for StorageUnit {
    fn from(row: StorageRow) -> Self {
        StorageUnit {
            id: row.storage_id.into(),
            bus: row.bus.into(),
            carrier: row.carrier,
            p_nom: Megawatts(row.p_nom),
            max_hours: row.max_hours,
            efficiency_store: row.efficiency_store,
            efficiency_dispatch: row.efficiency_dispatch,
            marginal_cost: row.marginal_cost,
            capital_cost: row.capital_cost,
        }
    }
}

impl From<&StorageUnit> for StorageRow {
    fn from(s: &StorageUnit) -> Self {
        StorageRow {
            storage_id: s.id.to_string(),
            bus: s.bus.to_string(),
            carrier: s.carrier.clone(),
            p_nom: s.p_nom.value(),
            max_hours: s.max_hours,
            efficiency_store: s.efficiency_store,
            efficiency_dispatch: s.efficiency_dispatch,
            marginal_cost: s.marginal_cost,
            capital_cost: s.capital_cost,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusmapRow {
    pub bus_id: String,
    pub sub_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstationRow {
    pub sub_id: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub interconnect: Option<String>,
}

/// Deserialize every row of a CSV file.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        // Header is line 1
        let row: T = result.with_context(|| format!("{}: parsing row {}", path.display(), i + 2))?;
        rows.push(row);
    }
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn read_optional<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>> {
    let path = dir.join(name);
    if path.exists() {
        read_rows(&path)
    } else {
        debug!("{} not present; skipping", path.display());
        Ok(Vec::new())
    }
}

fn read_required<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(anyhow!("required table {} not found", path.display()));
    }
    read_rows(&path)
}

/// Read a network directory.
///
/// Duplicate bus ids are fatal. Elements referencing an unknown bus are
/// skipped and reported in the diagnostics.
pub fn read_network(dir: &Path) -> Result<ImportResult> {
    let mut network = Network::new();
    let mut diagnostics = Diagnostics::new();

    for row in read_required::<BusRow>(dir, BUSES)? {
        network
            .add_bus(row.into())
            .with_context(|| format!("loading {}", dir.join(BUSES).display()))?;
    }

    let mut skip = |table: &str, row: usize, err: gridreduce_core::GridError| {
        warn!("{} row {}: {}; skipping", table, row, err);
        diagnostics.add_warning_at_row("reference", &format!("{table}: {err}"), row);
    };

    for (i, row) in read_required::<LineRow>(dir, LINES)?.into_iter().enumerate() {
        if let Err(err) = network.add_line(row.into()) {
            skip(LINES, i + 2, err);
        }
    }
    for (i, row) in read_optional::<TransformerRow>(dir, TRANSFORMERS)?
        .into_iter()
        .enumerate()
    {
        if let Err(err) = network.add_transformer(row.into()) {
            skip(TRANSFORMERS, i + 2, err);
        }
    }
    for (i, row) in read_optional::<LinkRow>(dir, LINKS)?.into_iter().enumerate() {
        if let Err(err) = network.add_link(row.into()) {
            skip(LINKS, i + 2, err);
        }
    }
    for (i, row) in read_optional::<LoadRow>(dir, LOADS)?.into_iter().enumerate() {
        if let Err(err) = network.add_load(row.into()) {
            skip(LOADS, i + 2, err);
        }
    }
    for (i, row) in read_optional::<GeneratorRow>(dir, GENERATORS)?
        .into_iter()
        .enumerate()
    {
        if let Err(err) = network.add_generator(row.into()) {
            skip(GENERATORS, i + 2, err);
        }
    }
    for (i, row) in read_optional::<StorageRow>(dir, STORAGE_UNITS)?
        .into_iter()
        .enumerate()
    {
        if let Err(err) = network.add_storage_unit(row.into()) {
            skip(STORAGE_UNITS, i + 2, err);
        }
    }

    info!("Loaded network from {}: {}", dir.display(), network.stats());
    Ok(ImportResult {
        network,
        diagnostics,
    })
}

/// Read `bus_id,sub_id` pairs. A bus listed twice is an error.
pub fn read_bus2sub(path: &Path) -> Result<BTreeMap<BusId, BusId>> {
    let mut map = BTreeMap::new();
    for row in read_rows::<BusmapRow>(path)? {
        let bus = BusId::new(row.bus_id);
        if map.insert(bus.clone(), BusId::new(row.sub_id)).is_some() {
            return Err(anyhow!("{}: bus '{}' listed twice", path.display(), bus));
        }
    }
    Ok(map)
}

/// Read the substation table. A substation listed twice is an error.
pub fn read_substations(path: &Path) -> Result<SubstationTable> {
    let mut table = SubstationTable::new();
    for row in read_rows::<SubstationRow>(path)? {
        let id = BusId::new(row.sub_id);
        let sub = Substation {
            sub_id: id.clone(),
            lon: row.lon,
            lat: row.lat,
            interconnect: row.interconnect.filter(|s| !s.is_empty()),
        };
        if table.insert(id.clone(), sub).is_some() {
            return Err(anyhow!(
                "{}: substation '{}' listed twice",
                path.display(),
                id
            ));
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_read_minimal_network() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            BUSES,
            "bus_id,x,y,v_nom,zone,substation_lv,substation_off\n\
             1,-120.5,37.1,345,CISO,True,False\n\
             2,-120.0,37.0,230,CISO,true,1\n",
        );
        write(
            dir.path(),
            LINES,
            "line_id,bus0,bus1,s_nom,r,x\nL1,1,2,500,0.5,5\n",
        );

        let result = read_network(dir.path()).unwrap();
        let network = result.network;
        assert!(result.diagnostics.is_empty());
        assert_eq!(network.stats().num_buses, 2);

        let bus2 = network.bus(&BusId::new("2")).unwrap();
        assert!(bus2.substation_off);
        assert_eq!(bus2.v_nom, Kilovolts(230.0));

        let line = network.lines().next().unwrap();
        assert_eq!(line.num_parallel, 1.0);
        assert_eq!(line.line_type, None);
        assert_eq!(line.s_nom, MegavoltAmperes(500.0));
    }

    #[test]
    fn test_unknown_bus_reference_is_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), BUSES, "bus_id,x,y\n1,0,0\n");
        write(dir.path(), LINES, "line_id,bus0,bus1\n");
        write(dir.path(), LOADS, "load_id,bus,p_set\nD1,1,10\nD9,9,5\n");

        let result = read_network(dir.path()).unwrap();
        assert_eq!(result.network.loads().count(), 1);
        assert_eq!(result.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_missing_required_table() {
        let dir = tempdir().unwrap();
        write(dir.path(), BUSES, "bus_id,x,y\n1,0,0\n");
        let err = read_network(dir.path()).unwrap_err();
        assert!(err.to_string().contains("lines.csv"));
    }

    #[test]
    fn test_bad_flag_names_row() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            BUSES,
            "bus_id,x,y,substation_lv\n1,0,0,maybe\n",
        );
        write(dir.path(), LINES, "line_id,bus0,bus1\n");
        let err = read_network(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("row 2"));
    }

    #[test]
    fn test_read_substation_tables() {
        let dir = tempdir().unwrap();
        let subs = dir.path().join("substations.csv");
        fs::write(
            &subs,
            "sub_id,lon,lat,interconnect\n100,-120,37,western\n200,-121,38,\n",
        )
        .unwrap();
        let table = read_substations(&subs).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[&BusId::new("100")].interconnect.as_deref(), Some("western"));
        assert_eq!(table[&BusId::new("200")].interconnect, None);

        let bus2sub = dir.path().join("bus2sub.csv");
        fs::write(&bus2sub, "bus_id,sub_id\n1,100\n1,200\n").unwrap();
        let err = read_bus2sub(&bus2sub).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }
}
