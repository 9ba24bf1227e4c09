//! # gridreduce-core: Georeferenced Transmission Network Model
//!
//! Data structures shared by every stage of the network reduction pipeline.
//!
//! ## Design Philosophy
//!
//! Networks are modelled as **undirected multigraphs** where:
//! - **Nodes**: buses, plus the one-port components attached to them
//!   (loads, generators, storage units) as isolated nodes
//! - **Edges**: lines, transformers and links between bus nodes
//!
//! Parallel lines between the same pair of buses are separate edges until the
//! aggregation stage combines them.
//!
//! Every pipeline stage takes a `&Network` and returns a **new** `Network`. Nothing
//! downstream mutates a network that an earlier stage handed over, so stages can be
//! tested on literal inputs and re-run without aliasing surprises.
//!
//! ## Quick Start
//!
//! ```rust
//! use gridreduce_core::*;
//!
//! let mut network = Network::new();
//! network.add_bus(Bus::new("1", -122.4, 37.8).with_zone("CISO-PGAE")).unwrap();
//! network.add_bus(Bus::new("2", -121.9, 37.3).with_zone("CISO-PGAE")).unwrap();
//!
//! network
//!     .add_line(
//!         Line::new("L1", "1", "2")
//!             .with_s_nom(400.0)
//!             .with_impedance(2.1, 18.4),
//!     )
//!     .unwrap();
//!
//! network
//!     .add_load(Load::new("load-2", "2").with_p_set(120.0))
//!     .unwrap();
//!
//! assert_eq!(network.stats().num_buses, 2);
//! ```
//!
//! ## Identifiers
//!
//! All identifiers are strings (substation tables and busmaps use site codes such as
//! `"37584"`), wrapped in newtypes so a line id cannot be passed where a bus id is
//! expected. [`BusId::natural_cmp`] orders numeric ids numerically.
//!
//! ## Modules
//!
//! - [`diagnostics`] - Warnings collected over a run and printed as a summary
//! - [`error`] - [`GridError`] and [`GridResult`]
//! - [`graph_utils`] - Degree statistics and island detection
//! - [`units`] - Unit-safe quantities (MW, MVA, kV, Ω, km)

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GridError, GridResult};
pub use graph_utils::{find_islands, graph_stats, GraphStats, Island};
pub use petgraph::graph::NodeIndex;
pub use units::{Kiloamperes, Kilometers, Kilovolts, Megavars, MegavoltAmperes, Megawatts, Ohms};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(value)
            }
        }
    };
}

string_id!(
    /// Bus identifier; also used for substation ids once buses are aggregated.
    BusId
);
string_id!(LineId);
string_id!(TransformerId);
string_id!(LinkId);
string_id!(LoadId);
string_id!(GeneratorId);
string_id!(StorageId);
string_id!(
    /// Country or balancing-authority code.
    Zone
);

/// Orders ids numerically when both parse as integers, lexically otherwise.
///
/// Site codes are numeric strings, so `"9" < "10"` must hold when picking the
/// lowest id of a transformer-connected site. Numeric ids sort before the rest.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl BusId {
    /// [`natural_cmp`] on bus ids.
    pub fn natural_cmp(&self, other: &BusId) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub id: BusId,
    /// Longitude (or planar x)
    pub x: f64,
    /// Latitude (or planar y)
    pub y: f64,
    /// Nominal voltage
    pub v_nom: Kilovolts,
    pub zone: Zone,
    /// Bus may receive an onshore region
    pub substation_lv: bool,
    /// Bus may receive an offshore region
    pub substation_off: bool,
    /// Interconnect label (filled from the substation table after aggregation)
    pub interconnect: Option<String>,
}

impl Bus {
    pub fn new(id: impl Into<BusId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            v_nom: Kilovolts(0.0),
            zone: Zone::new(""),
            substation_lv: true,
            substation_off: false,
            interconnect: None,
        }
    }

    pub fn with_zone(mut self, zone: impl Into<Zone>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn with_v_nom(mut self, kv: f64) -> Self {
        self.v_nom = Kilovolts(kv);
        self
    }

    /// Set the onshore/offshore connection flags.
    pub fn with_connections(mut self, onshore: bool, offshore: bool) -> Self {
        self.substation_lv = onshore;
        self.substation_off = offshore;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: LineId,
    pub bus0: BusId,
    pub bus1: BusId,
    /// Thermal rating
    pub s_nom: MegavoltAmperes,
    /// Series resistance
    pub r: Ohms,
    /// Series reactance
    pub x: Ohms,
    pub length: Kilometers,
    /// Number of parallel circuits; fractional after voltage harmonisation
    pub num_parallel: f64,
    pub v_nom: Kilovolts,
    /// Standard line type name
    pub line_type: Option<String>,
}

impl Line {
    pub fn new(id: impl Into<LineId>, bus0: impl Into<BusId>, bus1: impl Into<BusId>) -> Self {
        Self {
            id: id.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            s_nom: MegavoltAmperes(0.0),
            r: Ohms(0.0),
            x: Ohms(0.0),
            length: Kilometers(0.0),
            num_parallel: 1.0,
            v_nom: Kilovolts(0.0),
            line_type: None,
        }
    }

    pub fn with_s_nom(mut self, mva: f64) -> Self {
        self.s_nom = MegavoltAmperes(mva);
        self
    }

    pub fn with_impedance(mut self, r: f64, x: f64) -> Self {
        self.r = Ohms(r);
        self.x = Ohms(x);
        self
    }

    pub fn with_v_nom(mut self, kv: f64) -> Self {
        self.v_nom = Kilovolts(kv);
        self
    }

    pub fn with_line_type(mut self, line_type: impl Into<String>) -> Self {
        self.line_type = Some(line_type.into());
        self
    }

    pub fn with_length(mut self, km: f64) -> Self {
        self.length = Kilometers(km);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transformer {
    pub id: TransformerId,
    pub bus0: BusId,
    pub bus1: BusId,
    pub s_nom: MegavoltAmperes,
}

impl Transformer {
    pub fn new(
        id: impl Into<TransformerId>,
        bus0: impl Into<BusId>,
        bus1: impl Into<BusId>,
    ) -> Self {
        Self {
            id: id.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            s_nom: MegavoltAmperes(0.0),
        }
    }
}

/// Controllable (typically HVDC) connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub bus0: BusId,
    pub bus1: BusId,
    pub p_nom: Megawatts,
    pub length: Kilometers,
}

impl Link {
    pub fn new(id: impl Into<LinkId>, bus0: impl Into<BusId>, bus1: impl Into<BusId>) -> Self {
        Self {
            id: id.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            p_nom: Megawatts(0.0),
            length: Kilometers(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub id: LoadId,
    pub bus: BusId,
    pub p_set: Megawatts,
    pub q_set: Megavars,
}

impl Load {
    pub fn new(id: impl Into<LoadId>, bus: impl Into<BusId>) -> Self {
        Self {
            id: id.into(),
            bus: bus.into(),
            p_set: Megawatts(0.0),
            q_set: Megavars(0.0),
        }
    }

    pub fn with_p_set(mut self, mw: f64) -> Self {
        self.p_set = Megawatts(mw);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub id: GeneratorId,
    pub bus: BusId,
    pub carrier: String,
    /// Nameplate capacity
    pub p_nom: Megawatts,
    pub p_nom_min: Megawatts,
    pub p_nom_max: Megawatts,
    /// Variable cost ($/MWh)
    pub marginal_cost: f64,
    /// Annualised investment cost ($/MW)
    pub capital_cost: f64,
    pub p_min_pu: f64,
    pub p_max_pu: f64,
    pub ramp_limit_up: f64,
    pub ramp_limit_down: f64,
    pub efficiency: f64,
}

impl Generator {
    pub fn new(id: impl Into<GeneratorId>, bus: impl Into<BusId>, carrier: &str) -> Self {
        Self {
            id: id.into(),
            bus: bus.into(),
            carrier: carrier.to_string(),
            p_nom: Megawatts(0.0),
            p_nom_min: Megawatts(0.0),
            p_nom_max: Megawatts(f64::INFINITY),
            marginal_cost: 0.0,
            capital_cost: 0.0,
            p_min_pu: 0.0,
            p_max_pu: 1.0,
            ramp_limit_up: 1.0,
            ramp_limit_down: 1.0,
            efficiency: 1.0,
        }
    }

    pub fn with_p_nom(mut self, mw: f64) -> Self {
        self.p_nom = Megawatts(mw);
        self
    }

    pub fn with_marginal_cost(mut self, cost: f64) -> Self {
        self.marginal_cost = cost;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageUnit {
    pub id: StorageId,
    pub bus: BusId,
    pub carrier: String,
    pub p_nom: Megawatts,
    /// Energy-to-power ratio
    pub max_hours: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
}

impl StorageUnit {
    pub fn new(id: impl Into<StorageId>, bus: impl Into<BusId>, carrier: &str) -> Self {
        Self {
            id: id.into(),
            bus: bus.into(),
            carrier: carrier.to_string(),
            p_nom: Megawatts(0.0),
            max_hours: 1.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }

    pub fn with_p_nom(mut self, mw: f64) -> Self {
        self.p_nom = Megawatts(mw);
        self
    }
}

/// A physical substation: the target of the site-to-substation busmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub sub_id: BusId,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub interconnect: Option<String>,
}

/// Substations keyed by id.
pub type SubstationTable = BTreeMap<BusId, Substation>;

// Enum to represent different types of nodes in the graph
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Bus(Bus),
    Load(Load),
    Generator(Generator),
    StorageUnit(StorageUnit),
}

// Enum to represent different types of edges in the graph
#[derive(Debug, Clone, PartialEq)]
pub enum Edge {
    Line(Line),
    Transformer(Transformer),
    Link(Link),
}

impl Node {
    /// Identifier of the element, regardless of kind.
    pub fn id(&self) -> &str {
        match self {
            Node::Bus(bus) => bus.id.as_str(),
            Node::Load(load) => load.id.as_str(),
            Node::Generator(gen) => gen.id.as_str(),
            Node::StorageUnit(su) => su.id.as_str(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Bus(_) => "bus",
            Node::Load(_) => "load",
            Node::Generator(_) => "generator",
            Node::StorageUnit(_) => "storage unit",
        }
    }

    /// Bus a one-port component is attached to (`None` for buses).
    pub fn attached_bus(&self) -> Option<&BusId> {
        match self {
            Node::Bus(_) => None,
            Node::Load(load) => Some(&load.bus),
            Node::Generator(gen) => Some(&gen.bus),
            Node::StorageUnit(su) => Some(&su.bus),
        }
    }
}

impl Edge {
    pub fn id(&self) -> &str {
        match self {
            Edge::Line(line) => line.id.as_str(),
            Edge::Transformer(tx) => tx.id.as_str(),
            Edge::Link(link) => link.id.as_str(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Edge::Line(_) => "line",
            Edge::Transformer(_) => "transformer",
            Edge::Link(_) => "link",
        }
    }

    pub fn endpoints(&self) -> (&BusId, &BusId) {
        match self {
            Edge::Line(line) => (&line.bus0, &line.bus1),
            Edge::Transformer(tx) => (&tx.bus0, &tx.bus1),
            Edge::Link(link) => (&link.bus0, &link.bus1),
        }
    }
}

/// The transmission network graph.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: Graph<Node, Edge, Undirected>,
    bus_lookup: HashMap<BusId, NodeIndex>,
}

/// An element dropped by [`Network::without_buses`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedElement {
    pub kind: &'static str,
    pub id: String,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            bus_lookup: HashMap::new(),
        }
    }

    /// Add a bus; ids must be unique.
    pub fn add_bus(&mut self, bus: Bus) -> GridResult<NodeIndex> {
        if self.bus_lookup.contains_key(&bus.id) {
            return Err(GridError::Network(format!("duplicate bus id '{}'", bus.id)));
        }
        let id = bus.id.clone();
        let idx = self.graph.add_node(Node::Bus(bus));
        self.bus_lookup.insert(id, idx);
        Ok(idx)
    }

    pub fn add_line(&mut self, line: Line) -> GridResult<EdgeIndex> {
        self.add_edge(Edge::Line(line))
    }

    pub fn add_transformer(&mut self, transformer: Transformer) -> GridResult<EdgeIndex> {
        self.add_edge(Edge::Transformer(transformer))
    }

    pub fn add_link(&mut self, link: Link) -> GridResult<EdgeIndex> {
        self.add_edge(Edge::Link(link))
    }

    /// Add any edge; both endpoints must already exist.
    pub fn add_edge(&mut self, edge: Edge) -> GridResult<EdgeIndex> {
        let (bus0, bus1) = edge.endpoints();
        let from = self.require_bus(bus0, &edge)?;
        let to = self.require_bus(bus1, &edge)?;
        Ok(self.graph.add_edge(from, to, edge))
    }

    pub fn add_load(&mut self, load: Load) -> GridResult<NodeIndex> {
        self.add_one_port(Node::Load(load))
    }

    pub fn add_generator(&mut self, generator: Generator) -> GridResult<NodeIndex> {
        self.add_one_port(Node::Generator(generator))
    }

    pub fn add_storage_unit(&mut self, storage: StorageUnit) -> GridResult<NodeIndex> {
        self.add_one_port(Node::StorageUnit(storage))
    }

    /// Add a load, generator or storage unit; its bus must already exist.
    pub fn add_one_port(&mut self, node: Node) -> GridResult<NodeIndex> {
        match node.attached_bus() {
            Some(bus) if !self.bus_lookup.contains_key(bus) => Err(GridError::Network(format!(
                "{} '{}' references unknown bus '{}'",
                node.kind(),
                node.id(),
                bus
            ))),
            Some(_) => Ok(self.graph.add_node(node)),
            None => Err(GridError::Network(format!(
                "bus '{}' must be added with add_bus",
                node.id()
            ))),
        }
    }

    fn require_bus(&self, bus: &BusId, edge: &Edge) -> GridResult<NodeIndex> {
        self.bus_lookup.get(bus).copied().ok_or_else(|| {
            GridError::Network(format!(
                "{} '{}' references unknown bus '{}'",
                edge.kind(),
                edge.id(),
                bus
            ))
        })
    }

    pub fn bus_index(&self, id: &BusId) -> Option<NodeIndex> {
        self.bus_lookup.get(id).copied()
    }

    pub fn bus(&self, id: &BusId) -> Option<&Bus> {
        match self.bus_index(id).map(|idx| &self.graph[idx]) {
            Some(Node::Bus(bus)) => Some(bus),
            _ => None,
        }
    }

    pub fn contains_bus(&self, id: &BusId) -> bool {
        self.bus_lookup.contains_key(id)
    }

    pub fn buses(&self) -> impl Iterator<Item = &Bus> + '_ {
        self.graph.node_weights().filter_map(|n| match n {
            Node::Bus(b) => Some(b),
            _ => None,
        })
    }

    pub fn loads(&self) -> impl Iterator<Item = &Load> + '_ {
        self.graph.node_weights().filter_map(|n| match n {
            Node::Load(l) => Some(l),
            _ => None,
        })
    }

    pub fn generators(&self) -> impl Iterator<Item = &Generator> + '_ {
        self.graph.node_weights().filter_map(|n| match n {
            Node::Generator(g) => Some(g),
            _ => None,
        })
    }

    pub fn storage_units(&self) -> impl Iterator<Item = &StorageUnit> + '_ {
        self.graph.node_weights().filter_map(|n| match n {
            Node::StorageUnit(s) => Some(s),
            _ => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> + '_ {
        self.graph.edge_weights().filter_map(|e| match e {
            Edge::Line(l) => Some(l),
            _ => None,
        })
    }

    pub fn transformers(&self) -> impl Iterator<Item = &Transformer> + '_ {
        self.graph.edge_weights().filter_map(|e| match e {
            Edge::Transformer(t) => Some(t),
            _ => None,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.graph.edge_weights().filter_map(|e| match e {
            Edge::Link(l) => Some(l),
            _ => None,
        })
    }

    /// Copy of this network without `removed` buses and every element that
    /// references one of them.
    ///
    /// Returns the pruned elements (edges and one-ports, not the buses) so the
    /// caller can report them.
    pub fn without_buses(&self, removed: &HashSet<BusId>) -> (Network, Vec<PrunedElement>) {
        let mut out = Network::new();
        let mut pruned = Vec::new();
        for node in self.graph.node_weights() {
            if let Node::Bus(bus) = node {
                if !removed.contains(&bus.id) {
                    out.bus_lookup
                        .insert(bus.id.clone(), out.graph.add_node(node.clone()));
                }
            }
        }
        for node in self.graph.node_weights() {
            if let Some(bus) = node.attached_bus() {
                if removed.contains(bus) {
                    pruned.push(PrunedElement {
                        kind: node.kind(),
                        id: node.id().to_string(),
                    });
                } else {
                    out.graph.add_node(node.clone());
                }
            }
        }
        for edge in self.graph.edge_weights() {
            let (bus0, bus1) = edge.endpoints();
            if removed.contains(bus0) || removed.contains(bus1) {
                pruned.push(PrunedElement {
                    kind: edge.kind(),
                    id: edge.id().to_string(),
                });
                continue;
            }
            let from = out.bus_lookup[bus0];
            let to = out.bus_lookup[bus1];
            out.graph.add_edge(from, to, edge.clone());
        }
        (out, pruned)
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();

        for node in self.graph.node_weights() {
            match node {
                Node::Bus(_) => stats.num_buses += 1,
                Node::Load(l) => {
                    stats.num_loads += 1;
                    stats.total_load_mw += l.p_set.value();
                }
                Node::Generator(g) => {
                    stats.num_generators += 1;
                    stats.total_gen_capacity_mw += g.p_nom.value();
                }
                Node::StorageUnit(_) => stats.num_storage_units += 1,
            }
        }
        for edge in self.graph.edge_weights() {
            match edge {
                Edge::Line(l) => {
                    stats.num_lines += 1;
                    stats.total_line_capacity_mva += l.s_nom.value();
                }
                Edge::Transformer(_) => stats.num_transformers += 1,
                Edge::Link(_) => stats.num_links += 1,
            }
        }
        stats
    }

    /// Check the network for issues that would break the reduction stages.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.num_buses == 0 {
            diag.add_error("structure", "Network has no buses");
            return;
        }

        for bus in self.buses() {
            if !bus.x.is_finite() || !bus.y.is_finite() {
                diag.add_error_with_entity(
                    "structure",
                    "Bus coordinate is not finite",
                    &format!("bus {}", bus.id),
                );
            }
        }

        for line in self.lines() {
            if line.bus0 == line.bus1 {
                diag.add_warning_with_entity(
                    "structure",
                    "Line connects a bus to itself",
                    &format!("line {}", line.id),
                );
            }
            if line.s_nom.value() <= 0.0 {
                diag.add_warning_with_entity(
                    "capacity",
                    "Line has no thermal rating",
                    &format!("line {}", line.id),
                );
            }
        }

        if stats.num_lines + stats.num_links == 0 && stats.num_buses > 1 {
            diag.add_error("structure", "Network has multiple buses but no lines");
        }
    }
}

/// Statistics about a network's size and capacity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_lines: usize,
    pub num_transformers: usize,
    pub num_links: usize,
    pub num_loads: usize,
    pub num_generators: usize,
    pub num_storage_units: usize,
    pub total_load_mw: f64,
    pub total_gen_capacity_mw: f64,
    pub total_line_capacity_mva: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses, {} lines ({:.0} MVA), {} transformers, {} links, {} generators ({:.0} MW), {} loads ({:.0} MW), {} storage units",
            self.num_buses,
            self.num_lines,
            self.total_line_capacity_mva,
            self.num_transformers,
            self.num_links,
            self.num_generators,
            self.total_gen_capacity_mw,
            self.num_loads,
            self.total_load_mw,
            self.num_storage_units
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus_network() -> Network {
        let mut network = Network::new();
        network
            .add_bus(Bus::new("1", 0.0, 0.0).with_v_nom(230.0))
            .unwrap();
        network
            .add_bus(Bus::new("2", 1.0, 0.0).with_v_nom(230.0))
            .unwrap();
        network
            .add_line(Line::new("L1", "1", "2").with_s_nom(100.0))
            .unwrap();
        network
    }

    #[test]
    fn test_network_creation() {
        let network = two_bus_network();
        assert_eq!(network.graph.node_count(), 2);
        assert_eq!(network.graph.edge_count(), 1);
        assert_eq!(network.bus(&BusId::new("1")).unwrap().v_nom, Kilovolts(230.0));
    }

    #[test]
    fn test_duplicate_bus_rejected() {
        let mut network = two_bus_network();
        let err = network.add_bus(Bus::new("1", 5.0, 5.0)).unwrap_err();
        assert!(err.to_string().contains("duplicate bus id '1'"));
    }

    #[test]
    fn test_edge_with_unknown_endpoint_rejected() {
        let mut network = two_bus_network();
        let err = network.add_line(Line::new("L2", "1", "9")).unwrap_err();
        assert!(err.to_string().contains("line 'L2' references unknown bus '9'"));
    }

    #[test]
    fn test_one_port_with_unknown_bus_rejected() {
        let mut network = two_bus_network();
        assert!(network.add_load(Load::new("d", "7")).is_err());
        assert!(network.add_load(Load::new("d", "2")).is_ok());
    }

    #[test]
    fn test_network_stats() {
        let mut network = two_bus_network();
        network
            .add_generator(Generator::new("g1", "1", "gas").with_p_nom(100.0))
            .unwrap();
        network
            .add_load(Load::new("d1", "2").with_p_set(50.0))
            .unwrap();

        let stats = network.stats();
        assert_eq!(stats.num_buses, 2);
        assert_eq!(stats.num_lines, 1);
        assert_eq!(stats.num_generators, 1);
        assert_eq!(stats.num_loads, 1);
        assert!((stats.total_load_mw - 50.0).abs() < 1e-9);
        assert!((stats.total_gen_capacity_mw - 100.0).abs() < 1e-9);
        assert!((stats.total_line_capacity_mva - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_network_validation_empty() {
        let network = Network::new();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.has_errors());
        assert!(diag.errors().any(|i| i.message.contains("no buses")));
    }

    #[test]
    fn test_validation_flags_unrated_line() {
        let mut network = two_bus_network();
        network.add_line(Line::new("L2", "1", "2")).unwrap();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(!diag.has_errors());
        assert!(diag
            .warnings()
            .any(|i| i.entity.as_deref() == Some("line L2")));
    }

    #[test]
    fn test_without_buses_prunes_references() {
        let mut network = two_bus_network();
        network.add_bus(Bus::new("3", 2.0, 0.0)).unwrap();
        network.add_line(Line::new("L23", "2", "3")).unwrap();
        network.add_load(Load::new("d3", "3")).unwrap();
        network.add_load(Load::new("d1", "1")).unwrap();

        let removed: HashSet<BusId> = [BusId::new("3")].into_iter().collect();
        let (pruned_net, pruned) = network.without_buses(&removed);

        assert_eq!(pruned_net.stats().num_buses, 2);
        assert_eq!(pruned_net.stats().num_lines, 1);
        assert_eq!(pruned_net.stats().num_loads, 1);
        assert!(!pruned_net.contains_bus(&BusId::new("3")));
        assert_eq!(
            pruned,
            vec![
                PrunedElement {
                    kind: "load",
                    id: "d3".into()
                },
                PrunedElement {
                    kind: "line",
                    id: "L23".into()
                },
            ]
        );
        // The source network is untouched
        assert_eq!(network.stats().num_buses, 3);
    }

    #[test]
    fn test_natural_cmp_orders_numeric_ids() {
        let nine = BusId::new("9");
        let ten = BusId::new("10");
        assert_eq!(nine.natural_cmp(&ten), Ordering::Less);
        assert!(ten < nine); // lexical ordering differs
        assert_eq!(
            BusId::new("A").natural_cmp(&BusId::new("B")),
            Ordering::Less
        );
        assert_eq!(BusId::new("5").natural_cmp(&BusId::new("A")), Ordering::Less);
    }

    #[test]
    fn test_islands_and_stats() {
        let mut network = two_bus_network();
        network.add_bus(Bus::new("3", 2.0, 0.0)).unwrap();
        network.add_load(Load::new("d1", "1")).unwrap();

        let islands = find_islands(&network);
        assert_eq!(islands.len(), 2);
        assert_eq!(islands[0].buses, vec![BusId::new("1"), BusId::new("2")]);

        let stats = graph_stats(&network);
        assert_eq!(stats.bus_count, 3);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.islands, 2);
        assert_eq!(stats.max_degree, 1);
        assert_eq!(stats.min_degree, 0);
    }
}
