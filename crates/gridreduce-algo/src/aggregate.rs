//! Aggregation of a network onto its substations.
//!
//! Given a composed busmap (original bus -> substation), every group of buses
//! sharing a substation collapses to one bus placed at the substation. Lines
//! are rewired, self-loops dropped and parallel lines combined into one
//! equivalent line. Loads, generators and storage units sharing a substation
//! and carrier are merged attribute by attribute according to an explicit
//! [`AggregationRule`] per attribute.

use crate::busmap::Busmap;
use crate::lengths::DEFAULT_LINE_LENGTH_FACTOR;
use gridreduce_core::{
    natural_cmp, Bus, BusId, Edge, Generator, GridError, GridResult, Kilometers, Kilovolts,
    Line, Load, MegavoltAmperes, Network, Node, Ohms, StorageUnit, SubstationTable, Zone,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// How the values of one attribute are combined when components merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationRule {
    Sum,
    Mean,
    /// Mean weighted by nameplate capacity (`p_nom`); falls back to the plain
    /// mean when the members have no capacity
    WeightedMean,
    Max,
    Min,
}

impl AggregationRule {
    pub fn apply(self, values: &[f64], weights: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mean = || values.iter().sum::<f64>() / values.len() as f64;
        match self {
            AggregationRule::Sum => values.iter().sum(),
            AggregationRule::Mean => mean(),
            AggregationRule::WeightedMean => {
                let total: f64 = weights.iter().sum();
                if total.abs() < f64::EPSILON || !total.is_finite() {
                    mean()
                } else {
                    values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total
                }
            }
            AggregationRule::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregationRule::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// Rule table for one component kind, keyed by attribute name.
pub type RuleTable = BTreeMap<String, AggregationRule>;

/// A one-port component that can be merged with others at the same bus.
pub trait OnePort: Clone {
    const KIND: &'static str;
    /// Aggregated attribute names, in the order of [`OnePort::values`].
    const ATTRIBUTES: &'static [&'static str];

    fn bus(&self) -> &BusId;
    fn carrier(&self) -> &str;
    /// Give a merged component its bus and id.
    fn relocate(&mut self, bus: BusId, id: String);
    /// Weight used by [`AggregationRule::WeightedMean`].
    fn weight(&self) -> f64;
    fn values(&self) -> Vec<f64>;
    fn values_mut(&mut self) -> Vec<&mut f64>;
    fn rules(policy: &AggregationPolicy) -> &RuleTable;
    fn into_node(self) -> Node;
}

impl OnePort for Generator {
    const KIND: &'static str = "generators";
    const ATTRIBUTES: &'static [&'static str] = &[
        "p_nom",
        "p_nom_min",
        "p_nom_max",
        "marginal_cost",
        "capital_cost",
        "p_min_pu",
        "p_max_pu",
        "ramp_limit_up",
        "ramp_limit_down",
        "efficiency",
    ];

    fn bus(&self) -> &BusId {
        &self.bus
    }

    fn carrier(&self) -> &str {
        &self.carrier
    }

    fn relocate(&mut self, bus: BusId, id: String) {
        self.bus = bus;
        self.id = id.into();
    }

    fn weight(&self) -> f64 {
        self.p_nom.value()
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.p_nom.0,
            self.p_nom_min.0,
            self.p_nom_max.0,
            self.marginal_cost,
            self.capital_cost,
            self.p_min_pu,
            self.p_max_pu,
            self.ramp_limit_up,
            self.ramp_limit_down,
            self.efficiency,
        ]
    }

    fn values_mut(&mut self) -> Vec<&mut f64> {
        vec![
            &mut self.p_nom.0,
            &mut self.p_nom_min.0,
            &mut self.p_nom_max.0,
            &mut self.marginal_cost,
            &mut self.capital_cost,
            &mut self.p_min_pu,
            &mut self.p_max_pu,
            &mut self.ramp_limit_up,
            &mut self.ramp_limit_down,
            &mut self.efficiency,
        ]
    }

    fn rules(policy: &AggregationPolicy) -> &RuleTable {
        &policy.generators
    }

    fn into_node(self) -> Node {
        Node::Generator(self)
    }
}

impl OnePort for Load {
    const KIND: &'static str = "loads";
    const ATTRIBUTES: &'static [&'static str] = &["p_set", "q_set"];

    fn bus(&self) -> &BusId {
        &self.bus
    }

    fn carrier(&self) -> &str {
        ""
    }

    fn relocate(&mut self, bus: BusId, id: String) {
        self.bus = bus;
        self.id = id.into();
    }

    // Loads have no capacity; weighted means degrade to plain means
    fn weight(&self) -> f64 {
        1.0
    }

    fn values(&self) -> Vec<f64> {
        vec![self.p_set.0, self.q_set.0]
    }

    fn values_mut(&mut self) -> Vec<&mut f64> {
        vec![&mut self.p_set.0, &mut self.q_set.0]
    }

    fn rules(policy: &AggregationPolicy) -> &RuleTable {
        &policy.loads
    }

    fn into_node(self) -> Node {
        Node::Load(self)
    }
}

impl OnePort for StorageUnit {
    const KIND: &'static str = "storage_units";
    const ATTRIBUTES: &'static [&'static str] = &[
        "p_nom",
        "max_hours",
        "efficiency_store",
        "efficiency_dispatch",
        "marginal_cost",
        "capital_cost",
    ];

    fn bus(&self) -> &BusId {
        &self.bus
    }

    fn carrier(&self) -> &str {
        &self.carrier
    }

    fn relocate(&mut self, bus: BusId, id: String) {
        self.bus = bus;
        self.id = id.into();
    }

    fn weight(&self) -> f64 {
        self.p_nom.value()
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.p_nom.0,
            self.max_hours,
            self.efficiency_store,
            self.efficiency_dispatch,
            self.marginal_cost,
            self.capital_cost,
        ]
    }

    fn values_mut(&mut self) -> Vec<&mut f64> {
        vec![
            &mut self.p_nom.0,
            &mut self.max_hours,
            &mut self.efficiency_store,
            &mut self.efficiency_dispatch,
            &mut self.marginal_cost,
            &mut self.capital_cost,
        ]
    }

    fn rules(policy: &AggregationPolicy) -> &RuleTable {
        &policy.storage_units
    }

    fn into_node(self) -> Node {
        Node::StorageUnit(self)
    }
}

/// Per-attribute rules for every one-port kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationPolicy {
    pub generators: RuleTable,
    pub loads: RuleTable,
    pub storage_units: RuleTable,
}

fn table(entries: &[(&str, AggregationRule)]) -> RuleTable {
    entries
        .iter()
        .map(|(attr, rule)| (attr.to_string(), *rule))
        .collect()
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        use AggregationRule::*;
        Self {
            generators: table(&[
                ("p_nom", Sum),
                ("p_nom_min", Sum),
                ("p_nom_max", Sum),
                ("marginal_cost", Mean),
                ("capital_cost", Mean),
                ("p_min_pu", Mean),
                ("p_max_pu", Mean),
                ("ramp_limit_up", Max),
                ("ramp_limit_down", Max),
                ("efficiency", Mean),
            ]),
            loads: table(&[("p_set", Sum), ("q_set", Sum)]),
            storage_units: table(&[
                ("p_nom", Sum),
                ("max_hours", Mean),
                ("efficiency_store", Mean),
                ("efficiency_dispatch", Mean),
                ("marginal_cost", Mean),
                ("capital_cost", Mean),
            ]),
        }
    }
}

impl AggregationPolicy {
    /// Default rules with the given overrides applied, validated.
    pub fn with_overrides(options: &AggregationOptions) -> GridResult<Self> {
        let mut policy = Self::default();
        policy.generators.extend(options.generators.clone());
        policy.loads.extend(options.loads.clone());
        policy.storage_units.extend(options.storage_units.clone());
        policy.validate()?;
        Ok(policy)
    }

    /// Every attribute of every kind has exactly one rule, and no rule names an
    /// unknown attribute.
    pub fn validate(&self) -> GridResult<()> {
        check_table::<Generator>(&self.generators)?;
        check_table::<Load>(&self.loads)?;
        check_table::<StorageUnit>(&self.storage_units)?;
        Ok(())
    }
}

fn check_table<T: OnePort>(rules: &RuleTable) -> GridResult<()> {
    if let Some(missing) = T::ATTRIBUTES.iter().find(|a| !rules.contains_key(**a)) {
        return Err(GridError::Config(format!(
            "no aggregation rule for {}.{}",
            T::KIND,
            missing
        )));
    }
    if let Some(unknown) = rules.keys().find(|k| !T::ATTRIBUTES.contains(&k.as_str())) {
        return Err(GridError::Config(format!(
            "unknown attribute {}.{} (known: {})",
            T::KIND,
            unknown,
            T::ATTRIBUTES.join(", ")
        )));
    }
    Ok(())
}

/// The `[aggregation]` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationOptions {
    /// Label aggregated buses with their members' zone instead of `default_zone`
    #[serde(default)]
    pub use_ba_zones: bool,
    #[serde(default = "default_zone")]
    pub default_zone: String,
    #[serde(default = "default_line_length_factor")]
    pub line_length_factor: f64,
    /// Rule overrides, by attribute
    #[serde(default)]
    pub generators: RuleTable,
    #[serde(default)]
    pub loads: RuleTable,
    #[serde(default)]
    pub storage_units: RuleTable,
}

fn default_zone() -> String {
    "US".to_string()
}

fn default_line_length_factor() -> f64 {
    DEFAULT_LINE_LENGTH_FACTOR
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            use_ba_zones: false,
            default_zone: default_zone(),
            line_length_factor: default_line_length_factor(),
            generators: RuleTable::new(),
            loads: RuleTable::new(),
            storage_units: RuleTable::new(),
        }
    }
}

/// Collapse `network` onto substations.
///
/// Every bus must resolve through `busmap`, and every target must appear in
/// `substations`; either failure is a [`GridError::UnresolvedNode`].
pub fn aggregate_to_substations(
    network: &Network,
    busmap: &Busmap,
    substations: &SubstationTable,
    options: &AggregationOptions,
    policy: &AggregationPolicy,
) -> GridResult<Network> {
    info!("Aggregating buses to substation level...");
    let stage = "composed busmap";

    let mut members: BTreeMap<&BusId, Vec<&Bus>> = BTreeMap::new();
    for bus in network.buses() {
        members
            .entry(busmap.resolve(&bus.id, stage)?)
            .or_default()
            .push(bus);
    }

    let mut out = Network::new();
    for (target, group) in &members {
        let sub = substations
            .get(*target)
            .ok_or_else(|| GridError::unresolved(target.as_str(), "substation table"))?;
        let zone = if options.use_ba_zones {
            majority_zone(group)
        } else {
            Zone::new(options.default_zone.as_str())
        };
        out.add_bus(Bus {
            id: (*target).clone(),
            x: sub.lon,
            y: sub.lat,
            v_nom: group
                .iter()
                .map(|b| b.v_nom)
                .fold(Kilovolts(0.0), Kilovolts::max),
            zone,
            substation_lv: true,
            substation_off: true,
            interconnect: sub.interconnect.clone(),
        })?;
    }

    let remap = |id: &BusId| busmap.resolve(id, stage).cloned();

    // Lines: group by unordered endpoint pair
    let mut corridors: BTreeMap<(BusId, BusId), Vec<Line>> = BTreeMap::new();
    let mut self_loops = 0usize;
    for line in network.lines() {
        let mut line = line.clone();
        line.bus0 = remap(&line.bus0)?;
        line.bus1 = remap(&line.bus1)?;
        if line.bus0 == line.bus1 {
            self_loops += 1;
            continue;
        }
        let key = if line.bus0 <= line.bus1 {
            (line.bus0.clone(), line.bus1.clone())
        } else {
            (line.bus1.clone(), line.bus0.clone())
        };
        corridors.entry(key).or_default().push(line);
    }
    let corridor_count = corridors.len();
    for line in corridors.into_values().filter_map(merge_parallel) {
        out.add_line(line)?;
    }

    for edge in network.graph.edge_weights() {
        match edge {
            Edge::Line(_) => {}
            Edge::Transformer(tx) => {
                let mut tx = tx.clone();
                tx.bus0 = remap(&tx.bus0)?;
                tx.bus1 = remap(&tx.bus1)?;
                if tx.bus0 != tx.bus1 {
                    out.add_transformer(tx)?;
                }
            }
            Edge::Link(link) => {
                let mut link = link.clone();
                link.bus0 = remap(&link.bus0)?;
                link.bus1 = remap(&link.bus1)?;
                if link.bus0 != link.bus1 {
                    out.add_link(link)?;
                }
            }
        }
    }

    let generators = aggregate_one_ports(network.generators().cloned(), busmap, policy)?;
    let loads = aggregate_one_ports(network.loads().cloned(), busmap, policy)?;
    let storage = aggregate_one_ports(network.storage_units().cloned(), busmap, policy)?;
    for node in generators.into_iter().chain(loads).chain(storage) {
        out.add_one_port(node)?;
    }

    debug!("Dropped {} self-loop lines", self_loops);
    info!(
        "Aggregated {} buses onto {} substations, {} lines into {} corridors",
        network.buses().count(),
        members.len(),
        network.lines().count(),
        corridor_count
    );
    Ok(out)
}

/// Combine lines between the same pair of buses into one equivalent line.
///
/// Ratings and circuit counts add up, impedances combine in parallel, and the
/// result keeps the lowest member id and that member's orientation. The line
/// type survives only when every member shares it. An empty group yields
/// `None`.
pub fn merge_parallel(mut group: Vec<Line>) -> Option<Line> {
    group.sort_by(|a, b| natural_cmp(a.id.as_str(), b.id.as_str()));
    let mut merged = group.first()?.clone();
    if group.len() == 1 {
        return Some(merged);
    }
    merged.s_nom = group.iter().map(|l| l.s_nom).sum::<MegavoltAmperes>();
    merged.num_parallel = group.iter().map(|l| l.num_parallel).sum();
    merged.r = Ohms::parallel(group.iter().map(|l| l.r));
    merged.x = Ohms::parallel(group.iter().map(|l| l.x));
    merged.v_nom = group
        .iter()
        .map(|l| l.v_nom)
        .fold(Kilovolts(0.0), Kilovolts::max);
    merged.length = group.iter().map(|l| l.length).sum::<Kilometers>() / group.len() as f64;
    if group.iter().any(|l| l.line_type != merged.line_type) {
        merged.line_type = None;
    }
    Some(merged)
}

fn majority_zone(group: &[&Bus]) -> Zone {
    let mut counts: BTreeMap<&Zone, usize> = BTreeMap::new();
    for bus in group {
        *counts.entry(&bus.zone).or_default() += 1;
    }
    let mut best: Option<(&Zone, usize)> = None;
    for (zone, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((zone, count));
        }
    }
    best.map(|(zone, _)| zone.clone())
        .unwrap_or_else(|| Zone::new(""))
}

/// Merge components sharing a target bus and carrier.
pub fn aggregate_one_ports<T: OnePort>(
    items: impl IntoIterator<Item = T>,
    busmap: &Busmap,
    policy: &AggregationPolicy,
) -> GridResult<Vec<Node>> {
    let rules: Vec<AggregationRule> = T::ATTRIBUTES
        .iter()
        .map(|attr| {
            T::rules(policy).get(*attr).copied().ok_or_else(|| {
                GridError::Config(format!("no aggregation rule for {}.{}", T::KIND, attr))
            })
        })
        .collect::<GridResult<_>>()?;

    let mut groups: BTreeMap<(BusId, String), Vec<T>> = BTreeMap::new();
    for item in items {
        let target = busmap.resolve(item.bus(), "composed busmap")?.clone();
        groups
            .entry((target, item.carrier().to_string()))
            .or_default()
            .push(item);
    }

    let mut merged_nodes = Vec::with_capacity(groups.len());
    for ((bus, carrier), group) in groups {
        let Some(first) = group.first() else { continue };
        let rows: Vec<Vec<f64>> = group.iter().map(T::values).collect();
        let weights: Vec<f64> = group.iter().map(T::weight).collect();

        let mut merged = first.clone();
        for (k, (slot, rule)) in merged.values_mut().into_iter().zip(&rules).enumerate() {
            let column: Vec<f64> = rows.iter().map(|row| row[k]).collect();
            *slot = rule.apply(&column, &weights);
        }
        let id = if carrier.is_empty() {
            bus.to_string()
        } else {
            format!("{bus} {carrier}")
        };
        merged.relocate(bus, id);
        merged_nodes.push(merged.into_node());
    }
    Ok(merged_nodes)
}
