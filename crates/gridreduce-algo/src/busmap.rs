//! Busmaps: total maps from original bus ids to target ids.
//!
//! Simplification resolves buses in two stages:
//!
//! 1. **Transformer contraction** ([`contract_transformers`]): buses joined by any
//!    chain of transformers form one physical site, which collapses onto a single
//!    terminal bus. Sites are found with a union-find over the transformer
//!    endpoints, so chains and hubs of any depth resolve in one pass.
//! 2. **Substation clustering**: a site-to-substation table, loaded as a
//!    [`Busmap`] by the I/O layer.
//!
//! [`Busmap::compose`] chains the two into one map that resolves every original
//! bus to its substation in a single lookup.

use gridreduce_core::{BusId, Edge, GridError, GridResult, Network, Node};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

/// A total map from original ids to target ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Busmap {
    map: BTreeMap<BusId, BusId>,
}

impl Busmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I: IntoIterator<Item = (BusId, BusId)>>(pairs: I) -> Self {
        Self {
            map: pairs.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, from: BusId, to: BusId) -> Option<BusId> {
        self.map.insert(from, to)
    }

    pub fn get(&self, id: &BusId) -> Option<&BusId> {
        self.map.get(id)
    }

    /// Look up an id, failing with [`GridError::UnresolvedNode`] if it is absent.
    pub fn resolve(&self, id: &BusId, stage: &str) -> GridResult<&BusId> {
        self.map
            .get(id)
            .ok_or_else(|| GridError::unresolved(id.as_str(), stage))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&BusId, &BusId)> {
        self.map.iter()
    }

    /// Distinct target ids.
    pub fn targets(&self) -> Vec<&BusId> {
        let mut targets: Vec<&BusId> = self.map.values().collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Whether every target resolves in one hop: no target is also a key that
    /// maps somewhere else.
    pub fn is_closed(&self) -> bool {
        self.map
            .values()
            .all(|target| match self.map.get(target) {
                Some(next) => next == target,
                None => true,
            })
    }

    /// Apply `self`, then `next`.
    ///
    /// `self` must be closed; `next` is applied in a single hop, so its targets
    /// (substation ids) may coincide with bus ids. Every key of `self` appears in
    /// the result. A target of `self` that `next` does not know is an
    /// [`GridError::UnresolvedNode`] error naming it.
    pub fn compose(&self, next: &Busmap) -> GridResult<Busmap> {
        if !self.is_closed() {
            return Err(GridError::Validation(
                "busmap is not closed: a target id is also a key mapping elsewhere".into(),
            ));
        }
        let mut map = BTreeMap::new();
        for (from, mid) in &self.map {
            let to = next.resolve(mid, "site-to-substation map")?;
            map.insert(from.clone(), to.clone());
        }
        Ok(Busmap { map })
    }
}

/// Collapse every transformer-connected site onto one terminal bus.
///
/// The terminal is the lowest-id member of `primaries` in the site if there is
/// one, otherwise the lowest id in the site (numeric ids compare numerically).
/// Buses without transformers map to themselves.
pub fn contract_transformers(network: &Network, primaries: &HashSet<BusId>) -> Busmap {
    let ids: Vec<&BusId> = network.buses().map(|b| &b.id).collect();
    let index: HashMap<&BusId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut sites = UnionFind::<usize>::new(ids.len());
    for tx in network.transformers() {
        if let (Some(&a), Some(&b)) = (index.get(&tx.bus0), index.get(&tx.bus1)) {
            sites.union(a, b);
        }
    }

    let prefer = |candidate: usize, current: usize| {
        let (c, t) = (ids[candidate], ids[current]);
        match (primaries.contains(c), primaries.contains(t)) {
            (true, false) => true,
            (false, true) => false,
            _ => c.natural_cmp(t).is_lt(),
        }
    };

    let mut terminal: HashMap<usize, usize> = HashMap::new();
    for i in 0..ids.len() {
        let root = sites.find(i);
        terminal
            .entry(root)
            .and_modify(|t| {
                if prefer(i, *t) {
                    *t = i;
                }
            })
            .or_insert(i);
    }

    let busmap = Busmap::from_pairs(
        (0..ids.len()).map(|i| (ids[i].clone(), ids[terminal[&sites.find(i)]].clone())),
    );
    info!(
        "Contracted {} transformers: {} buses onto {} terminals",
        network.transformers().count(),
        busmap.len(),
        terminal.len()
    );
    busmap
}

/// Drop transformers and non-terminal buses, rewriting every reference through
/// the stage-1 busmap.
///
/// Lines inside a site become self-loops; they are dropped at aggregation.
pub fn remove_transformers(network: &Network, stage1: &Busmap) -> GridResult<Network> {
    let stage = "transformer contraction map";
    let mut out = Network::new();
    for bus in network.buses() {
        if stage1.resolve(&bus.id, stage)? == &bus.id {
            out.add_bus(bus.clone())?;
        }
    }
    for node in network.graph.node_weights() {
        let mut node = node.clone();
        match &mut node {
            Node::Bus(_) => continue,
            Node::Load(l) => l.bus = stage1.resolve(&l.bus, stage)?.clone(),
            Node::Generator(g) => g.bus = stage1.resolve(&g.bus, stage)?.clone(),
            Node::StorageUnit(s) => s.bus = stage1.resolve(&s.bus, stage)?.clone(),
        }
        out.add_one_port(node)?;
    }
    for edge in network.graph.edge_weights() {
        match edge {
            Edge::Transformer(_) => {}
            Edge::Line(line) => {
                let mut line = line.clone();
                line.bus0 = stage1.resolve(&line.bus0, stage)?.clone();
                line.bus1 = stage1.resolve(&line.bus1, stage)?.clone();
                out.add_line(line)?;
            }
            Edge::Link(link) => {
                let mut link = link.clone();
                link.bus0 = stage1.resolve(&link.bus0, stage)?.clone();
                link.bus1 = stage1.resolve(&link.bus1, stage)?.clone();
                out.add_link(link)?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridreduce_core::{Bus, Line, Load, Transformer};

    fn id(s: &str) -> BusId {
        BusId::new(s)
    }

    fn chain_network() -> Network {
        let mut network = Network::new();
        for name in ["A", "B", "C", "D"] {
            network.add_bus(Bus::new(name, 0.0, 0.0)).unwrap();
        }
        network
            .add_transformer(Transformer::new("T1", "A", "B"))
            .unwrap();
        network
            .add_transformer(Transformer::new("T2", "B", "C"))
            .unwrap();
        network
    }

    #[test]
    fn test_chain_resolves_to_primary() {
        let network = chain_network();
        let primaries: HashSet<BusId> = [id("C")].into_iter().collect();
        let stage1 = contract_transformers(&network, &primaries);

        assert_eq!(stage1.get(&id("A")), Some(&id("C")));
        assert_eq!(stage1.get(&id("B")), Some(&id("C")));
        assert_eq!(stage1.get(&id("C")), Some(&id("C")));
        // No transformer: identity
        assert_eq!(stage1.get(&id("D")), Some(&id("D")));
        assert!(stage1.is_closed());
    }

    #[test]
    fn test_chain_without_primary_uses_lowest_id() {
        let stage1 = contract_transformers(&chain_network(), &HashSet::new());
        assert_eq!(stage1.targets(), vec![&id("A"), &id("D")]);
    }

    #[test]
    fn test_numeric_ids_compare_numerically() {
        let mut network = Network::new();
        for name in ["10", "9", "100"] {
            network.add_bus(Bus::new(name, 0.0, 0.0)).unwrap();
        }
        network
            .add_transformer(Transformer::new("T1", "10", "9"))
            .unwrap();
        network
            .add_transformer(Transformer::new("T2", "100", "10"))
            .unwrap();
        let stage1 = contract_transformers(&network, &HashSet::new());
        assert_eq!(stage1.targets(), vec![&id("9")]);
    }

    #[test]
    fn test_hub_resolves_transitively() {
        let mut network = Network::new();
        for name in ["1", "2", "3", "4"] {
            network.add_bus(Bus::new(name, 0.0, 0.0)).unwrap();
        }
        for (t, from) in [("T2", "2"), ("T3", "3"), ("T4", "4")] {
            network
                .add_transformer(Transformer::new(t, from, "1"))
                .unwrap();
        }
        let stage1 = contract_transformers(&network, &HashSet::new());
        assert!(stage1.iter().all(|(_, to)| to == &id("1")));
    }

    #[test]
    fn test_compose_chain_with_substations() {
        let primaries: HashSet<BusId> = [id("C")].into_iter().collect();
        let network = chain_network();
        let stage1 = contract_transformers(&network, &primaries);
        let stage2 = Busmap::from_pairs([(id("C"), id("SUB1")), (id("D"), id("SUB2"))]);

        let composed = stage1.compose(&stage2).unwrap();
        assert_eq!(composed.len(), 4);
        for bus in ["A", "B", "C"] {
            assert_eq!(composed.get(&id(bus)), Some(&id("SUB1")));
        }
        assert_eq!(composed.get(&id("D")), Some(&id("SUB2")));
    }

    #[test]
    fn test_compose_missing_stage2_entry_names_id() {
        let stage1 = Busmap::from_pairs([(id("A"), id("C")), (id("C"), id("C"))]);
        let stage2 = Busmap::from_pairs([(id("A"), id("SUB1"))]);
        let err = stage1.compose(&stage2).unwrap_err();
        assert!(matches!(err, GridError::UnresolvedNode { ref id, .. } if id == "C"));
    }

    #[test]
    fn test_compose_is_idempotent_on_terminals() {
        let stage1 = contract_transformers(&chain_network(), &HashSet::new());
        assert_eq!(stage1.compose(&stage1).unwrap(), stage1);
    }

    #[test]
    fn test_open_map_detected() {
        let open = Busmap::from_pairs([(id("A"), id("B")), (id("B"), id("C"))]);
        assert!(!open.is_closed());
        let stage2 = Busmap::from_pairs([(id("B"), id("S")), (id("C"), id("S"))]);
        assert!(matches!(open.compose(&stage2), Err(GridError::Validation(_))));
    }

    #[test]
    fn test_substation_ids_may_reuse_bus_ids() {
        let stage1 = Busmap::from_pairs([(id("1"), id("1")), (id("2"), id("2"))]);
        let stage2 = Busmap::from_pairs([(id("1"), id("2")), (id("2"), id("5"))]);
        let composed = stage1.compose(&stage2).unwrap();
        assert_eq!(composed.get(&id("1")), Some(&id("2")));
        assert_eq!(composed.get(&id("2")), Some(&id("5")));
    }

    #[test]
    fn test_remove_transformers_rewrites_references() {
        let mut network = chain_network();
        network
            .add_line(Line::new("L1", "A", "D").with_s_nom(50.0))
            .unwrap();
        network.add_load(Load::new("load-b", "B")).unwrap();

        let primaries: HashSet<BusId> = [id("C")].into_iter().collect();
        let stage1 = contract_transformers(&network, &primaries);
        let reduced = remove_transformers(&network, &stage1).unwrap();

        let buses: Vec<&str> = reduced.buses().map(|b| b.id.as_str()).collect();
        assert_eq!(buses, vec!["C", "D"]);
        assert_eq!(reduced.transformers().count(), 0);
        let line = reduced.lines().next().unwrap();
        assert_eq!((line.bus0.as_str(), line.bus1.as_str()), ("C", "D"));
        assert_eq!(reduced.loads().next().unwrap().bus, id("C"));
    }
}
