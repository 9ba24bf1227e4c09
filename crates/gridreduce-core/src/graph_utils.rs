use crate::{BusId, Network, Node};
use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};

/// Summary statistics over the bus graph (one-port nodes are not counted).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub bus_count: usize,
    pub edge_count: usize,
    pub islands: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
}

/// One connected set of buses.
#[derive(Debug, Clone)]
pub struct Island {
    pub island_id: usize,
    pub buses: Vec<BusId>,
}

/// Degree and connectivity summary of the bus graph.
pub fn graph_stats(network: &Network) -> GraphStats {
    let bus_nodes: Vec<NodeIndex> = bus_indices(network).collect();
    let degrees: Vec<usize> = bus_nodes
        .iter()
        .map(|&idx| network.graph.edges(idx).count())
        .collect();
    let bus_count = bus_nodes.len();
    let avg_degree = if bus_count == 0 {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / bus_count as f64
    };
    GraphStats {
        bus_count,
        edge_count: network.graph.edge_count(),
        islands: find_islands(network).len(),
        min_degree: degrees.iter().copied().min().unwrap_or(0),
        avg_degree,
        max_degree: degrees.iter().copied().max().unwrap_or(0),
    }
}

/// Labels connected components of the bus graph by breadth-first search.
///
/// Islands are numbered in order of their first bus in the graph, and the bus
/// lists are sorted, so the result is stable for identical inputs.
pub fn find_islands(network: &Network) -> Vec<Island> {
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    for start in bus_indices(network) {
        if visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            if let Node::Bus(bus) = &network.graph[node] {
                members.push(bus.id.clone());
            }
            for neighbor in network.graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort();
        islands.push(Island {
            island_id: islands.len(),
            buses: members,
        });
    }
    islands
}

fn bus_indices(network: &Network) -> impl Iterator<Item = NodeIndex> + '_ {
    network
        .graph
        .node_indices()
        .filter(|&idx| matches!(network.graph[idx], Node::Bus(_)))
}
