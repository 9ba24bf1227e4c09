//! Great-circle line and link lengths.

use geo::{Distance, Haversine, Point};
use gridreduce_core::{Bus, BusId, Edge, GridError, GridResult, Kilometers, Network};
use std::collections::HashMap;
use tracing::info;

/// Routing overhead applied to straight-line distances.
pub const DEFAULT_LINE_LENGTH_FACTOR: f64 = 1.25;

/// Great-circle distance between two bus coordinates (lon/lat degrees).
pub fn haversine_km(a: &Bus, b: &Bus) -> Kilometers {
    let metres = Haversine.distance(Point::new(a.x, a.y), Point::new(b.x, b.y));
    Kilometers(metres / 1000.0)
}

/// Return a copy of `network` with every line and link length set to the
/// great-circle distance between its endpoints times `factor`.
pub fn assign_lengths(network: &Network, factor: f64) -> GridResult<Network> {
    info!("Assigning line lengths using the haversine distance (factor {})", factor);

    let buses: HashMap<&BusId, &Bus> = network.buses().map(|b| (&b.id, b)).collect();
    let endpoint = |id: &BusId, edge: &Edge| {
        buses.get(id).copied().ok_or_else(|| {
            GridError::Network(format!(
                "{} '{}' references unknown bus '{}'",
                edge.kind(),
                edge.id(),
                id
            ))
        })
    };

    let mut lengths = Vec::with_capacity(network.graph.edge_count());
    for edge in network.graph.edge_weights() {
        let (bus0, bus1) = edge.endpoints();
        let length = haversine_km(endpoint(bus0, edge)?, endpoint(bus1, edge)?) * factor;
        lengths.push(length);
    }

    let mut out = network.clone();
    for (edge, length) in out.graph.edge_weights_mut().zip(lengths) {
        match edge {
            Edge::Line(line) => line.length = length,
            Edge::Link(link) => link.length = length,
            Edge::Transformer(_) => {}
        }
    }
    Ok(out)
}
