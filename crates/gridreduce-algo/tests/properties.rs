//! End-to-end properties of the partitioning and reduction pipeline.

use geo::{polygon, Area, BooleanOps, MultiPolygon};
use gridreduce_algo::{
    voronoi_partition, Busmap, BusRegions, Outlines, RegionOptions, Simplification,
    SimplifyOptions,
};
use gridreduce_core::{
    Bus, BusId, Generator, Line, Load, Network, Substation, SubstationTable, Transformer,
};

fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x0, y: y0),
        (x: x0 + size, y: y0),
        (x: x0 + size, y: y0 + size),
        (x: x0, y: y0 + size),
    ]])
}

/// Deterministic scatter of `n` points in [0, 10)².
fn scatter(n: usize) -> Vec<geo::Coord<f64>> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            geo::Coord {
                x: (t * 3.7).rem_euclid(10.0),
                y: (t * 6.1 + 0.3).rem_euclid(10.0),
            }
        })
        .collect()
}

#[test]
fn test_cells_tile_the_outline() {
    let outline = square(0.0, 0.0, 10.0);
    let cells = voronoi_partition(&scatter(25), &outline).unwrap();
    assert_eq!(cells.len(), 25);

    let polygons: Vec<MultiPolygon<f64>> = cells.iter().map(|c| c.to_multi_polygon()).collect();
    let total: f64 = polygons.iter().map(|p| p.unsigned_area()).sum();
    assert!((total - 100.0).abs() < 1e-6, "cells cover {total}, expected 100");

    for (i, a) in polygons.iter().enumerate() {
        for b in &polygons[i + 1..] {
            let overlap = a.intersection(b).unsigned_area();
            assert!(overlap < 1e-6, "overlap {overlap}");
        }
    }
}

fn grid_network() -> Network {
    let mut network = Network::new();
    for (i, coord) in scatter(12).into_iter().enumerate() {
        network
            .add_bus(
                Bus::new(i.to_string(), coord.x, coord.y)
                    .with_v_nom(if i % 3 == 0 { 345.0 } else { 230.0 })
                    .with_zone("US"),
            )
            .unwrap();
    }
    // Sites of three buses: {0,1,2}, {3,4,5}, ...
    for site in 0..4 {
        let base = site * 3;
        for offset in 1..3 {
            network
                .add_transformer(Transformer::new(
                    format!("T{}", base + offset),
                    (base + offset).to_string(),
                    base.to_string(),
                ))
                .unwrap();
        }
    }
    for i in 0..11 {
        network
            .add_line(
                Line::new(format!("L{i}"), i.to_string(), (i + 1).to_string())
                    .with_s_nom(100.0 + i as f64)
                    .with_impedance(1.0, 10.0)
                    .with_v_nom(if i % 3 == 0 { 345.0 } else { 230.0 }),
            )
            .unwrap();
    }
    for i in 0..12 {
        network
            .add_load(Load::new(format!("D{i}"), i.to_string()).with_p_set(10.0))
            .unwrap();
        network
            .add_generator(
                Generator::new(format!("G{i}"), i.to_string(), "gas").with_p_nom(5.0 * i as f64),
            )
            .unwrap();
    }
    network
}

/// Sites 0 and 3 share SUB-A; sites 6 and 9 share SUB-B.
fn substation_inputs() -> (Busmap, SubstationTable) {
    let bus2sub = Busmap::from_pairs(
        [("0", "SUB-A"), ("3", "SUB-A"), ("6", "SUB-B"), ("9", "SUB-B")]
            .into_iter()
            .map(|(b, s)| (BusId::new(b), BusId::new(s))),
    );
    let substations = [("SUB-A", -100.0), ("SUB-B", -101.0)]
        .into_iter()
        .map(|(s, lon)| {
            (
                BusId::new(s),
                Substation {
                    sub_id: BusId::new(s),
                    lon,
                    lat: 40.0,
                    interconnect: Some("eastern".into()),
                },
            )
        })
        .collect();
    (bus2sub, substations)
}

fn simplify(network: &Network) -> gridreduce_algo::SimplifiedNetwork {
    let (bus2sub, substations) = substation_inputs();
    Simplification::new(network, &bus2sub, &substations)
        .with_options(SimplifyOptions {
            voltage_level: Some(345.0),
            ..SimplifyOptions::default()
        })
        .run()
        .unwrap()
}

#[test]
fn test_reduction_conserves_sums() {
    let network = grid_network();
    let result = simplify(&network);
    let out = &result.network;

    assert_eq!(out.stats().num_buses, 2);
    assert_eq!(out.transformers().count(), 0);
    assert_eq!(result.busmap.len(), 12);
    assert!(result.busmap.is_closed());

    let load_before: f64 = network.loads().map(|l| l.p_set.value()).sum();
    let load_after: f64 = out.loads().map(|l| l.p_set.value()).sum();
    assert!((load_before - load_after).abs() < 1e-9);

    let cap_before: f64 = network.generators().map(|g| g.p_nom.value()).sum();
    let cap_after: f64 = out.generators().map(|g| g.p_nom.value()).sum();
    assert!((cap_before - cap_after).abs() < 1e-9);

    // Every line left joins the two substations
    let lines: Vec<&Line> = out.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_ne!(lines[0].bus0, lines[0].bus1);
}

#[test]
fn test_reduction_is_deterministic() {
    let network = grid_network();
    let first = simplify(&network);
    let second = simplify(&network);

    let lines = |n: &Network| n.lines().cloned().collect::<Vec<_>>();
    let gens = |n: &Network| n.generators().cloned().collect::<Vec<_>>();
    assert_eq!(lines(&first.network), lines(&second.network));
    assert_eq!(gens(&first.network), gens(&second.network));
    assert_eq!(first.busmap, second.busmap);
}

#[test]
fn test_regions_then_reduction() {
    let network = grid_network();
    let onshore: Outlines = [("US".to_string(), square(0.0, 0.0, 10.0))]
        .into_iter()
        .collect();
    let regions = BusRegions::new(&network, &onshore)
        .with_options(RegionOptions {
            zones: vec!["US".into()],
            ..RegionOptions::default()
        })
        .run()
        .unwrap();
    assert_eq!(regions.regions.onshore.len(), 12);
    let total: f64 = regions.regions.onshore.iter().map(|r| r.area).sum();
    assert!((total - 100.0).abs() < 1e-6);

    let result = simplify(&regions.network);
    assert_eq!(result.network.stats().num_buses, 2);
}
