//! Mapping every line onto a single voltage layer.
//!
//! A line at voltage `v` carries the same power as `(v / level)²` circuits of the
//! standard type at `level`, so harmonised lines keep their transfer capacity as
//! a fractional `num_parallel`.

use gridreduce_core::{
    Edge, GridError, GridResult, Kiloamperes, Kilovolts, MegavoltAmperes, Network, Node,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Nominal current of each standard line type, by type name.
pub type LineTypeCatalog = BTreeMap<String, Kiloamperes>;

const VOLTAGE_TOLERANCE: f64 = 1e-6;

/// Return a copy of `network` with every bus and line at `level`.
///
/// Lines already at `level` are unchanged. Other lines are rescaled and take
/// the single line type used at `level`; more than one type at `level` is a
/// [`GridError::Validation`]. The rating of a rescaled line is recomputed from
/// the catalog's nominal current when its type is listed there.
pub fn harmonize_voltage(
    network: &Network,
    level: Kilovolts,
    catalog: &LineTypeCatalog,
) -> GridResult<Network> {
    if level.value() <= 0.0 {
        return Err(GridError::Validation(format!(
            "voltage level must be positive, got {}",
            level
        )));
    }

    let types_at_level: BTreeSet<&str> = network
        .lines()
        .filter(|l| at_level(l.v_nom, level))
        .filter_map(|l| l.line_type.as_deref())
        .collect();
    let line_type = match types_at_level.len() {
        0 => None,
        1 => types_at_level.iter().next().map(|t| t.to_string()),
        _ => {
            return Err(GridError::Validation(format!(
                "expected one line type at {:.0} kV, found {}: {}",
                level.value(),
                types_at_level.len(),
                types_at_level.iter().copied().collect::<Vec<_>>().join(", ")
            )))
        }
    };
    info!(
        "Mapping all lines onto the {:.0} kV layer (line type {})",
        level.value(),
        line_type.as_deref().unwrap_or("unchanged")
    );

    let mut out = network.clone();
    for node in out.graph.node_weights_mut() {
        if let Node::Bus(bus) = node {
            bus.v_nom = level;
        }
    }

    let mut rescaled = 0usize;
    for edge in out.graph.edge_weights_mut() {
        let Edge::Line(line) = edge else { continue };
        if at_level(line.v_nom, level) {
            continue;
        }
        if line.v_nom.value() <= 0.0 {
            debug!("Line {} has no nominal voltage; assuming {}", line.id, level);
            line.v_nom = level;
            continue;
        }
        let ratio2 = (line.v_nom / level).powi(2);
        line.num_parallel *= ratio2;
        line.v_nom = level;
        if line_type.is_some() {
            line.line_type = line_type.clone();
        }
        line.s_nom = match line.line_type.as_ref().and_then(|t| catalog.get(t)) {
            Some(&i_nom) => MegavoltAmperes::three_phase(i_nom, level) * line.num_parallel,
            None => line.s_nom * ratio2,
        };
        rescaled += 1;
    }
    debug!("Rescaled {} lines", rescaled);
    Ok(out)
}

fn at_level(v_nom: Kilovolts, level: Kilovolts) -> bool {
    (v_nom - level).value().abs() < VOLTAGE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridreduce_core::{Bus, Line};

    const TYPE_345: &str = "Al/St 240/40 4-bundle 345.0";

    fn mixed_network() -> Network {
        let mut network = Network::new();
        for (id, kv) in [("1", 345.0), ("2", 345.0), ("3", 230.0)] {
            network
                .add_bus(Bus::new(id, 0.0, 0.0).with_v_nom(kv))
                .unwrap();
        }
        network
            .add_line(
                Line::new("HV", "1", "2")
                    .with_v_nom(345.0)
                    .with_s_nom(1000.0)
                    .with_line_type(TYPE_345),
            )
            .unwrap();
        network
            .add_line(Line::new("LV", "2", "3").with_v_nom(230.0).with_s_nom(90.0))
            .unwrap();
        network
    }

    fn line<'a>(network: &'a Network, id: &str) -> &'a Line {
        network.lines().find(|l| l.id.as_str() == id).unwrap()
    }

    #[test]
    fn test_lines_rescaled_by_voltage_ratio() {
        let network = mixed_network();
        let out = harmonize_voltage(&network, Kilovolts(345.0), &LineTypeCatalog::new()).unwrap();

        assert!(out.buses().all(|b| b.v_nom == Kilovolts(345.0)));

        let hv = line(&out, "HV");
        assert_eq!(hv, line(&network, "HV"));

        let lv = line(&out, "LV");
        let ratio2 = (230.0_f64 / 345.0).powi(2);
        assert!((lv.num_parallel - ratio2).abs() < 1e-12);
        assert!((lv.s_nom.value() - 90.0 * ratio2).abs() < 1e-9);
        assert_eq!(lv.v_nom, Kilovolts(345.0));
        assert_eq!(lv.line_type.as_deref(), Some(TYPE_345));

        // The input is untouched
        assert_eq!(line(&network, "LV").v_nom, Kilovolts(230.0));
    }

    #[test]
    fn test_rating_from_catalog_current() {
        let network = mixed_network();
        let catalog: LineTypeCatalog = [(TYPE_345.to_string(), Kiloamperes(2.58))]
            .into_iter()
            .collect();
        let out = harmonize_voltage(&network, Kilovolts(345.0), &catalog).unwrap();

        let lv = line(&out, "LV");
        let expected = 3f64.sqrt() * 2.58 * 345.0 * (230.0_f64 / 345.0).powi(2);
        assert!((lv.s_nom.value() - expected).abs() < 1e-9);
        // Lines already at the level keep their rating
        assert_eq!(line(&out, "HV").s_nom, MegavoltAmperes(1000.0));
    }

    #[test]
    fn test_ambiguous_line_type_rejected() {
        let mut network = mixed_network();
        network
            .add_line(
                Line::new("HV2", "1", "2")
                    .with_v_nom(345.0)
                    .with_line_type("other"),
            )
            .unwrap();
        let err = harmonize_voltage(&network, Kilovolts(345.0), &LineTypeCatalog::new())
            .unwrap_err();
        assert!(matches!(err, GridError::Validation(ref msg) if msg.contains("found 2")));
    }

    #[test]
    fn test_non_positive_level_rejected() {
        let catalog = LineTypeCatalog::new();
        assert!(harmonize_voltage(&mixed_network(), Kilovolts(0.0), &catalog).is_err());
    }
}
