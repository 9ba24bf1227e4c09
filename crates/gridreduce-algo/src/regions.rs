//! Bus region assembly.
//!
//! Every bus that can host an onshore (or offshore) connection receives the
//! Voronoi cell of its coordinate, clipped to the outline of its zone. Two modes
//! are supported:
//!
//! - **Country**: buses are grouped by their existing `zone` label and
//!   partitioned against the country outline. Offshore buses of the same country
//!   are partitioned against the country's offshore outline, if one exists.
//! - **Authority**: buses are assigned to the first balancing-authority outline
//!   containing them and relabelled with that authority. Offshore buses close to
//!   an offshore outline are relabelled with the outline name. Buses left without
//!   a zone are removed from the network together with everything attached to
//!   them.
//!
//! Coverage gaps (a zone without an outline, a zone that selects no bus) do not
//! abort the run; they are recorded in [`Diagnostics`]. Only a run in which
//! every configured zone lacks an outline fails, with [`GridError::MissingData`].

use crate::geometry::{voronoi_partition, Clipped};
use geo::{Coord, Distance, Euclidean, Intersects, MultiPolygon, Point};
use gridreduce_core::{Bus, BusId, Diagnostics, GridError, GridResult, Network, Node, Zone};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Named outlines, iterated in name order.
pub type Outlines = BTreeMap<String, MultiPolygon<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionMode {
    #[default]
    Country,
    Authority,
}

/// Options for [`assemble_regions`]; the `[regions]` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOptions {
    #[serde(default)]
    pub mode: RegionMode,
    /// Countries or balancing authorities, in processing order
    #[serde(default)]
    pub zones: Vec<String>,
    /// Offshore cells with at most this area are dropped
    #[serde(default = "default_min_offshore_area")]
    pub min_offshore_area: f64,
    /// Distance within which an offshore bus is attached to an offshore outline
    #[serde(default = "default_offshore_buffer")]
    pub offshore_buffer: f64,
    /// Bus id -> zone, applied after all other assignment
    #[serde(default)]
    pub zone_overrides: BTreeMap<String, String>,
}

fn default_min_offshore_area() -> f64 {
    1e-2
}

fn default_offshore_buffer() -> f64 {
    0.2
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            mode: RegionMode::default(),
            zones: Vec::new(),
            min_offshore_area: default_min_offshore_area(),
            offshore_buffer: default_offshore_buffer(),
            zone_overrides: BTreeMap::new(),
        }
    }
}

/// The clipped Voronoi cell of one bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Owning bus
    pub name: BusId,
    pub x: f64,
    pub y: f64,
    pub zone: Zone,
    /// Possibly empty
    pub geometry: MultiPolygon<f64>,
    pub area: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    pub onshore: Vec<Region>,
    pub offshore: Vec<Region>,
}

/// Zone of every bus that was assigned one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneMap {
    zones: BTreeMap<BusId, Zone>,
}

impl ZoneMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign (or reassign) a bus, returning its previous zone.
    pub fn assign(&mut self, bus: BusId, zone: Zone) -> Option<Zone> {
        self.zones.insert(bus, zone)
    }

    pub fn zone_of(&self, bus: &BusId) -> Option<&Zone> {
        self.zones.get(bus)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BusId, &Zone)> {
        self.zones.iter()
    }
}

/// Output of [`assemble_regions`].
#[derive(Debug)]
pub struct RegionOutcome {
    /// Input network with zones reassigned and unassigned buses pruned
    pub network: Network,
    pub regions: RegionSet,
    pub zones: ZoneMap,
    pub diagnostics: Diagnostics,
}

/// Build onshore and offshore bus regions.
pub fn assemble_regions(
    network: &Network,
    onshore: &Outlines,
    offshore: &Outlines,
    options: &RegionOptions,
) -> GridResult<RegionOutcome> {
    info!(
        "Building bus regions for {} zones ({:?} mode)",
        options.zones.len(),
        options.mode
    );
    match options.mode {
        RegionMode::Country => by_country(network, onshore, offshore, options),
        RegionMode::Authority => by_authority(network, onshore, offshore, options),
    }
}

struct ZoneRegions {
    zone: String,
    outline_found: bool,
    onshore: Vec<Region>,
    offshore: Vec<Region>,
}

fn by_country(
    network: &Network,
    onshore: &Outlines,
    offshore: &Outlines,
    options: &RegionOptions,
) -> GridResult<RegionOutcome> {
    let buses: Vec<&Bus> = network.buses().collect();

    let per_zone: Vec<GridResult<ZoneRegions>> = options
        .zones
        .par_iter()
        .map(|country| {
            let Some(outline) = onshore.get(country) else {
                return Ok(ZoneRegions {
                    zone: country.clone(),
                    outline_found: false,
                    onshore: Vec::new(),
                    offshore: Vec::new(),
                });
            };
            let on: Vec<&Bus> = buses
                .iter()
                .copied()
                .filter(|b| b.zone.as_str() == country.as_str() && b.substation_lv)
                .collect();
            let onshore_regions = partition(&on, outline, country)?;

            let offshore_regions = match offshore.get(country) {
                Some(off_outline) => {
                    let off: Vec<&Bus> = buses
                        .iter()
                        .copied()
                        .filter(|b| b.zone.as_str() == country.as_str() && b.substation_off)
                        .collect();
                    retain_offshore(
                        partition(&off, off_outline, country)?,
                        options.min_offshore_area,
                    )
                }
                None => Vec::new(),
            };

            Ok(ZoneRegions {
                zone: country.clone(),
                outline_found: true,
                onshore: onshore_regions,
                offshore: offshore_regions,
            })
        })
        .collect();

    let mut diagnostics = Diagnostics::new();
    let mut regions = RegionSet::default();
    let mut outlined = 0usize;
    for result in per_zone {
        let zone = result?;
        if !zone.outline_found {
            warn!("No outline for country '{}'; skipping", zone.zone);
            diagnostics.add_coverage_gap(&zone.zone, "no onshore outline; zone skipped");
            continue;
        }
        outlined += 1;
        if zone.onshore.is_empty() {
            debug!("Country '{}' has no onshore buses", zone.zone);
            diagnostics.add_coverage_gap(&zone.zone, "no onshore buses; no region built");
        }
        regions.onshore.extend(zone.onshore);
        regions.offshore.extend(zone.offshore);
    }
    ensure_any_outline(outlined)?;

    let mut zones = ZoneMap::new();
    for bus in network.buses() {
        zones.assign(bus.id.clone(), bus.zone.clone());
    }
    apply_overrides(network, &options.zone_overrides, &mut zones, &mut diagnostics);

    let mut reduced = network.clone();
    relabel(&mut reduced, &zones);

    info!(
        "Built {} onshore and {} offshore regions",
        regions.onshore.len(),
        regions.offshore.len()
    );
    Ok(RegionOutcome {
        network: reduced,
        regions,
        zones,
        diagnostics,
    })
}

fn by_authority(
    network: &Network,
    onshore: &Outlines,
    offshore: &Outlines,
    options: &RegionOptions,
) -> GridResult<RegionOutcome> {
    let mut diagnostics = Diagnostics::new();
    let mut zones = ZoneMap::new();
    let mut regions = RegionSet::default();

    // Onshore: point-in-polygon per authority, each bus owned by the first match
    let onshore_buses: Vec<&Bus> = network.buses().filter(|b| b.substation_lv).collect();
    let candidates: Vec<Option<Vec<usize>>> = options
        .zones
        .par_iter()
        .map(|ba| {
            onshore.get(ba).map(|outline| {
                select(&onshore_buses, |b| {
                    outline.intersects(&Point::new(b.x, b.y))
                })
            })
        })
        .collect();

    let mut claimed = vec![false; onshore_buses.len()];
    let mut selections: Vec<(&str, &MultiPolygon<f64>, Vec<&Bus>)> = Vec::new();
    let mut outlined = 0usize;
    for (ba, candidate) in options.zones.iter().zip(candidates) {
        let (Some(outline), Some(indices)) = (onshore.get(ba), candidate) else {
            warn!("No outline for balancing authority '{}'; skipping", ba);
            diagnostics.add_coverage_gap(ba, "no outline for balancing authority; zone skipped");
            continue;
        };
        outlined += 1;
        let picked = claim(indices, &mut claimed, &onshore_buses);
        if picked.is_empty() {
            debug!("Balancing authority '{}' contains no onshore buses", ba);
            diagnostics.add_coverage_gap(ba, "no onshore buses; no region built");
            continue;
        }
        selections.push((ba.as_str(), outline, picked));
    }
    ensure_any_outline(outlined)?;

    let onshore_regions: Vec<Vec<Region>> = selections
        .par_iter()
        .map(|(ba, outline, buses)| partition(buses, outline, ba))
        .collect::<GridResult<_>>()?;
    for ((ba, _, buses), cells) in selections.iter().zip(onshore_regions) {
        for bus in buses {
            zones.assign(bus.id.clone(), Zone::new(*ba));
        }
        regions.onshore.extend(cells);
    }

    // Offshore: buses near each outline, partitioned against the outline itself
    let offshore_buses: Vec<&Bus> = network.buses().filter(|b| b.substation_off).collect();
    let outlines: Vec<(&String, &MultiPolygon<f64>)> = offshore.iter().collect();
    let near: Vec<Vec<usize>> = outlines
        .par_iter()
        .map(|(_, outline)| {
            select(&offshore_buses, |b| {
                within(outline, b, options.offshore_buffer)
            })
        })
        .collect();

    let mut claimed = vec![false; offshore_buses.len()];
    let mut off_selections: Vec<(&str, &MultiPolygon<f64>, Vec<&Bus>)> = Vec::new();
    for ((name, outline), indices) in outlines.iter().zip(near) {
        let picked = claim(indices, &mut claimed, &offshore_buses);
        if picked.is_empty() {
            debug!("Offshore outline '{}' has no buses nearby", name);
            continue;
        }
        off_selections.push((name.as_str(), *outline, picked));
    }

    let offshore_regions: Vec<Vec<Region>> = off_selections
        .par_iter()
        .map(|(name, outline, buses)| {
            partition(buses, outline, name).map(|r| retain_offshore(r, options.min_offshore_area))
        })
        .collect::<GridResult<_>>()?;
    for ((name, _, buses), cells) in off_selections.iter().zip(offshore_regions) {
        for bus in buses {
            zones.assign(bus.id.clone(), Zone::new(*name));
        }
        regions.offshore.extend(cells);
    }

    apply_overrides(network, &options.zone_overrides, &mut zones, &mut diagnostics);

    // Prune buses outside every zone
    let removed: HashSet<BusId> = network
        .buses()
        .filter(|b| zones.zone_of(&b.id).is_none())
        .map(|b| b.id.clone())
        .collect();
    let mut reduced = if removed.is_empty() {
        network.clone()
    } else {
        let mut removed_ids: Vec<&BusId> = removed.iter().collect();
        removed_ids.sort_by(|a, b| a.natural_cmp(b));
        for id in removed_ids {
            diagnostics.add_orphan("bus", id.as_str(), "bus lies outside every modelled zone");
        }
        let (pruned_network, pruned) = network.without_buses(&removed);
        for element in &pruned {
            diagnostics.add_orphan(element.kind, &element.id, "references a removed bus");
        }
        warn!(
            "Removed {} unassigned buses and {} attached elements",
            removed.len(),
            pruned.len()
        );
        pruned_network
    };
    relabel(&mut reduced, &zones);

    info!(
        "Built {} onshore and {} offshore regions; {} buses assigned",
        regions.onshore.len(),
        regions.offshore.len(),
        zones.len()
    );
    Ok(RegionOutcome {
        network: reduced,
        regions,
        zones,
        diagnostics,
    })
}

fn partition(buses: &[&Bus], outline: &MultiPolygon<f64>, zone: &str) -> GridResult<Vec<Region>> {
    let points: Vec<Coord<f64>> = buses.iter().map(|b| Coord { x: b.x, y: b.y }).collect();
    let cells = voronoi_partition(&points, outline)
        .map_err(|e| GridError::geometry(format!("zone {zone}"), e.to_string()))?;
    Ok(buses
        .iter()
        .zip(cells)
        .map(|(bus, cell)| region_for(bus, zone, cell))
        .collect())
}

fn region_for(bus: &Bus, zone: &str, cell: Clipped) -> Region {
    Region {
        name: bus.id.clone(),
        x: bus.x,
        y: bus.y,
        zone: Zone::new(zone),
        area: cell.area(),
        geometry: cell.to_multi_polygon(),
    }
}

fn retain_offshore(regions: Vec<Region>, min_area: f64) -> Vec<Region> {
    let before = regions.len();
    let kept: Vec<Region> = regions.into_iter().filter(|r| r.area > min_area).collect();
    if kept.len() < before {
        debug!(
            "Dropped {} offshore cells with area <= {}",
            before - kept.len(),
            min_area
        );
    }
    kept
}

fn select(buses: &[&Bus], pred: impl Fn(&Bus) -> bool) -> Vec<usize> {
    buses
        .iter()
        .enumerate()
        .filter_map(|(i, bus)| pred(*bus).then_some(i))
        .collect()
}

/// Keep the indices no earlier zone has claimed, and claim them.
fn claim<'a>(indices: Vec<usize>, claimed: &mut [bool], buses: &[&'a Bus]) -> Vec<&'a Bus> {
    indices
        .into_iter()
        .filter(|&i| !std::mem::replace(&mut claimed[i], true))
        .map(|i| buses[i])
        .collect()
}

fn within(outline: &MultiPolygon<f64>, bus: &Bus, buffer: f64) -> bool {
    let point = Point::new(bus.x, bus.y);
    outline.intersects(&point)
        || outline
            .iter()
            .any(|polygon| Euclidean.distance(&point, polygon) <= buffer)
}

fn ensure_any_outline(outlined: usize) -> GridResult<()> {
    if outlined == 0 {
        return Err(GridError::MissingData(
            "no configured zone has an outline (check zone names and outlines)".into(),
        ));
    }
    Ok(())
}

fn apply_overrides(
    network: &Network,
    overrides: &BTreeMap<String, String>,
    zones: &mut ZoneMap,
    diagnostics: &mut Diagnostics,
) {
    for (bus, zone) in overrides {
        let id = BusId::new(bus.as_str());
        if network.contains_bus(&id) {
            debug!("Zone override: bus {} -> {}", bus, zone);
            zones.assign(id, Zone::new(zone.as_str()));
        } else {
            diagnostics.add_warning_with_entity(
                "override",
                "zone override names an unknown bus",
                &format!("bus {bus}"),
            );
        }
    }
}

fn relabel(network: &mut Network, zones: &ZoneMap) {
    for node in network.graph.node_weights_mut() {
        if let Node::Bus(bus) = node {
            if let Some(zone) = zones.zone_of(&bus.id) {
                bus.zone = zone.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use gridreduce_core::{Line, Load};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]])
    }

    fn outlines(entries: &[(&str, MultiPolygon<f64>)]) -> Outlines {
        entries
            .iter()
            .map(|(name, mp)| (name.to_string(), mp.clone()))
            .collect()
    }

    fn country_network() -> Network {
        let mut network = Network::new();
        for (id, x, y) in [("1", 1.0, 1.0), ("2", 3.0, 1.0), ("3", 2.0, 3.0)] {
            network.add_bus(Bus::new(id, x, y).with_zone("US")).unwrap();
        }
        network
    }

    fn country_options(zones: &[&str]) -> RegionOptions {
        RegionOptions {
            zones: zones.iter().map(|z| z.to_string()).collect(),
            ..RegionOptions::default()
        }
    }

    #[test]
    fn test_options_defaults_from_empty_table() {
        let options: RegionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, RegionOptions::default());
        assert_eq!(options.min_offshore_area, 1e-2);
        assert_eq!(options.offshore_buffer, 0.2);
        assert_eq!(options.mode, RegionMode::Country);
    }

    #[test]
    fn test_country_mode_partitions_each_country() {
        let network = country_network();
        let onshore = outlines(&[("US", rect(0.0, 0.0, 4.0, 4.0))]);
        let outcome =
            assemble_regions(&network, &onshore, &Outlines::new(), &country_options(&["US"]))
                .unwrap();

        assert_eq!(outcome.regions.onshore.len(), 3);
        assert!(outcome.regions.offshore.is_empty());
        let total: f64 = outcome.regions.onshore.iter().map(|r| r.area).sum();
        assert!((total - 16.0).abs() < 1e-6);
        assert!(outcome.regions.onshore.iter().all(|r| r.zone.as_str() == "US"));
        assert_eq!(outcome.zones.len(), 3);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_tiny_offshore_cell_dropped() {
        let mut network = country_network();
        network
            .add_bus(
                Bus::new("off", 10.005, 10.005)
                    .with_zone("US")
                    .with_connections(false, true),
            )
            .unwrap();
        let onshore = outlines(&[("US", rect(0.0, 0.0, 4.0, 4.0))]);
        // 0.01 x 0.01 outline: the single offshore cell has area 1e-4
        let offshore = outlines(&[("US", rect(10.0, 10.0, 10.01, 10.01))]);

        let outcome =
            assemble_regions(&network, &onshore, &offshore, &country_options(&["US"])).unwrap();
        assert!(outcome.regions.offshore.is_empty());

        let big = outlines(&[("US", rect(10.0, 10.0, 11.0, 11.0))]);
        let outcome =
            assemble_regions(&network, &onshore, &big, &country_options(&["US"])).unwrap();
        assert_eq!(outcome.regions.offshore.len(), 1);
        assert_eq!(outcome.regions.offshore[0].name, BusId::new("off"));
    }

    #[test]
    fn test_missing_outline_is_skipped_with_warning() {
        let network = country_network();
        let onshore = outlines(&[("US", rect(0.0, 0.0, 4.0, 4.0))]);
        let outcome = assemble_regions(
            &network,
            &onshore,
            &Outlines::new(),
            &country_options(&["CA", "US"]),
        )
        .unwrap();

        assert_eq!(outcome.regions.onshore.len(), 3);
        let gaps: Vec<_> = outcome.diagnostics.issues_by_category("coverage").collect();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].entity.as_deref(), Some("zone CA"));
    }

    #[test]
    fn test_every_zone_skipped_is_fatal() {
        let network = country_network();
        let err = assemble_regions(
            &network,
            &Outlines::new(),
            &Outlines::new(),
            &country_options(&["CA", "MX"]),
        )
        .unwrap_err();
        assert!(matches!(err, GridError::MissingData(_)));
    }

    fn authority_network() -> Network {
        let mut network = Network::new();
        network.add_bus(Bus::new("1", 1.0, 1.0)).unwrap();
        network.add_bus(Bus::new("2", 2.0, 2.0)).unwrap();
        network.add_bus(Bus::new("3", 7.0, 1.0)).unwrap();
        // Outside every authority and not offshore-capable
        network.add_bus(Bus::new("4", 20.0, 1.0)).unwrap();
        // Offshore substation just off the coast of OFF
        network
            .add_bus(Bus::new("5", 11.9, 1.0).with_connections(false, true))
            .unwrap();
        network
            .add_line(Line::new("L12", "1", "2").with_s_nom(100.0))
            .unwrap();
        network
            .add_line(Line::new("L34", "3", "4").with_s_nom(100.0))
            .unwrap();
        network.add_load(Load::new("D4", "4")).unwrap();
        network.add_load(Load::new("D1", "1")).unwrap();
        network
    }

    fn authority_options() -> RegionOptions {
        RegionOptions {
            mode: RegionMode::Authority,
            zones: vec!["WEST".into(), "EAST".into()],
            ..RegionOptions::default()
        }
    }

    #[test]
    fn test_authority_mode_assigns_and_prunes() {
        let network = authority_network();
        let onshore = outlines(&[
            ("WEST", rect(0.0, 0.0, 5.0, 5.0)),
            ("EAST", rect(5.0, 0.0, 10.0, 5.0)),
        ]);
        let offshore = outlines(&[("OFF", rect(12.0, 0.0, 14.0, 2.0))]);

        let outcome =
            assemble_regions(&network, &onshore, &offshore, &authority_options()).unwrap();

        let zone = |id: &str| outcome.zones.zone_of(&BusId::new(id)).map(|z| z.as_str());
        assert_eq!(zone("1"), Some("WEST"));
        assert_eq!(zone("2"), Some("WEST"));
        assert_eq!(zone("3"), Some("EAST"));
        assert_eq!(zone("4"), None);
        assert_eq!(zone("5"), Some("OFF"));

        assert_eq!(outcome.regions.onshore.len(), 3);
        assert_eq!(outcome.regions.offshore.len(), 1);
        // Partitioned against the unbuffered outline
        assert!((outcome.regions.offshore[0].area - 4.0).abs() < 1e-6);
        assert_eq!(outcome.regions.offshore[0].zone.as_str(), "OFF");

        let reduced = &outcome.network;
        assert!(!reduced.contains_bus(&BusId::new("4")));
        assert_eq!(reduced.lines().count(), 1);
        assert_eq!(reduced.loads().count(), 1);
        assert_eq!(
            reduced.bus(&BusId::new("3")).unwrap().zone.as_str(),
            "EAST"
        );

        let orphans: Vec<String> = outcome
            .diagnostics
            .issues_by_category("orphan")
            .filter_map(|i| i.entity.clone())
            .collect();
        assert_eq!(orphans, vec!["bus 4", "load D4", "line L34"]);
    }

    #[test]
    fn test_first_authority_wins_overlap() {
        let network = authority_network();
        // WEST and EAST both contain bus 3
        let onshore = outlines(&[
            ("WEST", rect(0.0, 0.0, 8.0, 5.0)),
            ("EAST", rect(5.0, 0.0, 10.0, 5.0)),
        ]);
        let outcome =
            assemble_regions(&network, &onshore, &Outlines::new(), &authority_options()).unwrap();

        assert_eq!(
            outcome.zones.zone_of(&BusId::new("3")).unwrap().as_str(),
            "WEST"
        );
        let owners: Vec<&str> = outcome
            .regions
            .onshore
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(owners, vec!["1", "2", "3"]);
        // EAST selected nothing: a coverage warning, not an error
        let gaps: Vec<_> = outcome.diagnostics.issues_by_category("coverage").collect();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].entity.as_deref(), Some("zone EAST"));
    }

    #[test]
    fn test_outlined_zones_without_buses_are_not_fatal() {
        let network = country_network();
        let onshore = outlines(&[("US", rect(50.0, 50.0, 51.0, 51.0))]);
        let mut options = authority_options();
        options.zones = vec!["US".into()];
        let outcome =
            assemble_regions(&network, &onshore, &Outlines::new(), &options).unwrap();

        assert!(outcome.regions.onshore.is_empty());
        assert_eq!(outcome.diagnostics.issues_by_category("coverage").count(), 1);
        assert_eq!(outcome.network.buses().count(), 0);
    }

    #[test]
    fn test_zone_overrides_applied_last() {
        let network = authority_network();
        let onshore = outlines(&[
            ("WEST", rect(0.0, 0.0, 5.0, 5.0)),
            ("EAST", rect(5.0, 0.0, 10.0, 5.0)),
        ]);
        let mut options = authority_options();
        options.zone_overrides.insert("4".into(), "EAST".into());
        options.zone_overrides.insert("999".into(), "EAST".into());

        let outcome =
            assemble_regions(&network, &onshore, &Outlines::new(), &options).unwrap();

        // Overridden bus counts as assigned and survives pruning
        assert!(outcome.network.contains_bus(&BusId::new("4")));
        assert_eq!(
            outcome.network.bus(&BusId::new("4")).unwrap().zone.as_str(),
            "EAST"
        );
        let unknown: Vec<_> = outcome.diagnostics.issues_by_category("override").collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].entity.as_deref(), Some("bus 999"));
    }
}
