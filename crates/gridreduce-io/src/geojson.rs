//! GeoJSON outlines and regions.
//!
//! Outlines are read from a `FeatureCollection` whose features carry a
//! `properties.name` and a `Polygon` or `MultiPolygon` geometry. Every outline
//! is repaired on the way in. Regions are written back as a
//! `FeatureCollection` with `name`, `x`, `y` and `country` properties.

use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use gridreduce_algo::{repair_multi, Outlines, Region};
use gridreduce_core::natural_cmp;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("expected a FeatureCollection, found {0}")]
    NotFeatureCollection(String),
    #[error("feature {0} has no string 'name' property")]
    MissingName(usize),
    #[error("outline '{name}': unsupported geometry type {kind}")]
    UnsupportedGeometry { name: String, kind: String },
    #[error("outline '{name}': malformed coordinates")]
    BadCoordinates { name: String },
}

/// Read named outlines from a GeoJSON file.
///
/// Features sharing a name are merged into one outline.
pub fn read_outlines(path: &Path) -> Result<Outlines> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    let outlines = parse_outlines(&value)
        .with_context(|| format!("reading outlines from {}", path.display()))?;
    info!("Read {} outlines from {}", outlines.len(), path.display());
    Ok(outlines)
}

/// Parse a GeoJSON `FeatureCollection` value into repaired outlines.
pub fn parse_outlines(value: &Value) -> Result<Outlines> {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or("nothing");
    let features = match (kind, value.get("features").and_then(Value::as_array)) {
        ("FeatureCollection", Some(features)) => features,
        _ => return Err(GeoJsonError::NotFeatureCollection(kind.to_string()).into()),
    };

    let mut outlines = Outlines::new();
    for (index, feature) in features.iter().enumerate() {
        let name = feature
            .pointer("/properties/name")
            .and_then(Value::as_str)
            .ok_or(GeoJsonError::MissingName(index))?
            .to_string();
        let geometry = feature.get("geometry").unwrap_or(&Value::Null);
        let parsed = parse_geometry(&name, geometry)?;
        let repaired = repair_multi(&name, &parsed)?;
        match outlines.get_mut(&name) {
            Some(existing) => {
                debug!("Merging repeated outline '{}'", name);
                existing.0.extend(repaired.0);
            }
            None => {
                outlines.insert(name, repaired);
            }
        }
    }
    Ok(outlines)
}

fn parse_geometry(name: &str, geometry: &Value) -> Result<MultiPolygon<f64>, GeoJsonError> {
    let kind = geometry.get("type").and_then(Value::as_str).unwrap_or("null");
    let bad = || GeoJsonError::BadCoordinates {
        name: name.to_string(),
    };
    let coordinates = geometry.get("coordinates").ok_or_else(bad)?;
    match kind {
        "Polygon" => Ok(MultiPolygon::new(vec![
            parse_polygon(coordinates).ok_or_else(bad)?
        ])),
        "MultiPolygon" => coordinates
            .as_array()
            .ok_or_else(bad)?
            .iter()
            .map(|p| parse_polygon(p).ok_or_else(bad))
            .collect::<Result<Vec<_>, _>>()
            .map(MultiPolygon::new),
        other => Err(GeoJsonError::UnsupportedGeometry {
            name: name.to_string(),
            kind: other.to_string(),
        }),
    }
}

fn parse_polygon(rings: &Value) -> Option<Polygon<f64>> {
    let mut rings = rings
        .as_array()?
        .iter()
        .map(parse_ring)
        .collect::<Option<Vec<_>>>()?
        .into_iter();
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(ring: &Value) -> Option<LineString<f64>> {
    ring.as_array()?
        .iter()
        .map(|position| {
            let position = position.as_array()?;
            Some(Coord {
                x: position.first()?.as_f64()?,
                y: position.get(1)?.as_f64()?,
            })
        })
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

fn ring_coordinates(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

fn multi_polygon_geometry(mp: &MultiPolygon<f64>) -> Value {
    let polygons: Vec<Value> = mp
        .iter()
        .map(|polygon| {
            let mut rings = vec![ring_coordinates(polygon.exterior())];
            rings.extend(polygon.interiors().iter().map(ring_coordinates));
            Value::Array(rings)
        })
        .collect();
    json!({ "type": "MultiPolygon", "coordinates": polygons })
}

/// GeoJSON `FeatureCollection` for a set of regions, sorted by owning bus.
pub fn regions_to_geojson(regions: &[Region]) -> Value {
    let mut sorted: Vec<&Region> = regions.iter().collect();
    sorted.sort_by(|a, b| natural_cmp(a.name.as_str(), b.name.as_str()));
    let features: Vec<Value> = sorted
        .into_iter()
        .map(|region| {
            json!({
                "type": "Feature",
                "properties": {
                    "name": region.name.as_str(),
                    "x": region.x,
                    "y": region.y,
                    "country": region.zone.as_str(),
                },
                "geometry": multi_polygon_geometry(&region.geometry),
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

/// Write regions to a GeoJSON file, creating parent directories as needed.
pub fn write_regions(path: &Path, regions: &[Region]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if parent != Path::new("") {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &regions_to_geojson(regions))
        .with_context(|| format!("writing {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Wrote {} regions to {}", regions.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};
    use gridreduce_core::{BusId, Zone};
    use tempfile::tempdir;

    fn collection(features: Vec<Value>) -> Value {
        json!({ "type": "FeatureCollection", "features": features })
    }

    fn square_feature(name: &str, x0: f64, size: f64) -> Value {
        json!({
            "type": "Feature",
            "properties": { "name": name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [x0, 0.0],
                    [x0 + size, 0.0],
                    [x0 + size, size],
                    [x0, size],
                    [x0, 0.0]
                ]]
            }
        })
    }

    #[test]
    fn test_parse_polygon_and_multipolygon() {
        let value = collection(vec![
            square_feature("CISO", 0.0, 2.0),
            json!({
                "type": "Feature",
                "properties": { "name": "ISNE" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[10.0, 0.0], [11.0, 0.0], [11.0, 1.0], [10.0, 0.0]]],
                        [[[20.0, 0.0], [21.0, 0.0], [21.0, 1.0], [20.0, 0.0]]]
                    ]
                }
            }),
        ]);
        let outlines = parse_outlines(&value).unwrap();
        assert_eq!(outlines.len(), 2);
        assert!((outlines["CISO"].unsigned_area() - 4.0).abs() < 1e-12);
        assert_eq!(outlines["ISNE"].0.len(), 2);
        assert!((outlines["ISNE"].unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_names_merge() {
        let value = collection(vec![
            square_feature("US", 0.0, 1.0),
            square_feature("US", 5.0, 1.0),
        ]);
        let outlines = parse_outlines(&value).unwrap();
        assert_eq!(outlines.len(), 1);
        assert!((outlines["US"].unsigned_area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_input() {
        let err = parse_outlines(&json!({ "type": "Feature" })).unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));

        let nameless = collection(vec![json!({
            "type": "Feature",
            "properties": {},
            "geometry": null
        })]);
        assert!(parse_outlines(&nameless).unwrap_err().to_string().contains("feature 0"));

        let point = collection(vec![json!({
            "type": "Feature",
            "properties": { "name": "P" },
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
        })]);
        assert!(parse_outlines(&point).unwrap_err().to_string().contains("Point"));
    }

    #[test]
    fn test_degenerate_outline_names_zone() {
        let line = collection(vec![json!({
            "type": "Feature",
            "properties": { "name": "FLAT" },
            "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]] }
        })]);
        let err = parse_outlines(&line).unwrap_err();
        assert!(format!("{err:#}").contains("FLAT"));
    }

    fn region(name: &str, x0: f64) -> Region {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: x0, y: 0.0),
            (x: x0 + 1.0, y: 0.0),
            (x: x0 + 1.0, y: 1.0),
            (x: x0, y: 1.0),
        ]]);
        Region {
            name: BusId::new(name),
            x: x0 + 0.5,
            y: 0.5,
            zone: Zone::new("US"),
            area: geometry.unsigned_area(),
            geometry,
        }
    }

    #[test]
    fn test_regions_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("regions_onshore.geojson");
        write_regions(&path, &[region("10", 1.0), region("9", 0.0)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let features = value["features"].as_array().unwrap();
        // Natural order: "9" before "10"
        assert_eq!(features[0]["properties"]["name"], "9");
        assert_eq!(features[1]["properties"]["country"], "US");

        let outlines = read_outlines(&path).unwrap();
        assert!((outlines["10"].unsigned_area() - 1.0).abs() < 1e-12);
    }
}
