//! GeoJSON `FeatureCollection` loading.
//!
//! Only the subset needed to audit a layer is read: geometry, a numeric
//! feature `id`, and scalar properties. Coordinates beyond the first two
//! (elevation, measures) are ignored.

use std::collections::BTreeSet;

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use gisaudit_domain::{Feature, MemoryLayer};
use gisaudit_types::AttributeValue;

#[derive(Debug, thiserror::Error)]
pub enum GeoJsonError {
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a FeatureCollection, found '{0}'")]
    NotFeatureCollection(String),

    #[error("feature {index}: position has {len} coordinate(s), need at least 2")]
    ShortPosition { index: usize, len: usize },

    #[error("feature {index}: duplicate feature id {id}")]
    DuplicateId { index: usize, id: u64 },
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<RawGeometry> },
}

/// Parses a FeatureCollection into an in-memory layer called `name`.
///
/// Feature ids come from a non-negative integer `id` member, otherwise the
/// 0-based position in the collection. The field list is the union of
/// property keys in first-seen order across features (keys within one
/// feature arrive sorted).
pub fn parse_layer(name: &str, text: &str) -> Result<MemoryLayer, GeoJsonError> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    if collection.kind != "FeatureCollection" {
        return Err(GeoJsonError::NotFeatureCollection(collection.kind));
    }

    let mut fields: Vec<String> = Vec::new();
    let mut seen_fields: BTreeSet<String> = BTreeSet::new();
    let mut seen_ids: BTreeSet<u64> = BTreeSet::new();
    let mut features = Vec::with_capacity(collection.features.len());

    for (index, raw) in collection.features.into_iter().enumerate() {
        let id = raw
            .id
            .as_ref()
            .and_then(Value::as_u64)
            .unwrap_or(index as u64);
        if !seen_ids.insert(id) {
            return Err(GeoJsonError::DuplicateId { index, id });
        }

        let mut feature = Feature::new(id);
        if let Some(geometry) = raw.geometry {
            feature = feature.with_geometry(to_geometry(geometry, index)?);
        }

        for (key, value) in raw.properties.unwrap_or_default() {
            if seen_fields.insert(key.clone()) {
                fields.push(key.clone());
            }
            feature = feature.with_attribute(key, to_attribute(value));
        }
        features.push(feature);
    }

    Ok(MemoryLayer::new(name, fields).with_features(features))
}

fn to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::Text(s),
        nested @ (Value::Array(_) | Value::Object(_)) => AttributeValue::Text(nested.to_string()),
    }
}

fn to_geometry(raw: RawGeometry, index: usize) -> Result<Geometry<f64>, GeoJsonError> {
    let geometry: Geometry<f64> = match raw {
        RawGeometry::Point { coordinates } => Point(coord(&coordinates, index)?).into(),
        RawGeometry::MultiPoint { coordinates } => MultiPoint(
            coordinates
                .iter()
                .map(|p| coord(p, index).map(Point))
                .collect::<Result<_, _>>()?,
        )
        .into(),
        RawGeometry::LineString { coordinates } => line_string(&coordinates, index)?.into(),
        RawGeometry::MultiLineString { coordinates } => MultiLineString(
            coordinates
                .iter()
                .map(|line| line_string(line, index))
                .collect::<Result<_, _>>()?,
        )
        .into(),
        RawGeometry::Polygon { coordinates } => polygon(&coordinates, index)?.into(),
        RawGeometry::MultiPolygon { coordinates } => MultiPolygon(
            coordinates
                .iter()
                .map(|rings| polygon(rings, index))
                .collect::<Result<_, _>>()?,
        )
        .into(),
        RawGeometry::GeometryCollection { geometries } => {
            Geometry::GeometryCollection(GeometryCollection(
                geometries
                    .into_iter()
                    .map(|g| to_geometry(g, index))
                    .collect::<Result<_, _>>()?,
            ))
        }
    };
    Ok(geometry)
}

fn coord(position: &[f64], index: usize) -> Result<Coord<f64>, GeoJsonError> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(GeoJsonError::ShortPosition {
            index,
            len: position.len(),
        }),
    }
}

fn line_string(positions: &[Position], index: usize) -> Result<LineString<f64>, GeoJsonError> {
    positions
        .iter()
        .map(|p| coord(p, index))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

/// First ring is the exterior, the rest are holes.
fn polygon(rings: &[Vec<Position>], index: usize) -> Result<Polygon<f64>, GeoJsonError> {
    let mut rings = rings
        .iter()
        .map(|ring| line_string(ring, index))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
    Ok(Polygon::new(exterior, rings.collect()))
}
