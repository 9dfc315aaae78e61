//! GeoJSON output for feature collections

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, FeatureCollection};
use geojson::{GeoJson, Geometry, JsonObject, JsonValue};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Convert a feature collection to a GeoJSON document.
///
/// The CRS, when known by EPSG code, is written as the legacy named `crs`
/// member that GDAL and QGIS still honour.
pub fn to_geojson(collection: &FeatureCollection) -> GeoJson {
    let features = collection
        .iter()
        .map(|feature| {
            let properties: JsonObject = feature
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), attribute_to_json(v)))
                .collect();

            geojson::Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&feature.geometry))),
                id: feature.id.map(|id| geojson::feature::Id::Number(id.into())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let foreign_members = collection.crs.as_ref().and_then(|crs| crs.epsg()).map(|code| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", code) }
            }),
        );
        members
    });

    GeoJson::FeatureCollection(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    })
}

/// Write a feature collection as a GeoJSON file
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &to_geojson(collection))?;
    writer.flush()?;
    Ok(())
}

/// Read a GeoJSON feature collection back into polygon features.
///
/// Non-polygon geometries are rejected.
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| Error::GeoJson(e.to_string()))?;

    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err(Error::GeoJson("expected a FeatureCollection".into()));
    };

    let mut collection = FeatureCollection::new(None);
    for feature in fc.features {
        let geometry = feature
            .geometry
            .ok_or_else(|| Error::GeoJson("feature without geometry".into()))?;
        let polygon: geo_types::Polygon<f64> = geometry
            .value
            .try_into()
            .map_err(|e: geojson::Error| Error::GeoJson(e.to_string()))?;

        let mut out = crate::vector::Feature::new(polygon);
        for (key, value) in feature.properties.unwrap_or_default() {
            out.set_property(key, json_to_attribute(&value));
        }
        collection.push(out);
    }
    Ok(collection)
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(b) => JsonValue::from(*b),
        AttributeValue::Int(i) => JsonValue::from(*i),
        AttributeValue::Float(f) => JsonValue::from(*f),
        AttributeValue::String(s) => JsonValue::from(s.as_str()),
    }
}

fn json_to_attribute(value: &JsonValue) -> AttributeValue {
    match value {
        JsonValue::Bool(b) => AttributeValue::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => AttributeValue::String(s.clone()),
        _ => AttributeValue::Null,
    }
}
