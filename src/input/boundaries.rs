use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::PipelineError;
use crate::input::archive::{is_zip, read_archive_entry};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundaryFields {
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_name_field")]
    pub name_field: String,
    #[serde(default = "default_area_field")]
    pub area_field: String,
}

impl Default for BoundaryFields {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            name_field: default_name_field(),
            area_field: default_area_field(),
        }
    }
}

fn default_id_field() -> String {
    "GEOID20".to_string()
}

fn default_name_field() -> String {
    "BASENAME".to_string()
}

fn default_area_field() -> String {
    "ALAND20".to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub geoid: String,
    pub attributes: Map<String, Value>,
    pub geometry: Value,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Value,
}

pub fn load_boundaries(path: &Path, fields: &BoundaryFields) -> Result<Vec<Boundary>> {
    let data = if is_zip(path) {
        read_archive_entry(path, None, &["geojson", "json"])?.1
    } else {
        fs::read(path).with_context(|| format!("failed reading boundaries: {}", path.display()))?
    };
    let boundaries = parse_boundaries(&data, fields)
        .with_context(|| format!("failed parsing boundaries: {}", path.display()))?;
    info!(features = boundaries.len(), path = %path.display(), "loaded boundaries");
    Ok(boundaries)
}

pub fn parse_boundaries(data: &[u8], fields: &BoundaryFields) -> Result<Vec<Boundary>> {
    let collection: RawCollection = serde_json::from_slice(data)?;
    let mut out = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let properties = feature.properties.unwrap_or_default();
        let geoid = match properties.get(&fields.id_field) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(PipelineError::InvalidBoundary {
                    index,
                    reason: format!("missing identifier property `{}`", fields.id_field),
                }
                .into())
            }
        };
        if feature.geometry.is_null() {
            return Err(PipelineError::InvalidBoundary {
                index,
                reason: format!("feature {geoid} has no geometry"),
            }
            .into());
        }
        let mut attributes = Map::new();
        for key in [&fields.name_field, &fields.area_field] {
            attributes.insert(
                key.clone(),
                properties.get(key).cloned().unwrap_or(Value::Null),
            );
        }
        out.push(Boundary {
            geoid,
            attributes,
            geometry: feature.geometry,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_boundaries, BoundaryFields};
    use crate::testing::boundary_collection;

    #[test]
    fn keeps_identifier_name_area_and_geometry() {
        let data = boundary_collection(&["250010101001", "250010101002"]);
        let parsed = parse_boundaries(data.as_bytes(), &BoundaryFields::default()).expect("parse");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].geoid, "250010101002");
        assert_eq!(parsed[1].attributes["BASENAME"], json!("Unit 1"));
        assert_eq!(parsed[1].attributes["ALAND20"], json!(1001));
        assert!(!parsed[1].attributes.contains_key("MTFCC20"));
        assert_eq!(parsed[1].geometry["type"], json!("Polygon"));
    }

    #[test]
    fn numeric_identifiers_are_read_as_text() {
        let data = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "GEOID20": 25001 },
                "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
            }]
        })
        .to_string();
        let parsed = parse_boundaries(data.as_bytes(), &BoundaryFields::default()).expect("parse");
        assert_eq!(parsed[0].geoid, "25001");
        assert!(parsed[0].attributes["BASENAME"].is_null());
    }

    #[test]
    fn rejects_feature_without_identifier() {
        let data = boundary_collection(&["25001"]).replace("GEOID20", "GEOID10");
        let err = parse_boundaries(data.as_bytes(), &BoundaryFields::default())
            .expect_err("identifier renamed");
        assert!(err.to_string().contains("GEOID20"));
    }
}
